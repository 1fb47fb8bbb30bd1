//! AI collaborator interface
//!
//! The engine never calls a model itself. It builds a prompt, hands it to a
//! [`TextGenerator`], and imports whatever text comes back.

use rescanvas_registry::ResourceRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request sent to the collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Existing records given as context, in the text format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_text: Option<String>,
    /// What the user asked for
    pub user_prompt: String,
}

impl GenerationRequest {
    /// Create request without context
    #[inline]
    #[must_use]
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            context_text: None,
            user_prompt: user_prompt.into(),
        }
    }

    /// With context text; blank context is dropped
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context_text = (!context.trim().is_empty()).then_some(context);
        self
    }

    /// Prompt text combining context and request
    #[must_use]
    pub fn compose(&self) -> String {
        match &self.context_text {
            Some(context) => format!(
                "Context YAML:\n{context}\n\nUser Request: {}",
                self.user_prompt
            ),
            None => self.user_prompt.clone(),
        }
    }
}

/// Collaborator failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationErrorKind {
    /// No credentials or no service
    NotConfigured,
    /// Usage limit hit
    Quota,
    /// Transport failure
    Network,
    /// Refused by content filtering
    Blocked,
    /// Anything else
    Other,
}

impl GenerationErrorKind {
    /// User-facing summary
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::NotConfigured => "Invalid API key",
            Self::Quota => "API quota exceeded",
            Self::Network => "Network error - check internet connection",
            Self::Blocked => "Request blocked by AI safety filters",
            Self::Other => "AI generation failed",
        }
    }
}

/// Categorized collaborator failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", .kind.summary())]
pub struct GenerationError {
    /// Failure category
    pub kind: GenerationErrorKind,
    /// Provider message
    pub message: String,
}

impl GenerationError {
    /// Create error of a known kind
    #[inline]
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Collaborator is not available
    #[inline]
    #[must_use]
    pub fn not_configured() -> Self {
        Self::new(GenerationErrorKind::NotConfigured, "no text generator configured")
    }

    /// Categorize a provider error message
    #[must_use]
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.contains("API_KEY") {
            GenerationErrorKind::NotConfigured
        } else if message.contains("quota") {
            GenerationErrorKind::Quota
        } else if message.contains("network") || message.contains("fetch") {
            GenerationErrorKind::Network
        } else if message.contains("blocked") {
            GenerationErrorKind::Blocked
        } else {
            GenerationErrorKind::Other
        };
        Self { kind, message }
    }
}

/// External text generation service
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce multi-document text for a request
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Check if the service can be called
    fn is_available(&self) -> bool {
        true
    }
}

/// System prompt builder
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    kinds: Vec<String>,
    examples: Vec<String>,
}

impl PromptBuilder {
    /// Builder listing every registered kind
    #[must_use]
    pub fn from_registry(registry: &ResourceRegistry) -> Self {
        Self {
            kinds: registry.kinds().into_iter().map(str::to_string).collect(),
            examples: Vec::new(),
        }
    }

    /// Add an example document
    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// System prompt text
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are a Kubernetes YAML expert. Generate valid Kubernetes YAML based on user requirements.\n\n\
             AVAILABLE RESOURCES: {}\n",
            self.kinds.join(", ")
        );
        if !self.examples.is_empty() {
            prompt.push_str("\nEXAMPLE YAMLS:\n");
            prompt.push_str(&self.examples.join("---\n"));
            prompt.push('\n');
        }
        prompt.push_str(
            "\nRULES:\n\
             1. Always include apiVersion, kind, metadata.name\n\
             2. Use proper resource relationships and labels\n\
             3. Include proper selectors for services/deployments\n\
             4. Return ONLY valid YAML, no explanations\n\
             5. Separate multiple resources with ---\n",
        );
        prompt
    }

    /// Full prompt for a request
    #[must_use]
    pub fn build(&self, request: &GenerationRequest) -> String {
        format!("{}\nUSER REQUEST: {}", self.system_prompt(), request.compose())
    }
}

impl fmt::Display for PromptBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.system_prompt())
    }
}
