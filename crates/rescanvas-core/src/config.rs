//! Engine configuration
//!
//! Loaded from TOML or YAML; every field has a default so partial files are
//! accepted.

use rescanvas_graph::{DEFAULT_DEBOUNCE, DEFAULT_MAX_ROUNDS};
use rescanvas_interchange::{GridLayout, DEFAULT_EXPORT_PREFIX, DEFAULT_KIND_FIELD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::EngineError;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period before a propagated write lands
    pub propagation_debounce_ms: u64,
    /// Propagation rounds per flush before pending writes are discarded
    pub max_propagation_rounds: usize,
    /// Discriminator field used by text import
    pub kind_field: String,
    /// Placement grid for imported nodes
    pub layout: GridLayout,
    /// Durable snapshot file
    pub storage_path: PathBuf,
    /// Export file name prefix
    pub export_prefix: String,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Extra kind manifests; built-in kinds are used when absent
    pub registry_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With propagation debounce
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.propagation_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With propagation round limit
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_propagation_rounds = rounds;
        self
    }

    /// With discriminator field
    #[inline]
    #[must_use]
    pub fn with_kind_field(mut self, field: impl Into<String>) -> Self {
        self.kind_field = field.into();
        self
    }

    /// With import layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// With snapshot file
    #[inline]
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// With manifest directory
    #[inline]
    #[must_use]
    pub fn with_registry_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.registry_dir = Some(dir.into());
        self
    }

    /// Propagation debounce as a duration
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.propagation_debounce_ms)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `EngineError::Config` on malformed input
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns `EngineError::Config` on malformed input
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        serde_yaml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load from a file, choosing the format by extension
    ///
    /// `.toml` is read as TOML, anything else as YAML.
    ///
    /// # Errors
    /// Returns `EngineError` if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            propagation_debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(300),
            max_propagation_rounds: DEFAULT_MAX_ROUNDS,
            kind_field: DEFAULT_KIND_FIELD.to_string(),
            layout: GridLayout::default(),
            storage_path: PathBuf::from("resource-graph.json"),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            log_filter: "info".to_string(),
            registry_dir: None,
        }
    }
}
