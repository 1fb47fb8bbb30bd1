//! Command registry
//!
//! Named actions with single-key shortcuts. Execution is single-flight per
//! command: while one run is pending, further triggers of the same id are
//! ignored.

use dashmap::DashSet;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Async command body
pub type CommandAction = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Enablement check
pub type CommandGuard = Arc<dyn Fn() -> bool + Send + Sync>;

/// A named, optionally shortcut-bound action
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub shortcut: Option<char>,
    action: CommandAction,
    guard: Option<CommandGuard>,
}

impl Command {
    /// Create command
    pub fn new<F, Fut>(id: impl Into<String>, label: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            icon: String::new(),
            shortcut: None,
            action: Arc::new(move || Box::pin(action())),
            guard: None,
        }
    }

    /// With icon name
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// With single-key shortcut
    #[must_use]
    pub fn with_shortcut(mut self, key: char) -> Self {
        self.shortcut = Some(key);
        self
    }

    /// With enablement check
    #[must_use]
    pub fn with_guard(mut self, guard: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Check if the command may run now
    #[must_use]
    pub fn can_execute(&self) -> bool {
        self.guard.as_ref().map_or(true, |g| g())
    }

    fn matches_key(&self, key: char) -> bool {
        self.shortcut
            .is_some_and(|s| s.to_uppercase().eq(key.to_uppercase()))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

/// Where keyboard focus currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Canvas or nothing focused
    #[default]
    Canvas,
    /// Single-line text input
    TextInput,
    /// Multi-line text area
    TextArea,
    /// Any other editable region
    Editable,
}

impl Focus {
    /// Check if keystrokes belong to a text field
    #[inline]
    #[must_use]
    pub fn captures_typing(self) -> bool {
        !matches!(self, Self::Canvas)
    }
}

/// Result of one execution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Ran to completion
    Executed,
    /// Same command still running; trigger ignored
    AlreadyRunning,
    /// Guard refused
    Disabled,
    /// No command with this id
    Unknown,
    /// Ran and returned an error
    Failed(String),
}

/// Marks a command as executing until dropped
struct ExecutingMarker {
    executing: Arc<DashSet<String>>,
    id: String,
}

impl Drop for ExecutingMarker {
    fn drop(&mut self) {
        self.executing.remove(&self.id);
    }
}

/// Registry of commands, in registration order
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, Command>,
    executing: Arc<DashSet<String>>,
}

impl CommandRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, returning the one it replaced
    pub fn register(&mut self, command: Command) -> Option<Command> {
        debug!(command = %command.id, "command registered");
        self.commands.insert(command.id.clone(), command)
    }

    /// Get command by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    /// Commands in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Check if a command is running
    #[inline]
    #[must_use]
    pub fn is_executing(&self, id: &str) -> bool {
        self.executing.contains(id)
    }

    /// Run a command unless it is already running or disabled
    pub async fn execute(&self, id: &str) -> CommandOutcome {
        let Some(command) = self.commands.get(id) else {
            return CommandOutcome::Unknown;
        };
        if !command.can_execute() {
            return CommandOutcome::Disabled;
        }
        if !self.executing.insert(id.to_string()) {
            debug!(command = id, "command already running");
            return CommandOutcome::AlreadyRunning;
        }
        let _marker = ExecutingMarker {
            executing: Arc::clone(&self.executing),
            id: id.to_string(),
        };

        match (command.action)().await {
            Ok(()) => CommandOutcome::Executed,
            Err(e) => {
                warn!(command = id, error = %e, "command failed");
                CommandOutcome::Failed(e.to_string())
            }
        }
    }

    /// Dispatch a key press to the first command bound to it
    ///
    /// Returns `None` when focus is in a text field or no command is bound.
    pub async fn handle_key(&self, key: char, focus: Focus) -> Option<CommandOutcome> {
        if focus.captures_typing() {
            return None;
        }
        let id = self.commands.values().find(|c| c.matches_key(key))?.id.clone();
        Some(self.execute(&id).await)
    }
}
