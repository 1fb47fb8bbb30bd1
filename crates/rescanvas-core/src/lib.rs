//! Resource canvas engine
//!
//! The composition root that keeps a resource graph, its data-flow
//! connections and its text form consistent:
//! - Owns one graph per [`EditorSession`]
//! - Routes form edits, connections and imports through the graph store
//! - Runs debounced field propagation after every mutation
//! - Tracks bulk imports for one-step revert
//! - Saves, restores and exports snapshots
//! - Binds single-flight commands to keyboard shortcuts
//!
//! # Example
//!
//! ```rust
//! use rescanvas_core::{EditorSession, EngineConfig};
//! use rescanvas_interchange::MemorySnapshotStore;
//! use rescanvas_registry::ResourceRegistry;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let session = EditorSession::new(
//!     Arc::new(ResourceRegistry::kubernetes().unwrap()),
//!     EngineConfig::new().with_debounce(Duration::ZERO),
//!     Arc::new(MemorySnapshotStore::new()),
//! );
//!
//! let outcome = session
//!     .import_text("kind: Deployment\n---\nkind: Service\n", "paste")
//!     .unwrap();
//! assert_eq!(outcome.created.len(), 2);
//! assert!(session.preview_text().unwrap().contains("kind: Service"));
//! ```

#![warn(unreachable_pub)]

pub mod assistant;
pub mod commands;
pub mod config;
pub mod error;
pub mod notification;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use assistant::{
    GenerationError, GenerationErrorKind, GenerationRequest, PromptBuilder, TextGenerator,
};
pub use commands::{Command, CommandOutcome, CommandRegistry, Focus};
pub use config::EngineConfig;
pub use error::EngineError;
pub use notification::{Notification, NotificationLevel};
pub use session::{EditorSession, FormChange, FormPatch, ImportOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving an editor session
    pub use crate::{
        Command, CommandRegistry, EditorSession, EngineConfig, EngineError, FormPatch, Focus,
        Notification, TextGenerator,
    };
    pub use rescanvas_graph::{GenerationId, Position, Viewport};
    pub use rescanvas_model::{FieldPath, NodeId, Record};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
