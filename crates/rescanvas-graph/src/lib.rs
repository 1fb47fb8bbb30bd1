//! Resource graph engine
//!
//! The canonical node/edge graph and the machinery that keeps it consistent.
//!
//! # Overview
//!
//! - **GraphStore**: Owns nodes and edges; id allocation, cascade delete, connect
//! - **Propagator**: Debounced copying of source fields to target fields
//! - **GenerationLedger**: Bulk-insert batches with atomic revert
//!
//! # Example
//!
//! ```rust
//! use rescanvas_graph::{GraphStore, Propagator};
//! use rescanvas_registry::ResourceRegistry;
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! let registry = Arc::new(ResourceRegistry::kubernetes().unwrap());
//! let mut store = GraphStore::new(registry);
//! let mut propagator = Propagator::new(Duration::ZERO);
//!
//! let deployment = store.add_node("Deployment", None).unwrap().id.clone();
//! let service = store.add_node("Service", None).unwrap().id.clone();
//! store
//!     .connect(
//!         &format!("source:{deployment}:metadata.name"),
//!         &format!("target:{service}:spec.selector.app"),
//!     )
//!     .unwrap();
//!
//! let events = store.drain_events();
//! propagator.observe(&store, &events, Instant::now());
//! propagator.flush_due(&mut store, Instant::now());
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod ledger;
pub mod node;
pub mod propagate;
pub mod store;

// Re-exports
pub use error::{ConnectError, LedgerError, ReplaceError};
pub use event::GraphEvent;
pub use ledger::{GenerationId, GenerationLedger, GenerationRecord};
pub use node::{Edge, Node, Position, Viewport};
pub use propagate::{PropagationReport, Propagator, DEFAULT_DEBOUNCE, DEFAULT_MAX_ROUNDS};
pub use store::{GraphStore, ReplaceReport, MAX_NODE_ID};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for graph operations
    pub use crate::{
        Edge, GenerationId, GenerationLedger, GraphEvent, GraphStore, Node, Position, Propagator,
        Viewport,
    };
}
