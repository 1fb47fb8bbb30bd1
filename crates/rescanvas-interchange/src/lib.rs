//! Resource graph interchange
//!
//! The boundary between the in-memory graph and the outside world.
//!
//! # Core Operations
//!
//! - **Text**: Records to a multi-document YAML stream and back, with
//!   per-document rejection on import
//! - **Cleanup**: Strip prose and fences from generated text before import
//! - **Snapshot**: Whole-graph JSON capture and wholesale restore
//! - **Storage**: Single-slot durable snapshot storage and dated exports
//!
//! # Architecture
//!
//! ```text
//! Text ──► TextCodec::parse ──► Candidates ──► GraphStore (grid placement)
//!                                   └─► Rejections
//! GraphStore ◄──► GraphSnapshot ◄──► JSON ◄──► SnapshotStore
//! ```
//!
//! # Example
//!
//! ```rust
//! use rescanvas_graph::GraphStore;
//! use rescanvas_interchange::{serialize_all, TextCodec};
//! use rescanvas_registry::ResourceRegistry;
//! use std::sync::Arc;
//!
//! let mut store = GraphStore::new(Arc::new(ResourceRegistry::kubernetes().unwrap()));
//! let report = TextCodec::new().parse_and_build(
//!     "kind: ConfigMap\nmetadata:\n  name: settings\n---\nkind: Pod\n",
//!     &mut store,
//! );
//! assert_eq!(report.created.len(), 1);
//! assert_eq!(report.rejected_count(), 1);
//!
//! let text = serialize_all(store.nodes()).unwrap();
//! assert!(text.contains("name: settings"));
//! ```

#![warn(missing_docs)]

pub mod cleanup;
pub mod error;
pub mod snapshot;
pub mod storage;
pub mod text;

// Re-exports
pub use cleanup::clean_generated_text;
pub use error::{CodecError, ParseRejection, SnapshotError, StorageError};
pub use snapshot::{export_file_name, GraphSnapshot, DEFAULT_EXPORT_PREFIX};
pub use storage::{write_export, FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use text::{
    serialize_all, serialize_node, serialize_selection, split_documents, Candidate, GridLayout,
    ImportReport, ParsedBatch, TextCodec, DEFAULT_KIND_FIELD, DOCUMENT_SEPARATOR,
};

/// Version of the interchange layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
