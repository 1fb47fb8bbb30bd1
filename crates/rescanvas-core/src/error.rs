//! Error types for the editor engine
//!
//! Aggregates the errors of every layer so session operations can use `?`
//! throughout:
//! - Registry misses and registry construction failures
//! - Connection refusals and record path failures
//! - Snapshot, text and storage failures
//! - Generation ledger misses and AI collaborator failures

use rescanvas_graph::{ConnectError, LedgerError};
use rescanvas_interchange::{CodecError, SnapshotError, StorageError};
use rescanvas_model::RecordError;
use rescanvas_registry::{RegistryError, UnknownKindError};
use std::path::PathBuf;

use crate::assistant::GenerationError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Kind not in the registry
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    /// Registry could not be built
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Connection refused
    #[error("connection refused: {0}")]
    Connect(#[from] ConnectError),

    /// Record path could not be written
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Snapshot refused
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Text export failed
    #[error("text export failed: {0}")]
    Codec(#[from] CodecError),

    /// Text import produced no nodes
    #[error("no resources imported ({rejected} documents rejected)")]
    EmptyImport { rejected: usize },

    /// Durable storage failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Nothing stored yet
    #[error("no saved snapshot")]
    NothingSaved,

    /// Generation ledger miss
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// AI collaborator failure or absence
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error outside snapshot storage
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the whole operation was refused without touching the graph
    #[inline]
    #[must_use]
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind(_) | Self::Connect(_) | Self::Snapshot(_) | Self::EmptyImport { .. }
        )
    }
}
