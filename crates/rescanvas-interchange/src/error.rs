//! Error types for text and snapshot interchange
//!
//! Provides error handling for:
//! - Text export (records → YAML documents)
//! - Text import rejections (one per document)
//! - Snapshot decoding and restore
//! - Durable snapshot storage

use rescanvas_graph::ReplaceError;
use std::path::PathBuf;

/// Errors while serializing records to text
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// YAML emitter failure
    #[error("failed to serialize record for node {node}: {message}")]
    Serialize { node: String, message: String },
}

/// Why one imported document did not become a node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseRejection {
    /// Document is not valid YAML
    #[error("document {index}: syntax error: {message}")]
    Syntax { index: usize, message: String },

    /// Document is a list or scalar
    #[error("document {index}: expected a mapping, got {found}")]
    NotAnObject { index: usize, found: &'static str },

    /// Discriminator field absent or not a string
    #[error("document {index}: missing string field '{field}'")]
    MissingKind { index: usize, field: String },

    /// Discriminator names an unregistered kind
    #[error("document {index}: unknown resource kind '{kind}'")]
    UnknownKind { index: usize, kind: String },
}

impl ParseRejection {
    /// Position of the document in the input, counting from 1
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Syntax { index, .. }
            | Self::NotAnObject { index, .. }
            | Self::MissingKind { index, .. }
            | Self::UnknownKind { index, .. } => *index,
        }
    }
}

/// Snapshot text or content that cannot be restored
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Not JSON at all
    #[error("snapshot is not valid JSON: {0}")]
    Syntax(String),

    /// Required top-level field absent
    #[error("snapshot is missing required field '{0}'")]
    MissingField(&'static str),

    /// Field present with the wrong shape
    #[error("snapshot field '{field}' is invalid: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// Nodes refused by the store
    #[error("snapshot rejected: {0}")]
    Rejected(#[from] ReplaceError),

    /// Encoder failure
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}

/// Durable storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored content is not a snapshot
    #[error("stored snapshot is unreadable: {0}")]
    Corrupt(#[from] SnapshotError),
}

impl StorageError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
