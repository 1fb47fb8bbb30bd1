//! Error types for the resource registry

use std::path::PathBuf;

/// Lookup of a kind that was never registered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind: '{0}'")]
pub struct UnknownKindError(pub String);

/// Errors while building a registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Kind registered twice
    #[error("kind '{0}' is already registered")]
    DuplicateKind(String),

    /// Schema does not compile
    #[error("invalid schema for kind '{kind}': {message}")]
    InvalidSchema { kind: String, message: String },

    /// Default record declares a different kind
    #[error("default record for '{kind}' declares kind '{found}'")]
    KindMismatch { kind: String, found: String },

    /// Manifest file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest file is not a valid descriptor
    #[error("invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}

impl RegistryError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create manifest error for path
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }
}
