//! Error types for graph mutations

use rescanvas_model::{EdgeId, FieldPath, HandleError, NodeId};

/// Reasons a connection is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Handle string does not decode
    #[error("malformed handle: {0}")]
    MalformedHandle(#[from] HandleError),

    /// Source handle is a target or vice versa
    #[error("expected a {expected} handle, got '{handle}'")]
    WrongDirection {
        expected: &'static str,
        handle: String,
    },

    /// Endpoint node does not exist
    #[error("node not found: {0}")]
    MissingNode(NodeId),

    /// Whole-record connections are not supported
    #[error("cannot connect the record root")]
    RootPath,

    /// Source and target overlap on the same node
    #[error("'{source_path}' and '{target_path}' overlap on node {node}")]
    SelfOverlap {
        node: NodeId,
        source_path: FieldPath,
        target_path: FieldPath,
    },

    /// Identical connection already exists
    #[error("connection already exists: {0}")]
    Duplicate(EdgeId),
}

/// Reasons a whole-graph replacement is refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplaceError {
    /// Node of a kind the registry does not know
    #[error("node {node} has unknown kind '{kind}'")]
    UnknownKind { node: NodeId, kind: String },

    /// Two nodes share an id
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Numeric id too large to allocate past
    #[error("node id out of range: {0}")]
    IdOutOfRange(NodeId),
}

/// Generation ledger errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No record with this id
    #[error("unknown generation: {0}")]
    UnknownGeneration(String),
}
