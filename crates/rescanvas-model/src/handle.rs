//! Field handle codec
//!
//! A field handle names one field of one node, scoped by direction, as a
//! single string the canvas layer can carry around:
//!
//! ```text
//! handle    = direction ":" node-id ":" path
//! direction = "source" | "target"
//! ```
//!
//! `node-id` and every path segment escape `\`, `.` and `:` with `\`. The
//! node id is read only from its fixed position between the first two
//! unescaped colons, so a field whose name equals the node id is never
//! mangled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::id::NodeId;
use crate::path::{escape_into, split_unescaped, unescape, FieldPath, PathError};

/// Handle delimiter between direction, node id and path
pub const HANDLE_DELIMITER: char = ':';

/// Which side of a connection a handle sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Data flows out of this field
    Source,
    /// Data flows into this field
    Target,
}

impl Direction {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "target" => Ok(Self::Target),
            other => Err(HandleError::UnknownDirection(other.to_string())),
        }
    }
}

/// Decoded field handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    /// Owning node
    pub node_id: NodeId,
    /// Field within the node record
    pub path: FieldPath,
    /// Source or target side
    pub direction: Direction,
}

impl FieldHandle {
    /// Create a handle
    #[inline]
    #[must_use]
    pub fn new(node_id: NodeId, path: FieldPath, direction: Direction) -> Self {
        Self {
            node_id,
            path,
            direction,
        }
    }

    /// Source-side handle
    #[inline]
    #[must_use]
    pub fn source(node_id: NodeId, path: FieldPath) -> Self {
        Self::new(node_id, path, Direction::Source)
    }

    /// Target-side handle
    #[inline]
    #[must_use]
    pub fn target(node_id: NodeId, path: FieldPath) -> Self {
        Self::new(node_id, path, Direction::Target)
    }

    /// Encode into the handle string
    ///
    /// # Errors
    /// Returns `HandleError::EmptyNodeId` for an empty node id
    pub fn encode(&self) -> Result<String, HandleError> {
        encode(&self.node_id, &self.path, self.direction)
    }
}

/// Encode `(node_id, path, direction)` into a handle string
///
/// # Errors
/// Returns `HandleError::EmptyNodeId` for an empty node id
pub fn encode(node_id: &NodeId, path: &FieldPath, direction: Direction) -> Result<String, HandleError> {
    if node_id.as_str().is_empty() {
        return Err(HandleError::EmptyNodeId);
    }
    let mut out = String::with_capacity(direction.as_str().len() + node_id.as_str().len() + 16);
    out.push_str(direction.as_str());
    out.push(HANDLE_DELIMITER);
    escape_into(&mut out, node_id.as_str());
    out.push(HANDLE_DELIMITER);
    out.push_str(&path.to_string());
    Ok(out)
}

/// Decode a handle string
///
/// # Errors
/// Returns `HandleError` if the string does not follow the handle grammar
pub fn decode(handle: &str) -> Result<FieldHandle, HandleError> {
    let parts = split_unescaped(handle, HANDLE_DELIMITER).map_err(HandleError::Path)?;
    let [direction, node, path] = parts.as_slice() else {
        return Err(HandleError::WrongArity(parts.len()));
    };

    let direction: Direction = direction.parse()?;
    let node = unescape(node).map_err(HandleError::Path)?;
    if node.is_empty() {
        return Err(HandleError::EmptyNodeId);
    }
    let path: FieldPath = path.parse().map_err(HandleError::Path)?;

    Ok(FieldHandle::new(NodeId::new(node), path, direction))
}

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for FieldHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Malformed handle errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("handle must have 3 ':'-separated parts, found {0}")]
    WrongArity(usize),

    #[error("unknown handle direction: '{0}'")]
    UnknownDirection(String),

    #[error("handle has an empty node id")]
    EmptyNodeId,

    #[error("invalid handle component: {0}")]
    Path(#[source] PathError),
}
