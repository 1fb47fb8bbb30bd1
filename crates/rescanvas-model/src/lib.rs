//! Resource graph data model
//!
//! Value types shared by every other crate in the workspace.
//!
//! # Core Concepts
//!
//! - [`FieldPath`]: Escaped, dotted addressing of a field inside a record
//! - [`Record`]: Object-valued node data with path get/set and deep merge
//! - [`FieldHandle`]: `(node, path, direction)` packed into one string
//! - [`NodeId`] / [`EdgeId`]: Graph identifiers
//!
//! # Example
//!
//! ```rust
//! use rescanvas_model::{decode, Direction, FieldHandle, FieldPath, NodeId};
//!
//! let path: FieldPath = "metadata.name".parse().unwrap();
//! let handle = FieldHandle::source(NodeId::new("1"), path);
//! let text = handle.encode().unwrap();
//! assert_eq!(text, "source:1:metadata.name");
//! assert_eq!(decode(&text).unwrap().direction, Direction::Source);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod handle;
mod id;
mod path;
mod record;

pub use handle::{decode, encode, Direction, FieldHandle, HandleError, HANDLE_DELIMITER};
pub use id::{EdgeId, NodeId};
pub use path::{FieldPath, PathError, ESCAPE, SEGMENT_SEPARATOR};
pub use record::{merge_json, Record, RecordError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handle_path_resolves_against_record() {
        let record = Record::from_value(json!({
            "metadata": {"labels": {"app.kubernetes.io/name": "web"}}
        }))
        .unwrap();
        let path = FieldPath::new(vec![
            "metadata".into(),
            "labels".into(),
            "app.kubernetes.io/name".into(),
        ])
        .unwrap();

        let text = FieldHandle::source(NodeId::from_number(4), path).encode().unwrap();
        let handle = decode(&text).unwrap();

        assert_eq!(record.get(&handle.path), Some(&json!("web")));
    }
}
