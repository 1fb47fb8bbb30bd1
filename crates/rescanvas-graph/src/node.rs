//! Nodes, edges and canvas geometry

use rescanvas_model::{EdgeId, FieldHandle, FieldPath, NodeId, Record};
use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create position
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Canvas pan and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// One resource on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: String,
    pub position: Position,
    pub record: Record,
}

/// Field-to-field data-flow connection
///
/// Data flows from `source_field_path` on the source node to
/// `target_field_path` on the target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub source_field_path: FieldPath,
    pub target_node_id: NodeId,
    pub target_field_path: FieldPath,
    #[serde(default)]
    pub label: String,
}

impl Edge {
    /// Handle of the source field
    #[must_use]
    pub fn source_handle(&self) -> FieldHandle {
        FieldHandle::source(self.source_node_id.clone(), self.source_field_path.clone())
    }

    /// Handle of the target field
    #[must_use]
    pub fn target_handle(&self) -> FieldHandle {
        FieldHandle::target(self.target_node_id.clone(), self.target_field_path.clone())
    }

    /// Check if the edge touches `node`
    #[inline]
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source_node_id == node || &self.target_node_id == node
    }

    /// Display label for a connection between two paths
    #[must_use]
    pub fn label_for(source: &FieldPath, target: &FieldPath) -> String {
        format!("{} → {}", source.display_label(), target.display_label())
    }
}
