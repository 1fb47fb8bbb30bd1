//! Graph change notifications
//!
//! Every applied store mutation appends one [`GraphEvent`]. Observers such as
//! the propagator drain the queue after each mutation turn.

use rescanvas_model::{EdgeId, NodeId};

/// An applied graph mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// Node created
    NodeAdded(NodeId),

    /// Node record changed
    NodeUpdated(NodeId),

    /// Node position changed
    NodeMoved(NodeId),

    /// Nodes deleted, with the edges removed by cascade
    NodesRemoved {
        nodes: Vec<NodeId>,
        edges: Vec<EdgeId>,
    },

    /// Edge created
    Connected(EdgeId),

    /// Edge deleted explicitly
    Disconnected(EdgeId),

    /// Whole graph replaced (restore, import)
    Replaced,
}

impl GraphEvent {
    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeAdded(_) => "node_added",
            Self::NodeUpdated(_) => "node_updated",
            Self::NodeMoved(_) => "node_moved",
            Self::NodesRemoved { .. } => "nodes_removed",
            Self::Connected(_) => "connected",
            Self::Disconnected(_) => "disconnected",
            Self::Replaced => "replaced",
        }
    }
}
