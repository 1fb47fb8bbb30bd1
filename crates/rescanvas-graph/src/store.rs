//! Resource graph store
//!
//! [`GraphStore`] exclusively owns the canonical node and edge collections.
//! Every other component mutates the graph through its API, and every
//! applied mutation is announced as a [`GraphEvent`].
//!
//! Mutations are total: a stale node id or an invalid connection is logged
//! and leaves the graph untouched.

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use rescanvas_model::{
    decode, Direction, EdgeId, FieldHandle, FieldPath, NodeId, Record, RecordError,
};
use rescanvas_registry::{ResourceRegistry, UnknownKindError};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ConnectError, ReplaceError};
use crate::event::GraphEvent;
use crate::node::{Edge, Node, Position};

/// Origin of the default placement cascade
const PLACEMENT_ORIGIN: Position = Position::new(100.0, 100.0);

/// Offset between consecutive default placements
const PLACEMENT_STEP: f64 = 40.0;

/// Default placements before the cascade wraps
const PLACEMENT_WRAP: u64 = 10;

/// Largest numeric node id a restored graph may carry
pub const MAX_NODE_ID: u64 = u64::MAX >> 1;

/// Outcome of a whole-graph replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    /// Nodes now in the graph
    pub nodes: usize,
    /// Edges now in the graph
    pub edges: usize,
    /// Edges dropped for a missing endpoint or a repeated id
    pub dropped_edges: usize,
}

/// Canonical node/edge graph
#[derive(Debug)]
pub struct GraphStore {
    registry: Arc<ResourceRegistry>,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    next_id: u64,
    last_edge_millis: i64,
    placements: u64,
    events: Vec<GraphEvent>,
}

impl GraphStore {
    /// Create empty store backed by `registry`
    #[must_use]
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            registry,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            next_id: 1,
            last_edge_millis: 0,
            placements: 0,
            events: Vec::new(),
        }
    }

    /// Registry backing this store
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Add a node of `kind` with a copy of the kind's default record
    ///
    /// # Errors
    /// Returns `UnknownKindError` if the kind is not registered
    pub fn add_node(
        &mut self,
        kind: &str,
        position: Option<Position>,
    ) -> Result<&Node, UnknownKindError> {
        let record = self.registry.get(kind)?.default_record().clone();
        Ok(self.insert_node(kind, record, position))
    }

    /// Add a node of `kind` with an explicit record
    ///
    /// # Errors
    /// Returns `UnknownKindError` if the kind is not registered
    pub fn add_node_with_record(
        &mut self,
        kind: &str,
        record: Record,
        position: Option<Position>,
    ) -> Result<&Node, UnknownKindError> {
        self.registry.get(kind)?;
        Ok(self.insert_node(kind, record, position))
    }

    fn insert_node(&mut self, kind: &str, record: Record, position: Option<Position>) -> &Node {
        let id = self.allocate_id();
        let position = position.unwrap_or_else(|| self.next_placement());
        debug!(node = %id, kind, "node added");

        self.events.push(GraphEvent::NodeAdded(id.clone()));
        let node = Node {
            id: id.clone(),
            kind: kind.to_string(),
            position,
            record,
        };
        self.nodes.entry(id).or_insert(node)
    }

    fn allocate_id(&mut self) -> NodeId {
        // Restored ids are capped at MAX_NODE_ID, so the counter cannot wrap.
        loop {
            let id = NodeId::from_number(self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn next_placement(&mut self) -> Position {
        #[allow(clippy::cast_precision_loss)]
        let step = (self.placements % PLACEMENT_WRAP) as f64 * PLACEMENT_STEP;
        self.placements += 1;
        Position::new(PLACEMENT_ORIGIN.x + step, PLACEMENT_ORIGIN.y + step)
    }

    /// Numeric id the next created node will receive
    #[inline]
    #[must_use]
    pub fn next_node_id(&self) -> u64 {
        self.next_id
    }

    /// Replace a node's record wholesale
    ///
    /// Returns `false` for a stale id or an unchanged record.
    pub fn replace_record(&mut self, id: &NodeId, record: Record) -> bool {
        self.update_record(id, |current| *current = record)
    }

    /// Patch a node's record in place
    ///
    /// Returns `false` for a stale id or when the patch changed nothing.
    pub fn update_record(&mut self, id: &NodeId, patch: impl FnOnce(&mut Record)) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(node = %id, "record update for unknown node ignored");
            return false;
        };
        let before = node.record.clone();
        patch(&mut node.record);
        if node.record == before {
            return false;
        }
        debug!(node = %id, "record updated");
        self.events.push(GraphEvent::NodeUpdated(id.clone()));
        true
    }

    /// Overwrite a single field
    ///
    /// Returns `Ok(false)` for a stale id or an unchanged value.
    ///
    /// # Errors
    /// Returns `RecordError` if the path cannot be written
    pub fn set_field(
        &mut self,
        id: &NodeId,
        path: &FieldPath,
        value: JsonValue,
    ) -> Result<bool, RecordError> {
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(node = %id, path = %path, "field write for unknown node ignored");
            return Ok(false);
        };
        if node.record.get(path) == Some(&value) {
            return Ok(false);
        }
        node.record.set(path, value)?;
        debug!(node = %id, path = %path, "field set");
        self.events.push(GraphEvent::NodeUpdated(id.clone()));
        Ok(true)
    }

    /// Remove a single field
    ///
    /// Returns `false` for a stale id or a missing field.
    pub fn remove_field(&mut self, id: &NodeId, path: &FieldPath) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(node = %id, path = %path, "field removal for unknown node ignored");
            return false;
        };
        if node.record.remove(path).is_none() {
            return false;
        }
        self.events.push(GraphEvent::NodeUpdated(id.clone()));
        true
    }

    /// Move a node on the canvas
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(node = %id, "move of unknown node ignored");
            return false;
        };
        if node.position == position {
            return false;
        }
        node.position = position;
        self.events.push(GraphEvent::NodeMoved(id.clone()));
        true
    }

    /// Remove nodes and every edge touching them
    ///
    /// Unknown ids are skipped. Returns the ids actually removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for id in ids {
            if self.nodes.shift_remove(id).is_some() {
                removed.push(id.clone());
            } else {
                debug!(node = %id, "removal of unknown node skipped");
            }
        }
        if removed.is_empty() {
            return removed;
        }

        let gone: IndexSet<&NodeId> = removed.iter().collect();
        let mut cascaded = Vec::new();
        self.edges.retain(|edge_id, edge| {
            let dangling =
                gone.contains(&edge.source_node_id) || gone.contains(&edge.target_node_id);
            if dangling {
                cascaded.push(edge_id.clone());
            }
            !dangling
        });

        debug!(nodes = removed.len(), edges = cascaded.len(), "nodes removed");
        self.events.push(GraphEvent::NodesRemoved {
            nodes: removed.clone(),
            edges: cascaded,
        });
        removed
    }

    /// Connect a source handle to a target handle
    ///
    /// # Errors
    /// Returns `ConnectError` if the connection is refused; the graph is
    /// left unchanged
    pub fn connect(&mut self, source: &str, target: &str) -> Result<&Edge, ConnectError> {
        let result = decode(source)
            .map_err(ConnectError::from)
            .and_then(|s| Ok((s, decode(target)?)));
        let (source, target) = match result {
            Ok(handles) => handles,
            Err(e) => {
                warn!(source, target, error = %e, "connection refused");
                return Err(e);
            }
        };
        self.connect_handles(source, target)
    }

    /// Connect two decoded handles
    ///
    /// # Errors
    /// Returns `ConnectError` if the connection is refused
    pub fn connect_handles(
        &mut self,
        source: FieldHandle,
        target: FieldHandle,
    ) -> Result<&Edge, ConnectError> {
        let millis = Utc::now().timestamp_millis();
        if let Err(e) = check_connection(&self.nodes, &self.edges, &source, &target) {
            warn!(source = %source, target = %target, error = %e, "connection refused");
            return Err(e);
        }

        let millis = millis.max(self.last_edge_millis + 1);
        self.last_edge_millis = millis;
        let id = EdgeId::new(format!("{}-{}-{millis}", source.node_id, target.node_id));
        let edge = Edge {
            id: id.clone(),
            label: Edge::label_for(&source.path, &target.path),
            source_node_id: source.node_id,
            source_field_path: source.path,
            target_node_id: target.node_id,
            target_field_path: target.path,
        };

        debug!(edge = %id, label = %edge.label, "connected");
        self.events.push(GraphEvent::Connected(id.clone()));
        Ok(self.edges.entry(id).or_insert(edge))
    }


    /// Remove an edge
    pub fn disconnect(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(id);
        match &edge {
            Some(_) => {
                debug!(edge = %id, "disconnected");
                self.events.push(GraphEvent::Disconnected(id.clone()));
            }
            None => warn!(edge = %id, "disconnect of unknown edge ignored"),
        }
        edge
    }

    /// Replace the whole graph
    ///
    /// Nodes are checked first: an unknown kind, a repeated id or a numeric
    /// id above [`MAX_NODE_ID`] refuses the replacement and leaves the graph
    /// untouched. Edges go through the same checks as [`Self::connect`];
    /// refused edges and repeated edge ids are dropped and counted.
    ///
    /// # Errors
    /// Returns `ReplaceError` if any node is unacceptable
    pub fn replace_all(
        &mut self,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<ReplaceReport, ReplaceError> {
        let mut by_id = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            if !self.registry.contains(&node.kind) {
                return Err(ReplaceError::UnknownKind {
                    node: node.id,
                    kind: node.kind,
                });
            }
            if by_id.contains_key(&node.id) {
                return Err(ReplaceError::DuplicateNode(node.id));
            }
            if node.id.numeric().is_some_and(|n| n > MAX_NODE_ID) {
                return Err(ReplaceError::IdOutOfRange(node.id));
            }
            by_id.insert(node.id.clone(), node);
        }

        let mut kept = IndexMap::with_capacity(edges.len());
        let mut dropped_edges = 0;
        for edge in edges {
            if kept.contains_key(&edge.id) {
                warn!(edge = %edge.id, "dropping repeated edge id");
                dropped_edges += 1;
                continue;
            }
            let checked = check_connection(&by_id, &kept, &edge.source_handle(), &edge.target_handle());
            if let Err(e) = checked {
                warn!(edge = %edge.id, error = %e, "dropping invalid edge");
                dropped_edges += 1;
                continue;
            }
            kept.insert(edge.id.clone(), edge);
        }

        let max_numeric = by_id.keys().filter_map(NodeId::numeric).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_numeric + 1);
        self.nodes = by_id;
        self.edges = kept;
        self.events.push(GraphEvent::Replaced);

        Ok(ReplaceReport {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            dropped_edges,
        })
    }

    /// Get node by id
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get edge by id
    #[inline]
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges whose source is `node`
    pub fn edges_from<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| &e.source_node_id == node)
    }

    /// Get number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Checks shared by new connections and restored edges
fn check_connection(
    nodes: &IndexMap<NodeId, Node>,
    edges: &IndexMap<EdgeId, Edge>,
    source: &FieldHandle,
    target: &FieldHandle,
) -> Result<(), ConnectError> {
    for (handle, expected) in [(source, Direction::Source), (target, Direction::Target)] {
        if handle.direction != expected {
            return Err(ConnectError::WrongDirection {
                expected: expected.as_str(),
                handle: handle.to_string(),
            });
        }
        if !nodes.contains_key(&handle.node_id) {
            return Err(ConnectError::MissingNode(handle.node_id.clone()));
        }
        if handle.path.is_empty() {
            return Err(ConnectError::RootPath);
        }
    }

    if source.node_id == target.node_id && source.path.overlaps(&target.path) {
        return Err(ConnectError::SelfOverlap {
            node: source.node_id.clone(),
            source_path: source.path.clone(),
            target_path: target.path.clone(),
        });
    }

    let existing = edges.values().find(|e| {
        e.source_node_id == source.node_id
            && e.source_field_path == source.path
            && e.target_node_id == target.node_id
            && e.target_field_path == target.path
    });
    match existing {
        Some(edge) => Err(ConnectError::Duplicate(edge.id.clone())),
        None => Ok(()),
    }
}
