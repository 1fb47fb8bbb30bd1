//! Data-flow propagation
//!
//! [`Propagator`] copies source-field values to target fields along edges.
//! Writes are keyed by target field and debounced: a burst of source edits
//! produces one write carrying the value current at flush time.
//!
//! Time is passed in explicitly so the caller decides which clock drives the
//! quiet period.

use indexmap::IndexMap;
use rescanvas_model::{EdgeId, FieldPath, NodeId};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::event::GraphEvent;
use crate::store::GraphStore;

/// Default quiet period before a scheduled write is applied
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default bound on flush rounds in one pump
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// Scheduled write to one target field
#[derive(Debug, Clone)]
struct PendingWrite {
    edge: EdgeId,
    due: Instant,
}

/// Counters from one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Target fields written
    pub writes: usize,
    /// Writes skipped because the target already held the value
    pub unchanged: usize,
    /// Writes skipped because the source path did not resolve
    pub unresolved: usize,
    /// Flush rounds run
    pub rounds: usize,
    /// Due writes discarded after hitting the round limit
    pub truncated: usize,
}

/// Debounced field-to-field propagator
#[derive(Debug)]
pub struct Propagator {
    debounce: Duration,
    max_rounds: usize,
    pending: IndexMap<(NodeId, FieldPath), PendingWrite>,
}

impl Default for Propagator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Propagator {
    /// Create propagator with the given quiet period
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            max_rounds: DEFAULT_MAX_ROUNDS,
            pending: IndexMap::new(),
        }
    }

    /// Set round limit
    #[inline]
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Quiet period
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// React to graph events
    ///
    /// A new edge schedules itself; a record change schedules every edge
    /// leaving the changed node.
    pub fn observe(&mut self, store: &GraphStore, events: &[GraphEvent], now: Instant) {
        for event in events {
            match event {
                GraphEvent::Connected(id) => {
                    if let Some(edge) = store.edge(id) {
                        self.schedule(
                            edge.id.clone(),
                            edge.target_node_id.clone(),
                            edge.target_field_path.clone(),
                            now,
                        );
                    }
                }
                GraphEvent::NodeUpdated(node) => {
                    let edges: Vec<_> = store
                        .edges_from(node)
                        .map(|e| (e.id.clone(), e.target_node_id.clone(), e.target_field_path.clone()))
                        .collect();
                    for (edge, target, path) in edges {
                        self.schedule(edge, target, path, now);
                    }
                }
                GraphEvent::Disconnected(id) => self.pending.retain(|_, w| &w.edge != id),
                GraphEvent::NodesRemoved { edges, .. } => {
                    self.pending.retain(|_, w| !edges.contains(&w.edge));
                }
                GraphEvent::Replaced => self.pending.clear(),
                GraphEvent::NodeAdded(_) | GraphEvent::NodeMoved(_) => {}
            }
        }
    }

    fn schedule(&mut self, edge: EdgeId, target: NodeId, path: FieldPath, now: Instant) {
        let due = now + self.debounce;
        debug!(edge = %edge, target = %target, path = %path, "propagation scheduled");
        self.pending.insert((target, path), PendingWrite { edge, due });
    }

    /// Apply every write due at `now`
    ///
    /// Writes caused by propagation are observed in turn; with a zero quiet
    /// period a whole chain settles in one call.
    pub fn flush_due(&mut self, store: &mut GraphStore, now: Instant) -> PropagationReport {
        let mut report = PropagationReport::default();
        while self.has_due(now) {
            if report.rounds == self.max_rounds {
                let before = self.pending.len();
                self.pending.retain(|_, w| w.due > now);
                report.truncated = before - self.pending.len();
                warn!(
                    rounds = report.rounds,
                    discarded = report.truncated,
                    "propagation round limit reached"
                );
                break;
            }
            report.rounds += 1;

            let due: Vec<EdgeId> = {
                let mut due = Vec::new();
                self.pending.retain(|_, w| {
                    if w.due <= now {
                        due.push(w.edge.clone());
                        false
                    } else {
                        true
                    }
                });
                due
            };

            for edge in due {
                self.apply(store, &edge, &mut report);
            }
            let events = store.drain_events();
            self.observe(store, &events, now);
        }
        report
    }

    fn apply(&self, store: &mut GraphStore, edge: &EdgeId, report: &mut PropagationReport) {
        let Some(edge) = store.edge(edge).cloned() else {
            return;
        };
        let value = store
            .node(&edge.source_node_id)
            .and_then(|n| n.record.get(&edge.source_field_path))
            .cloned();
        let Some(value) = value else {
            debug!(edge = %edge.id, path = %edge.source_field_path, "source field unresolved");
            report.unresolved += 1;
            return;
        };

        match store.set_field(&edge.target_node_id, &edge.target_field_path, value) {
            Ok(true) => report.writes += 1,
            Ok(false) => report.unchanged += 1,
            Err(e) => warn!(edge = %edge.id, error = %e, "propagation write failed"),
        }
    }

    /// Schedule every edge for immediate propagation and flush
    ///
    /// Writes chained off the resync still wait for the quiet period.
    pub fn resync(&mut self, store: &mut GraphStore, now: Instant) -> PropagationReport {
        let edges: Vec<_> = store
            .edges()
            .map(|e| (e.id.clone(), e.target_node_id.clone(), e.target_field_path.clone()))
            .collect();
        for (edge, target, path) in edges {
            self.pending.insert((target, path), PendingWrite { edge, due: now });
        }
        self.flush_due(store, now)
    }

    fn has_due(&self, now: Instant) -> bool {
        self.pending.values().any(|w| w.due <= now)
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|w| w.due).min()
    }

    /// Number of scheduled writes
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is scheduled
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Position;
    use rescanvas_model::{Direction, FieldHandle};
    use rescanvas_registry::ResourceRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> GraphStore {
        GraphStore::new(Arc::new(ResourceRegistry::kubernetes().unwrap()))
    }

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    fn add(store: &mut GraphStore, kind: &str) -> NodeId {
        store.add_node(kind, Some(Position::default())).unwrap().id.clone()
    }

    fn connect(store: &mut GraphStore, from: &NodeId, src: &str, to: &NodeId, dst: &str) -> EdgeId {
        let s = FieldHandle::new(from.clone(), path(src), Direction::Source);
        let t = FieldHandle::new(to.clone(), path(dst), Direction::Target);
        store.connect_handles(s, t).unwrap().id.clone()
    }

    fn pump(propagator: &mut Propagator, store: &mut GraphStore, now: Instant) -> PropagationReport {
        let events = store.drain_events();
        propagator.observe(store, &events, now);
        propagator.flush_due(store, now)
    }

    fn value(store: &GraphStore, node: &NodeId, p: &str) -> Option<serde_json::Value> {
        store.node(node).unwrap().record.get(&path(p)).cloned()
    }

    #[test]
    fn connect_propagates_after_quiet_period() {
        let mut store = store();
        let mut propagator = Propagator::default();
        let dep = add(&mut store, "Deployment");
        let svc = add(&mut store, "Service");
        store.set_field(&dep, &path("metadata.name"), json!("web")).unwrap();
        connect(&mut store, &dep, "metadata.name", &svc, "spec.selector.app");

        let t0 = Instant::now();
        let report = pump(&mut propagator, &mut store, t0);
        assert_eq!(report.writes, 0);
        assert_eq!(value(&store, &svc, "spec.selector.app"), None);

        let report = propagator.flush_due(&mut store, t0 + DEFAULT_DEBOUNCE);
        assert_eq!(report.writes, 1);
        assert_eq!(value(&store, &svc, "spec.selector.app"), Some(json!("web")));
        assert!(propagator.is_idle());
    }

    #[test]
    fn burst_of_edits_produces_one_write_with_latest_value() {
        let mut store = store();
        let mut propagator = Propagator::default();
        let dep = add(&mut store, "Deployment");
        let svc = add(&mut store, "Service");
        connect(&mut store, &dep, "metadata.name", &svc, "metadata.name");

        let t0 = Instant::now();
        pump(&mut propagator, &mut store, t0);
        for (i, name) in ["w", "we", "web"].into_iter().enumerate() {
            store.set_field(&dep, &path("metadata.name"), json!(name)).unwrap();
            pump(&mut propagator, &mut store, t0 + Duration::from_millis(100 * i as u64));
        }
        assert_eq!(propagator.pending_len(), 1);

        let report = propagator.flush_due(&mut store, t0 + Duration::from_millis(200) + DEFAULT_DEBOUNCE);
        assert_eq!(report.writes, 1);
        assert_eq!(value(&store, &svc, "metadata.name"), Some(json!("web")));
    }

    #[test]
    fn zero_debounce_settles_chain_in_one_pump() {
        let mut store = store();
        let mut propagator = Propagator::new(Duration::ZERO);
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        let c = add(&mut store, "ConfigMap");
        connect(&mut store, &a, "data.x", &b, "data.y");
        connect(&mut store, &b, "data.y", &c, "data.z");
        store.set_field(&a, &path("data.x"), json!("v")).unwrap();

        let report = pump(&mut propagator, &mut store, Instant::now());
        assert_eq!(value(&store, &b, "data.y"), Some(json!("v")));
        assert_eq!(value(&store, &c, "data.z"), Some(json!("v")));
        assert_eq!(report.writes, 2);
        assert!(propagator.is_idle());
    }

    #[test]
    fn unresolved_source_writes_nothing() {
        let mut store = store();
        let mut propagator = Propagator::new(Duration::ZERO);
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        connect(&mut store, &a, "data.missing", &b, "data.y");

        let report = pump(&mut propagator, &mut store, Instant::now());
        assert_eq!(report.unresolved, 1);
        assert_eq!(value(&store, &b, "data.y"), None);
    }

    #[test]
    fn equal_target_is_not_rewritten() {
        let mut store = store();
        let mut propagator = Propagator::new(Duration::ZERO);
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        store.set_field(&a, &path("data.x"), json!("same")).unwrap();
        store.set_field(&b, &path("data.y"), json!("same")).unwrap();
        connect(&mut store, &a, "data.x", &b, "data.y");

        let report = pump(&mut propagator, &mut store, Instant::now());
        assert_eq!(report.writes, 0);
        assert_eq!(report.unchanged, 1);
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn two_node_cycle_converges() {
        let mut store = store();
        let mut propagator = Propagator::new(Duration::ZERO);
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        connect(&mut store, &a, "data.v", &b, "data.v");
        connect(&mut store, &b, "data.v", &a, "data.v");
        store.set_field(&a, &path("data.v"), json!("x")).unwrap();

        let report = pump(&mut propagator, &mut store, Instant::now());
        assert_eq!(report.truncated, 0);
        assert_eq!(value(&store, &a, "data.v"), Some(json!("x")));
        assert_eq!(value(&store, &b, "data.v"), Some(json!("x")));
        assert!(propagator.is_idle());
    }

    #[test]
    fn self_nesting_cycle_hits_round_limit() {
        let mut store = store();
        let mut propagator = Propagator::new(Duration::ZERO).with_max_rounds(8);
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        connect(&mut store, &a, "data", &b, "data.inner");
        connect(&mut store, &b, "data", &a, "data.inner");
        store.set_field(&a, &path("data.seed"), json!(1)).unwrap();

        let report = pump(&mut propagator, &mut store, Instant::now());
        assert_eq!(report.rounds, 8);
        assert!(report.truncated > 0);
        assert!(propagator.is_idle());
    }

    #[test]
    fn disconnect_cancels_pending_write() {
        let mut store = store();
        let mut propagator = Propagator::default();
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        store.set_field(&a, &path("data.x"), json!(1)).unwrap();
        let edge = connect(&mut store, &a, "data.x", &b, "data.x");

        let t0 = Instant::now();
        pump(&mut propagator, &mut store, t0);
        assert_eq!(propagator.pending_len(), 1);
        store.disconnect(&edge);
        pump(&mut propagator, &mut store, t0);
        assert!(propagator.is_idle());
    }

    #[test]
    fn resync_runs_every_edge() {
        let mut store = store();
        let mut propagator = Propagator::default();
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        store.set_field(&a, &path("data.x"), json!("r")).unwrap();
        connect(&mut store, &a, "data.x", &b, "data.x");
        store.drain_events();

        let report = propagator.resync(&mut store, Instant::now());
        assert_eq!(report.writes, 1);
        assert_eq!(value(&store, &b, "data.x"), Some(json!("r")));
    }

    #[test]
    fn next_due_tracks_earliest_deadline() {
        let mut store = store();
        let mut propagator = Propagator::default();
        let a = add(&mut store, "ConfigMap");
        let b = add(&mut store, "ConfigMap");
        connect(&mut store, &a, "data.x", &b, "data.x");
        assert_eq!(propagator.next_due(), None);

        let t0 = Instant::now();
        pump(&mut propagator, &mut store, t0);
        assert_eq!(propagator.next_due(), Some(t0 + DEFAULT_DEBOUNCE));
    }
}
