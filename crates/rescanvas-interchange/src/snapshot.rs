//! Graph snapshots
//!
//! A [`GraphSnapshot`] captures the whole graph plus the viewport. It is
//! produced on demand and consumed wholesale: a snapshot that fails any
//! check is never partially applied.

use chrono::{DateTime, NaiveDate, Utc};
use rescanvas_graph::{Edge, GraphStore, Node, ReplaceReport, Viewport};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{info, warn};

use crate::error::SnapshotError;

/// Default export file name prefix
pub const DEFAULT_EXPORT_PREFIX: &str = "resource-graph";

/// Serializable copy of the whole graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    /// Edges discarded while decoding because they did not parse
    #[serde(skip)]
    pub dropped_edges: usize,
}

impl GraphSnapshot {
    /// Capture the current graph
    #[must_use]
    pub fn capture(store: &GraphStore, viewport: Viewport) -> Self {
        Self {
            nodes: store.nodes().cloned().collect(),
            edges: store.edges().cloned().collect(),
            viewport,
            last_saved: None,
            dropped_edges: 0,
        }
    }

    /// Stamp with a save time
    #[inline]
    #[must_use]
    pub fn saved_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_saved = Some(at);
        self
    }

    /// Replace the store's graph with this snapshot
    ///
    /// # Errors
    /// Returns `SnapshotError::Rejected` if a node has an unknown kind or a
    /// repeated id; the store is left untouched
    pub fn restore_into(self, store: &mut GraphStore) -> Result<ReplaceReport, SnapshotError> {
        let mut report = store.replace_all(self.nodes, self.edges)?;
        report.dropped_edges += self.dropped_edges;
        info!(
            nodes = report.nodes,
            edges = report.edges,
            dropped_edges = report.dropped_edges,
            "snapshot restored"
        );
        Ok(report)
    }

    /// Encode as pretty-printed JSON
    ///
    /// # Errors
    /// Returns `SnapshotError::Encode` if serialization fails
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Decode from JSON, checking required fields one by one
    ///
    /// # Errors
    /// - `SnapshotError::Syntax` if the text is not a JSON object
    /// - `SnapshotError::MissingField` naming the first absent field
    /// - `SnapshotError::InvalidField` if a field has the wrong shape
    ///
    /// Edges are decoded one by one; an edge that does not parse is dropped
    /// and counted in `dropped_edges` instead of refusing the snapshot.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| SnapshotError::Syntax(e.to_string()))?;
        let JsonValue::Object(mut map) = value else {
            return Err(SnapshotError::Syntax("expected a JSON object".to_string()));
        };

        let nodes = take_field(&mut map, "nodes")?;
        let raw_edges: Vec<JsonValue> = take_field(&mut map, "edges")?;
        let viewport = take_field(&mut map, "viewport")?;
        let last_saved = match map.remove("lastSaved") {
            None | Some(JsonValue::Null) => None,
            Some(value) => Some(parse_field("lastSaved", value)?),
        };

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut dropped_edges = 0;
        for raw in raw_edges {
            match serde_json::from_value::<Edge>(raw) {
                Ok(edge) => edges.push(edge),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable edge");
                    dropped_edges += 1;
                }
            }
        }

        Ok(Self {
            nodes,
            edges,
            viewport,
            last_saved,
            dropped_edges,
        })
    }
}

fn take_field<T: DeserializeOwned>(
    map: &mut Map<String, JsonValue>,
    field: &'static str,
) -> Result<T, SnapshotError> {
    let value = map.remove(field).ok_or(SnapshotError::MissingField(field))?;
    parse_field(field, value)
}

fn parse_field<T: DeserializeOwned>(field: &'static str, value: JsonValue) -> Result<T, SnapshotError> {
    serde_json::from_value(value).map_err(|e| SnapshotError::InvalidField {
        field,
        message: e.to_string(),
    })
}

/// Export file name for a date: `<prefix>-YYYY-MM-DD.json`
#[must_use]
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}-{}.json", date.format("%Y-%m-%d"))
}
