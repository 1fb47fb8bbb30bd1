//! Generation ledger
//!
//! Records which nodes each bulk insertion created so the whole batch can
//! be reverted at once. Records are independent: reverting one never
//! touches another's nodes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rescanvas_model::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use ulid::Ulid;

use crate::error::LedgerError;
use crate::store::GraphStore;

/// Generation record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenerationId(Ulid);

impl GenerationId {
    /// Generate new unique id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen_{}", self.0)
    }
}

impl FromStr for GenerationId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("gen_").unwrap_or(s);
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|_| LedgerError::UnknownGeneration(s.to_string()))
    }
}

/// One bulk insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: GenerationId,
    pub source_description: String,
    pub node_ids: Vec<NodeId>,
    pub created_at: DateTime<Utc>,
}

/// Ordered set of generation records
#[derive(Debug, Default)]
pub struct GenerationLedger {
    records: IndexMap<GenerationId, GenerationRecord>,
}

impl GenerationLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch of created nodes
    pub fn record(
        &mut self,
        source_description: impl Into<String>,
        node_ids: Vec<NodeId>,
    ) -> GenerationRecord {
        let record = GenerationRecord {
            id: GenerationId::new(),
            source_description: source_description.into(),
            node_ids,
            created_at: Utc::now(),
        };
        info!(
            generation = %record.id,
            nodes = record.node_ids.len(),
            "generation recorded"
        );
        self.records.insert(record.id, record.clone());
        record
    }

    /// Remove exactly the recorded nodes, then drop the record
    ///
    /// Nodes already deleted by other means are skipped. Returns the ids
    /// actually removed.
    ///
    /// # Errors
    /// Returns `LedgerError::UnknownGeneration` if no such record exists
    pub fn revert(
        &mut self,
        id: GenerationId,
        store: &mut GraphStore,
    ) -> Result<Vec<NodeId>, LedgerError> {
        let record = self
            .records
            .shift_remove(&id)
            .ok_or_else(|| LedgerError::UnknownGeneration(id.to_string()))?;
        let removed = store.remove_nodes(&record.node_ids);
        info!(generation = %id, removed = removed.len(), "generation reverted");
        Ok(removed)
    }

    /// Get record by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: GenerationId) -> Option<&GenerationRecord> {
        self.records.get(&id)
    }

    /// Most recent record
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&GenerationRecord> {
        self.records.values().last()
    }

    /// Records, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &GenerationRecord> {
        self.records.values()
    }

    /// Get number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if ledger is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
