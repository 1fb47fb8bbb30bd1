//! Multi-document text codec
//!
//! Converts node records to a flat YAML stream and back:
//! - One document per record, in node insertion order
//! - Documents separated by a line that is exactly `---`
//! - Two-space indentation
//!
//! Import parses each document independently, so one bad document never
//! blocks the rest of the batch.

use rescanvas_graph::{GraphStore, Node, Position};
use rescanvas_model::{NodeId, Record};
use rescanvas_registry::ResourceRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::{CodecError, ParseRejection};

/// Line separating documents
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Default discriminator field
pub const DEFAULT_KIND_FIELD: &str = "kind";

/// Grid placement for imported nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub origin_x: f64,
    pub origin_y: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
    pub columns: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            origin_x: 100.0,
            origin_y: 100.0,
            column_spacing: 350.0,
            row_spacing: 250.0,
            columns: 3,
        }
    }
}

impl GridLayout {
    /// Position of the `index`-th cell, filling rows left to right
    #[must_use]
    pub fn position(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        #[allow(clippy::cast_precision_loss)]
        let (column, row) = ((index % columns) as f64, (index / columns) as f64);
        Position::new(
            self.origin_x + column * self.column_spacing,
            self.origin_y + row * self.row_spacing,
        )
    }
}

/// One document accepted for import
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: String,
    pub record: Record,
}

/// Parsed documents, before any node is created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    pub candidates: Vec<Candidate>,
    pub rejected: Vec<ParseRejection>,
}

/// Outcome of a text import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Created node ids, in document order
    pub created: Vec<NodeId>,
    /// Rejected documents with reasons
    pub rejected: Vec<ParseRejection>,
}

impl ImportReport {
    /// Number of rejected documents
    #[inline]
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Check if nothing was created
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

/// Text codec with a configurable discriminator and import layout
#[derive(Debug, Clone, PartialEq)]
pub struct TextCodec {
    kind_field: String,
    layout: GridLayout,
}

impl Default for TextCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCodec {
    /// Create codec using `kind` and the default grid
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind_field: DEFAULT_KIND_FIELD.to_string(),
            layout: GridLayout::default(),
        }
    }

    /// Set discriminator field
    #[inline]
    #[must_use]
    pub fn with_kind_field(mut self, field: impl Into<String>) -> Self {
        self.kind_field = field.into();
        self
    }

    /// Set import layout
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Discriminator field
    #[inline]
    #[must_use]
    pub fn kind_field(&self) -> &str {
        &self.kind_field
    }

    /// Parse text into candidates without touching any graph
    ///
    /// Empty and null documents are skipped and not counted. Each candidate
    /// record is the parsed document merged over the kind's default record.
    #[must_use]
    pub fn parse(&self, text: &str, registry: &ResourceRegistry) -> ParsedBatch {
        let mut batch = ParsedBatch::default();
        let documents = split_documents(text).into_iter().filter(|d| !is_blank(d));

        for (offset, document) in documents.enumerate() {
            let index = offset + 1;
            match self.parse_document(index, document, registry) {
                Ok(Some(candidate)) => batch.candidates.push(candidate),
                Ok(None) => {}
                Err(rejection) => {
                    warn!(%rejection, "document rejected");
                    batch.rejected.push(rejection);
                }
            }
        }
        batch
    }

    fn parse_document(
        &self,
        index: usize,
        document: &str,
        registry: &ResourceRegistry,
    ) -> Result<Option<Candidate>, ParseRejection> {
        let value: JsonValue = serde_yaml::from_str(document).map_err(|e| ParseRejection::Syntax {
            index,
            message: e.to_string(),
        })?;

        let map = match value {
            JsonValue::Null => return Ok(None),
            JsonValue::Object(map) => map,
            other => {
                return Err(ParseRejection::NotAnObject {
                    index,
                    found: json_type(&other),
                })
            }
        };

        let Some(kind) = map.get(&self.kind_field).and_then(JsonValue::as_str) else {
            return Err(ParseRejection::MissingKind {
                index,
                field: self.kind_field.clone(),
            });
        };
        let descriptor = registry.get(kind).map_err(|_| ParseRejection::UnknownKind {
            index,
            kind: kind.to_string(),
        })?;

        let kind = kind.to_string();
        let record = descriptor.default_record().merged_with(&Record::from(map));
        Ok(Some(Candidate { kind, record }))
    }

    /// Parse text and create one node per accepted document
    ///
    /// New nodes continue the import grid after the nodes already present.
    pub fn parse_and_build(&self, text: &str, store: &mut GraphStore) -> ImportReport {
        let batch = self.parse(text, store.registry());
        let start = store.node_count();
        let mut report = ImportReport {
            created: Vec::with_capacity(batch.candidates.len()),
            rejected: batch.rejected,
        };

        for (offset, candidate) in batch.candidates.into_iter().enumerate() {
            let position = self.layout.position(start + offset);
            match store.add_node_with_record(&candidate.kind, candidate.record, Some(position)) {
                Ok(node) => report.created.push(node.id.clone()),
                Err(e) => warn!(error = %e, "candidate refused by store"),
            }
        }

        info!(
            created = report.created.len(),
            rejected = report.rejected_count(),
            "text import finished"
        );
        report
    }
}

/// Serialize one record as a YAML document
///
/// # Errors
/// Returns `CodecError` if the emitter fails
pub fn serialize_node(node: &Node) -> Result<String, CodecError> {
    serde_yaml::to_string(&node.record).map_err(|e| CodecError::Serialize {
        node: node.id.to_string(),
        message: e.to_string(),
    })
}

/// Serialize every node, joined by the separator line
///
/// # Errors
/// Returns `CodecError` if any record fails to serialize
pub fn serialize_all<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Result<String, CodecError> {
    let documents = nodes
        .into_iter()
        .map(serialize_node)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(documents = documents.len(), "records serialized");
    Ok(documents.join(&format!("{DOCUMENT_SEPARATOR}\n")))
}

/// Serialize only the nodes whose ids are in `ids`, in node order
///
/// # Errors
/// Returns `CodecError` if any record fails to serialize
pub fn serialize_selection<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    ids: &[NodeId],
) -> Result<String, CodecError> {
    serialize_all(nodes.into_iter().filter(|n| ids.contains(&n.id)))
}

/// Split text on lines that are exactly the separator
///
/// Trailing whitespace (including `\r`) on the separator line is ignored.
#[must_use]
pub fn split_documents(text: &str) -> Vec<&str> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end() == DOCUMENT_SEPARATOR {
            documents.push(&text[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&text[start..]);
    documents
}

fn is_blank(document: &str) -> bool {
    document.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}
