//! Node records
//!
//! A [`Record`] is the structured data held by one node. It is always a
//! JSON object, even while transiently incomplete; arrays and scalars are
//! rejected at construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::path::FieldPath;

/// Object-valued node data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, JsonValue>);

impl Record {
    /// Create an empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create from a JSON value
    ///
    /// # Errors
    /// Returns error if the value is not an object
    pub fn from_value(value: JsonValue) -> Result<Self, RecordError> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(RecordError::NotAnObject(type_name(&other))),
        }
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Consume into a JSON value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }

    /// Clone into a JSON value
    #[inline]
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }

    /// Top-level string field, if present
    #[inline]
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    /// Get a value by field path
    ///
    /// Object segments are looked up by key; array segments must be
    /// decimal indices.
    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&JsonValue> {
        let mut segments = path.iter();
        let Some(first) = segments.next() else {
            return None;
        };
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = match current {
                JsonValue::Object(map) => map.get(segment)?,
                JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set a value by field path
    ///
    /// Missing intermediate objects are created. A scalar in the way is
    /// replaced by an object. An array index may address an existing item
    /// or append at exactly `len`.
    ///
    /// # Errors
    /// - `RecordError::RootWrite` for the root path with a non-object value
    /// - `RecordError::IndexOutOfRange` for an array index past the end
    pub fn set(&mut self, path: &FieldPath, value: JsonValue) -> Result<(), RecordError> {
        if path.is_empty() {
            *self = Self::from_value(value).map_err(|_| RecordError::RootWrite)?;
            return Ok(());
        }

        let mut root = JsonValue::Object(std::mem::take(&mut self.0));
        let result = set_in(&mut root, path.segments(), value, path);
        if let JsonValue::Object(map) = root {
            self.0 = map;
        }
        result
    }

    /// Remove a value by field path, returning it
    pub fn remove(&mut self, path: &FieldPath) -> Option<JsonValue> {
        let (last, parents) = path.segments().split_last()?;
        let mut current = &mut self.0;
        for segment in parents {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        current.remove(last)
    }

    /// Merge `overlay` over this record, returning a new record
    ///
    /// Objects are deep-merged; arrays and scalars from `overlay` replace
    /// the base value.
    #[must_use]
    pub fn merged_with(&self, overlay: &Self) -> Self {
        match merge_json(&self.to_value(), &overlay.to_value()) {
            JsonValue::Object(map) => Self(map),
            _ => overlay.clone(),
        }
    }
}

fn set_in(
    slot: &mut JsonValue,
    segments: &[String],
    value: JsonValue,
    full: &FieldPath,
) -> Result<(), RecordError> {
    let Some((head, rest)) = segments.split_first() else {
        *slot = value;
        return Ok(());
    };

    let needs_object = match slot {
        JsonValue::Object(_) => false,
        JsonValue::Array(_) => head.parse::<usize>().is_err(),
        _ => true,
    };
    if needs_object {
        *slot = JsonValue::Object(Map::new());
    }

    match slot {
        JsonValue::Object(map) => {
            let child = map.entry(head.clone()).or_insert(JsonValue::Null);
            set_in(child, rest, value, full)
        }
        JsonValue::Array(items) => {
            let index = head
                .parse::<usize>()
                .map_err(|_| RecordError::IndexOutOfRange(full.to_string()))?;
            if index == items.len() {
                items.push(JsonValue::Null);
            }
            match items.get_mut(index) {
                Some(item) => set_in(item, rest, value, full),
                None => Err(RecordError::IndexOutOfRange(full.to_string())),
            }
        }
        _ => Err(RecordError::IndexOutOfRange(full.to_string())),
    }
}

impl From<Map<String, JsonValue>> for Record {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl TryFrom<JsonValue> for Record {
    type Error = RecordError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Record error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("cannot replace the whole record with a non-object value")]
    RootWrite,

    #[error("array index out of range at '{0}'")]
    IndexOutOfRange(String),
}

/// Merge two JSON values (deep merge for objects, overlay wins otherwise)
#[must_use]
pub fn merge_json(base: &JsonValue, overlay: &JsonValue) -> JsonValue {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            let mut result = base_map.clone();
            for (key, overlay_val) in overlay_map {
                let merged = match result.get(key) {
                    Some(base_val) => merge_json(base_val, overlay_val),
                    None => overlay_val.clone(),
                };
                result.insert(key.clone(), merged);
            }
            JsonValue::Object(result)
        }
        (_, overlay_val) => overlay_val.clone(),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        Record::from_value(value).unwrap()
    }

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    #[test]
    fn record_rejects_non_objects() {
        assert_eq!(
            Record::from_value(json!([1, 2])),
            Err(RecordError::NotAnObject("array"))
        );
        assert_eq!(
            Record::from_value(json!("x")),
            Err(RecordError::NotAnObject("string"))
        );
    }

    #[test]
    fn record_deserialize_rejects_non_objects() {
        let result: Result<Record, _> = serde_json::from_str("[1]");
        assert!(result.is_err());
    }

    #[test]
    fn record_get_nested_and_indexed() {
        let r = record(json!({
            "metadata": {"name": "web"},
            "spec": {"ports": [{"port": 80}, {"port": 443}]}
        }));
        assert_eq!(r.get(&path("metadata.name")), Some(&json!("web")));
        assert_eq!(r.get(&path("spec.ports.1.port")), Some(&json!(443)));
        assert_eq!(r.get(&path("spec.ports.9.port")), None);
        assert_eq!(r.get(&path("metadata.name.deeper")), None);
        assert_eq!(r.get(&FieldPath::root()), None);
    }

    #[test]
    fn record_set_creates_intermediate_objects() {
        let mut r = record(json!({"kind": "Service"}));
        r.set(&path("spec.selector.app"), json!("web")).unwrap();
        assert_eq!(r.get(&path("spec.selector.app")), Some(&json!("web")));
        assert_eq!(r.str_field("kind"), Some("Service"));
    }

    #[test]
    fn record_set_replaces_scalar_in_the_way() {
        let mut r = record(json!({"spec": "oops"}));
        r.set(&path("spec.replicas"), json!(3)).unwrap();
        assert_eq!(r.to_value(), json!({"spec": {"replicas": 3}}));
    }

    #[test]
    fn record_set_root_requires_object() {
        let mut r = record(json!({"a": 1}));
        assert_eq!(r.set(&FieldPath::root(), json!(5)), Err(RecordError::RootWrite));
        r.set(&FieldPath::root(), json!({"b": 2})).unwrap();
        assert_eq!(r.to_value(), json!({"b": 2}));
    }

    #[test]
    fn record_set_indexes_arrays() {
        let mut r = record(json!({"spec": {"ports": [{"port": 80}]}}));
        r.set(&path("spec.ports.0.port"), json!(8080)).unwrap();
        r.set(&path("spec.ports.1.port"), json!(443)).unwrap();
        assert_eq!(
            r.get(&path("spec.ports")),
            Some(&json!([{"port": 8080}, {"port": 443}]))
        );
        assert_eq!(
            r.set(&path("spec.ports.5.port"), json!(1)),
            Err(RecordError::IndexOutOfRange("spec.ports.5.port".into()))
        );
    }

    #[test]
    fn record_remove() {
        let mut r = record(json!({"metadata": {"name": "web", "namespace": "prod"}}));
        assert_eq!(r.remove(&path("metadata.namespace")), Some(json!("prod")));
        assert_eq!(r.remove(&path("metadata.namespace")), None);
        assert_eq!(r.to_value(), json!({"metadata": {"name": "web"}}));
    }

    #[test]
    fn record_merge_overlay_wins() {
        let defaults = record(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": ""},
            "type": "Opaque",
            "data": {}
        }));
        let parsed = record(json!({
            "kind": "Secret",
            "metadata": {"name": "tls", "labels": {"a": "b"}},
            "data": {"key": "dmFsdWU="}
        }));
        let merged = defaults.merged_with(&parsed);
        assert_eq!(
            merged.to_value(),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {"name": "tls", "labels": {"a": "b"}},
                "type": "Opaque",
                "data": {"key": "dmFsdWU="}
            })
        );
    }

    #[test]
    fn record_merge_replaces_arrays() {
        let base = record(json!({"items": [1, 2]}));
        let overlay = record(json!({"items": [3]}));
        assert_eq!(base.merged_with(&overlay).to_value(), json!({"items": [3]}));
    }
}
