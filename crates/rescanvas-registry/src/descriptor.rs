//! Resource kind descriptors
//!
//! A [`KindManifest`] is the serializable description of one kind, as found
//! in manifest files. A [`ResourceKindDescriptor`] is the registered,
//! immutable form with its schema compiled for validation.

use jsonschema::JSONSchema;
use rescanvas_model::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::error::RegistryError;

/// Node view used when a manifest does not name one
pub const DEFAULT_VIEW: &str = "resource";

/// Palette group used when a manifest does not name one
pub const DEFAULT_GROUP: &str = "Other";

/// Serializable kind description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindManifest {
    /// Discriminator value, e.g. `Deployment`
    pub kind: String,

    /// Palette group, e.g. `Workloads`
    #[serde(default = "default_group")]
    pub group: String,

    /// Node view binding name
    #[serde(default = "default_view")]
    pub view: String,

    /// JSON Schema for records of this kind
    pub schema: JsonValue,

    /// Opaque form-rendering hints
    #[serde(default)]
    pub ui_hints: JsonValue,

    /// Record a new node starts from
    pub default_record: Record,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

fn default_view() -> String {
    DEFAULT_VIEW.to_string()
}

/// Registered resource kind
#[derive(Clone)]
pub struct ResourceKindDescriptor {
    manifest: KindManifest,
    validator: Arc<JSONSchema>,
}

impl ResourceKindDescriptor {
    /// Compile a manifest into a descriptor
    ///
    /// # Errors
    /// - `RegistryError::InvalidSchema` if the schema does not compile
    /// - `RegistryError::KindMismatch` if the default record names another kind
    pub fn from_manifest(manifest: KindManifest) -> Result<Self, RegistryError> {
        if let Some(found) = manifest.default_record.str_field("kind") {
            if found != manifest.kind {
                return Err(RegistryError::KindMismatch {
                    kind: manifest.kind.clone(),
                    found: found.to_string(),
                });
            }
        }

        let validator =
            JSONSchema::compile(&manifest.schema).map_err(|e| RegistryError::InvalidSchema {
                kind: manifest.kind.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            manifest,
            validator: Arc::new(validator),
        })
    }

    /// Kind name
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.manifest.kind
    }

    /// Palette group
    #[inline]
    #[must_use]
    pub fn group(&self) -> &str {
        &self.manifest.group
    }

    /// Node view binding
    #[inline]
    #[must_use]
    pub fn view(&self) -> &str {
        &self.manifest.view
    }

    /// Raw JSON Schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &JsonValue {
        &self.manifest.schema
    }

    /// Form-rendering hints
    #[inline]
    #[must_use]
    pub fn ui_hints(&self) -> &JsonValue {
        &self.manifest.ui_hints
    }

    /// Default record (borrowed; clone before mutating)
    #[inline]
    #[must_use]
    pub fn default_record(&self) -> &Record {
        &self.manifest.default_record
    }

    /// Underlying manifest
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &KindManifest {
        &self.manifest
    }

    /// Validate a record against this kind's schema
    ///
    /// Returns every issue found; an empty vector means the record is valid.
    #[must_use]
    pub fn validate(&self, record: &Record) -> Vec<ValidationIssue> {
        let instance = record.to_value();
        let issues = match self.validator.validate(&instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| ValidationIssue {
                    instance_path: e.instance_path.to_string(),
                    message: e.to_string(),
                })
                .collect(),
        };
        issues
    }
}

impl fmt::Debug for ResourceKindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKindDescriptor")
            .field("kind", &self.manifest.kind)
            .field("group", &self.manifest.group)
            .field("view", &self.manifest.view)
            .finish_non_exhaustive()
    }
}

/// One schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// JSON pointer to the offending value (empty for the root)
    pub instance_path: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}
