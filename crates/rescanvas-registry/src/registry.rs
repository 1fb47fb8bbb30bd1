//! Resource registry
//!
//! Provides [`ResourceRegistry`], the startup-time map from kind name to
//! [`ResourceKindDescriptor`]. Once built it is shared read-only.

use indexmap::IndexMap;
use rescanvas_model::Record;
use std::path::Path;
use tracing::{debug, info};

use crate::descriptor::{KindManifest, ResourceKindDescriptor, ValidationIssue};
use crate::error::{RegistryError, UnknownKindError};

/// Built-in Kubernetes manifests, in registration order
const KUBERNETES_MANIFESTS: [(&str, &str); 9] = [
    ("deployment.yaml", include_str!("../kinds/deployment.yaml")),
    ("statefulset.yaml", include_str!("../kinds/statefulset.yaml")),
    ("service.yaml", include_str!("../kinds/service.yaml")),
    ("daemonset.yaml", include_str!("../kinds/daemonset.yaml")),
    ("configmap.yaml", include_str!("../kinds/configmap.yaml")),
    ("job.yaml", include_str!("../kinds/job.yaml")),
    ("secret.yaml", include_str!("../kinds/secret.yaml")),
    ("cronjob.yaml", include_str!("../kinds/cronjob.yaml")),
    ("ingress.yaml", include_str!("../kinds/ingress.yaml")),
];

/// Map of registered resource kinds
///
/// Iteration follows registration order.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    kinds: IndexMap<String, ResourceKindDescriptor>,
}

impl ResourceRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: IndexMap::new(),
        }
    }

    /// Create registry with the built-in Kubernetes kinds
    ///
    /// # Errors
    /// Returns error if a built-in manifest fails to compile
    pub fn kubernetes() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, text) in KUBERNETES_MANIFESTS {
            let manifest: KindManifest = serde_yaml::from_str(text)
                .map_err(|e| RegistryError::manifest(name, e.to_string()))?;
            registry.register_manifest(manifest)?;
        }
        info!(kinds = registry.len(), "loaded built-in resource kinds");
        Ok(registry)
    }

    /// Load every `*.json`, `*.yaml` and `*.yml` manifest in `dir`
    ///
    /// Files are registered in file-name order.
    ///
    /// # Errors
    /// Returns error if the directory or a manifest cannot be read, or a
    /// manifest is invalid
    pub fn from_manifests(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|e| RegistryError::io_error(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| RegistryError::io_error(dir, e))?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| matches!(ext, "json" | "yaml" | "yml"));
            if supported && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let text =
                std::fs::read_to_string(&path).map_err(|e| RegistryError::io_error(&path, e))?;
            let manifest = parse_manifest(&path, &text)?;
            registry.register_manifest(manifest)?;
        }
        info!(dir = %dir.display(), kinds = registry.len(), "loaded resource kind manifests");
        Ok(registry)
    }

    /// Register a compiled descriptor
    ///
    /// # Errors
    /// Returns `RegistryError::DuplicateKind` if the kind is already present
    pub fn register(&mut self, descriptor: ResourceKindDescriptor) -> Result<(), RegistryError> {
        let kind = descriptor.kind().to_string();
        if self.kinds.contains_key(&kind) {
            return Err(RegistryError::DuplicateKind(kind));
        }
        debug!(kind = %kind, group = descriptor.group(), "registered resource kind");
        self.kinds.insert(kind, descriptor);
        Ok(())
    }

    /// Compile and register a manifest
    ///
    /// # Errors
    /// Returns error if the manifest is invalid or the kind is a duplicate
    pub fn register_manifest(&mut self, manifest: KindManifest) -> Result<(), RegistryError> {
        self.register(ResourceKindDescriptor::from_manifest(manifest)?)
    }

    /// Look up a kind
    ///
    /// # Errors
    /// Returns `UnknownKindError` if the kind is not registered
    pub fn get(&self, kind: &str) -> Result<&ResourceKindDescriptor, UnknownKindError> {
        self.kinds
            .get(kind)
            .ok_or_else(|| UnknownKindError(kind.to_string()))
    }

    /// Check if kind exists
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered kind names, in registration order
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }

    /// Palette groups, in order of first appearance, each listing its kinds
    #[must_use]
    pub fn groups(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for descriptor in self.kinds.values() {
            groups
                .entry(descriptor.group())
                .or_default()
                .push(descriptor.kind());
        }
        groups.into_iter().collect()
    }

    /// Validate a record against its kind's schema
    ///
    /// # Errors
    /// Returns `UnknownKindError` if the kind is not registered
    pub fn validate(&self, kind: &str, record: &Record) -> Result<Vec<ValidationIssue>, UnknownKindError> {
        Ok(self.get(kind)?.validate(record))
    }

    /// Get number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterate over descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceKindDescriptor> {
        self.kinds.values()
    }
}

fn parse_manifest(path: &Path, text: &str) -> Result<KindManifest, RegistryError> {
    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(text).map_err(|e| RegistryError::manifest(path, e.to_string()))
    } else {
        serde_yaml::from_str(text).map_err(|e| RegistryError::manifest(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kubernetes() -> ResourceRegistry {
        ResourceRegistry::kubernetes().unwrap()
    }

    #[test]
    fn registry_new_empty() {
        let registry = ResourceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn kubernetes_kinds_in_registration_order() {
        let registry = kubernetes();
        assert_eq!(
            registry.kinds(),
            vec![
                "Deployment",
                "StatefulSet",
                "Service",
                "DaemonSet",
                "ConfigMap",
                "Job",
                "Secret",
                "CronJob",
                "Ingress",
            ]
        );
    }

    #[test]
    fn kubernetes_palette_groups() {
        let registry = kubernetes();
        assert_eq!(
            registry.groups(),
            vec![
                ("Workloads", vec!["Deployment", "StatefulSet", "DaemonSet", "Job", "CronJob"]),
                ("Network", vec!["Service", "Ingress"]),
                ("Config", vec!["ConfigMap", "Secret"]),
            ]
        );
    }

    #[test]
    fn kubernetes_default_records() {
        let registry = kubernetes();
        assert_eq!(
            registry.get("Secret").unwrap().default_record().to_value(),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {"name": ""},
                "type": "Opaque",
                "data": {}
            })
        );
        assert_eq!(
            registry.get("Ingress").unwrap().default_record().to_value(),
            json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": {"name": ""}
            })
        );
        assert_eq!(registry.get("CronJob").unwrap().view(), "resource");
    }

    #[test]
    fn every_default_record_is_valid() {
        let registry = kubernetes();
        for descriptor in registry.iter() {
            let issues = descriptor.validate(descriptor.default_record());
            assert!(issues.is_empty(), "{}: {issues:?}", descriptor.kind());
        }
    }

    #[test]
    fn get_unknown_kind() {
        let registry = kubernetes();
        assert_eq!(
            registry.get("Pod").unwrap_err(),
            UnknownKindError("Pod".to_string())
        );
    }

    #[test]
    fn validate_reports_schema_violations() {
        let registry = kubernetes();
        let record = Record::from_value(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "web"},
            "spec": {"replicas": "three"}
        }))
        .unwrap();
        let issues = registry.validate("Deployment", &record).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].instance_path, "/spec/replicas");
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = kubernetes();
        let manifest = registry.get("Service").unwrap().manifest().clone();
        let err = registry.register_manifest(manifest).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKind(kind) if kind == "Service"));
    }

    #[test]
    fn from_manifests_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a-widget.json"),
            r#"{"kind": "Widget", "group": "Custom", "schema": {"type": "object"}, "defaultRecord": {"kind": "Widget"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b-gadget.yaml"),
            "kind: Gadget\nschema:\n  type: object\ndefaultRecord:\n  kind: Gadget\n  size: 1\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = ResourceRegistry::from_manifests(dir.path()).unwrap();
        assert_eq!(registry.kinds(), vec!["Widget", "Gadget"]);
        assert_eq!(registry.get("Gadget").unwrap().group(), "Other");
    }

    #[test]
    fn from_manifests_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "kind: [unclosed").unwrap();
        let err = ResourceRegistry::from_manifests(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Manifest { .. }));
    }
}
