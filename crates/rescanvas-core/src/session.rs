//! Editor session
//!
//! [`EditorSession`] owns one graph and everything wired around it: the
//! propagator, the generation ledger, snapshot storage and the optional AI
//! collaborator. All graph state sits behind one lock that is never held
//! across an `.await`, so each mutation (and the propagation it triggers)
//! completes within one turn.
//!
//! Every mutation drains the store's events into the propagator and flushes
//! whatever is due. Debounced writes land on a later [`EditorSession::tick`]
//! or [`EditorSession::settle`].

use chrono::Utc;
use parking_lot::Mutex;
use rescanvas_graph::{
    Edge, GenerationId, GenerationLedger, GenerationRecord, GraphStore, Node, Position,
    PropagationReport, Propagator, ReplaceReport, Viewport,
};
use rescanvas_interchange::{
    clean_generated_text, serialize_all, serialize_selection, write_export, FileSnapshotStore,
    GraphSnapshot, ImportReport, ParseRejection, SnapshotStore, TextCodec,
};
use rescanvas_model::{EdgeId, FieldPath, NodeId, Record};
use rescanvas_registry::ResourceRegistry;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assistant::{
    GenerationError, GenerationErrorKind, GenerationRequest, PromptBuilder, TextGenerator,
};
use crate::commands::{Command, CommandRegistry};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::notification::{Notification, NotificationLevel};
use crate::telemetry;

/// Change requested by the form collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum FormChange {
    /// Replace the whole record
    Replace(Record),
    /// Overwrite one field
    #[allow(missing_docs)]
    Set { path: FieldPath, value: JsonValue },
    /// Delete one field
    #[allow(missing_docs)]
    Remove { path: FieldPath },
}

/// Form edit addressed to one node
#[derive(Debug, Clone, PartialEq)]
pub struct FormPatch {
    /// Edited node
    pub node_id: NodeId,
    pub change: FormChange,
}

impl FormPatch {
    /// Set one field
    pub fn set(node_id: NodeId, path: FieldPath, value: JsonValue) -> Self {
        Self {
            node_id,
            change: FormChange::Set { path, value },
        }
    }

    /// Replace the record
    pub fn replace(node_id: NodeId, record: Record) -> Self {
        Self {
            node_id,
            change: FormChange::Replace(record),
        }
    }

    /// Remove one field
    pub fn remove(node_id: NodeId, path: FieldPath) -> Self {
        Self {
            node_id,
            change: FormChange::Remove { path },
        }
    }
}

/// Result of a text or AI import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Ledger entry covering the created nodes
    pub generation: GenerationId,
    /// Created node ids, in document order
    pub created: Vec<NodeId>,
    /// Rejected documents
    pub rejected: Vec<ParseRejection>,
}

/// Graph state guarded by the session lock
#[derive(Debug)]
struct SessionState {
    store: GraphStore,
    propagator: Propagator,
    ledger: GenerationLedger,
    viewport: Viewport,
    notifications: Vec<Notification>,
}

impl SessionState {
    /// Feed pending events to the propagator and apply due writes
    fn pump(&mut self, now: std::time::Instant) -> PropagationReport {
        let events = self.store.drain_events();
        self.propagator.observe(&self.store, &events, now);
        let report = self.propagator.flush_due(&mut self.store, now);
        if report.truncated > 0 {
            self.notifications.push(Notification::warning(format!(
                "Propagation stopped after {} rounds; {} updates discarded",
                report.rounds, report.truncated
            )));
        }
        report
    }

    fn notify(&mut self, notification: Notification) {
        debug!(level = %notification.level, message = %notification.message, "notification");
        self.notifications.push(notification);
    }
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

/// One editable resource graph with its collaborators
pub struct EditorSession {
    config: EngineConfig,
    codec: TextCodec,
    state: Mutex<SessionState>,
    storage: Arc<dyn SnapshotStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    prompt: PromptBuilder,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Create session over `registry` persisting to `storage`
    #[must_use]
    pub fn new(
        registry: Arc<ResourceRegistry>,
        config: EngineConfig,
        storage: Arc<dyn SnapshotStore>,
    ) -> Self {
        let codec = TextCodec::new()
            .with_kind_field(config.kind_field.clone())
            .with_layout(config.layout);
        let propagator =
            Propagator::new(config.debounce()).with_max_rounds(config.max_propagation_rounds);
        let prompt = PromptBuilder::from_registry(&registry);
        Self {
            config,
            codec,
            state: Mutex::new(SessionState {
                store: GraphStore::new(registry),
                propagator,
                ledger: GenerationLedger::new(),
                viewport: Viewport::default(),
                notifications: Vec::new(),
            }),
            storage,
            generator: None,
            prompt,
        }
    }

    /// Build a session from configuration alone
    ///
    /// Installs logging with the configured filter, then uses the manifest
    /// directory when configured, the built-in kinds otherwise, and file
    /// storage at `storage_path`.
    ///
    /// # Errors
    /// Returns `EngineError::Registry` if the kinds cannot be loaded
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        telemetry::init_from(&config);
        let registry = match &config.registry_dir {
            Some(dir) => ResourceRegistry::from_manifests(dir)?,
            None => ResourceRegistry::kubernetes()?,
        };
        let storage = Arc::new(FileSnapshotStore::new(config.storage_path.clone()));
        Ok(Self::new(Arc::new(registry), config, storage))
    }

    /// With AI collaborator
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// With prompt builder
    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Kind registry
    #[must_use]
    pub fn registry(&self) -> Arc<ResourceRegistry> {
        Arc::clone(self.state.lock().store.registry())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.state.lock();
        let out = f(&mut state);
        state.pump(now());
        out
    }

    // Graph mutations

    /// Add a node of `kind` with its default record
    ///
    /// # Errors
    /// Returns `EngineError::UnknownKind` if the kind is not registered
    pub fn add_node(&self, kind: &str, position: Option<Position>) -> Result<NodeId, EngineError> {
        self.mutate(|state| -> Result<NodeId, EngineError> {
            let result = state.store.add_node(kind, position).map(|n| n.id.clone());
            if let Err(e) = &result {
                state.notify(Notification::error(e.to_string()));
            }
            Ok(result?)
        })
    }

    /// Apply a form edit
    ///
    /// Returns `Ok(false)` for a stale node or a change that altered nothing.
    ///
    /// # Errors
    /// Returns `EngineError::Record` if a field path cannot be written
    pub fn apply_form_patch(&self, patch: FormPatch) -> Result<bool, EngineError> {
        self.mutate(|state| -> Result<bool, EngineError> {
            let changed = match patch.change {
                FormChange::Replace(record) => state.store.replace_record(&patch.node_id, record),
                FormChange::Set { path, value } => {
                    state.store.set_field(&patch.node_id, &path, value)?
                }
                FormChange::Remove { path } => state.store.remove_field(&patch.node_id, &path),
            };
            Ok(changed)
        })
    }

    /// Move a node
    pub fn move_node(&self, id: &NodeId, position: Position) -> bool {
        self.mutate(|state| state.store.move_node(id, position))
    }

    /// Connect two encoded handles
    ///
    /// # Errors
    /// Returns `EngineError::Connect` if the connection is refused
    pub fn connect(&self, source: &str, target: &str) -> Result<EdgeId, EngineError> {
        self.mutate(|state| -> Result<EdgeId, EngineError> {
            Ok(state.store.connect(source, target)?.id.clone())
        })
    }

    /// Delete an edge
    pub fn disconnect(&self, id: &EdgeId) -> bool {
        self.mutate(|state| state.store.disconnect(id).is_some())
    }

    /// Delete nodes and their edges
    pub fn remove_nodes(&self, ids: &[NodeId]) -> Vec<NodeId> {
        self.mutate(|state| state.store.remove_nodes(ids))
    }

    /// Update the canvas viewport
    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.lock().viewport = viewport;
    }

    // Reads

    /// Current viewport
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    /// Copy of one node
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.state.lock().store.node(id).cloned()
    }

    /// Copy of every node, in insertion order
    #[must_use]
    pub fn nodes(&self) -> Vec<Node> {
        self.state.lock().store.nodes().cloned().collect()
    }

    /// Copy of every edge, in insertion order
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        self.state.lock().store.edges().cloned().collect()
    }

    /// Run a read-only closure against the store
    pub fn with_store<T>(&self, f: impl FnOnce(&GraphStore) -> T) -> T {
        f(&self.state.lock().store)
    }

    /// Number of scheduled propagation writes
    #[must_use]
    pub fn pending_propagations(&self) -> usize {
        self.state.lock().propagator.pending_len()
    }

    /// Take queued notifications
    pub fn drain_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.lock().notifications)
    }

    // Propagation

    /// Apply every propagation write due now
    pub fn tick(&self) -> PropagationReport {
        self.state.lock().pump(now())
    }

    /// Wait out the debounce until no write is pending
    pub async fn settle(&self) -> PropagationReport {
        let mut total = PropagationReport::default();
        loop {
            let due = self.state.lock().propagator.next_due();
            let Some(due) = due else {
                return total;
            };
            tokio::time::sleep_until(tokio::time::Instant::from_std(due)).await;
            let report = self.tick();
            total.writes += report.writes;
            total.unchanged += report.unchanged;
            total.unresolved += report.unresolved;
            total.rounds += report.rounds;
            total.truncated += report.truncated;
        }
    }

    /// Push every connected source value to its target now
    ///
    /// Restores keep target fields exactly as saved; call this to bring
    /// them back in line with their sources.
    pub fn resync(&self) -> PropagationReport {
        let mut state = self.state.lock();
        let now = now();
        state.pump(now);
        let SessionState {
            store, propagator, ..
        } = &mut *state;
        propagator.resync(store, now)
    }

    // Text

    /// Whole graph in the text format
    ///
    /// # Errors
    /// Returns `EngineError::Codec` if a record cannot be serialized
    pub fn preview_text(&self) -> Result<String, EngineError> {
        Ok(serialize_all(self.state.lock().store.nodes())?)
    }

    /// Selected nodes in the text format
    ///
    /// # Errors
    /// Returns `EngineError::Codec` if a record cannot be serialized
    pub fn selection_text(&self, ids: &[NodeId]) -> Result<String, EngineError> {
        Ok(serialize_selection(self.state.lock().store.nodes(), ids)?)
    }

    /// Import text as a new generation batch
    ///
    /// # Errors
    /// Returns `EngineError::EmptyImport` if no document produced a node
    pub fn import_text(&self, text: &str, description: &str) -> Result<ImportOutcome, EngineError> {
        self.mutate(|state| {
            let ImportReport { created, rejected } =
                self.codec.parse_and_build(text, &mut state.store);

            if created.is_empty() {
                let err = EngineError::EmptyImport {
                    rejected: rejected.len(),
                };
                state.notify(Notification::error(err.to_string()));
                return Err(err);
            }

            let record = state.ledger.record(description, created.clone());
            let mut message = format!("Imported {} resources", created.len());
            let level = if rejected.is_empty() {
                NotificationLevel::Success
            } else {
                message.push_str(&format!(", {} rejected", rejected.len()));
                NotificationLevel::Warning
            };
            state.notify(Notification::new(level, message));

            Ok(ImportOutcome {
                generation: record.id,
                created,
                rejected,
            })
        })
    }

    // AI

    /// Ask the collaborator for resources and import the reply
    ///
    /// Selected nodes, if any, are sent as context.
    ///
    /// # Errors
    /// - `EngineError::Generation` if no collaborator is available or it fails
    /// - `EngineError::EmptyImport` if the reply contains no usable document
    pub async fn generate(
        &self,
        prompt: &str,
        context: &[NodeId],
    ) -> Result<ImportOutcome, EngineError> {
        let result = self.request_generation(prompt, context).await;
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "generation failed");
                self.state.lock().notify(Notification::error(e.to_string()));
                return Err(e);
            }
        };
        self.import_text(&text, &format!("AI: {prompt}"))
    }

    async fn request_generation(
        &self,
        prompt: &str,
        context: &[NodeId],
    ) -> Result<String, EngineError> {
        let generator = self
            .generator
            .as_ref()
            .filter(|g| g.is_available())
            .ok_or_else(GenerationError::not_configured)?;

        let mut request = GenerationRequest::new(prompt);
        if !context.is_empty() {
            request = request.with_context(self.selection_text(context)?);
        }
        let full = GenerationRequest::new(self.prompt.build(&request));

        info!(context = context.len(), "requesting generation");
        let reply = generator.generate(&full).await?;
        let cleaned = clean_generated_text(&reply);
        if cleaned.trim().is_empty() {
            return Err(GenerationError::new(
                GenerationErrorKind::Other,
                "Empty response from AI model",
            )
            .into());
        }
        Ok(cleaned)
    }

    /// Generation batches, oldest first
    #[must_use]
    pub fn generations(&self) -> Vec<GenerationRecord> {
        self.state.lock().ledger.iter().cloned().collect()
    }

    /// Remove every node of a generation batch
    ///
    /// # Errors
    /// Returns `EngineError::Ledger` for an unknown batch
    pub fn revert_generation(&self, id: GenerationId) -> Result<Vec<NodeId>, EngineError> {
        self.mutate(|state| -> Result<Vec<NodeId>, EngineError> {
            let removed = state.ledger.revert(id, &mut state.store)?;
            state.notify(Notification::success(format!(
                "Reverted {} resources",
                removed.len()
            )));
            Ok(removed)
        })
    }

    /// Revert the most recent generation batch, if any
    ///
    /// # Errors
    /// Returns `EngineError::Ledger` if the batch disappeared concurrently
    pub fn revert_latest_generation(&self) -> Result<Option<Vec<NodeId>>, EngineError> {
        let latest = self.state.lock().ledger.latest().map(|r| r.id);
        latest.map(|id| self.revert_generation(id)).transpose()
    }

    // Snapshots

    /// Capture the graph and viewport
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.lock();
        GraphSnapshot::capture(&state.store, state.viewport)
    }

    fn apply_snapshot(&self, snapshot: GraphSnapshot) -> Result<ReplaceReport, EngineError> {
        let mut state = self.state.lock();
        let viewport = snapshot.viewport;
        let report = match snapshot.restore_into(&mut state.store) {
            Ok(report) => report,
            Err(e) => {
                state.notify(Notification::error(format!("Restore failed: {e}")));
                return Err(e.into());
            }
        };
        state.viewport = viewport;
        state.pump(now());

        let mut message = format!("Restored {} resources", report.nodes);
        if report.dropped_edges > 0 {
            message.push_str(&format!(", dropped {} connections", report.dropped_edges));
        }
        state.notify(Notification::success(message));
        Ok(report)
    }

    /// Write the snapshot to durable storage
    ///
    /// # Errors
    /// Returns `EngineError::Storage` if the write fails
    pub async fn save(&self) -> Result<(), EngineError> {
        let snapshot = self.snapshot().saved_at(Utc::now());
        let result = self.storage.save(&snapshot).await;
        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                info!(nodes = snapshot.nodes.len(), "session saved");
                state.notify(Notification::success("Saved"));
                Ok(())
            }
            Err(e) => {
                state.notify(Notification::error(format!("Save failed: {e}")));
                Err(e.into())
            }
        }
    }

    /// Replace the graph with the stored snapshot
    ///
    /// # Errors
    /// - `EngineError::NothingSaved` if storage is empty
    /// - `EngineError::Storage` or `EngineError::Snapshot` if it is unusable
    pub async fn restore(&self) -> Result<ReplaceReport, EngineError> {
        let loaded = self.storage.load().await;
        match loaded {
            Ok(Some(snapshot)) => self.apply_snapshot(snapshot),
            Ok(None) => {
                self.state
                    .lock()
                    .notify(Notification::warning("No saved graph to restore"));
                Err(EngineError::NothingSaved)
            }
            Err(e) => {
                self.state
                    .lock()
                    .notify(Notification::error(format!("Restore failed: {e}")));
                Err(e.into())
            }
        }
    }

    /// Snapshot as pretty JSON
    ///
    /// # Errors
    /// Returns `EngineError::Snapshot` if encoding fails
    pub fn export_snapshot(&self) -> Result<String, EngineError> {
        Ok(self.snapshot().saved_at(Utc::now()).to_json()?)
    }

    /// Replace the graph with a JSON snapshot
    ///
    /// # Errors
    /// Returns `EngineError::Snapshot` if the text is not a usable snapshot;
    /// nothing is applied
    pub fn import_snapshot(&self, text: &str) -> Result<ReplaceReport, EngineError> {
        match GraphSnapshot::from_json(text) {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => {
                self.state
                    .lock()
                    .notify(Notification::error(format!("Import failed: {e}")));
                Err(e.into())
            }
        }
    }

    /// Write a dated export file into `dir`
    ///
    /// # Errors
    /// Returns `EngineError::Storage` if the write fails
    pub async fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, EngineError> {
        let now = Utc::now();
        let snapshot = self.snapshot().saved_at(now);
        let path = write_export(dir, &self.config.export_prefix, now.date_naive(), &snapshot).await?;
        self.state.lock().notify(Notification::success(format!(
            "Exported to {}",
            path.display()
        )));
        Ok(path)
    }

    // Commands

    /// Register save, restore, export and revert commands
    ///
    /// Export writes into `export_dir`.
    pub fn install_default_commands(
        self: &Arc<Self>,
        commands: &mut CommandRegistry,
        export_dir: impl Into<PathBuf>,
    ) {
        let session = Arc::clone(self);
        commands.register(
            Command::new("save", "Save", move || {
                let session = Arc::clone(&session);
                async move {
                    session.save().await?;
                    anyhow::Ok(())
                }
            })
            .with_icon("save")
            .with_shortcut('S'),
        );

        let session = Arc::clone(self);
        commands.register(
            Command::new("restore", "Restore", move || {
                let session = Arc::clone(&session);
                async move {
                    session.restore().await?;
                    anyhow::Ok(())
                }
            })
            .with_icon("folder-open")
            .with_shortcut('R'),
        );

        let session = Arc::clone(self);
        let dir = export_dir.into();
        commands.register(
            Command::new("export", "Export", move || {
                let session = Arc::clone(&session);
                let dir = dir.clone();
                async move {
                    session.export_to_dir(dir).await?;
                    anyhow::Ok(())
                }
            })
            .with_icon("download")
            .with_shortcut('E'),
        );

        let session = Arc::clone(self);
        let guard_session = Arc::clone(self);
        commands.register(
            Command::new("revert-generation", "Revert last generation", move || {
                let session = Arc::clone(&session);
                async move {
                    session.revert_latest_generation()?;
                    anyhow::Ok(())
                }
            })
            .with_icon("undo")
            .with_shortcut('U')
            .with_guard(move || !guard_session.state.lock().ledger.is_empty()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rescanvas_interchange::MemorySnapshotStore;
    use serde_json::json;
    use std::time::Duration;

    fn session(debounce: Duration) -> EditorSession {
        let registry = Arc::new(ResourceRegistry::kubernetes().unwrap());
        let config = EngineConfig::new().with_debounce(debounce);
        EditorSession::new(registry, config, Arc::new(MemorySnapshotStore::new()))
    }

    fn path(text: &str) -> FieldPath {
        text.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_write_waits_for_quiet_period() {
        let session = session(Duration::from_millis(300));
        let dep = session.add_node("Deployment", None).unwrap();
        let svc = session.add_node("Service", None).unwrap();
        session
            .connect(
                &format!("source:{dep}:metadata.name"),
                &format!("target:{svc}:spec.selector.app"),
            )
            .unwrap();
        session
            .apply_form_patch(FormPatch::set(dep.clone(), path("metadata.name"), json!("web")))
            .unwrap();

        let read = |id: &NodeId| {
            session
                .node(id)
                .and_then(|n| n.record.get(&path("spec.selector.app")).cloned())
        };
        assert_ne!(read(&svc), Some(json!("web")));
        assert_eq!(session.pending_propagations(), 1);

        tokio::time::advance(Duration::from_millis(299)).await;
        session.tick();
        assert_ne!(read(&svc), Some(json!("web")));

        let report = session.settle().await;
        assert_eq!(report.writes, 1);
        assert_eq!(read(&svc), Some(json!("web")));
        assert_eq!(session.pending_propagations(), 0);
    }

    #[test]
    fn unknown_kind_is_refused_and_reported() {
        let session = session(Duration::ZERO);
        let err = session.add_node("Pod", None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownKind(_)));
        assert!(session.nodes().is_empty());
        let notes = session.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
    }

    #[test]
    fn stale_form_patch_is_ignored() {
        let session = session(Duration::ZERO);
        let changed = session
            .apply_form_patch(FormPatch::set(NodeId::new("42"), path("metadata.name"), json!("x")))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn form_patch_variants() {
        let session = session(Duration::ZERO);
        let id = session.add_node("ConfigMap", None).unwrap();

        assert!(session
            .apply_form_patch(FormPatch::set(id.clone(), path("data.mode"), json!("fast")))
            .unwrap());
        assert!(session
            .apply_form_patch(FormPatch::remove(id.clone(), path("data.mode")))
            .unwrap());
        assert!(!session
            .apply_form_patch(FormPatch::remove(id.clone(), path("data.mode")))
            .unwrap());

        let mut record = Record::new();
        record.set(&path("kind"), json!("ConfigMap")).unwrap();
        assert!(session
            .apply_form_patch(FormPatch::replace(id.clone(), record.clone()))
            .unwrap());
        assert_eq!(session.node(&id).unwrap().record, record);
    }

    #[test]
    fn empty_import_is_an_error_with_notification() {
        let session = session(Duration::ZERO);
        let err = session.import_text("kind: Pod\n", "paste").unwrap_err();
        assert!(matches!(err, EngineError::EmptyImport { rejected: 1 }));
        assert!(session.generations().is_empty());
        assert_eq!(
            session.drain_notifications()[0].message,
            "no resources imported (1 documents rejected)"
        );
    }

    #[test]
    fn import_then_revert() {
        let session = session(Duration::ZERO);
        session.add_node("Secret", None).unwrap();
        let outcome = session
            .import_text("kind: Job\n---\nkind: Service\n", "paste")
            .unwrap();
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(session.nodes().len(), 3);

        let removed = session.revert_generation(outcome.generation).unwrap();
        assert_eq!(removed, outcome.created);
        assert_eq!(session.nodes().len(), 1);
        assert!(matches!(
            session.revert_generation(outcome.generation).unwrap_err(),
            EngineError::Ledger(_)
        ));
    }

    #[tokio::test]
    async fn save_and_restore_through_storage() {
        let session = session(Duration::ZERO);
        assert!(matches!(
            session.restore().await.unwrap_err(),
            EngineError::NothingSaved
        ));

        let id = session.add_node("Ingress", None).unwrap();
        session.set_viewport(Viewport {
            x: 5.0,
            y: 6.0,
            zoom: 2.0,
        });
        session.save().await.unwrap();

        session.remove_nodes(&[id.clone()]);
        session.set_viewport(Viewport::default());
        let report = session.restore().await.unwrap();
        assert_eq!(report.nodes, 1);
        assert!(session.node(&id).is_some());
        assert_eq!(session.viewport().zoom, 2.0);
    }

    #[test]
    fn resync_pushes_sources_on_demand() {
        let session = session(Duration::from_millis(300));
        let a = session.add_node("ConfigMap", None).unwrap();
        let b = session.add_node("ConfigMap", None).unwrap();
        session
            .apply_form_patch(FormPatch::set(a.clone(), path("data.x"), json!("src")))
            .unwrap();
        session
            .connect(&format!("source:{a}:data.x"), &format!("target:{b}:data.y"))
            .unwrap();
        let snapshot = session.export_snapshot().unwrap();

        let restored = EditorSession::new(
            session.registry(),
            EngineConfig::new(),
            Arc::new(MemorySnapshotStore::new()),
        );
        restored.import_snapshot(&snapshot).unwrap();
        let read = |id: &NodeId| {
            restored
                .node(id)
                .and_then(|n| n.record.get(&path("data.y")).cloned())
        };
        assert_eq!(read(&b), None);

        let report = restored.resync();
        assert_eq!(report.writes, 1);
        assert_eq!(read(&b), Some(json!("src")));
    }

    #[test]
    fn invalid_snapshot_leaves_graph_alone() {
        let session = session(Duration::ZERO);
        session.add_node("Job", None).unwrap();
        let err = session.import_snapshot(r#"{"nodes": [], "edges": []}"#).unwrap_err();
        assert!(matches!(err, EngineError::Snapshot(_)));
        assert_eq!(session.nodes().len(), 1);
    }

    #[tokio::test]
    async fn generate_without_collaborator_is_not_configured() {
        let session = session(Duration::ZERO);
        let err = session.generate("a cache", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Generation(GenerationError {
                kind: GenerationErrorKind::NotConfigured,
                ..
            })
        ));
        assert_eq!(
            session.drain_notifications()[0].level,
            NotificationLevel::Error
        );
    }
}
