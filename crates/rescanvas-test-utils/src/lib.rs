//! Testing utilities for the rescanvas workspace
//!
//! Shared fixtures, sessions and a scripted AI collaborator.

#![allow(missing_docs)]

use parking_lot::Mutex;
use rescanvas_core::{
    EditorSession, EngineConfig, GenerationError, GenerationRequest, TextGenerator,
};
use rescanvas_graph::GraphStore;
use rescanvas_interchange::MemorySnapshotStore;
use rescanvas_model::{FieldPath, NodeId};
use rescanvas_registry::ResourceRegistry;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const DEPLOYMENT_AND_SERVICE: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
---
apiVersion: v1
kind: Service
metadata:
  name: web-svc
";

/// Five documents, two of them with unregistered kinds
pub const MIXED_BATCH: &str = "\
kind: ConfigMap
metadata:
  name: settings
---
kind: Pod
metadata:
  name: stray
---
kind: Job
metadata:
  name: migrate
---
kind: CronTab
metadata:
  name: custom
---
kind: Secret
metadata:
  name: token
";

pub fn registry() -> Arc<ResourceRegistry> {
    Arc::new(ResourceRegistry::kubernetes().unwrap())
}

pub fn store() -> GraphStore {
    GraphStore::new(registry())
}

pub fn path(text: &str) -> FieldPath {
    text.parse().unwrap()
}

pub fn session_with_debounce(debounce: Duration) -> EditorSession {
    let config = EngineConfig::new().with_debounce(debounce);
    EditorSession::new(registry(), config, Arc::new(MemorySnapshotStore::new()))
}

pub fn setup_test_session() -> EditorSession {
    session_with_debounce(Duration::ZERO)
}

pub fn field(session: &EditorSession, id: &NodeId, at: &str) -> Option<JsonValue> {
    session.node(id)?.record.get(&path(at)).cloned()
}

pub fn name_of(session: &EditorSession, id: &NodeId) -> Option<JsonValue> {
    field(session, id, "metadata.name")
}

/// Collaborator that replays scripted replies and records requests
#[derive(Debug, Default)]
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    unavailable: bool,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        let fake = Self::new();
        fake.push_reply(Ok(reply.into()));
        fake
    }

    pub fn failing(message: &str) -> Self {
        let fake = Self::new();
        fake.push_reply(Err(GenerationError::classify(message)));
        fake
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn push_reply(&self, reply: Result<String, GenerationError>) {
        self.replies.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }
}
