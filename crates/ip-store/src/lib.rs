//! The knowledge store collaborator contract (spec §6.3) plus an
//! in-memory implementation, since SQLite persistence is explicitly out
//! of scope (spec §1) but the Intelligence Plane needs something to read
//! artifacts and append to the audit log through while under test.

use async_trait::async_trait;
use ip_types::{ArtifactEvent, AuditLogEntry};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),
}

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn get_artifact(&self, artifact_id: &str) -> Option<ArtifactEvent>;

    async fn get_artifact_content(&self, agent_id: &str, artifact_id: &str) -> Option<String>;

    async fn list_artifacts(&self) -> Vec<ArtifactEvent>;

    async fn append_audit_log(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: &str,
        caller_agent_id: Option<String>,
        tick: u64,
        details: serde_json::Value,
    );

    async fn list_audit_log(
        &self,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) -> Vec<AuditLogEntry>;

    /// Record an artifact write. Not part of the read-only core contract
    /// in §6.3, but required by any concrete store — the core's ingestion
    /// path that produces `ArtifactEvent`s is out of scope (spec §1), so
    /// this stands in for it in the in-memory implementation.
    async fn record_artifact(&self, event: ArtifactEvent, content: Option<String>);
}

#[derive(Default)]
struct Inner {
    artifacts: HashMap<String, ArtifactEvent>,
    content: HashMap<(String, String), String>,
    audit_log: Vec<AuditLogEntry>,
}

/// In-memory stand-in for the SQLite-backed knowledge store. State is
/// lost on process exit; the analyzers replay the audit log to
/// reconstruct their views, matching spec §9's persistence model.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    inner: RwLock<Inner>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn get_artifact(&self, artifact_id: &str) -> Option<ArtifactEvent> {
        self.inner.read().artifacts.get(artifact_id).cloned()
    }

    async fn get_artifact_content(&self, agent_id: &str, artifact_id: &str) -> Option<String> {
        self.inner
            .read()
            .content
            .get(&(agent_id.to_string(), artifact_id.to_string()))
            .cloned()
    }

    async fn list_artifacts(&self) -> Vec<ArtifactEvent> {
        self.inner.read().artifacts.values().cloned().collect()
    }

    async fn append_audit_log(
        &self,
        entity_type: &str,
        entity_id: &str,
        action: &str,
        caller_agent_id: Option<String>,
        tick: u64,
        details: serde_json::Value,
    ) {
        let entry = AuditLogEntry::new(entity_type, entity_id, action, caller_agent_id, tick, details);
        self.inner.write().audit_log.push(entry);
    }

    async fn list_audit_log(
        &self,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) -> Vec<AuditLogEntry> {
        self.inner
            .read()
            .audit_log
            .iter()
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t))
            .filter(|e| entity_id.is_none_or(|i| e.entity_id == i))
            .cloned()
            .collect()
    }

    async fn record_artifact(&self, event: ArtifactEvent, content: Option<String>) {
        let mut inner = self.inner.write();
        if let Some(content) = content {
            inner
                .content
                .insert((event.agent_id.clone(), event.artifact_id.clone()), content);
        }
        inner.artifacts.insert(event.artifact_id.clone(), event);
    }
}
