//! Layer 0 — structural conflict detection (synchronous, deterministic;
//! spec §4.5).

use crate::state::{ArtifactMeta, State};
use ip_types::{ArtifactEvent, CoherenceCategory, CoherenceEvent, Severity};
use std::collections::BTreeSet;

/// Processes one artifact event: records it as changed, rebinds its
/// content-hash entry, and checks for a path-ownership conflict.
/// Same-agent writes to the same path are never conflicts.
pub(crate) fn process_artifact(
    state: &mut State,
    artifact: &ArtifactEvent,
    source_path: Option<&str>,
) -> Option<CoherenceEvent> {
    state.unbind_content_hash(&artifact.artifact_id);

    state.artifacts.insert(
        artifact.artifact_id.clone(),
        ArtifactMeta {
            workstream: artifact.workstream.clone(),
            agent_id: artifact.agent_id.clone(),
            kind: artifact.kind,
            mime_type: artifact.mime_type.clone(),
            content_hash: artifact.content_hash.clone(),
        },
    );

    if let Some(hash) = &artifact.content_hash {
        state.bind_content_hash(hash, &artifact.artifact_id, &artifact.workstream, &artifact.agent_id);
    }

    state.changed.insert(artifact.artifact_id.clone());
    state.dirty_since_sweep = true;

    let path = source_path?;
    match state.path_owners.get(path).cloned() {
        Some((owner_agent, owner_artifact, owner_workstream)) if owner_agent != artifact.agent_id => {
            state.path_owners.insert(
                path.to_string(),
                (artifact.agent_id.clone(), artifact.artifact_id.clone(), artifact.workstream.clone()),
            );
            let mut affected_workstreams = BTreeSet::new();
            affected_workstreams.insert(owner_workstream);
            affected_workstreams.insert(artifact.workstream.clone());
            Some(CoherenceEvent {
                id: state.issue_ids.next(),
                title: format!("Structural conflict on {path}"),
                description: format!(
                    "{} (agent {}) overwrote {} (agent {}) at path {}",
                    artifact.artifact_id, artifact.agent_id, owner_artifact, owner_agent, path
                ),
                category: CoherenceCategory::Duplication,
                severity: Severity::High,
                affected_workstreams,
                affected_artifact_ids: vec![owner_artifact, artifact.artifact_id.clone()],
            })
        }
        _ => {
            state.path_owners.insert(
                path.to_string(),
                (artifact.agent_id.clone(), artifact.artifact_id.clone(), artifact.workstream.clone()),
            );
            None
        }
    }
}
