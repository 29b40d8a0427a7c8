use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::data::{
    entities::{FileRecord, ImportSession, Properties, VIRTUAL_LABEL},
    errors::StateStoreError,
};
use crate::traits::{GraphStore, IndexSpec, RelationshipBatch, WritePlan, WriteStats};

/// A node as held by [`InMemoryGraphStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub label: String,
    pub uuid: String,
    pub properties: Properties,
    pub is_virtual: bool,
}

/// A relationship as held by [`InMemoryGraphStore`]. Endpoints are
/// `(label, uuid)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRelationship {
    pub rel_type: String,
    pub from: (String, String),
    pub to: (String, String),
    pub properties: Properties,
}

type NodeKey = (String, String);
type RelationshipKey = (String, NodeKey, NodeKey);

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: BTreeMap<NodeKey, StoredNode>,
    relationships: BTreeMap<RelationshipKey, Properties>,
    sessions: Vec<ImportSession>,
    files: Vec<FileRecord>,
}

impl GraphState {
    fn merge_node(&mut self, label: &str, uuid: &str, properties: &Properties, is_virtual: bool) {
        let key = (label.to_string(), uuid.to_string());
        match self.nodes.get_mut(&key) {
            Some(existing) => existing.properties.extend(properties.clone()),
            None => {
                self.nodes.insert(
                    key,
                    StoredNode {
                        label: label.to_string(),
                        uuid: uuid.to_string(),
                        properties: properties.clone(),
                        is_virtual,
                    },
                );
            }
        }
    }

    /// Mirrors `MATCH ... MERGE`: rows whose endpoints do not exist are not
    /// written.
    fn merge_relationships(&mut self, batch: &RelationshipBatch) -> usize {
        let mut written = 0;
        for row in &batch.rows {
            let from = (batch.from_label.clone(), row.from.clone());
            let to = (batch.to_label.clone(), row.to.clone());
            if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
                debug!(
                    rel_type = %batch.rel_type,
                    from = %row.from,
                    to = %row.to,
                    "Endpoint not found"
                );
                continue;
            }
            self.relationships
                .entry((batch.rel_type.clone(), from, to))
                .or_default()
                .extend(row.properties.clone());
            written += 1;
        }
        written
    }
}

/// Graph store kept in process memory.
///
/// Used by the CLI's dry-run mode and by tests. A plan is applied to a copy
/// of the state that replaces the live state only when every step succeeded.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: RwLock<GraphState>,
    indexes: RwLock<BTreeSet<String>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.state.read().relationships.len()
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<StoredNode> {
        self.state
            .read()
            .nodes
            .values()
            .filter(|node| node.label == label)
            .cloned()
            .collect()
    }

    pub fn node(&self, uuid: &str) -> Option<StoredNode> {
        self.state
            .read()
            .nodes
            .values()
            .find(|node| node.uuid == uuid)
            .cloned()
    }

    pub fn relationships(&self) -> Vec<StoredRelationship> {
        self.state
            .read()
            .relationships
            .iter()
            .map(|((rel_type, from, to), properties)| StoredRelationship {
                rel_type: rel_type.clone(),
                from: from.clone(),
                to: to.clone(),
                properties: properties.clone(),
            })
            .collect()
    }

    /// True if a relationship of `rel_type` links the two uuids, whatever
    /// their labels.
    pub fn has_relationship(&self, rel_type: &str, from_uuid: &str, to_uuid: &str) -> bool {
        self.state
            .read()
            .relationships
            .keys()
            .any(|(t, from, to)| t == rel_type && from.1 == from_uuid && to.1 == to_uuid)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.indexes.read().iter().cloned().collect()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn clear_all(&self) -> Result<(), StateStoreError> {
        *self.state.write() = GraphState::default();
        Ok(())
    }

    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StateStoreError> {
        let mut names = self.indexes.write();
        for spec in indexes {
            names.insert(spec.name());
        }
        Ok(())
    }

    async fn apply_plan(&self, plan: &WritePlan) -> Result<WriteStats, StateStoreError> {
        let mut staged = self.state.read().clone();
        let mut stats = WriteStats::default();

        for batch in &plan.node_batches {
            for row in &batch.rows {
                staged.merge_node(&batch.label, &row.uuid, &row.properties, false);
            }
            stats.nodes_written += batch.rows.len();
        }
        for batch in &plan.relationship_batches {
            stats.relationships_written += staged.merge_relationships(batch);
        }

        for node in &plan.virtual_nodes {
            let mut properties = Properties::new();
            properties.insert("uuid".to_string(), node.uuid.clone());
            properties.insert("name".to_string(), node.name.clone());
            properties.insert("arxmlPath".to_string(), node.arxml_path.clone());
            staged.merge_node(VIRTUAL_LABEL, &node.uuid, &properties, true);
        }
        stats.virtual_nodes_written = plan.virtual_nodes.len();
        for batch in &plan.virtual_relationship_batches {
            stats.relationships_written += staged.merge_relationships(batch);
        }

        if staged.sessions.iter().any(|s| s.id == plan.session.id) {
            return Err(StateStoreError::ConstraintViolation(format!(
                "ImportSession {} already exists",
                plan.session.id
            )));
        }
        staged.sessions.push(plan.session.clone());
        staged.files.extend(plan.files.iter().cloned());

        *self.state.write() = staged;
        Ok(stats)
    }

    async fn latest_import(&self) -> Result<Option<ImportSession>, StateStoreError> {
        Ok(self
            .state
            .read()
            .sessions
            .iter()
            .max_by_key(|session| session.started_at)
            .cloned())
    }

    async fn files_for_import(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<FileRecord>, StateStoreError> {
        Ok(self
            .state
            .read()
            .files
            .iter()
            .filter(|file| file.session_id == *session_id)
            .cloned()
            .collect())
    }
}
