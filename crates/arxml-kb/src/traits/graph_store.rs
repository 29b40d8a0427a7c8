//! GraphStore trait definition for graph database interaction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::{
    entities::{FileRecord, ImportSession, Properties, VirtualNode},
    errors::StateStoreError,
};

/// One node to upsert, keyed by its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow {
    pub uuid: String,
    pub properties: Properties,
}

/// Nodes sharing one label, written by a single batched statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBatch {
    pub label: String,
    pub rows: Vec<NodeRow>,
}

/// One relationship to upsert between two node identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub from: String,
    pub to: String,
    pub properties: Properties,
}

/// Relationships sharing `(type, from_label, to_label)`. Endpoints are matched
/// with label-qualified patterns, hence the grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipBatch {
    pub rel_type: String,
    pub from_label: String,
    pub to_label: String,
    pub rows: Vec<RelationshipRow>,
}

/// Everything written inside the single import transaction.
///
/// A plan is a pure function of the extracted graph, so it can be inspected
/// in tests without a database. Batches are already split to the configured
/// batch size; stores write each batch as one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritePlan {
    /// Concrete nodes grouped by label.
    pub node_batches: Vec<NodeBatch>,

    /// Concrete relationships (containment and resolved references).
    pub relationship_batches: Vec<RelationshipBatch>,

    /// Placeholder nodes for unresolved path segments.
    pub virtual_nodes: Vec<VirtualNode>,

    /// Containment chain between virtual segments plus the typed edges from
    /// real sources to the deepest segment.
    pub virtual_relationship_batches: Vec<RelationshipBatch>,

    /// Metadata for this run.
    pub session: ImportSession,

    /// One record per input file, linked to `session`.
    pub files: Vec<FileRecord>,

    /// Relationships left out because an endpoint label was unknown.
    pub skipped_relationships: usize,
}

impl WritePlan {
    pub fn node_count(&self) -> usize {
        self.node_batches.iter().map(|b| b.rows.len()).sum::<usize>() + self.virtual_nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationship_batches
            .iter()
            .chain(self.virtual_relationship_batches.iter())
            .map(|b| b.rows.len())
            .sum()
    }
}

/// Counts reported by a store after a plan was committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStats {
    /// Concrete nodes only.
    pub nodes_written: usize,
    /// Concrete and virtual relationships.
    pub relationships_written: usize,
    pub virtual_nodes_written: usize,
}

/// Single-property index on a node label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    pub label: String,
    pub property: String,
}

impl IndexSpec {
    pub fn new(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
        }
    }

    /// Stable index name, so repeated creation is a no-op.
    pub fn name(&self) -> String {
        format!("idx_{}_{}", self.label.to_lowercase(), self.property.to_lowercase())
    }
}

/// Represents the interface for interacting with the graph database.
/// This abstracts the underlying database technology (e.g., Neo4j).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Deletes all graph content. Auto-committed, outside any transaction.
    async fn clear_all(&self) -> Result<(), StateStoreError>;

    /// Creates the given indexes if they do not exist yet.
    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StateStoreError>;

    /// Writes the whole plan in one transaction. On error nothing of the plan
    /// is visible.
    async fn apply_plan(&self, plan: &WritePlan) -> Result<WriteStats, StateStoreError>;

    /// Most recent import session, by start time.
    async fn latest_import(&self) -> Result<Option<ImportSession>, StateStoreError>;

    /// File records linked to the given session.
    async fn files_for_import(&self, session_id: &Uuid) -> Result<Vec<FileRecord>, StateStoreError>;
}
