//! Write planning and the clear / index / transact sequence.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::ImportConfig,
    data::{
        entities::{
            FileRecord, GraphRelationship, ImportFile, ImportSession, ImportStatus, CONTAINS,
            FILE_RECORD_LABEL, IMPORT_SESSION_LABEL, VIRTUAL_LABEL,
        },
        errors::ImportError,
    },
    services::ingestion::ImportGraph,
    traits::{
        GraphStore, IndexSpec, NodeBatch, NodeRow, RelationshipBatch, RelationshipRow, WritePlan,
        WriteStats,
    },
};

/// Run metadata needed to build the session and file records.
#[derive(Debug, Clone)]
pub struct SessionMeta<'a> {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: &'a [ImportFile],
}

/// What a successful write reports back to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub session: ImportSession,
    pub stats: WriteStats,
    pub skipped_relationships: usize,
}

/// Indexes created before every import: `uuid` and `name` for each
/// configured label, plus the fixed virtual and metadata indexes.
pub fn index_specs(labels: &[String]) -> Vec<IndexSpec> {
    let mut specs: Vec<IndexSpec> = labels
        .iter()
        .flat_map(|label| [IndexSpec::new(label, "uuid"), IndexSpec::new(label, "name")])
        .collect();
    specs.push(IndexSpec::new(VIRTUAL_LABEL, "uuid"));
    specs.push(IndexSpec::new(IMPORT_SESSION_LABEL, "id"));
    specs.push(IndexSpec::new(FILE_RECORD_LABEL, "id"));
    specs
}

/// Groups the import graph into label-homogeneous batches of at most
/// `batch_size` rows, and attaches the session metadata.
pub fn plan_write(graph: &ImportGraph, meta: &SessionMeta<'_>, batch_size: usize) -> WritePlan {
    let batch_size = batch_size.max(1);
    let labels = graph.label_index();

    let mut nodes_by_label: BTreeMap<&str, Vec<NodeRow>> = BTreeMap::new();
    for node in &graph.nodes {
        nodes_by_label
            .entry(node.label.as_str())
            .or_default()
            .push(NodeRow {
                uuid: node.uuid.clone(),
                properties: node.properties.clone(),
            });
    }
    let node_batches: Vec<NodeBatch> = nodes_by_label
        .into_iter()
        .flat_map(|(label, rows)| {
            chunk(rows, batch_size).into_iter().map(move |rows| NodeBatch {
                label: label.to_string(),
                rows,
            })
        })
        .collect();

    let mut skipped_relationships = 0;
    let mut grouped: BTreeMap<(String, String, String), Vec<RelationshipRow>> = BTreeMap::new();
    for relationship in graph.containment.iter().chain(graph.relationships.iter()) {
        let (Some(from_label), Some(to_label)) = (
            labels.get(relationship.from.as_str()),
            labels.get(relationship.to.as_str()),
        ) else {
            warn!(
                rel_type = %relationship.rel_type,
                from = %relationship.from,
                to = %relationship.to,
                "Skipping relationship with unknown endpoint label"
            );
            skipped_relationships += 1;
            continue;
        };
        grouped
            .entry((
                relationship.rel_type.clone(),
                from_label.to_string(),
                to_label.to_string(),
            ))
            .or_default()
            .push(row(relationship));
    }
    let relationship_batches = into_batches(grouped, batch_size);

    let virtual_graph = &graph.virtual_graph;
    let mut virtual_grouped: BTreeMap<(String, String, String), Vec<RelationshipRow>> =
        BTreeMap::new();
    if !virtual_graph.contains.is_empty() {
        virtual_grouped.insert(
            (
                CONTAINS.to_string(),
                VIRTUAL_LABEL.to_string(),
                VIRTUAL_LABEL.to_string(),
            ),
            virtual_graph.contains.iter().map(row).collect(),
        );
    }
    for ((rel_type, source_label), relationships) in &virtual_graph.relationships {
        virtual_grouped
            .entry((rel_type.clone(), source_label.clone(), VIRTUAL_LABEL.to_string()))
            .or_default()
            .extend(relationships.iter().map(row));
    }
    let virtual_relationship_batches = into_batches(virtual_grouped, batch_size);

    let mut plan = WritePlan {
        node_batches,
        relationship_batches,
        virtual_nodes: virtual_graph.nodes.clone(),
        virtual_relationship_batches,
        session: ImportSession {
            id: meta.id,
            started_at: meta.started_at,
            finished_at: meta.finished_at,
            duration_ms: (meta.finished_at - meta.started_at).num_milliseconds(),
            file_count: meta.files.len() as i64,
            node_count: 0,
            relationship_count: 0,
            unresolved_count: graph.unresolved.len() as i64,
            virtual_node_count: virtual_graph.nodes.len() as i64,
            status: if graph.unresolved.is_empty() {
                ImportStatus::Completed
            } else {
                ImportStatus::CompletedWithUnresolved
            },
        },
        files: Vec::new(),
        skipped_relationships,
    };

    plan.session.node_count = plan.node_count() as i64;
    plan.session.relationship_count = plan.relationship_count() as i64;
    plan.files = file_records(&plan.session, meta.files);
    plan
}

/// Per-file counts are the session aggregate split evenly across files.
fn file_records(session: &ImportSession, files: &[ImportFile]) -> Vec<FileRecord> {
    let file_count = files.len().max(1) as i64;
    files
        .iter()
        .map(|file| FileRecord {
            id: Uuid::new_v4(),
            session_id: session.id,
            file_name: file.file_name.clone(),
            file_path: file.file_path.clone(),
            size_bytes: file.size_bytes() as i64,
            node_count: session.node_count / file_count,
            relationship_count: session.relationship_count / file_count,
        })
        .collect()
}

fn row(relationship: &GraphRelationship) -> RelationshipRow {
    RelationshipRow {
        from: relationship.from.clone(),
        to: relationship.to.clone(),
        properties: relationship.properties.clone(),
    }
}

fn into_batches(
    grouped: BTreeMap<(String, String, String), Vec<RelationshipRow>>,
    batch_size: usize,
) -> Vec<RelationshipBatch> {
    grouped
        .into_iter()
        .flat_map(|((rel_type, from_label, to_label), rows)| {
            chunk(rows, batch_size)
                .into_iter()
                .map(move |rows| RelationshipBatch {
                    rel_type: rel_type.clone(),
                    from_label: from_label.clone(),
                    to_label: to_label.clone(),
                    rows,
                })
        })
        .collect()
}

fn chunk<T: Clone>(rows: Vec<T>, size: usize) -> Vec<Vec<T>> {
    rows.chunks(size).map(<[T]>::to_vec).collect()
}

/// Writes an import graph to a [`GraphStore`]: clear, indexes, then one
/// transaction for the plan.
///
/// A failure after the clear leaves the store empty; imports are expected to
/// run as the only writer against the store.
pub struct GraphWriter {
    store: Arc<dyn GraphStore>,
    config: ImportConfig,
}

impl GraphWriter {
    pub fn new(store: Arc<dyn GraphStore>, config: ImportConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip_all, fields(nodes = graph.nodes.len(), files = files.len()))]
    pub async fn write(
        &self,
        graph: &ImportGraph,
        files: &[ImportFile],
        started_at: DateTime<Utc>,
    ) -> Result<WriteReport, ImportError> {
        self.store.clear_all().await?;
        debug!("Cleared existing graph content");

        let indexes = index_specs(&self.config.indexed_labels);
        self.store.ensure_indexes(&indexes).await?;
        debug!(count = indexes.len(), "Ensured indexes");

        let meta = SessionMeta {
            id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            files,
        };
        let mut plan = plan_write(graph, &meta, self.config.batch_size);
        if plan.skipped_relationships > 0 {
            warn!(
                skipped = plan.skipped_relationships,
                "Some relationships were left out of the write plan"
            );
        }

        plan.session.finish(Utc::now());
        let stats = self.store.apply_plan(&plan).await?;
        info!(
            session_id = %plan.session.id,
            nodes = stats.nodes_written,
            relationships = stats.relationships_written,
            virtual_nodes = stats.virtual_nodes_written,
            "Committed import transaction"
        );

        Ok(WriteReport {
            session: plan.session,
            stats,
            skipped_relationships: plan.skipped_relationships,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entities::{GraphNode, Properties, VirtualNode};
    use crate::data::errors::StateStoreError;
    use crate::services::ingestion::VirtualGraph;
    use crate::storage::InMemoryGraphStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn node(uuid: &str, label: &str) -> GraphNode {
        GraphNode {
            uuid: uuid.to_string(),
            label: label.to_string(),
            properties: Properties::new(),
        }
    }

    fn meta(files: &[ImportFile]) -> SessionMeta<'_> {
        let now = Utc::now();
        SessionMeta {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            files,
        }
    }

    #[test]
    fn test_index_specs_cover_fixed_labels() {
        let specs = index_specs(&["AR_PACKAGE".to_string()]);
        assert_eq!(specs.len(), 5);
        assert!(specs.contains(&IndexSpec::new("AR_PACKAGE", "name")));
        assert!(specs.contains(&IndexSpec::new(VIRTUAL_LABEL, "uuid")));
        assert!(specs.contains(&IndexSpec::new(IMPORT_SESSION_LABEL, "id")));
        assert!(specs.contains(&IndexSpec::new(FILE_RECORD_LABEL, "id")));
    }

    #[test]
    fn test_nodes_grouped_by_label_and_chunked() {
        let graph = ImportGraph {
            nodes: vec![node("a", "A"), node("b", "A"), node("c", "A"), node("d", "B")],
            ..Default::default()
        };
        let plan = plan_write(&graph, &meta(&[]), 2);
        let shape: Vec<(&str, usize)> = plan
            .node_batches
            .iter()
            .map(|b| (b.label.as_str(), b.rows.len()))
            .collect();
        assert_eq!(shape, vec![("A", 2), ("A", 1), ("B", 1)]);
        assert_eq!(plan.node_count(), 4);
    }

    #[test]
    fn test_relationship_with_unknown_endpoint_is_skipped() {
        let graph = ImportGraph {
            nodes: vec![node("a", "A"), node("b", "B")],
            containment: vec![GraphRelationship::contains("a", "b")],
            relationships: vec![GraphRelationship::new("TYPE-TREF", "a", "ghost")],
            ..Default::default()
        };
        let plan = plan_write(&graph, &meta(&[]), 500);
        assert_eq!(plan.skipped_relationships, 1);
        assert_eq!(plan.relationship_batches.len(), 1);
        let batch = &plan.relationship_batches[0];
        assert_eq!(
            (batch.rel_type.as_str(), batch.from_label.as_str(), batch.to_label.as_str()),
            (CONTAINS, "A", "B")
        );
    }

    #[test]
    fn test_session_counts_and_even_file_split() {
        let mut relationships = BTreeMap::new();
        relationships.insert(
            ("TYPE-TREF".to_string(), "A".to_string()),
            vec![GraphRelationship::new("TYPE-TREF", "a", "/X")],
        );
        let graph = ImportGraph {
            nodes: vec![node("a", "A"), node("b", "A"), node("c", "A")],
            virtual_graph: VirtualGraph {
                nodes: vec![VirtualNode::new("/X", "X")],
                contains: Vec::new(),
                relationships,
                dropped: 0,
            },
            unresolved: vec![crate::data::UnresolvedReference {
                source_uuid: "a".to_string(),
                target_path: "/X".to_string(),
                relationship_type: "TYPE-TREF".to_string(),
                destination_attribute: "N/A".to_string(),
                reason: String::new(),
            }],
            ..Default::default()
        };
        let files = vec![
            ImportFile::new("a.arxml", "/in/a.arxml", "<A/>"),
            ImportFile::new("b.arxml", "/in/b.arxml", "<B/>"),
        ];
        let plan = plan_write(&graph, &meta(&files), 500);

        assert_eq!(plan.session.node_count, 4);
        assert_eq!(plan.session.relationship_count, 1);
        assert_eq!(plan.session.virtual_node_count, 1);
        assert_eq!(plan.session.status, ImportStatus::CompletedWithUnresolved);
        assert_eq!(plan.files.len(), 2);
        assert!(plan.files.iter().all(|f| f.node_count == 2 && f.session_id == plan.session.id));
        assert_eq!(plan.files[0].size_bytes, 4);
        assert_eq!(plan.virtual_relationship_batches[0].to_label, VIRTUAL_LABEL);
    }

    /// Delegates to the in-memory store and records when indexing finished
    /// and which session the transaction received.
    #[derive(Default)]
    struct TimingStore {
        inner: InMemoryGraphStore,
        indexed_at: Mutex<Option<DateTime<Utc>>>,
        applied: Mutex<Option<ImportSession>>,
    }

    #[async_trait]
    impl GraphStore for TimingStore {
        async fn clear_all(&self) -> Result<(), StateStoreError> {
            self.inner.clear_all().await
        }

        async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StateStoreError> {
            self.inner.ensure_indexes(indexes).await?;
            *self.indexed_at.lock() = Some(Utc::now());
            Ok(())
        }

        async fn apply_plan(&self, plan: &WritePlan) -> Result<WriteStats, StateStoreError> {
            *self.applied.lock() = Some(plan.session.clone());
            self.inner.apply_plan(plan).await
        }

        async fn latest_import(&self) -> Result<Option<ImportSession>, StateStoreError> {
            self.inner.latest_import().await
        }

        async fn files_for_import(
            &self,
            session_id: &Uuid,
        ) -> Result<Vec<FileRecord>, StateStoreError> {
            self.inner.files_for_import(session_id).await
        }
    }

    #[tokio::test]
    async fn test_session_finished_after_indexes_before_transaction() {
        let store = Arc::new(TimingStore::default());
        let writer = GraphWriter::new(store.clone(), ImportConfig::default());
        let graph = ImportGraph {
            nodes: vec![node("a", "A")],
            ..Default::default()
        };
        let started_at = Utc::now() - chrono::Duration::seconds(5);

        let report = writer.write(&graph, &[], started_at).await.unwrap();

        let indexed_at = (*store.indexed_at.lock()).expect("indexes ensured");
        let applied = store.applied.lock().clone().expect("plan applied");
        assert!(applied.finished_at >= indexed_at);
        assert_eq!(applied, report.session);
        assert_eq!(
            applied.duration_ms,
            (applied.finished_at - started_at).num_milliseconds()
        );
        assert!(applied.duration_ms >= 5_000);
    }
}
