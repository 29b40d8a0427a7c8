use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::{query, BoltType, ConfigBuilder, Graph, Query, Row, Txn};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::Neo4jConfig,
    data::{
        entities::{
            FileRecord, ImportSession, ImportStatus, Properties, FILE_RECORD_LABEL,
            IMPORT_SESSION_LABEL, INCLUDES_FILE, VIRTUAL_LABEL,
        },
        errors::StateStoreError,
    },
    traits::{GraphStore, IndexSpec, NodeBatch, RelationshipBatch, WritePlan, WriteStats},
};

/// Neo4j implementation of the [`GraphStore`] trait
pub struct Neo4jGraphStore {
    pub graph: Arc<Graph>,
    config: Neo4jConfig,
}

impl Neo4jGraphStore {
    /// Returns the configuration used for this store
    pub fn get_config(&self) -> &Neo4jConfig {
        &self.config
    }

    /// Connects to Neo4j, retrying as configured
    pub async fn new(config: Neo4jConfig) -> Result<Self, StateStoreError> {
        let mut config_builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.username)
            .password(&config.password)
            .max_connections(config.pool_size);

        if let Some(db) = &config.database {
            config_builder = config_builder.db(db.as_str());
        }

        let neo4j_config = config_builder.build().map_err(|e| {
            StateStoreError::ConnectionError(format!("Failed to build Neo4j config: {}", e))
        })?;

        let mut last_error = None;
        for attempt in 1..=config.connection_retry_count {
            match Graph::connect(neo4j_config.clone()).await {
                Ok(graph) => {
                    info!("Connected to Neo4j at {} (attempt {})", config.uri, attempt);

                    match graph.run(query("RETURN 1")).await {
                        Ok(()) => {
                            return Ok(Self {
                                graph: Arc::new(graph),
                                config,
                            });
                        }
                        Err(e) => {
                            error!("Connection test failed: {}", e);
                            last_error = Some(e);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to connect to Neo4j (attempt {}): {}", attempt, e);
                    last_error = Some(e);
                }
            }
            if attempt < config.connection_retry_count {
                tokio::time::sleep(config.connection_retry_delay).await;
            }
        }

        Err(StateStoreError::ConnectionError(format!(
            "Failed to connect to Neo4j after {} attempts. Last error: {:?}",
            config.connection_retry_count, last_error
        )))
    }

    async fn write_plan(txn: &mut Txn, plan: &WritePlan) -> Result<WriteStats, StateStoreError> {
        let mut stats = WriteStats::default();

        for batch in &plan.node_batches {
            txn.run(node_batch_query(batch))
                .await
                .map_err(|e| query_error("node batch", &batch.label, e))?;
            stats.nodes_written += batch.rows.len();
        }
        for batch in &plan.relationship_batches {
            txn.run(relationship_batch_query(batch))
                .await
                .map_err(|e| query_error("relationship batch", &batch.rel_type, e))?;
            stats.relationships_written += batch.rows.len();
        }

        if !plan.virtual_nodes.is_empty() {
            txn.run(virtual_node_query(plan))
                .await
                .map_err(|e| query_error("virtual node batch", VIRTUAL_LABEL, e))?;
            stats.virtual_nodes_written = plan.virtual_nodes.len();
        }
        for batch in &plan.virtual_relationship_batches {
            txn.run(relationship_batch_query(batch))
                .await
                .map_err(|e| query_error("virtual relationship batch", &batch.rel_type, e))?;
            stats.relationships_written += batch.rows.len();
        }

        txn.run(session_query(plan))
            .await
            .map_err(|e| query_error("session", IMPORT_SESSION_LABEL, e))?;

        Ok(stats)
    }
}

/// Quotes a label or relationship type for use in Cypher.
fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn query_error(what: &str, name: &str, e: neo4rs::Error) -> StateStoreError {
    StateStoreError::QueryError(format!("Failed to write {} '{}': {}", what, name, e))
}

fn props_param(properties: &Properties) -> HashMap<String, BoltType> {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), BoltType::from(v.as_str())))
        .collect()
}

fn node_batch_query(batch: &NodeBatch) -> Query {
    let rows: Vec<HashMap<String, BoltType>> = batch
        .rows
        .iter()
        .map(|row| {
            let mut m: HashMap<String, BoltType> = HashMap::new();
            m.insert("uuid".to_string(), row.uuid.as_str().into());
            m.insert("props".to_string(), props_param(&row.properties).into());
            m
        })
        .collect();

    query(&format!(
        "UNWIND $rows AS row
         MERGE (n:{} {{uuid: row.uuid}})
         ON CREATE SET n = row.props
         ON MATCH SET n += row.props",
        quote(&batch.label)
    ))
    .param("rows", rows)
}

fn relationship_batch_query(batch: &RelationshipBatch) -> Query {
    let rows: Vec<HashMap<String, BoltType>> = batch
        .rows
        .iter()
        .map(|row| {
            let mut m: HashMap<String, BoltType> = HashMap::new();
            m.insert("from".to_string(), row.from.as_str().into());
            m.insert("to".to_string(), row.to.as_str().into());
            m.insert("props".to_string(), props_param(&row.properties).into());
            m
        })
        .collect();

    query(&format!(
        "UNWIND $rows AS row
         MATCH (a:{} {{uuid: row.from}})
         MATCH (b:{} {{uuid: row.to}})
         MERGE (a)-[r:{}]->(b)
         SET r += row.props",
        quote(&batch.from_label),
        quote(&batch.to_label),
        quote(&batch.rel_type)
    ))
    .param("rows", rows)
}

fn virtual_node_query(plan: &WritePlan) -> Query {
    let rows: Vec<HashMap<String, BoltType>> = plan
        .virtual_nodes
        .iter()
        .map(|node| {
            let mut m: HashMap<String, BoltType> = HashMap::new();
            m.insert("uuid".to_string(), node.uuid.as_str().into());
            m.insert("name".to_string(), node.name.as_str().into());
            m.insert("arxmlPath".to_string(), node.arxml_path.as_str().into());
            m
        })
        .collect();

    query(&format!(
        "UNWIND $rows AS row
         MERGE (n:{} {{uuid: row.uuid}})
         SET n.name = row.name, n.arxmlPath = row.arxmlPath, n.isVirtual = true",
        quote(VIRTUAL_LABEL)
    ))
    .param("rows", rows)
}

fn session_query(plan: &WritePlan) -> Query {
    let session = &plan.session;
    let mut s: HashMap<String, BoltType> = HashMap::new();
    s.insert("id".to_string(), session.id.to_string().into());
    s.insert("startedAt".to_string(), session.started_at.to_rfc3339().into());
    s.insert("finishedAt".to_string(), session.finished_at.to_rfc3339().into());
    s.insert("durationMs".to_string(), session.duration_ms.into());
    s.insert("fileCount".to_string(), session.file_count.into());
    s.insert("nodeCount".to_string(), session.node_count.into());
    s.insert("relationshipCount".to_string(), session.relationship_count.into());
    s.insert("unresolvedCount".to_string(), session.unresolved_count.into());
    s.insert("virtualNodeCount".to_string(), session.virtual_node_count.into());
    s.insert("status".to_string(), session.status.as_str().into());

    let files: Vec<HashMap<String, BoltType>> = plan
        .files
        .iter()
        .map(|file| {
            let mut m: HashMap<String, BoltType> = HashMap::new();
            m.insert("id".to_string(), file.id.to_string().into());
            m.insert("sessionId".to_string(), file.session_id.to_string().into());
            m.insert("fileName".to_string(), file.file_name.as_str().into());
            m.insert("filePath".to_string(), file.file_path.as_str().into());
            m.insert("sizeBytes".to_string(), file.size_bytes.into());
            m.insert("nodeCount".to_string(), file.node_count.into());
            m.insert("relationshipCount".to_string(), file.relationship_count.into());
            m
        })
        .collect();

    query(&format!(
        "CREATE (s:{session_label})
         SET s = $session
         WITH s
         UNWIND $files AS file
         CREATE (f:{file_label})
         SET f = file
         CREATE (s)-[:{includes}]->(f)",
        session_label = quote(IMPORT_SESSION_LABEL),
        file_label = quote(FILE_RECORD_LABEL),
        includes = quote(INCLUDES_FILE),
    ))
    .param("session", s)
    .param("files", files)
}

fn mapping_error(field: &str, e: impl std::fmt::Display) -> StateStoreError {
    StateStoreError::MappingError(format!("Invalid '{}' in graph result: {}", field, e))
}

fn get_string(row: &Row, field: &str) -> Result<String, StateStoreError> {
    row.get::<String>(field).map_err(|e| mapping_error(field, e))
}

fn get_i64(row: &Row, field: &str) -> Result<i64, StateStoreError> {
    row.get::<i64>(field).map_err(|e| mapping_error(field, e))
}

fn get_uuid(row: &Row, field: &str) -> Result<Uuid, StateStoreError> {
    Uuid::parse_str(&get_string(row, field)?).map_err(|e| mapping_error(field, e))
}

fn get_datetime(row: &Row, field: &str) -> Result<DateTime<Utc>, StateStoreError> {
    DateTime::parse_from_rfc3339(&get_string(row, field)?)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| mapping_error(field, e))
}

fn row_to_session(row: &Row) -> Result<ImportSession, StateStoreError> {
    let status = get_string(row, "status")?;
    Ok(ImportSession {
        id: get_uuid(row, "id")?,
        started_at: get_datetime(row, "startedAt")?,
        finished_at: get_datetime(row, "finishedAt")?,
        duration_ms: get_i64(row, "durationMs")?,
        file_count: get_i64(row, "fileCount")?,
        node_count: get_i64(row, "nodeCount")?,
        relationship_count: get_i64(row, "relationshipCount")?,
        unresolved_count: get_i64(row, "unresolvedCount")?,
        virtual_node_count: get_i64(row, "virtualNodeCount")?,
        status: ImportStatus::parse(&status).ok_or_else(|| mapping_error("status", &status))?,
    })
}

fn row_to_file(row: &Row) -> Result<FileRecord, StateStoreError> {
    Ok(FileRecord {
        id: get_uuid(row, "id")?,
        session_id: get_uuid(row, "sessionId")?,
        file_name: get_string(row, "fileName")?,
        file_path: get_string(row, "filePath")?,
        size_bytes: get_i64(row, "sizeBytes")?,
        node_count: get_i64(row, "nodeCount")?,
        relationship_count: get_i64(row, "relationshipCount")?,
    })
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<(), StateStoreError> {
        self.graph
            .run(query("MATCH (n) DETACH DELETE n"))
            .await
            .map_err(|e| StateStoreError::QueryError(format!("Failed to clear graph: {}", e)))?;
        info!("Cleared all graph content");
        Ok(())
    }

    #[instrument(skip_all, fields(count = indexes.len()))]
    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StateStoreError> {
        for spec in indexes {
            let cypher = format!(
                "CREATE INDEX {} IF NOT EXISTS FOR (n:{}) ON (n.{})",
                quote(&spec.name()),
                quote(&spec.label),
                quote(&spec.property)
            );
            debug!("Ensuring index: {}", cypher);
            self.graph.run(query(&cypher)).await.map_err(|e| {
                StateStoreError::QueryError(format!(
                    "Failed to create index {}: {}",
                    spec.name(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(session_id = %plan.session.id))]
    async fn apply_plan(&self, plan: &WritePlan) -> Result<WriteStats, StateStoreError> {
        let mut txn = self.graph.start_txn().await.map_err(|e| {
            StateStoreError::TransactionError(format!("Failed to start transaction: {}", e))
        })?;

        match Self::write_plan(&mut txn, plan).await {
            Ok(stats) => {
                txn.commit().await.map_err(|e| {
                    StateStoreError::TransactionError(format!(
                        "Failed to commit transaction: {}",
                        e
                    ))
                })?;
                debug!("Transaction committed");
                Ok(stats)
            }
            Err(e) => {
                warn!("Error during batch write, rolling back: {}", e);
                if let Err(rollback_err) = txn.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn latest_import(&self) -> Result<Option<ImportSession>, StateStoreError> {
        let cypher = format!(
            "MATCH (s:{}) RETURN s.id AS id, s.startedAt AS startedAt, s.finishedAt AS finishedAt,
             s.durationMs AS durationMs, s.fileCount AS fileCount, s.nodeCount AS nodeCount,
             s.relationshipCount AS relationshipCount, s.unresolvedCount AS unresolvedCount,
             s.virtualNodeCount AS virtualNodeCount, s.status AS status
             ORDER BY s.startedAt DESC LIMIT 1",
            quote(IMPORT_SESSION_LABEL)
        );
        let mut result = self
            .graph
            .execute(query(&cypher))
            .await
            .map_err(|e| StateStoreError::QueryError(e.to_string()))?;

        match result.next().await {
            Ok(Some(row)) => Ok(Some(row_to_session(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StateStoreError::QueryError(e.to_string())),
        }
    }

    async fn files_for_import(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<FileRecord>, StateStoreError> {
        let cypher = format!(
            "MATCH (s:{} {{id: $id}})-[:{}]->(f:{})
             RETURN f.id AS id, f.sessionId AS sessionId, f.fileName AS fileName,
             f.filePath AS filePath, f.sizeBytes AS sizeBytes, f.nodeCount AS nodeCount,
             f.relationshipCount AS relationshipCount
             ORDER BY f.fileName",
            quote(IMPORT_SESSION_LABEL),
            quote(INCLUDES_FILE),
            quote(FILE_RECORD_LABEL)
        );
        let mut result = self
            .graph
            .execute(query(&cypher).param("id", session_id.to_string()))
            .await
            .map_err(|e| StateStoreError::QueryError(e.to_string()))?;

        let mut files = Vec::new();
        loop {
            match result.next().await {
                Ok(Some(row)) => files.push(row_to_file(&row)?),
                Ok(None) => break,
                Err(e) => return Err(StateStoreError::QueryError(e.to_string())),
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_backticks() {
        assert_eq!(quote("TYPE-TREF"), "`TYPE-TREF`");
        assert_eq!(quote("a`b"), "`a``b`");
    }
}
