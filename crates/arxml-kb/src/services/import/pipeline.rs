//! End-to-end import: parse, merge, extract, write.

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{error, info, instrument};

use crate::{
    config::ImportConfig,
    data::{
        entities::{ImportFile, ImportOutcome, UnresolvedReference},
        errors::ImportError,
        types::DocValue,
    },
    services::ingestion::{build_import_graph, merge_documents},
    traits::{DocumentParser, GraphStore},
};

use super::writer::{GraphWriter, WriteReport};

/// Runs one import from raw files to a committed graph.
///
/// [`run`](ImportPipeline::run) never returns an error: every failure is
/// reported through the returned [`ImportOutcome`].
pub struct ImportPipeline {
    parser: Arc<dyn DocumentParser>,
    writer: GraphWriter,
}

impl ImportPipeline {
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        store: Arc<dyn GraphStore>,
        config: ImportConfig,
    ) -> Self {
        Self {
            parser,
            writer: GraphWriter::new(store, config),
        }
    }

    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn run(&self, files: Vec<ImportFile>) -> ImportOutcome {
        match self.try_run(&files).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(category = e.category(), error = %e, "Import failed");
                ImportOutcome::failure(format!("Import failed ({})", e.category()), e.to_string())
            }
        }
    }

    async fn try_run(&self, files: &[ImportFile]) -> Result<ImportOutcome, ImportError> {
        if files.is_empty() {
            return Err(ImportError::NoInput);
        }
        let started_at = Utc::now();

        let documents = parse_documents(&self.parser, files).await?;
        let root = merge_documents(documents)?;
        let graph = build_import_graph(&root);

        let report = self.writer.write(&graph, files, started_at).await?;
        let outcome = outcome_from_report(&report, graph.unresolved);
        info!(
            session_id = %report.session.id,
            nodes = outcome.node_count,
            relationships = outcome.relationship_count,
            unresolved = outcome.unresolved_references.len(),
            "Import completed"
        );
        Ok(outcome)
    }
}

/// Parses every file on the blocking pool. The first failure aborts the
/// whole batch.
pub async fn parse_documents(
    parser: &Arc<dyn DocumentParser>,
    files: &[ImportFile],
) -> Result<Vec<DocValue>, ImportError> {
    let tasks = files.iter().map(|file| {
        let parser = Arc::clone(parser);
        let file_name = file.file_name.clone();
        let content = file.content.clone();
        async move {
            let task_name = file_name.clone();
            tokio::task::spawn_blocking(move || {
                parser
                    .parse(&content)
                    .map_err(|e| ImportError::parse(file_name, e))
            })
            .await
            .map_err(|e| {
                ImportError::Internal(format!("parse task for '{}' failed: {}", task_name, e))
            })?
        }
    });
    try_join_all(tasks).await
}

fn outcome_from_report(
    report: &WriteReport,
    unresolved: Vec<UnresolvedReference>,
) -> ImportOutcome {
    let node_count = report.stats.nodes_written + report.stats.virtual_nodes_written;
    let relationship_count = report.stats.relationships_written;
    let message = if unresolved.is_empty() {
        format!("Imported {} nodes and {} relationships", node_count, relationship_count)
    } else {
        format!(
            "Imported {} nodes and {} relationships ({} unresolved references)",
            node_count,
            relationship_count,
            unresolved.len()
        )
    };

    ImportOutcome {
        success: true,
        message,
        node_count,
        relationship_count,
        unresolved_references: unresolved,
        error: None,
    }
}
