use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ImportConfig,
    data::errors::StateStoreError,
    services::messages::{ImportMessage, ImportSummary},
    traits::{DocumentParser, GraphStore},
};

use super::pipeline::ImportPipeline;

/// Service owning the import pipeline. Messages are handled one at a time,
/// so a service instance never runs two imports against its store.
pub struct ImportService {
    pipeline: ImportPipeline,
    store: Arc<dyn GraphStore>,
    import_rx: mpsc::Receiver<ImportMessage>,
}

impl ImportService {
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        store: Arc<dyn GraphStore>,
        config: ImportConfig,
        import_rx: mpsc::Receiver<ImportMessage>,
    ) -> Self {
        Self {
            pipeline: ImportPipeline::new(parser, Arc::clone(&store), config),
            store,
            import_rx,
        }
    }

    /// Runs until every sender is dropped.
    pub async fn run(&mut self) {
        info!("ImportService started");
        while let Some(msg) = self.import_rx.recv().await {
            match msg {
                ImportMessage::Import { files, reply } => {
                    info!(files = files.len(), "Processing import request");
                    let outcome = self.pipeline.run(files).await;
                    if reply.send(outcome).is_err() {
                        warn!("Import requester went away before the outcome was sent");
                    }
                }
                ImportMessage::LatestImport { reply } => {
                    let summary = latest_summary(self.store.as_ref()).await;
                    if reply.send(summary).is_err() {
                        debug!("Latest-import requester went away");
                    }
                }
            }
        }
        info!("ImportService stopped");
    }
}

#[instrument(skip(store))]
async fn latest_summary(store: &dyn GraphStore) -> Result<Option<ImportSummary>, StateStoreError> {
    let Some(session) = store.latest_import().await? else {
        return Ok(None);
    };
    let files = store.files_for_import(&session.id).await?;
    Ok(Some(ImportSummary { session, files }))
}
