use tokio::sync::{mpsc, oneshot};

use crate::data::{
    entities::{ImportFile, ImportOutcome},
    errors::ImportError,
};
use crate::services::messages::{ImportMessage, ImportSummary};

/// Client interface for the [`ImportService`](crate::services::ImportService).
#[derive(Clone)]
pub struct ImportClient {
    import_tx: mpsc::Sender<ImportMessage>,
}

impl ImportClient {
    pub fn new(import_tx: mpsc::Sender<ImportMessage>) -> Self {
        ImportClient { import_tx }
    }

    /// Queues an import and waits for its outcome.
    pub async fn import(&self, files: Vec<ImportFile>) -> Result<ImportOutcome, ImportError> {
        let (reply, response_rx) = oneshot::channel();

        self.import_tx
            .send(ImportMessage::Import { files, reply })
            .await
            .map_err(|_| ImportError::Internal("Import channel closed".to_string()))?;

        response_rx.await.map_err(|_| {
            ImportError::Internal("Import response channel closed by service".to_string())
        })
    }

    /// Most recent import session and its files, if any import ran.
    pub async fn latest_import(&self) -> Result<Option<ImportSummary>, ImportError> {
        let (reply, response_rx) = oneshot::channel();

        self.import_tx
            .send(ImportMessage::LatestImport { reply })
            .await
            .map_err(|_| ImportError::Internal("Import channel closed".to_string()))?;

        let response = response_rx.await.map_err(|_| {
            ImportError::Internal("Import response channel closed by service".to_string())
        })?;
        Ok(response?)
    }
}
