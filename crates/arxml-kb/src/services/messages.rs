//! Message types for service communication

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::data::{
    entities::{FileRecord, ImportFile, ImportOutcome, ImportSession},
    errors::StateStoreError,
};

/// Message type for import operations
#[derive(Debug)]
pub enum ImportMessage {
    /// Replace the store contents with the graph built from `files`.
    Import {
        files: Vec<ImportFile>,
        reply: oneshot::Sender<ImportOutcome>,
    },
    /// Fetch the most recent session and its file records.
    LatestImport {
        reply: oneshot::Sender<Result<Option<ImportSummary>, StateStoreError>>,
    },
}

/// Most recent import session together with its files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub session: ImportSession,
    pub files: Vec<FileRecord>,
}
