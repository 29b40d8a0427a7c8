use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::data::{
    entities::{FileRecord, ImportSession},
    errors::StateStoreError,
};
use crate::storage::InMemoryGraphStore;
use crate::traits::{GraphStore, IndexSpec, WritePlan, WriteStats};

/// Store that behaves like [`InMemoryGraphStore`] except that every
/// transaction fails, after the clear has already happened.
#[derive(Debug, Clone)]
pub struct FailingGraphStore {
    pub inner: Arc<InMemoryGraphStore>,
    clear_calls: Arc<AtomicUsize>,
}

impl FailingGraphStore {
    pub fn new(inner: Arc<InMemoryGraphStore>) -> Self {
        Self {
            inner,
            clear_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `clear_all` ran.
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for FailingGraphStore {
    async fn clear_all(&self) -> Result<(), StateStoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_all().await
    }

    async fn ensure_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StateStoreError> {
        self.inner.ensure_indexes(indexes).await
    }

    async fn apply_plan(&self, plan: &WritePlan) -> Result<WriteStats, StateStoreError> {
        info!(session_id = %plan.session.id, "FailingGraphStore rejecting transaction");
        Err(StateStoreError::TransactionError(
            "simulated transaction failure".to_string(),
        ))
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
