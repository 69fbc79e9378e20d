use std::sync::Arc;

use rutt_api::{CorrelationRecord, CorrelationStore, FieldPath, Operation, StoreError, Update};

use crate::bootstrap::open_store;
use crate::config::StoreConfig;
use crate::error::EngineError;

/// Correlation tracker: the five tracking operations over one store.
///
/// Cheap to clone; every clone shares the same store handle.
#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn CorrelationStore>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker").finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(store: Arc<dyn CorrelationStore>) -> Self {
        Self { store }
    }

    /// Open the configured store and wrap it.
    pub async fn bootstrap(config: &StoreConfig) -> Result<Self, EngineError> {
        Ok(Self::new(open_store(config).await?))
    }

    /// Insert `{_id, sourceId}`. `DuplicateKey` if the id already has a
    /// record, including one created implicitly by an update.
    pub async fn create(&self, correlation_id: &str, source_id: &str) -> Result<(), StoreError> {
        self.store
            .insert(correlation_id, CorrelationRecord::created(correlation_id, source_id))
            .await?;
        tracing::debug!(correlation_id, source_id, "record created");
        Ok(())
    }

    pub async fn set_queued(&self, correlation_id: &str, time_queued: &str) -> Result<(), StoreError> {
        self.merge(correlation_id, Update::new(FieldPath::time_queued(), time_queued))
            .await
    }

    pub async fn set_field(
        &self,
        correlation_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.merge(correlation_id, Update::new(FieldPath::field(field)?, value))
            .await
    }

    pub async fn set_destination_queued(
        &self,
        correlation_id: &str,
        destination_id: &str,
        message_id: &str,
        time_queued: &str,
    ) -> Result<(), StoreError> {
        let path = FieldPath::destination_time_queued(destination_id, message_id)?;
        self.merge(correlation_id, Update::new(path, time_queued))
            .await
    }

    pub async fn set_destination_field(
        &self,
        correlation_id: &str,
        destination_id: &str,
        message_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let path = FieldPath::destination_field(destination_id, message_id, field)?;
        self.merge(correlation_id, Update::new(path, value)).await
    }

    /// Current snapshot of a record; `None` if it was never written.
    pub async fn get(&self, correlation_id: &str) -> Result<Option<CorrelationRecord>, StoreError> {
        self.store.get(correlation_id).await
    }

    /// Execute a decoded request.
    pub async fn apply(&self, operation: &Operation) -> Result<(), StoreError> {
        match operation {
            Operation::New {
                correlation_id,
                source_id,
            } => self.create(correlation_id, source_id).await,
            other => match other.update()? {
                Some(update) => self.merge(other.correlation_id(), update).await,
                None => Ok(()),
            },
        }
    }

    /// Release the store.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.store.close().await?;
        tracing::info!("store closed");
        Ok(())
    }

    async fn merge(&self, correlation_id: &str, update: Update) -> Result<(), StoreError> {
        self.store.merge(correlation_id, &update).await?;
        tracing::debug!(correlation_id, path = %update.path, "record updated");
        Ok(())
    }
}
