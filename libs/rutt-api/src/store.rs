use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;
use crate::record::{CorrelationRecord, Update};

/// Boxed future returned by every store method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Backing store for correlation records, one document per id.
///
/// Implementations: memory, file, sqlite. The server holds exactly one
/// instance for its whole lifetime and hands it out as
/// `Arc<dyn CorrelationStore>`.
///
/// Atomicity contract:
/// - `insert` and `merge` are atomic per record;
/// - a `merge` never loses a concurrent `merge` to a different path of
///   the same record, nor a concurrent `insert` of the same id;
/// - concurrent merges of the same path are last-writer-wins.
pub trait CorrelationStore: Send + Sync {
    /// Prepare the backend (directories, schema). Called once at startup.
    fn init(&self) -> StoreFuture<'_, ()>;

    /// Insert a new record. `DuplicateKey` if `id` already has one,
    /// whether it was created or upserted.
    fn insert(&self, id: &str, record: CorrelationRecord) -> StoreFuture<'_, ()>;

    /// Merge-upsert: apply `update` to the record of `id`, starting from
    /// [`CorrelationRecord::upserted`] if there is none. Nothing is
    /// persisted when the update fails.
    fn merge(&self, id: &str, update: &Update) -> StoreFuture<'_, ()>;

    /// Current snapshot of the record of `id`.
    fn get(&self, id: &str) -> StoreFuture<'_, Option<CorrelationRecord>>;

    /// Release backend resources (at process shutdown).
    fn close(&self) -> StoreFuture<'_, ()>;
}
