use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use rutt_api::{CorrelationRecord, CorrelationStore, StoreError, StoreFuture, Update};

use super::config::{FileStoreConfig, file_stem};

// ════════════════════════════════════════════════════════════════
//  FileStore
// ════════════════════════════════════════════════════════════════

/// One compact JSON document per record: `{data_dir}/{stem}.json`.
///
/// Writes go to `{stem}.json.tmp` and are renamed over the target, so a
/// reader or a crash never observes a half-written document. All
/// writes of one store are serialized by `write_lock`; reads take no
/// lock.
pub struct FileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(config: &FileStoreConfig) -> Self {
        Self {
            data_dir: PathBuf::from(&config.data_dir),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", file_stem(id)))
    }

    // ── Read ──

    async fn read_record(&self, path: &Path) -> Result<Option<CorrelationRecord>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::unavailable(format!("read {}: {e}", path.display())));
            }
        };
        let record: CorrelationRecord = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::from(e).with_context(path.display()))?;
        Ok(Some(record))
    }

    // ── Write ──

    async fn write_record(&self, path: &Path, record: &CorrelationRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(record)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::unavailable(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::unavailable(format!("rename {}: {e}", path.display())))
    }

    async fn do_insert(&self, id: &str, record: CorrelationRecord) -> Result<(), StoreError> {
        let path = self.record_path(id);
        let _guard = self.write_lock.lock().await;

        if tokio::fs::try_exists(&path).await? {
            return Err(StoreError::duplicate_key(id));
        }
        self.write_record(&path, &record).await
    }

    async fn do_merge(&self, id: &str, update: &Update) -> Result<(), StoreError> {
        let path = self.record_path(id);
        let _guard = self.write_lock.lock().await;

        let mut record = match self.read_record(&path).await? {
            Some(r) => r,
            None => CorrelationRecord::upserted(id),
        };
        record.apply(update)?;
        self.write_record(&path, &record).await
    }
}

// ════════════════════════════════════════════════════════════════
//  CorrelationStore impl
// ════════════════════════════════════════════════════════════════

impl CorrelationStore for FileStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
                StoreError::unavailable(format!("mkdir {}: {e}", self.data_dir.display()))
            })?;
            tracing::debug!(dir = %self.data_dir.display(), "file store ready");
            Ok(())
        })
    }

    fn insert(&self, id: &str, record: CorrelationRecord) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move { self.do_insert(&id, record).await })
    }

    fn merge(&self, id: &str, update: &Update) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        let update = update.clone();
        Box::pin(async move { self.do_merge(&id, &update).await })
    }

    fn get(&self, id: &str) -> StoreFuture<'_, Option<CorrelationRecord>> {
        let path = self.record_path(id);
        Box::pin(async move { self.read_record(&path).await })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
