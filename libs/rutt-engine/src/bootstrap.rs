use std::sync::Arc;

use rutt_api::CorrelationStore;
use rutt_storage_file::{FileStore, FileStoreConfig};
use rutt_storage_memory::MemoryStore;
use rutt_storage_sqlite::{SqliteStore, SqliteStoreConfig};

use crate::config::StoreConfig;
use crate::error::EngineError;

/// Backend selected by the scheme of the store connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File(FileStoreConfig),
    Sqlite(SqliteStoreConfig),
}

impl StoreBackend {
    pub fn from_config(config: &StoreConfig) -> Result<Self, EngineError> {
        let url = config.url.trim();

        if url == "memory:" || url == "memory://" {
            return Ok(StoreBackend::Memory);
        }
        if url.starts_with("file:") {
            return FileStoreConfig::from_url(url)
                .map(StoreBackend::File)
                .ok_or_else(|| EngineError::Config(format!("store url '{url}': missing directory")));
        }
        if let Some(sqlite) = SqliteStoreConfig::from_url(url, config.max_connections) {
            return Ok(StoreBackend::Sqlite(sqlite));
        }

        Err(EngineError::Config(format!(
            "unsupported store url '{url}' (expected memory:, file:<dir> or sqlite:<path>)"
        )))
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File(_) => "file",
            StoreBackend::Sqlite(_) => "sqlite",
        }
    }
}

/// Connect and initialize the configured store.
///
/// Called once at startup; the returned handle lives until shutdown,
/// when the caller is expected to `close` it.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn CorrelationStore>, EngineError> {
    let backend = StoreBackend::from_config(config)?;
    let store_ctx = format!("store '{}'", backend.name());

    let store: Arc<dyn CorrelationStore> = match &backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File(file) => Arc::new(FileStore::new(file)),
        StoreBackend::Sqlite(sqlite) => Arc::new(
            SqliteStore::connect(sqlite)
                .await
                .map_err(|e| EngineError::from(e).with_context(&store_ctx))?,
        ),
    };
    store
        .init()
        .await
        .map_err(|e| EngineError::from(e).with_context(&store_ctx))?;

    match &backend {
        StoreBackend::Memory => tracing::info!(backend = backend.name(), "store ready"),
        StoreBackend::File(file) => {
            tracing::info!(backend = backend.name(), dir = %file.data_dir, "store ready")
        }
        StoreBackend::Sqlite(sqlite) => {
            tracing::info!(backend = backend.name(), url = %sqlite.url, "store ready")
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use rutt_api::CorrelationRecord;

    use super::*;

    fn store_config(url: &str) -> StoreConfig {
        StoreConfig {
            url: url.to_string(),
            max_connections: None,
        }
    }

    #[test]
    fn schemes_select_backends() {
        assert_eq!(
            StoreBackend::from_config(&store_config("memory:")).unwrap(),
            StoreBackend::Memory
        );
        assert_eq!(
            StoreBackend::from_config(&store_config("file:///var/lib/rutt")).unwrap(),
            StoreBackend::File(FileStoreConfig {
                data_dir: "/var/lib/rutt".to_string()
            })
        );
        let backend = StoreBackend::from_config(&StoreConfig {
            url: "sqlite:.data/rutt.db".to_string(),
            max_connections: Some(2),
        })
        .unwrap();
        match backend {
            StoreBackend::Sqlite(sqlite) => assert_eq!(sqlite.max_connections, 2),
            other => panic!("expected sqlite, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scheme_is_config_error() {
        for url in ["mongodb://localhost:27017", "file:", ""] {
            let err = StoreBackend::from_config(&store_config(url)).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "{url}: {err}");
        }
    }

    #[tokio::test]
    async fn opens_memory_store() {
        let store = open_store(&store_config("memory:")).await.unwrap();
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();
        assert!(store.get("c1").await.unwrap().is_some());
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn opens_file_store_and_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("records");
        let url = format!("file:{}", data_dir.display());

        let store = open_store(&store_config(&url)).await.unwrap();
        assert!(data_dir.is_dir());
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();
        assert!(data_dir.join("c1.json").is_file());
    }

    #[tokio::test]
    async fn opens_migrated_sqlite_store() {
        let store = open_store(&store_config("sqlite::memory:")).await.unwrap();
        store
            .insert("c1", CorrelationRecord::created("c1", "s1"))
            .await
            .unwrap();
        assert_eq!(
            store.get("c1").await.unwrap(),
            Some(CorrelationRecord::created("c1", "s1"))
        );
        store.close().await.unwrap();
    }
}
