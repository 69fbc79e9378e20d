//! SQLite-backed correlation store.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;

use rutt_api::{CorrelationRecord, CorrelationStore, StoreError, StoreFuture, Update};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn default_max_connections() -> u32 {
    5
}

/// Connection settings, built from a `sqlite:` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStoreConfig {
    pub url: String,
    pub max_connections: u32,
}

impl SqliteStoreConfig {
    /// Accepts `sqlite:<path>`, `sqlite://<path>` and `sqlite::memory:`,
    /// optionally followed by `?<options>`.
    pub fn from_url(url: &str, max_connections: Option<u32>) -> Option<Self> {
        url.strip_prefix("sqlite:")?;
        Some(Self {
            url: url.to_string(),
            max_connections: max_connections.unwrap_or_else(default_max_connections),
        })
    }

    fn location(&self) -> &str {
        let rest = self.url.strip_prefix("sqlite:").unwrap_or(&self.url);
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        rest.split('?').next().unwrap_or_default()
    }

    /// An in-memory database lives in a single connection.
    pub fn is_memory(&self) -> bool {
        let location = self.location();
        location == ":memory:" || self.url.contains("mode=memory")
    }

    /// Database file, if any.
    pub fn database_path(&self) -> Option<PathBuf> {
        let location = self.location();
        if location.is_empty() || self.is_memory() {
            return None;
        }
        Some(PathBuf::from(location))
    }
}

fn db_error(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::unavailable(format!("sqlite {operation}: {e}"))
}

/// SQLite-backed store: table `correlation_records(id, doc)`.
///
/// The document is merged in Rust with the same `merge_at` primitive as
/// every other backend and written back in one transaction. Writers of
/// one store are serialized by `write_lock`, so a read-modify-write never
/// races with another insert or merge.
pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteStore {
    /// Create a store from an existing pool. Call `init` to migrate.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the database (creating the file and its parent directory when
    /// missing). The schema is applied by `init`.
    pub async fn connect(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        if let Some(path) = config.database_path()
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::unavailable(format!("create directory {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| db_error("parse url", e))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if config.is_memory() {
            pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect", e))?;

        Ok(Self::new(pool))
    }

    async fn do_insert(&self, id: &str, record: &CorrelationRecord) -> Result<(), StoreError> {
        let doc = serde_json::to_string(record)?;
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query(
            r#"
            INSERT INTO correlation_records (id, doc)
            VALUES (?, ?)
            "#,
        )
        .bind(id)
        .bind(doc)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::duplicate_key(id))
            }
            Err(e) => Err(db_error("insert", e)),
        }
    }

    async fn do_merge(&self, id: &str, update: &Update) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(|e| db_error("begin", e))?;

        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT doc FROM correlation_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("select", e))?;

        let mut record = match row {
            Some((doc,)) => serde_json::from_str::<CorrelationRecord>(&doc)
                .map_err(|e| StoreError::from(e).with_context(format!("record '{id}'")))?,
            None => CorrelationRecord::upserted(id),
        };
        // Dropping `tx` on error rolls back.
        record.apply(update)?;
        let doc = serde_json::to_string(&record)?;

        sqlx::query(
            r#"
            INSERT INTO correlation_records (id, doc)
            VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET doc = excluded.doc
            "#,
        )
        .bind(id)
        .bind(doc)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("upsert", e))?;

        tx.commit().await.map_err(|e| db_error("commit", e))
    }

    async fn do_get(&self, id: &str) -> Result<Option<CorrelationRecord>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT doc FROM correlation_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("select", e))?;

        match row {
            Some((doc,)) => {
                let record = serde_json::from_str(&doc)
                    .map_err(|e| StoreError::from(e).with_context(format!("record '{id}'")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl CorrelationStore for SqliteStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            MIGRATOR
                .run(&self.pool)
                .await
                .map_err(|e| StoreError::unavailable(format!("sqlite migrate: {e}")))?;
            tracing::debug!("sqlite store migrated");
            Ok(())
        })
    }

    fn insert(&self, id: &str, record: CorrelationRecord) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move { self.do_insert(&id, &record).await })
    }

    fn merge(&self, id: &str, update: &Update) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        let update = update.clone();
        Box::pin(async move { self.do_merge(&id, &update).await })
    }

    fn get(&self, id: &str) -> StoreFuture<'_, Option<CorrelationRecord>> {
        let id = id.to_string();
        Box::pin(async move { self.do_get(&id).await })
    }

    fn close(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.pool.close().await;
            Ok(())
        })
    }
}
