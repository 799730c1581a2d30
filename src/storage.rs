use anyhow::Context;
use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;

// Logical keys in the key-value store
pub const SETTINGS_KEY: &str = "nexus_settings";
pub const HISTORY_KEY: &str = "nexus_history";

const DB_FILE_NAME: &str = "nexus.sqlite";

// Single key-value table; each logical record is one JSON document
const MIGRATIONS_SQL: &str = "
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL -- Unix Timestamp (milliseconds)
);
";

/// Persistent string key-value store shared by the settings and history stores.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

// --- SQLite-backed store ---

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database inside `data_dir` and runs migrations.
    pub async fn open(data_dir: &Path) -> Result<Self, anyhow::Error> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .context("Failed to create database directory")?;

        let db_path = data_dir.join(DB_FILE_NAME);
        let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        log::info!("Connecting to database: {}", db_url);

        if !Sqlite::database_exists(&db_url).await.unwrap_or(false) {
            log::info!("Database file not found, creating...");
            Sqlite::create_database(&db_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // One session, one writer
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), anyhow::Error> {
        log::debug!("Running database migrations...");
        sqlx::query(MIGRATIONS_SQL)
            .execute(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        log::debug!("Reading key '{}' from database", key);
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read key '{}' from database", key))?;

        row.map(|r| r.try_get::<String, _>("value"))
            .transpose()
            .with_context(|| format!("Failed to decode value for key '{}'", key))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();
        sqlx::query("INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(updated_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to write key '{}' to database", key))?;
        log::debug!("Wrote key '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete key '{}' from database", key))?;

        if result.rows_affected() == 0 {
            log::debug!("Key '{}' was already absent", key);
        } else {
            log::warn!("Deleted key '{}'", key);
        }
        Ok(())
    }
}

// --- In-memory store (tests and `--memory` sessions) ---

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Wraps a `MemoryStore` whose reads or writes can be switched to fail.
#[cfg(test)]
pub(crate) mod failing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    pub struct FailingStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FailingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                anyhow::bail!("database is locked");
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("database is locked");
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> anyhow::Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                anyhow::bail!("database is locked");
            }
            self.inner.remove(key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(dir.path()).await.unwrap();
            store.set(SETTINGS_KEY, "{\"a\":1}").await.unwrap();
        }
        let store = SqliteStore::open(dir.path()).await.unwrap();
        assert_eq!(
            store.get(SETTINGS_KEY).await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn sqlite_store_overwrites_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path()).await.unwrap();

        store.set(HISTORY_KEY, "[]").await.unwrap();
        store.set(HISTORY_KEY, "[1]").await.unwrap();
        assert_eq!(store.get(HISTORY_KEY).await.unwrap().as_deref(), Some("[1]"));

        store.remove(HISTORY_KEY).await.unwrap();
        assert!(store.get(HISTORY_KEY).await.unwrap().is_none());

        // Removing again is a no-op
        store.remove(HISTORY_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
