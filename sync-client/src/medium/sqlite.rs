//! SQLite medium.

use super::KvMedium;
use crate::error::StorageError;
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SQLite-backed key-value medium.
///
/// Uses WAL mode for concurrent reads/writes. One table, `kv(key, value)`.
#[derive(Debug, Clone)]
pub struct SqliteMedium {
    pool: SqlitePool,
}

impl SqliteMedium {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let medium = Self { pool };
        medium.run_migrations().await?;
        Ok(medium)
    }

    /// Create an in-memory database (for testing).
    ///
    /// A single connection that never idles out, so the data lives as long
    /// as the medium.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let medium = Self { pool };
        medium.run_migrations().await?;
        Ok(medium)
    }

    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close the pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KvMedium for SqliteMedium {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    async fn probe(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let medium = SqliteMedium::in_memory().await.unwrap();
        medium.set("a", "1").await.unwrap();
        assert_eq!(medium.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(medium.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites() {
        let medium = SqliteMedium::in_memory().await.unwrap();
        medium.set("a", "1").await.unwrap();
        medium.set("a", "2").await.unwrap();
        assert_eq!(medium.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(medium.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let medium = SqliteMedium::in_memory().await.unwrap();
        medium.set("a", "1").await.unwrap();
        medium.remove("a").await.unwrap();
        medium.remove("a").await.unwrap();
        assert!(medium.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_are_sorted() {
        let medium = SqliteMedium::in_memory().await.unwrap();
        medium.set("b", "2").await.unwrap();
        medium.set("a", "1").await.unwrap();
        assert_eq!(medium.keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        let medium = SqliteMedium::open(&path).await.unwrap();
        medium.set("persisted", "yes").await.unwrap();
        medium.close().await;

        let reopened = SqliteMedium::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("persisted").await.unwrap().as_deref(),
            Some("yes")
        );
        assert!(reopened.probe().await.is_ok());
    }

    #[tokio::test]
    async fn open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("cache.db");
        assert!(SqliteMedium::open(&path).await.is_err());
    }
}
