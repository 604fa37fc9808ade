//! SQLite-backed durable key-value cache tier.

use std::path::Path;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Row,
};

use crate::error::Result;

/// Durable key-value store shared by all gateway instances pointing at
/// the same database file.
///
/// This is the cross-instance tier of the resolution cache: values are
/// opaque strings, last write wins, and staleness is the reader's problem
/// (records carry their own creation timestamps).
#[derive(Debug, Clone)]
pub struct KvDatabase {
    pool: SqlitePool,
}

impl KvDatabase {
    /// Create a new database connection from a file path.
    pub async fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create an in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Read a value by key.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    /// Write a value, replacing any existing one.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a value. Deleting an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_kv_round_trip() {
        let db = KvDatabase::in_memory().await.unwrap();

        assert!(db.get("missing").await.unwrap().is_none());

        db.put("k", "v1").await.unwrap();
        assert_eq!(db.get("k").await.unwrap().as_deref(), Some("v1"));

        // last write wins
        db.put("k", "v2").await.unwrap();
        assert_eq!(db.get("k").await.unwrap().as_deref(), Some("v2"));

        db.delete("k").await.unwrap();
        assert!(db.get("k").await.unwrap().is_none());

        // deleting again is fine
        db.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cache").join("kv.sqlite");

        let db = KvDatabase::new(&path).await.unwrap();
        db.put("k", "v").await.unwrap();
        assert_eq!(db.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(path.exists());
    }
}
