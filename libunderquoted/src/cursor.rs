//! Persistent progress cursor
//!
//! The cursor is the id of the last mention handled. It is the only state
//! shared between passes, so a crash mid-pass resumes after the last mention
//! whose reply was attempted.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{CursorError, Result};

/// Logical key the mention cursor is stored under
pub const SINCE_ID_KEY: &str = "since_id";

/// Storage for the single mention cursor
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// The stored cursor, `None` when absent or blank
    async fn get(&self) -> Result<Option<String>>;

    /// Replace the stored cursor
    async fn set(&self, value: &str) -> Result<()>;

    /// Remove the stored cursor
    async fn clear(&self) -> Result<()>;
}

/// Trim a stored value, treating blank values as absent
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// SQLite-backed cursor store
#[derive(Clone)]
pub struct SqliteCursorStore {
    pool: SqlitePool,
    key: String,
}

impl SqliteCursorStore {
    /// Open (creating if needed) the cursor database at `db_path`
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CursorError::IoError)?;
        }

        // mode=rwc creates the database file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(CursorError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(CursorError::MigrationError)?;

        Ok(Self {
            pool,
            key: SINCE_ID_KEY.to_string(),
        })
    }
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    async fn get(&self) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            r#"
            SELECT value FROM cursors WHERE key = ?
            "#,
        )
        .bind(&self.key)
        .fetch_optional(&self.pool)
        .await
        .map_err(CursorError::SqlxError)?;

        Ok(normalize(value))
    }

    async fn set(&self, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cursors (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(CursorError::SqlxError)?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM cursors WHERE key = ?
            "#,
        )
        .bind(&self.key)
        .execute(&self.pool)
        .await
        .map_err(CursorError::SqlxError)?;

        Ok(())
    }
}

/// In-process cursor store that records its calls
#[derive(Clone, Default)]
pub struct MemoryCursorStore {
    value: Arc<Mutex<Option<String>>>,
    get_calls: Arc<Mutex<usize>>,
    set_calls: Arc<Mutex<Vec<String>>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store starting out with `value` as its cursor
    pub fn with_value(value: &str) -> Self {
        let store = Self::default();
        *store.value.lock().unwrap() = Some(value.to_string());
        store
    }

    /// Current raw value
    pub fn value(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        *self.get_calls.lock().unwrap()
    }

    /// Every value passed to `set`, in order
    pub fn set_history(&self) -> Vec<String> {
        self.set_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn get(&self) -> Result<Option<String>> {
        *self.get_calls.lock().unwrap() += 1;
        Ok(normalize(self.value()))
    }

    async fn set(&self, value: &str) -> Result<()> {
        self.set_calls.lock().unwrap().push(value.to_string());
        *self.value.lock().unwrap() = Some(value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.value.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn sqlite_store() -> (SqliteCursorStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cursor.db");
        let store = SqliteCursorStore::new(db_path.to_str().unwrap())
            .await
            .unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(String::new())), None);
        assert_eq!(normalize(Some("  \n".to_string())), None);
        assert_eq!(normalize(Some(" 123\n".to_string())), Some("123".to_string()));
    }

    #[tokio::test]
    async fn test_sqlite_empty_store() {
        let (store, _dir) = sqlite_store().await;

        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_set_get_overwrite() {
        let (store, _dir) = sqlite_store().await;

        store.set("123").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("123".to_string()));

        store.set("456").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("456".to_string()));
    }

    #[tokio::test]
    async fn test_sqlite_clear() {
        let (store, _dir) = sqlite_store().await;

        store.set("123").await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_trims_stored_value() {
        let (store, _dir) = sqlite_store().await;

        store.set("  789 \n").await.unwrap();

        assert_eq!(store.get().await.unwrap(), Some("789".to_string()));
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("cursor.db");
        let db_path = db_path.to_str().unwrap();

        {
            let store = SqliteCursorStore::new(db_path).await.unwrap();
            store.set("110").await.unwrap();
        }

        let reopened = SqliteCursorStore::new(db_path).await.unwrap();
        assert_eq!(reopened.get().await.unwrap(), Some("110".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_records_calls() {
        let store = MemoryCursorStore::with_value("3");

        assert_eq!(store.get().await.unwrap(), Some("3".to_string()));
        store.set("4").await.unwrap();
        store.set("5").await.unwrap();

        assert_eq!(store.get_count(), 1);
        assert_eq!(store.set_history(), vec!["4", "5"]);
        assert_eq!(store.value(), Some("5".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
    }
}
