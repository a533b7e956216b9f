use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Storage keys, one per entity collection.
pub mod keys {
    pub const METERS: &str = "meters";
    pub const CATEGORIES: &str = "categories";
    pub const SETTINGS: &str = "settings";
    pub const USERS: &str = "users";
    pub const REMINDERS: &str = "reminders";
    pub const ACTIVITIES: &str = "activities";
}

/// Key-value persistence for whole entity collections.
///
/// Each collection is stored as a single JSON document. Cloning is cheap and
/// every clone talks to the same backing store.
#[derive(Debug, Clone)]
pub enum KvStore {
    Sqlite(SqlitePool),
    /// Process-local map; used in tests and ephemeral runs.
    Memory(Arc<Mutex<HashMap<String, String>>>),
}

impl KvStore {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::Sqlite(pool)
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::default())
    }

    /// Raw document stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        match self {
            Self::Sqlite(pool) => {
                sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = ?")
                    .bind(key)
                    .fetch_optional(pool)
                    .await
            }
            Self::Memory(map) => Ok(map.lock().await.get(key).cloned()),
        }
    }

    /// Insert or overwrite the document stored under `key`.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        match self {
            Self::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO kv_entries (key, value, updated_at)
                    VALUES (?, ?, ?)
                    ON CONFLICT (key) DO UPDATE
                        SET value = excluded.value,
                            updated_at = excluded.updated_at
                    "#,
                )
                .bind(key)
                .bind(value)
                .bind(Utc::now())
                .execute(pool)
                .await?;
                Ok(())
            }
            Self::Memory(map) => {
                map.lock().await.insert(key.to_owned(), value.to_owned());
                Ok(())
            }
        }
    }

    /// Load and decode the collection under `key`.
    ///
    /// Read failures and undecodable documents are logged and reported as
    /// `None`, so callers fall back to an empty or default collection.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read collection; using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored collection is not valid; using default");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it under `key`.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.put(key, &json).await?;
        debug!(key, bytes = json.len(), "Collection persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_get_missing_is_none() {
        let kv = KvStore::memory();
        assert!(kv.get("meters").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_clone_shares_state() {
        let kv = KvStore::memory();
        let clone = kv.clone();
        kv.put("k", "v").await.unwrap();
        assert_eq!(clone.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn load_invalid_document_falls_back_to_none() {
        let kv = KvStore::memory();
        kv.put(keys::METERS, "{not json").await.unwrap();
        let loaded: Option<Vec<String>> = kv.load(keys::METERS).await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_then_load_typed_collection() {
        let kv = KvStore::memory();
        kv.save(keys::CATEGORIES, &vec!["a".to_owned(), "b".to_owned()])
            .await
            .unwrap();
        let loaded: Vec<String> = kv.load(keys::CATEGORIES).await.unwrap();
        assert_eq!(loaded, vec!["a", "b"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sqlite_missing_key_is_none(pool: SqlitePool) {
        let kv = KvStore::sqlite(pool);
        assert!(kv.get(keys::USERS).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sqlite_put_overwrites_existing_value(pool: SqlitePool) {
        let kv = KvStore::sqlite(pool.clone());
        kv.put(keys::SETTINGS, "1").await.unwrap();
        kv.put(keys::SETTINGS, "2").await.unwrap();

        assert_eq!(kv.get(keys::SETTINGS).await.unwrap().as_deref(), Some("2"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sqlite_load_invalid_document_is_none(pool: SqlitePool) {
        let kv = KvStore::sqlite(pool);
        kv.put(keys::REMINDERS, "[{\"id\":").await.unwrap();
        let loaded: Option<Vec<u32>> = kv.load(keys::REMINDERS).await;
        assert!(loaded.is_none());
    }
}
