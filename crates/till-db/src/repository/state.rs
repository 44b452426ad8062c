//! # State Repository
//!
//! Key-value JSON documents in the `kv_state` table.
//!
//! ```text
//! key            value
//! ─────────────  ──────────────────────────────────────────────────
//! cashRegister   {"isOpen":true,"initialAmount":10000,"movements":[...]}
//! customers      [{"id":"...","name":"Maria",...}, ...]
//! ```
//!
//! Writes replace the whole document (upsert on `key`).

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use till_core::{StateStore, StoreResult};

#[derive(Debug, Clone)]
pub struct StateRepository {
    pool: SqlitePool,
}

impl StateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StateRepository { pool }
    }

    /// Reads a document. `None` if the key was never written.
    pub async fn get(&self, key: &str) -> DbResult<Option<Value>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_state WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Writes a document, replacing any previous value.
    pub async fn put(&self, key: &str, value: &Value) -> DbResult<()> {
        let text = serde_json::to_string(value)?;
        debug!(key = %key, bytes = text.len(), "Saving state document");

        sqlx::query(
            r#"
            INSERT INTO kv_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads and decodes a typed document.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn put_as<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let value = serde_json::to_value(value)?;
        self.put(key, &value).await
    }
}

#[async_trait]
impl StateStore for StateRepository {
    async fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.get(key).await?)
    }

    async fn save(&self, key: &str, value: &Value) -> StoreResult<()> {
        Ok(self.put(key, value).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.state().load("cashRegister").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_document() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = db.state();

        state.save("cashRegister", &json!({"isOpen": true})).await.unwrap();
        state.save("cashRegister", &json!({"isOpen": false})).await.unwrap();

        let loaded = state.load("cashRegister").await.unwrap().unwrap();
        assert_eq!(loaded, json!({"isOpen": false}));
    }

    #[tokio::test]
    async fn test_typed_access() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = db.state();

        state.put_as("counts", &vec![1, 2, 3]).await.unwrap();
        let counts: Vec<i32> = state.get_as("counts").await.unwrap().unwrap();
        assert_eq!(counts, vec![1, 2, 3]);

        let err = state.get_as::<String>("counts").await.unwrap_err();
        assert!(matches!(err, crate::error::DbError::Serialization(_)));
    }
}
