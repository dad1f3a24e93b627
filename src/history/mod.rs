//! Per-visitor history of generated tweets, stored in SQLite

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CopycatError, Result};

/// Maximum number of entries returned by [`HistoryStore::list`]
pub const HISTORY_LIMIT: i64 = 20;

const DEFAULT_MODE: &str = "auto";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tweets_history (
    id TEXT PRIMARY KEY,
    visitor_id TEXT NOT NULL,
    original_text TEXT NOT NULL,
    improved_text TEXT NOT NULL,
    is_thread INTEGER NOT NULL DEFAULT 0,
    mode TEXT NOT NULL DEFAULT 'auto',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tweets_history_visitor
    ON tweets_history (visitor_id, created_at);
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub visitor_id: String,
    pub original_text: String,
    pub improved_text: String,
    pub is_thread: bool,
    pub mode: String,
    pub created_at: String,
}

/// Body of `POST /api/history`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    #[serde(default)]
    pub visitor_id: String,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub improved_text: String,
    #[serde(default)]
    pub is_thread: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl NewHistoryEntry {
    pub fn validate(&self) -> Result<()> {
        if self.visitor_id.trim().is_empty()
            || self.original_text.trim().is_empty()
            || self.improved_text.trim().is_empty()
        {
            return Err(CopycatError::InvalidInput(
                "visitorId, originalText and improvedText are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Connect and make sure the schema exists.
    ///
    /// File databases are created on first use. `sqlite::memory:` is pinned
    /// to a single connection that never expires, otherwise every new
    /// connection would see an empty database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        info!(database_url, "History store ready");
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Newest entries for a visitor, at most [`HISTORY_LIMIT`]
    pub async fn list(&self, visitor_id: &str) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, visitor_id, original_text, improved_text, is_thread, mode, created_at \
             FROM tweets_history WHERE visitor_id = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(visitor_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                id: row.get("id"),
                visitor_id: row.get("visitor_id"),
                original_text: row.get("original_text"),
                improved_text: row.get("improved_text"),
                is_thread: row.get::<i64, _>("is_thread") != 0,
                mode: row.get("mode"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Insert an entry and return its generated id
    pub async fn insert(&self, entry: &NewHistoryEntry) -> Result<String> {
        entry.validate()?;

        let id = Uuid::new_v4().to_string();
        let mode = entry
            .mode
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODE);
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            "INSERT INTO tweets_history \
             (id, visitor_id, original_text, improved_text, is_thread, mode, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(entry.visitor_id.trim())
        .bind(&entry.original_text)
        .bind(&entry.improved_text)
        .bind(entry.is_thread as i64)
        .bind(mode)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, visitor_id = %entry.visitor_id, "Saved history entry");
        Ok(id)
    }

    /// Delete an entry owned by `visitor_id`. Returns whether a row was removed.
    pub async fn delete(&self, id: &str, visitor_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tweets_history WHERE id = ? AND visitor_id = ?")
            .bind(id)
            .bind(visitor_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> HistoryStore {
        HistoryStore::connect("sqlite::memory:").await.unwrap()
    }

    fn entry(visitor: &str, text: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            visitor_id: visitor.into(),
            original_text: text.into(),
            improved_text: format!("{} (improved)", text),
            is_thread: false,
            mode: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let store = store().await;
        store.insert(&entry("v1", "first")).await.unwrap();
        store.insert(&entry("v1", "second")).await.unwrap();
        store.insert(&entry("v2", "other visitor")).await.unwrap();

        let history = store.list("v1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].original_text, "second");
        assert_eq!(history[1].original_text, "first");
        assert_eq!(history[0].mode, "auto");
        assert!(!history[0].is_thread);
    }

    #[tokio::test]
    async fn test_list_is_limited() {
        let store = store().await;
        for i in 0..25 {
            store.insert(&entry("v1", &format!("tweet {}", i))).await.unwrap();
        }
        let history = store.list("v1").await.unwrap();
        assert_eq!(history.len(), HISTORY_LIMIT as usize);
        assert_eq!(history[0].original_text, "tweet 24");
    }

    #[tokio::test]
    async fn test_insert_keeps_thread_and_mode() {
        let store = store().await;
        let mut e = entry("v1", "thread");
        e.is_thread = true;
        e.mode = Some("thread".into());
        let id = store.insert(&e).await.unwrap();

        let history = store.list("v1").await.unwrap();
        assert_eq!(history[0].id, id);
        assert!(history[0].is_thread);
        assert_eq!(history[0].mode, "thread");
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_fields() {
        let store = store().await;
        let err = store.insert(&entry("  ", "text")).await.unwrap_err();
        assert!(matches!(err, CopycatError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_scoped_to_visitor() {
        let store = store().await;
        let id = store.insert(&entry("v1", "mine")).await.unwrap();

        assert!(!store.delete(&id, "v2").await.unwrap());
        assert_eq!(store.list("v1").await.unwrap().len(), 1);

        assert!(store.delete(&id, "v1").await.unwrap());
        assert!(store.list("v1").await.unwrap().is_empty());
    }
}
