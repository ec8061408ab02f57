//! libSQL backend — durable `OnboardingStore` implementation.
//!
//! Supports local file and in-memory databases. Drafts live in the
//! `onboarding_drafts` table keyed by `(scope, key)`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::OnboardingStore;

/// libSQL draft store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to create in-memory database: {e}")))?;

        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// All scopes holding at least one draft, sorted.
    pub async fn list_scopes(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT DISTINCT scope FROM onboarding_drafts ORDER BY scope",
                (),
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_scopes: {e}")))?;

        let mut scopes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_scopes: {e}")))?
        {
            let scope: String = row
                .get(0)
                .map_err(|e| StoreError::Query(format!("list_scopes: {e}")))?;
            scopes.push(scope);
        }
        Ok(scopes)
    }

    /// Delete drafts not written to for `keep_days` days.
    /// Returns the number of drafts deleted.
    pub async fn prune_older_than(&self, keep_days: u32) -> Result<usize, StoreError> {
        let cutoff = (Utc::now() - Duration::days(i64::from(keep_days))).to_rfc3339();
        let count = self
            .conn()
            .execute(
                "DELETE FROM onboarding_drafts WHERE updated_at < ?1",
                params![cutoff],
            )
            .await
            .map_err(|e| StoreError::Query(format!("prune_older_than: {e}")))?;
        if count > 0 {
            info!(count, keep_days, "Pruned abandoned onboarding drafts");
        }
        Ok(count as usize)
    }
}

#[async_trait]
impl OnboardingStore for LibSqlBackend {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT value FROM onboarding_drafts WHERE scope = ?1 AND key = ?2",
                params![scope, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("get: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO onboarding_drafts (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (scope, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![scope, key, value, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set: {e}")))?;
        debug!(scope, key, bytes = value.len(), "Draft written");
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let count = self
            .conn()
            .execute(
                "DELETE FROM onboarding_drafts WHERE scope = ?1 AND key = ?2",
                params![scope, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("remove: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    #[tokio::test]
    async fn draft_crud() {
        let db = test_db().await;

        db.set("session1", "draft", r#"{"currentStep":"plan-selection"}"#)
            .await
            .unwrap();
        let fetched = db.get("session1", "draft").await.unwrap().unwrap();
        assert_eq!(fetched, r#"{"currentStep":"plan-selection"}"#);

        // Update (upsert)
        db.set("session1", "draft", r#"{"currentStep":"account-setup"}"#)
            .await
            .unwrap();
        let fetched2 = db.get("session1", "draft").await.unwrap().unwrap();
        assert!(fetched2.contains("account-setup"));

        // Delete
        assert!(db.remove("session1", "draft").await.unwrap());
        assert!(db.get("session1", "draft").await.unwrap().is_none());

        // Delete non-existent
        assert!(!db.remove("session1", "draft").await.unwrap());
    }

    #[tokio::test]
    async fn scope_isolation() {
        let db = test_db().await;
        db.set("a", "draft", "one").await.unwrap();
        db.set("b", "draft", "two").await.unwrap();

        assert_eq!(db.get("a", "draft").await.unwrap().as_deref(), Some("one"));
        assert_eq!(db.get("b", "draft").await.unwrap().as_deref(), Some("two"));
        assert_eq!(db.list_scopes().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stores_raw_text_verbatim() {
        let db = test_db().await;
        db.set("s", "draft", "{not json").await.unwrap();
        assert_eq!(db.get("s", "draft").await.unwrap().as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn prune_drops_only_stale_drafts() {
        let db = test_db().await;
        db.set("fresh", "draft", "{}").await.unwrap();
        db.conn()
            .execute(
                "INSERT INTO onboarding_drafts (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params!["stale", "draft", "{}", "2000-01-01T00:00:00+00:00"],
            )
            .await
            .unwrap();

        let pruned = db.prune_older_than(30).await.unwrap();
        assert_eq!(pruned, 1);
        assert_eq!(db.list_scopes().await.unwrap(), vec!["fresh"]);
    }

    #[tokio::test]
    async fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("dir").join("drafts.db");
        let db = LibSqlBackend::new_local(&db_path).await.unwrap();
        db.set("s", "k", "v").await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("drafts.db");
        {
            let db = LibSqlBackend::new_local(&db_path).await.unwrap();
            db.set("s", "k", "persisted").await.unwrap();
        }
        let reopened = LibSqlBackend::new_local(&db_path).await.unwrap();
        assert_eq!(reopened.get("s", "k").await.unwrap().as_deref(), Some("persisted"));
    }
}
