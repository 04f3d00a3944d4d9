//! libSQL backend for the flag store.
//!
//! Supports local file and in-memory databases. Expiry timestamps are stored
//! as fixed-width RFC 3339 strings so they compare correctly in SQL.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use super::traits::{FlagStore, expiry_from_ttl};
use crate::error::StorageError;
use crate::store::migrations;

/// libSQL flag store.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlFlagStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlFlagStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Flag store opened");
        Ok(store)
    }

    /// Create an in-memory database.
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Connection(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Delete every expired row. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, StorageError> {
        let count = self
            .conn()
            .execute(
                "DELETE FROM wizard_flags WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![timestamp(Utc::now())],
            )
            .await
            .map_err(|e| StorageError::Query(format!("purge_expired: {e}")))?;
        if count > 0 {
            debug!(count, "Purged expired wizard flags");
        }
        Ok(count)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Convert `Option<String>` to libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

fn is_expired(expires_at: Option<&str>, now: DateTime<Utc>) -> bool {
    match expires_at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|at| at.with_timezone(&Utc) <= now)
            .unwrap_or(true),
        None => false,
    }
}

#[async_trait]
impl FlagStore for LibSqlFlagStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT value, expires_at FROM wizard_flags WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| StorageError::Query(format!("get_flag: {e}")))?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(StorageError::Query(format!("get_flag: {e}"))),
        };

        // NULL expiry reads back as an error from `get::<String>`.
        let expires_at: Option<String> = row.get(1).ok();
        if is_expired(expires_at.as_deref(), Utc::now()) {
            return Ok(None);
        }

        let value_str: String = row
            .get(0)
            .map_err(|e| StorageError::Query(format!("get_flag: {e}")))?;
        serde_json::from_str(&value_str)
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let value_str =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let expires_at = opt_text_owned(expiry_from_ttl(ttl)?.map(timestamp));
        let now = timestamp(Utc::now());

        self.conn()
            .execute(
                "INSERT INTO wizard_flags (key, value, expires_at, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, expires_at = ?3, updated_at = ?4",
                params![key, value_str, expires_at, now],
            )
            .await
            .map_err(|e| StorageError::Query(format!("set_flag: {e}")))?;
        debug!(key, "Flag stored");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let count = self
            .conn()
            .execute(
                "DELETE FROM wizard_flags WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, timestamp(Utc::now())],
            )
            .await
            .map_err(|e| StorageError::Query(format!("remove_flag: {e}")))?;
        // Drop any expired leftover under the same key too.
        self.conn()
            .execute("DELETE FROM wizard_flags WHERE key = ?1", params![key])
            .await
            .map_err(|e| StorageError::Query(format!("remove_flag: {e}")))?;
        Ok(count > 0)
    }
}
