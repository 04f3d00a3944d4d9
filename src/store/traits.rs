//! Flag storage port: key/value persistence with expiry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;

/// Backend-agnostic key/value store used to persist wizard flags across
/// reloads.
///
/// Entries written with a TTL read as absent once it has elapsed.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Read a value, or `None` if missing or expired.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Insert or replace a value. `ttl: None` never expires.
    async fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError>;

    /// Remove a value. Returns whether a live entry was removed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

/// Absolute expiry for a TTL starting now.
pub(crate) fn expiry_from_ttl(
    ttl: Option<Duration>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, StorageError> {
    ttl.map(|ttl| {
        let delta = chrono::Duration::from_std(ttl)
            .map_err(|e| StorageError::Serialization(format!("TTL out of range: {e}")))?;
        chrono::Utc::now()
            .checked_add_signed(delta)
            .ok_or_else(|| StorageError::Serialization(format!("TTL out of range: {ttl:?}")))
    })
    .transpose()
}
