//! Bearer token storage.
//!
//! Tokens carry a client-side expiry; an expired token reads as absent.
//! There is no refresh flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;

/// A bearer token with an optional expiry.
#[derive(Debug, Clone)]
pub struct StoredToken {
    pub token: SecretString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.expose_secret().is_empty() && self.expires_at.is_none_or(|at| now < at)
    }
}

/// Source of the bearer credential for backend calls.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` if missing or expired.
    async fn get_token(&self) -> Option<SecretString>;
}

/// Token store holding a single token in memory.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<StoredToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    /// Replace the stored token (e.g. after a fresh login).
    pub async fn set(&self, token: StoredToken) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self) -> Option<SecretString> {
        let guard = self.token.read().await;
        let stored = guard.as_ref()?;
        if stored.is_valid_at(Utc::now()) {
            Some(stored.token.clone())
        } else {
            tracing::debug!("Stored API token has expired");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn valid_token_is_returned() {
        let store = MemoryTokenStore::new(Some(StoredToken::new(
            "abc",
            Some(Utc::now() + chrono::Duration::hours(1)),
        )));
        assert_eq!(store.get_token().await.unwrap().expose_secret(), "abc");
    }

    #[tokio::test]
    async fn expired_token_reads_absent() {
        let store = MemoryTokenStore::new(Some(StoredToken::new(
            "abc",
            Some(Utc::now() - chrono::Duration::seconds(1)),
        )));
        assert!(store.get_token().await.is_none());
    }

    #[test]
    fn token_without_expiry_never_expires() {
        let token = StoredToken::new("abc", None);
        assert!(token.is_valid_at(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn empty_token_is_invalid() {
        assert!(!StoredToken::new("", None).is_valid_at(Utc::now()));
    }

    #[tokio::test]
    async fn set_and_clear() {
        let store = MemoryTokenStore::default();
        assert!(store.get_token().await.is_none());
        store.set(StoredToken::new("t1", None)).await;
        assert_eq!(store.get_token().await.unwrap().expose_secret(), "t1");
        store.clear().await;
        assert!(store.get_token().await.is_none());
    }
}
