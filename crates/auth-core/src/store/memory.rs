//! In-process token store.

use crate::errors::AuthError;
use crate::models::TokenRecord;
use crate::store::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Token store backed by a process-local map.
///
/// Record mutation happens under the write lock, so readers always
/// observe a whole record. Suitable for tests and single-process
/// deployments; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered records, expired and revoked included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn register(
        &self,
        token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut records = self.records.write().await;
        match records.entry(token.to_string()) {
            Entry::Occupied(_) => Err(AuthError::DuplicateToken),
            Entry::Vacant(slot) => {
                slot.insert(TokenRecord {
                    revoked: false,
                    issued_at,
                    expires_at,
                });
                Ok(())
            }
        }
    }

    async fn lookup(&self, token: &str) -> Result<Option<TokenRecord>, AuthError> {
        Ok(self.records.read().await.get(token).cloned())
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        if let Some(record) = self.records.write().await.get_mut(token) {
            record.revoked = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn lifetimes(ttl_secs: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now, now + Duration::seconds(ttl_secs))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let store = MemoryTokenStore::new();
        let (issued_at, expires_at) = lifetimes(60);

        store.register("tok-1", issued_at, expires_at).await.unwrap();

        let record = store.lookup("tok-1").await.unwrap().unwrap();
        assert!(!record.revoked);
        assert_eq!(record.issued_at, issued_at);
        assert_eq!(record.expires_at, expires_at);
        assert!(store.is_usable("tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_unknown_token() {
        let store = MemoryTokenStore::new();

        assert_eq!(store.lookup("unknown").await.unwrap(), None);
        assert!(!store.is_usable("unknown").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let store = MemoryTokenStore::new();
        let (issued_at, expires_at) = lifetimes(60);

        store.register("tok-1", issued_at, expires_at).await.unwrap();
        let result = store.register("tok-1", issued_at, expires_at).await;

        assert!(matches!(result, Err(AuthError::DuplicateToken)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryTokenStore::new();
        let (issued_at, expires_at) = lifetimes(60);
        store.register("tok-1", issued_at, expires_at).await.unwrap();

        store.revoke("tok-1").await.unwrap();
        let after_first = store.lookup("tok-1").await.unwrap();

        store.revoke("tok-1").await.unwrap();
        let after_second = store.lookup("tok-1").await.unwrap();

        assert_eq!(after_first, after_second);
        assert!(after_second.unwrap().revoked);
        assert!(!store.is_usable("tok-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_noop() {
        let store = MemoryTokenStore::new();

        store.revoke("unknown").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_record_is_unusable() {
        let store = MemoryTokenStore::new();
        let now = Utc::now();
        store
            .register("tok-1", now - Duration::seconds(120), now - Duration::seconds(60))
            .await
            .unwrap();

        // Never revoked, but past its store-side expiry.
        assert!(!store.is_usable("tok-1").await.unwrap());
        assert!(!store.lookup("tok-1").await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn test_concurrent_revokes_and_reads_observe_whole_records() {
        let store = Arc::new(MemoryTokenStore::new());

        for i in 0..100 {
            let token = format!("tok-{i}");
            let (issued_at, expires_at) = lifetimes(60);
            store.register(&token, issued_at, expires_at).await.unwrap();

            let (a, b, c) = {
                let s1 = Arc::clone(&store);
                let s2 = Arc::clone(&store);
                let s3 = Arc::clone(&store);
                let t1 = token.clone();
                let t2 = token.clone();
                let t3 = token.clone();
                tokio::join!(
                    tokio::spawn(async move { s1.revoke(&t1).await }),
                    tokio::spawn(async move { s2.revoke(&t2).await }),
                    tokio::spawn(async move { s3.is_usable(&t3).await }),
                )
            };

            // Both revokes succeed; the reader saw either the fully-old
            // or the fully-new record, never an error.
            a.unwrap().unwrap();
            b.unwrap().unwrap();
            let _usable: bool = c.unwrap().unwrap();

            assert!(store.lookup(&token).await.unwrap().unwrap().revoked);
            assert!(!store.is_usable(&token).await.unwrap());
        }
    }
}
