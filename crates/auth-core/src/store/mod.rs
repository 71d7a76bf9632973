//! Issued-token registry.
//!
//! The store is the subsystem's only mutable shared state: a key-value
//! table mapping the full token string to its [`TokenRecord`]. Issuance
//! registers a row; logout and rotation flip `revoked`; validation asks
//! whether the row still authorizes use.
//!
//! # Backends
//!
//! - [`PgTokenStore`] - persisted, `issued_tokens` table
//! - [`MemoryTokenStore`] - in-process, for tests and embedded use

use crate::errors::AuthError;
use crate::models::TokenRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod postgres;

pub use memory::MemoryTokenStore;
pub use postgres::PgTokenStore;

/// Registry of issued tokens.
///
/// # Concurrency
///
/// Implementations must be safe under many concurrent readers and
/// occasional concurrent writers. Mutation of a single record is atomic:
/// a `revoke` racing a `lookup` yields either the fully-old or fully-new
/// record, never a partial one. No ordering is required across distinct
/// tokens.
///
/// # Failure
///
/// When the backing resource is unavailable, operations fail fast with
/// [`AuthError::StoreUnavailable`] rather than blocking indefinitely.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new record for a freshly issued token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::DuplicateToken`] if the token string is already
    ///   registered. Codec determinism plus the `jti` claim make this
    ///   unreachable in practice; it is checked anyway.
    /// - [`AuthError::StoreUnavailable`] on backend failure.
    async fn register(
        &self,
        token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// Fetch the record for a token, `None` if it was never registered.
    async fn lookup(&self, token: &str) -> Result<Option<TokenRecord>, AuthError>;

    /// Idempotently mark a token revoked.
    ///
    /// Revoking a missing or already-revoked token is a no-op, not an
    /// error.
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;

    /// Whether the store still authorizes use of this token: the record
    /// exists, is not revoked, and has not passed its expiry.
    async fn is_usable(&self, token: &str) -> Result<bool, AuthError> {
        let record = self.lookup(token).await?;
        Ok(record.is_some_and(|r| r.usable_at(Utc::now())))
    }
}
