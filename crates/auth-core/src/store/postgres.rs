//! Persisted token store over the `issued_tokens` table.
//!
//! Lookup is always by exact token value (the primary key); no other
//! index exists. Fail-fast behavior on an unreachable database is
//! governed by the pool the host constructs (acquire timeout); every
//! backend failure surfaces as [`AuthError::StoreUnavailable`].

use crate::errors::AuthError;
use crate::models::TokenRecord;
use crate::observability::metrics::record_store_query;
use crate::store::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Instant;

/// Token store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete records whose expiry is at or before `cutoff`, returning
    /// the number of rows removed.
    ///
    /// Retention policy belongs to an external process; this is the hook
    /// it calls. Revoked-but-unexpired rows are kept so revocation keeps
    /// winning over a still-valid signature.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM issued_tokens
            WHERE expires_at <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("Failed to purge expired tokens: {e}")))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn register(
        &self,
        token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let start = Instant::now();
        let result = sqlx::query(
            r#"
            INSERT INTO issued_tokens (token, revoked, issued_at, expires_at)
            VALUES ($1, FALSE, $2, $3)
            "#,
        )
        .bind(token)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_store_query("insert", status, start.elapsed());

        result.map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateToken,
            _ => AuthError::StoreUnavailable(format!("Failed to register token: {e}")),
        })?;

        Ok(())
    }

    async fn lookup(&self, token: &str) -> Result<Option<TokenRecord>, AuthError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT revoked, issued_at, expires_at
            FROM issued_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_store_query("select", status, start.elapsed());

        result.map_err(|e| AuthError::StoreUnavailable(format!("Failed to fetch token record: {e}")))
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        // Single-statement update keeps the mutation atomic per row;
        // missing and already-revoked tokens fall through as no-ops.
        sqlx::query(
            r#"
            UPDATE issued_tokens
            SET revoked = TRUE
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreUnavailable(format!("Failed to revoke token: {e}")))?;

        Ok(())
    }
}
