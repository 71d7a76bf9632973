//! Token issuance, rotation, and revocation.
//!
//! Issuance builds claims from a resolved [`Identity`], signs them, and
//! registers the token in the store before returning it: a token the
//! caller holds is always revocable. Signing failures are not transient
//! and are never retried.

use crate::config::AuthConfig;
use crate::crypto::{self, Claims};
use crate::errors::AuthError;
use crate::models::{Identity, TokenPair};
use crate::observability::metrics::record_token_issuance;
use crate::store::TokenStore;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;
use uuid::Uuid;

/// Issues and invalidates tokens against a [`TokenStore`].
///
/// Two issuances for the same identity are independent and may run fully
/// in parallel; the service holds no mutable state of its own.
#[derive(Clone)]
pub struct TokenService {
    config: Arc<AuthConfig>,
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    #[must_use]
    pub fn new(config: Arc<AuthConfig>, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store }
    }

    /// Issue a short-lived access token carrying the identity's roles.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Encoding`] if the claims cannot be signed
    /// - [`AuthError::DuplicateToken`] / [`AuthError::StoreUnavailable`]
    ///   from registration
    #[instrument(skip_all)]
    pub async fn issue_access_token(&self, identity: &Identity) -> Result<String, AuthError> {
        let start = Instant::now();
        let result = self
            .issue(
                identity.subject.clone(),
                Some(identity.roles.clone()),
                self.config.access_token_ttl,
            )
            .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance("access", status, start.elapsed());

        result
    }

    /// Issue a long-lived refresh token.
    ///
    /// Refresh tokens carry no role claims and are registered separately
    /// from their access-token sibling, so each can be revoked on its
    /// own.
    #[instrument(skip_all)]
    pub async fn issue_refresh_token(&self, identity: &Identity) -> Result<String, AuthError> {
        let start = Instant::now();
        let result = self
            .issue(identity.subject.clone(), None, self.config.refresh_token_ttl)
            .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance("refresh", status, start.elapsed());

        result
    }

    /// Issue an access/refresh pair, the login response shape.
    pub async fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let access_token = self.issue_access_token(identity).await?;
        let refresh_token = self.issue_refresh_token(identity).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl.as_secs(),
        })
    }

    /// Redeem a refresh token for its subject, revoking it in the same
    /// step.
    ///
    /// Each refresh token mints successors exactly once. The caller
    /// re-resolves the returned subject against the user directory and
    /// issues the next pair via [`TokenService::issue_token_pair`];
    /// role membership is never taken from the refresh token because it
    /// carries none.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] / [`AuthError::InvalidSignature`] /
    ///   [`AuthError::Expired`] if the token itself does not verify, or
    ///   if an access token is presented for rotation
    /// - [`AuthError::Revoked`] if the store no longer authorizes it
    /// - [`AuthError::StoreUnavailable`] on backend failure
    #[instrument(skip_all)]
    pub async fn redeem_refresh_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = crypto::verify_token(token, &self.config.signing_secret)?;

        if !claims.is_refresh() {
            tracing::debug!(
                target: "auth.token_service",
                "Rotation rejected: access token presented as refresh token"
            );
            return Err(AuthError::Malformed);
        }

        if !self.store.is_usable(token).await? {
            tracing::debug!(
                target: "auth.token_service",
                "Rotation rejected: refresh token revoked or expired in store"
            );
            return Err(AuthError::Revoked);
        }

        self.store.revoke(token).await?;

        Ok(claims.sub)
    }

    /// Revoke a token (logout). Idempotent; unknown tokens are a no-op.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.store.revoke(token).await
    }

    /// Shared issuance path: build claims, sign, then register.
    async fn issue(
        &self,
        subject: String,
        roles: Option<Vec<String>>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + chrono_ttl(ttl);

        let claims = Claims::new(
            subject,
            issued_at.timestamp(),
            expires_at.timestamp(),
            Uuid::new_v4().to_string(),
            roles,
        );

        let token = crypto::sign_token(&claims, &self.config.signing_secret)?;
        self.store.register(&token, issued_at, expires_at).await?;

        Ok(token)
    }
}

/// Millisecond-precision TTL conversion; saturates on overflow rather
/// than panicking.
fn chrono_ttl(ttl: Duration) -> ChronoDuration {
    ChronoDuration::milliseconds(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}
