//! Request authentication middleware.
//!
//! Extracts a bearer token from the `Authorization` header, validates it
//! against the codec and the token store, and attaches a
//! [`SecurityContext`] to the request. The middleware never fails the
//! request: a missing, malformed, expired, or revoked credential yields
//! an anonymous context, and downstream authorization decides what an
//! anonymous request may do. Public and protected routes can therefore
//! share one pipeline, and a rejected credential is indistinguishable
//! from none at all.
//!
//! Token values and subjects are never logged; tracing events carry only
//! the outcome and an error category.

use crate::crypto;
use crate::errors::AuthError;
use crate::models::SecurityContext;
use crate::observability::metrics::record_token_validation;
use crate::store::TokenStore;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Process-wide authentication configuration.
    pub config: Arc<crate::config::AuthConfig>,

    /// Issued-token registry consulted after signature verification.
    pub store: Arc<dyn TokenStore>,
}

/// Extract the bearer token from the `Authorization` header.
///
/// Only the case-sensitive `Bearer ` scheme is recognized; any other or
/// absent header means the request carries no credential.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Authentication middleware.
///
/// Establishes the request's [`SecurityContext`] at most once: a context
/// set earlier in the chain is never overwritten, so applying the
/// middleware twice is harmless.
#[instrument(skip_all, name = "auth.middleware")]
pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<SecurityContext>().is_none() {
        // Extract the token here, where the request is owned: an owned
        // `Request` is `Send`, but a `&Request` is not (its body is not
        // `Sync`). Passing a borrowed request into the awaiting resolver
        // would make this middleware's future non-`Send`.
        let token = bearer_token(&req).map(str::to_owned);
        let context = resolve_context(&state, token).await;
        req.extensions_mut().insert(context);
    }

    next.run(req).await
}

/// Resolve the security context for a single request.
async fn resolve_context(state: &AuthState, token: Option<String>) -> SecurityContext {
    let Some(token) = token else {
        // Anonymous requests are legitimate; no store round trip.
        return SecurityContext::Anonymous;
    };

    // Signature and embedded expiry first: the check is cheap and local,
    // and it spares the store a round trip for obviously invalid tokens.
    let claims = match crypto::verify_token(&token, &state.config.signing_secret) {
        Ok(claims) => claims,
        Err(e) => {
            record_token_validation("error", Some(error_category(&e)));
            return SecurityContext::Anonymous;
        }
    };

    // Revocation check against the store's own copy of the expiry; a
    // token can be rejected here even while its signature still verifies.
    match state.store.is_usable(&token).await {
        Ok(true) => {
            record_token_validation("success", None);
            SecurityContext::Authenticated {
                subject: claims.sub,
                roles: claims.roles.unwrap_or_default(),
            }
        }
        Ok(false) => {
            tracing::debug!(
                target: "auth.middleware",
                "Token rejected by store (revoked or past expiry)"
            );
            record_token_validation("error", Some("revoked"));
            SecurityContext::Anonymous
        }
        Err(e) => {
            // Store trouble must not take the request down; it proceeds
            // anonymously and protected routes reject it downstream.
            tracing::warn!(
                target: "auth.middleware",
                error = %e,
                "Token store unavailable during validation"
            );
            record_token_validation("error", Some("store_unavailable"));
            SecurityContext::Anonymous
        }
    }
}

/// Bounded metric label for a validation failure.
fn error_category(err: &AuthError) -> &'static str {
    match err {
        AuthError::Malformed => "malformed",
        AuthError::InvalidSignature => "invalid_signature",
        AuthError::Expired => "expired",
        AuthError::Revoked => "revoked",
        AuthError::Encoding(_) => "encoding",
        AuthError::DuplicateToken => "duplicate",
        AuthError::StoreUnavailable(_) => "store_unavailable",
    }
}

/// Extension trait for reading the resolved context from a request.
pub trait SecurityContextExt {
    /// The request's security context.
    ///
    /// Returns `None` if the authentication middleware was not applied
    /// to this request.
    fn security_context(&self) -> Option<&SecurityContext>;
}

impl<B> SecurityContextExt for axum::http::Request<B> {
    fn security_context(&self) -> Option<&SecurityContext> {
        self.extensions().get::<SecurityContext>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_authorization(value: Option<&str>) -> Request {
        let builder = axum::http::Request::builder().uri("/");
        let builder = match value {
            Some(v) => builder.header(header::AUTHORIZATION, v),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extracted() {
        let req = request_with_authorization(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&req), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_is_no_token() {
        let req = request_with_authorization(None);
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_other_scheme_is_no_token() {
        let req = request_with_authorization(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_bearer_prefix_is_case_sensitive() {
        let req = request_with_authorization(Some("bearer abc.def.ghi"));
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_error_categories_are_bounded() {
        // Every variant maps to a fixed label; a new variant without a
        // label fails to compile in error_category.
        assert_eq!(error_category(&AuthError::Malformed), "malformed");
        assert_eq!(
            error_category(&AuthError::InvalidSignature),
            "invalid_signature"
        );
        assert_eq!(error_category(&AuthError::Expired), "expired");
    }
}
