use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by the authentication subsystem.
///
/// The first four variants are credential failures: structurally
/// equivalent to "not a valid credential" and absorbed into an anonymous
/// outcome by the request middleware. `Encoding` is issuance-side and
/// fatal to the issuing call. `DuplicateToken` and `StoreUnavailable`
/// originate in the token store.
///
/// Note: Display messages are intentionally generic so nothing about why
/// a credential was rejected can leak to a caller. Details are logged at
/// debug level where the failure occurs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token does not parse into the expected three-part structure.
    #[error("The token is invalid or expired")]
    Malformed,

    /// Recomputed signature does not match the embedded signature.
    #[error("The token is invalid or expired")]
    InvalidSignature,

    /// The token's embedded expiry is at or before the current time.
    #[error("The token is invalid or expired")]
    Expired,

    /// The token's store record is revoked or missing.
    #[error("The token is invalid or expired")]
    Revoked,

    /// Claims could not be encoded during signing.
    #[error("Claims encoding failed: {0}")]
    Encoding(String),

    /// The token string is already registered in the store.
    #[error("Token is already registered")]
    DuplicateToken,

    /// The store's backing resource did not answer.
    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Server-side details never reach the response body; they are
        // logged where the failure occurred.
        let (status, code, message) = match &self {
            AuthError::Malformed
            | AuthError::InvalidSignature
            | AuthError::Expired
            | AuthError::Revoked => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "The token is invalid or expired",
            ),
            AuthError::Encoding(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENCODING_ERROR",
                "An internal error occurred",
            ),
            AuthError::DuplicateToken => (
                StatusCode::CONFLICT,
                "DUPLICATE_TOKEN",
                "Token is already registered",
            ),
            AuthError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "Token store temporarily unavailable",
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_map_to_unauthorized() {
        for err in [
            AuthError::Malformed,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::Revoked,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_store_errors_map_to_server_side_statuses() {
        let response = AuthError::DuplicateToken.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AuthError::StoreUnavailable("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = AuthError::Encoding("bad claim".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_credential_failures_share_a_generic_message() {
        // A caller must not be able to distinguish why a credential was
        // rejected from the error text alone.
        assert_eq!(
            AuthError::Malformed.to_string(),
            AuthError::InvalidSignature.to_string()
        );
        assert_eq!(
            AuthError::Expired.to_string(),
            AuthError::Revoked.to_string()
        );
    }
}
