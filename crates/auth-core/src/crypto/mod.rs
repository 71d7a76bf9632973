//! Token codec: signing and verification of bearer tokens.
//!
//! Tokens are three dot-separated base64url segments (header, payload,
//! signature) signed with HMAC-SHA-512 over `header.payload` under the
//! process-wide symmetric secret. Signing and verification are pure
//! functions of their inputs plus wall-clock time for the expiry check.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS512 is accepted; tokens carrying any other algorithm are
//!   rejected as malformed
//! - Signature comparison is constant time (via `jsonwebtoken`/`ring`)
//! - The `sub` and `jti` fields are redacted in Debug output

use crate::errors::AuthError;
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Maximum allowed token size in bytes (8KB).
///
/// Tokens larger than this are rejected before base64 decoding or any
/// cryptographic work. Typical tokens here are 300-600 bytes; the limit
/// leaves room for large role sets while bounding the work an oversized
/// credential can cause.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Claims embedded in a signed token.
///
/// `sub`, `iat`, `exp`, and `jti` are always present. `roles` is present
/// on access tokens and omitted from the payload entirely for refresh
/// tokens, which authorize nothing beyond minting their successors.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Unique token identifier; keeps two tokens minted for the same
    /// subject within the same second from colliding in the store.
    pub jti: String,

    /// Role names, in directory order. Absent on refresh tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl Claims {
    #[must_use]
    pub fn new(sub: String, iat: i64, exp: i64, jti: String, roles: Option<Vec<String>>) -> Self {
        Self {
            sub,
            iat,
            exp,
            jti,
            roles,
        }
    }

    /// Whether these claims belong to a refresh token (no role claims).
    #[must_use]
    pub fn is_refresh(&self) -> bool {
        self.roles.is_none()
    }
}

/// The `sub` and `jti` fields identify a user and a credential and are
/// redacted in Debug output.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("jti", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// Sign claims into a token under the given secret.
///
/// Deterministic for identical claims and secret.
///
/// # Errors
///
/// Returns `AuthError::Encoding` if the claims cannot be serialized.
/// Signing failures are not transient; callers should not retry.
#[instrument(skip_all)]
pub fn sign_token(claims: &Claims, secret: &SecretString) -> Result<String, AuthError> {
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    let header = Header::new(Algorithm::HS512);

    encode(&header, claims, &encoding_key).map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Verify a token's signature and embedded expiry, returning its claims.
///
/// The size check and structural parse run before any cryptography; the
/// signature is checked before the expiry so a tampered `exp` can never
/// influence the outcome.
///
/// # Errors
///
/// - `AuthError::Malformed` - oversized, not three-part, undecodable, or
///   signed with an unexpected algorithm
/// - `AuthError::InvalidSignature` - signature does not match the payload
/// - `AuthError::Expired` - `exp` is at or before the current time
#[instrument(skip_all)]
pub fn verify_token(token: &str, secret: &SecretString) -> Result<Claims, AuthError> {
    // Check token size BEFORE any parsing or cryptographic operations
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "auth.crypto",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::Malformed);
    }

    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS512);
    validation.validate_exp = true;
    // No leeway: an expiry at or before now must fail even for sub-second
    // token lifetimes.
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        let err = match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed,
        };
        tracing::debug!(target: "auth.crypto", error = %e, "Token verification failed");
        err
    })?;

    // The envelope expiry is inclusive: a token whose `exp` equals the
    // current second is already expired, which `jsonwebtoken` alone does
    // not enforce.
    if token_data.claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::Expired);
    }

    Ok(token_data.claims)
}
