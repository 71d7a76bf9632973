use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Minimum signing secret length in bytes.
///
/// HMAC-SHA-512 secrets shorter than the hash's block input weaken the
/// MAC; 32 bytes is the floor we accept for any deployment.
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

/// Default access token lifetime (15 minutes, in milliseconds).
pub const DEFAULT_ACCESS_TOKEN_TTL_MS: u64 = 900_000;

/// Default refresh token lifetime (7 days, in milliseconds).
pub const DEFAULT_REFRESH_TOKEN_TTL_MS: u64 = 604_800_000;

/// Process-wide authentication configuration.
///
/// Loaded once at startup and passed by reference into the codec,
/// issuer, and middleware. The signing secret is a [`SecretString`]
/// so `Debug`/tracing output redacts it.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric signing secret for token signatures.
    pub signing_secret: SecretString,

    /// Access token lifetime.
    pub access_token_ttl: Duration,

    /// Refresh token lifetime.
    pub refresh_token_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Signing secret too short: {0} bytes (minimum {MIN_SIGNING_SECRET_BYTES})")]
    SecretTooShort(usize),

    #[error("Invalid duration for {0}: {1}")]
    InvalidTtl(String, String),
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let signing_secret = vars
            .get("AUTH_SIGNING_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_SIGNING_SECRET".to_string()))?;

        if signing_secret.len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort(signing_secret.len()));
        }

        let access_token_ttl =
            parse_ttl_ms(vars, "AUTH_ACCESS_TOKEN_TTL_MS", DEFAULT_ACCESS_TOKEN_TTL_MS)?;
        let refresh_token_ttl =
            parse_ttl_ms(vars, "AUTH_REFRESH_TOKEN_TTL_MS", DEFAULT_REFRESH_TOKEN_TTL_MS)?;

        Ok(AuthConfig {
            signing_secret: SecretString::from(signing_secret.as_str()),
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    /// The signing secret as raw bytes for MAC key construction.
    #[must_use]
    pub fn secret_bytes(&self) -> &[u8] {
        self.signing_secret.expose_secret().as_bytes()
    }
}

/// Parse a millisecond TTL variable, falling back to `default_ms`.
///
/// Zero is rejected: a token that expires the instant it is issued is
/// always a misconfiguration.
fn parse_ttl_ms(
    vars: &HashMap<String, String>,
    var: &str,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    let ms = match vars.get(var) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTtl(var.to_string(), raw.clone()))?,
        None => default_ms,
    };

    if ms == 0 {
        return Err(ConfigError::InvalidTtl(var.to_string(), "0".to_string()));
    }

    Ok(Duration::from_millis(ms))
}
