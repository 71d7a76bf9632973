use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A resolved user identity, supplied by the external user directory.
///
/// Immutable for the duration of token issuance. Role order is preserved
/// into the issued claims.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque user identifier (username/subject).
    pub subject: String,

    /// Role names granted to this identity, in directory order.
    pub roles: Vec<String>,
}

impl Identity {
    #[must_use]
    pub fn new(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }
}

/// The subject is a user identifier and is redacted in Debug output.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("subject", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// Persisted record for an issued token (maps to the `issued_tokens`
/// table, keyed by the full token string).
///
/// The record outlives the token's natural expiry so revocation can be
/// distinguished from "never issued"; an external retention process
/// clears old rows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TokenRecord {
    /// Server-side invalidation flag, set on logout or rotation.
    pub revoked: bool,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the record authorizes use of its token at `now`.
    ///
    /// True iff the token is not revoked and `now` is strictly before
    /// `expires_at`. This duplicates the codec's embedded-expiry check on
    /// the store's own copy of the timestamp; both checks are kept.
    #[must_use]
    pub fn usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

/// Access and refresh token pair returned on login or rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Request-scoped outcome of authentication.
///
/// Created at most once per request by the authentication middleware and
/// consumed by downstream authorization code; never persisted or shared
/// across requests. A request with no valid, usable token carries
/// `Anonymous` — downstream code cannot tell why.
#[derive(Clone, PartialEq, Eq)]
pub enum SecurityContext {
    Anonymous,
    Authenticated {
        subject: String,
        roles: Vec<String>,
    },
}

impl SecurityContext {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SecurityContext::Authenticated { .. })
    }

    /// The authenticated subject, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            SecurityContext::Anonymous => None,
            SecurityContext::Authenticated { subject, .. } => Some(subject),
        }
    }

    /// Whether the context carries the named role. Always false for
    /// anonymous requests.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        match self {
            SecurityContext::Anonymous => false,
            SecurityContext::Authenticated { roles, .. } => roles.iter().any(|r| r == role),
        }
    }
}

/// The subject is a user identifier and is redacted in Debug output.
impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityContext::Anonymous => f.debug_struct("Anonymous").finish(),
            SecurityContext::Authenticated { roles, .. } => f
                .debug_struct("Authenticated")
                .field("subject", &"[REDACTED]")
                .field("roles", roles)
                .finish(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_record_usable_within_lifetime() {
        let now = Utc::now();
        let record = TokenRecord {
            revoked: false,
            issued_at: now,
            expires_at: now + Duration::seconds(60),
        };

        assert!(record.usable_at(now));
        assert!(record.usable_at(now + Duration::seconds(59)));
    }

    #[test]
    fn test_record_unusable_at_expiry_boundary() {
        let now = Utc::now();
        let record = TokenRecord {
            revoked: false,
            issued_at: now - Duration::seconds(60),
            expires_at: now,
        };

        // Expiry is inclusive: a token is unusable at exactly expires_at.
        assert!(!record.usable_at(now));
        assert!(!record.usable_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_record_unusable_when_revoked() {
        let now = Utc::now();
        let record = TokenRecord {
            revoked: true,
            issued_at: now,
            expires_at: now + Duration::seconds(60),
        };

        assert!(!record.usable_at(now));
    }

    #[test]
    fn test_context_role_membership() {
        let context = SecurityContext::Authenticated {
            subject: "alice".to_string(),
            roles: vec!["ADMIN".to_string(), "USER".to_string()],
        };

        assert!(context.is_authenticated());
        assert_eq!(context.subject(), Some("alice"));
        assert!(context.has_role("ADMIN"));
        assert!(context.has_role("USER"));
        assert!(!context.has_role("AUDITOR"));
        assert!(!context.has_role("ADMI")); // Partial match should not work
    }

    #[test]
    fn test_anonymous_context_has_no_roles() {
        let context = SecurityContext::Anonymous;

        assert!(!context.is_authenticated());
        assert_eq!(context.subject(), None);
        assert!(!context.has_role("ADMIN"));
    }

    #[test]
    fn test_context_debug_redacts_subject() {
        let context = SecurityContext::Authenticated {
            subject: "alice".to_string(),
            roles: vec!["ADMIN".to_string()],
        };

        let debug_str = format!("{context:?}");
        assert!(!debug_str.contains("alice"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_identity_debug_redacts_subject() {
        let identity = Identity::new("alice", vec!["ADMIN".to_string()]);

        let debug_str = format!("{identity:?}");
        assert!(!debug_str.contains("alice"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
