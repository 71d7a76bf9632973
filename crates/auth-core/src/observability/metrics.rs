//! Metric definitions for the authentication core.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `kind`: 2 values (access, refresh)
//! - `status`: 2 values (success, error)
//! - `error_category`: small fixed set (malformed, invalid_signature,
//!   expired, revoked, store_unavailable, ...)
//! - `operation`: bounded by code (select, insert, update, delete)

use metrics::{counter, histogram};
use std::time::Duration;

/// Record token issuance duration and outcome
///
/// Metric: `auth_token_issuance_duration_seconds`
/// Labels: `kind`, `status`
pub fn record_token_issuance(kind: &str, status: &str, duration: Duration) {
    histogram!("auth_token_issuance_duration_seconds", "kind" => kind.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("auth_token_issuance_total", "kind" => kind.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record token validation result
///
/// Metric: `auth_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &str, error_category: Option<&str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_token_validations_total", "status" => status.to_string(), "error_category" => category.to_string())
        .increment(1);
}

/// Record token store query execution
///
/// Metric: `auth_store_query_duration_seconds`, `auth_store_queries_total`
/// Labels: `operation`, `status`
pub fn record_store_query(operation: &str, status: &str, duration: Duration) {
    histogram!("auth_store_query_duration_seconds", "operation" => operation.to_string())
        .record(duration.as_secs_f64());

    counter!("auth_store_queries_total", "operation" => operation.to_string(), "status" => status.to_string())
        .increment(1);
}
