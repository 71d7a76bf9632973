//! Token-based authentication core.
//!
//! Issues signed access and refresh tokens carrying role claims,
//! validates presented tokens against both their signature and a
//! server-side revocation record, and turns the result into a
//! per-request security context.
//!
//! The crate deliberately stops at the identity decision: credential
//! storage, password verification, role-to-permission policy, and the
//! HTTP server itself belong to the host application. The host wires
//! [`middleware::authenticate`] into its router and reads the resulting
//! [`models::SecurityContext`] in its handlers.
//!
//! # Modules
//!
//! - `config` - Process-wide configuration
//! - `crypto` - Token signing and verification
//! - `errors` - Error types
//! - `middleware` - Request authentication middleware
//! - `models` - Data models
//! - `observability` - Metric recorders
//! - `services` - Token issuance, rotation, and revocation
//! - `store` - Issued-token registry

pub mod config;
pub mod crypto;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod store;
