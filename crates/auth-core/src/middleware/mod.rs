/// Request authentication middleware
pub mod auth;

pub use auth::{authenticate, AuthState, SecurityContextExt};
