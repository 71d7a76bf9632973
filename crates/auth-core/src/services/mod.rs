/// Token issuance, rotation, and revocation
pub mod token_service;

pub use token_service::TokenService;
