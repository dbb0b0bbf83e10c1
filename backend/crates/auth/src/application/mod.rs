//! Application Layer
//!
//! The guard and the services it is assembled from.

pub mod config;
pub mod credential_verifier;
pub mod guard;
pub mod token;

// Re-exports
pub use config::AuthConfig;
pub use credential_verifier::CredentialVerifier;
pub use guard::Guard;
pub use token::{TokenClaims, TokenCodec};
