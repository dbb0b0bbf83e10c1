//! Auth Core
//!
//! Layered structure:
//! - `domain/` - Users, tenant memberships, permission grants, collaborator traits
//! - `application/` - Guard, credential verifier, bearer token codec, configuration
//! - `infra/` - In-memory user provider, session and tenant context
//!
//! ## Features
//! - Password login with per-identifier lockout
//! - Remember-me tokens, rotated on every remembered login and on logout
//! - HMAC-SHA256 bearer tokens
//! - Tenant-scoped roles and `category.action` permissions with wildcards
//! - Guards assembled from a [`container::Container`], per consumer
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Unknown identifier and wrong secret are indistinguishable to the caller
//! - Token signatures compared in constant time
//! - Secrets are zeroized on drop and redacted from `Debug`
//!
//! ```rust
//! use std::sync::Arc;
//! use auth::{AuthConfig, Credentials, Guard, InMemoryUserProvider};
//! use auth::models::user_password::RawPassword;
//! use kernel::id::UserId;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let provider = Arc::new(InMemoryUserProvider::default());
//!     let raw = RawPassword::new("Correct-Horse-42".to_string()).unwrap();
//!     provider.register(UserId::from(1), "ana@example.com", &raw).await.unwrap();
//!
//!     let mut guard = Guard::new(provider, Arc::new(AuthConfig::default()));
//!     let credentials = Credentials::password("ana@example.com", "Correct-Horse-42");
//!     assert!(guard.attempt(&credentials, false).await.unwrap());
//!     assert!(guard.check());
//! });
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::{AuthConfig, CredentialVerifier, Guard, TokenClaims, TokenCodec};
pub use domain::value_object::credentials::Credentials;
pub use domain::{SessionStore, TenantContext, TenantPermissionEvaluator, User, UserProvider};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserProvider, MemorySession, StaticTenantContext};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
