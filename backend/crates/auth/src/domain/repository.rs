//! Collaborator Traits
//!
//! Interfaces the guard consumes. Implementations live in the infrastructure
//! layer or in the embedding application.

use async_trait::async_trait;
use kernel::id::{TenantId, UserId};
use platform::password::ClearTextPassword;

use crate::domain::entity::user::User;
use crate::domain::value_object::remember_token::RememberToken;
use crate::error::AuthResult;

/// User lookup and credential storage
///
/// Storage failures are reported as `AuthError::ProviderUnavailable`; a user
/// that does not exist is `Ok(None)`.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Find user by ID
    async fn retrieve_by_id(&self, id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by login identifier
    async fn retrieve_by_credentials(&self, identifier: &str) -> AuthResult<Option<User>>;

    /// Find user by ID whose current remember token matches `token`
    async fn retrieve_by_token(&self, id: &UserId, token: &str) -> AuthResult<Option<User>>;

    /// Store `token` as the user's only remember token
    ///
    /// Must replace the previous value in one step. `user` is updated to
    /// match the stored record.
    async fn update_remember_token(&self, user: &mut User, token: RememberToken)
    -> AuthResult<()>;

    /// Check a login secret against the user's stored hash
    async fn validate_credentials(&self, user: &User, secret: &ClearTextPassword)
    -> AuthResult<bool>;
}

/// Server-side session of the current client
pub trait SessionStore: Send + Sync {
    /// Current session id
    fn id(&self) -> String;

    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: String);

    fn forget(&self, key: &str);

    /// New session id, data kept
    fn regenerate(&self);

    /// New session id, data dropped
    fn invalidate(&self);
}

/// Tenant of the current request
pub trait TenantContext: Send + Sync {
    fn current_tenant_id(&self) -> Option<TenantId>;
}
