//! In-memory Implementations
//!
//! Process-local collaborators for tests, tooling and single-node setups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kernel::error::app_error::{OptionExt, ResultExt};
use kernel::error::kind::ErrorKind;
use kernel::id::{TenantId, UserId};
use platform::password::ClearTextPassword;
use tokio::sync::RwLock;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, TenantContext, UserProvider};
use crate::domain::value_object::remember_token::RememberToken;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::domain::value_object::user_status::UserStatus;
use crate::error::{AuthError, AuthResult};

// ============================================================================
// User Provider
// ============================================================================

/// User store held in a map keyed by user id
///
/// Can be switched offline to exercise storage failures.
#[derive(Debug, Default)]
pub struct InMemoryUserProvider {
    users: RwLock<HashMap<UserId, User>>,
    pepper: Option<Vec<u8>>,
    offline: AtomicBool,
}

impl InMemoryUserProvider {
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            pepper,
            offline: AtomicBool::new(false),
        }
    }

    /// Store or replace a user record
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Hash `password` and store a new active user
    pub async fn register(
        &self,
        id: UserId,
        identifier: &str,
        password: &RawPassword,
    ) -> AuthResult<User> {
        self.ensure_available()?;
        let hashed = UserPassword::from_raw(password, self.pepper.as_deref())?;
        let user = User::new(id, identifier, hashed);
        self.insert(user.clone()).await;
        tracing::debug!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn set_status(&self, id: &UserId, status: UserStatus) -> AuthResult<()> {
        self.ensure_available()?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_app_err(ErrorKind::Internal, format!("No user with id {id}"))?;
        user.status = status;
        Ok(())
    }

    /// Stored record, bypassing availability
    pub async fn get(&self, id: &UserId) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> AuthResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthError::provider_unavailable("User store is offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn retrieve_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        self.ensure_available()?;
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn retrieve_by_credentials(&self, identifier: &str) -> AuthResult<Option<User>> {
        self.ensure_available()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.identifier == identifier)
            .cloned())
    }

    async fn retrieve_by_token(&self, id: &UserId, token: &str) -> AuthResult<Option<User>> {
        self.ensure_available()?;
        let users = self.users.read().await;
        Ok(users
            .get(id)
            .filter(|user| {
                user.remember_token
                    .as_ref()
                    .is_some_and(|stored| stored.matches(token))
            })
            .cloned())
    }

    async fn update_remember_token(
        &self,
        user: &mut User,
        token: RememberToken,
    ) -> AuthResult<()> {
        self.ensure_available()?;
        let mut users = self.users.write().await;
        if let Some(stored) = users.get_mut(&user.id) {
            stored.set_remember_token(token.clone());
        }
        user.set_remember_token(token);
        Ok(())
    }

    async fn validate_credentials(
        &self,
        user: &User,
        secret: &ClearTextPassword,
    ) -> AuthResult<bool> {
        self.ensure_available()?;
        let hash = user.password.clone();
        let secret = secret.clone();
        let pepper = self.pepper.clone().map(Zeroizing::new);
        let verified = tokio::task::spawn_blocking(move || {
            hash.verify(&secret, pepper.as_ref().map(|p| p.as_slice()))
        })
        .await
        .map_app_err(ErrorKind::Internal, "Password check did not complete")?;
        Ok(verified)
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug)]
struct SessionState {
    id: String,
    data: HashMap<String, String>,
}

/// Session of a single client kept in process memory
#[derive(Debug)]
pub struct MemorySession {
    state: Mutex<SessionState>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState {
                id: Uuid::new_v4().to_string(),
                data: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySession {
    fn id(&self) -> String {
        self.state().id.clone()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.state().data.get(key).cloned()
    }

    fn put(&self, key: &str, value: String) {
        self.state().data.insert(key.to_string(), value);
    }

    fn forget(&self, key: &str) {
        self.state().data.remove(key);
    }

    fn regenerate(&self) {
        self.state().id = Uuid::new_v4().to_string();
    }

    fn invalidate(&self) {
        let mut state = self.state();
        state.data.clear();
        state.id = Uuid::new_v4().to_string();
    }
}

// ============================================================================
// Tenant Context
// ============================================================================

/// Fixed tenant for the lifetime of a request
#[derive(Debug, Clone, Default)]
pub struct StaticTenantContext(Option<TenantId>);

impl StaticTenantContext {
    pub fn new(tenant: impl Into<TenantId>) -> Self {
        Self(Some(tenant.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TenantContext for StaticTenantContext {
    fn current_tenant_id(&self) -> Option<TenantId> {
        self.0.clone()
    }
}
