//! Guard
//!
//! Owns the login state of one request or session. The state is either
//! guest or authenticated; an authenticated state remembers whether it was
//! restored from a remember token.
//!
//! ```text
//! Guest --attempt / login / login_using_id / login_via_remember--> Authenticated
//! Authenticated --logout--> Guest
//! ```
//!
//! Wrong secrets and bad tokens come back as `Ok(false)` / `Ok(None)`.
//! Lockout, disabled accounts and provider failures come back as errors.
//!
//! A guard is not shared between requests; every mutating operation takes
//! `&mut self`. The attempt throttle is the only state meant to outlive a
//! guard and is injected as a [`RateLimitStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use container::{Container, ContractKey};
use kernel::id::{TenantId, UserId};
use platform::clock::{Clock, SystemClock};
use platform::rate_limit::{LoginThrottle, RateLimitResult, RateLimitStore};

use crate::application::config::AuthConfig;
use crate::application::credential_verifier::CredentialVerifier;
use crate::application::token::TokenCodec;
use crate::domain::authorization::TenantPermissionEvaluator;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionStore, TenantContext, UserProvider};
use crate::domain::value_object::credentials::Credentials;
use crate::domain::value_object::remember_token::{Recaller, RememberToken};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
struct Authenticated {
    user: User,
    via_remember: bool,
}

pub struct Guard {
    name: &'static str,
    config: Arc<AuthConfig>,
    verifier: CredentialVerifier,
    evaluator: TenantPermissionEvaluator,
    throttle: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    session: Option<Arc<dyn SessionStore>>,
    tenants: Option<Arc<dyn TenantContext>>,
    current: Option<Authenticated>,
    recaller: Option<Recaller>,
}

impl Guard {
    /// Guest guard with its own throttle and the system clock
    pub fn new(provider: Arc<dyn UserProvider>, config: Arc<AuthConfig>) -> Self {
        let codec = TokenCodec::from_config(&config);
        Self {
            name: "default",
            throttle: Arc::new(LoginThrottle::new(config.rate_limit())),
            verifier: CredentialVerifier::new(provider, codec),
            evaluator: TenantPermissionEvaluator,
            clock: Arc::new(SystemClock),
            session: None,
            tenants: None,
            current: None,
            recaller: None,
            config,
        }
    }

    /// Guard whose collaborators are resolved from `container` on behalf of
    /// consumer `C`
    ///
    /// `dyn UserProvider` is required. `dyn SessionStore`, `dyn TenantContext`,
    /// `dyn Clock` and `dyn RateLimitStore` are used when bound, globally or
    /// for `C`.
    pub fn named<C: ?Sized + 'static>(
        container: &Container,
        config: Arc<AuthConfig>,
    ) -> AuthResult<Self> {
        let provider = container.resolve_for::<C, dyn UserProvider>()?;
        let name = ContractKey::of::<C>().name();
        let mut guard = Self::new(provider, config).with_name(short_name(name));

        if let Some(session) = resolve_optional::<C, dyn SessionStore>(container)? {
            guard = guard.with_session(session);
        }
        if let Some(tenants) = resolve_optional::<C, dyn TenantContext>(container)? {
            guard = guard.with_tenant_context(tenants);
        }
        if let Some(clock) = resolve_optional::<C, dyn Clock>(container)? {
            guard = guard.with_clock(clock);
        }
        if let Some(throttle) = resolve_optional::<C, dyn RateLimitStore>(container)? {
            guard = guard.with_throttle(throttle);
        }

        tracing::debug!(guard = guard.name, "Guard built from container");
        Ok(guard)
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_tenant_context(mut self, tenants: Arc<dyn TenantContext>) -> Self {
        self.tenants = Some(tenants);
        self
    }

    /// Share attempt counters with other guards
    pub fn with_throttle(mut self, throttle: Arc<dyn RateLimitStore>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ========================================================================
    // State queries
    // ========================================================================

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn check(&self) -> bool {
        self.current.is_some()
    }

    pub fn guest(&self) -> bool {
        !self.check()
    }

    /// Current user; never re-verifies anything
    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|current| &current.user)
    }

    pub fn id(&self) -> Option<&UserId> {
        self.user().map(|user| &user.id)
    }

    /// Whether the current state was restored from a remember token
    pub fn via_remember(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.via_remember)
    }

    /// The user provider this guard verifies against
    pub fn provider(&self) -> &Arc<dyn UserProvider> {
        self.verifier.provider()
    }

    /// Recaller issued by the last remembered login, for the client to keep
    /// under [`AuthConfig::recaller_key`]
    pub fn recaller(&self) -> Option<&Recaller> {
        self.recaller.as_ref()
    }

    /// Failed attempts currently counted for `identifier`
    pub fn attempts(&self, identifier: &str) -> u32 {
        self.throttle.attempts(identifier)
    }

    // ========================================================================
    // Credential lifecycle
    // ========================================================================

    /// Run the verifier only
    pub async fn validate(&self, credentials: &Credentials) -> AuthResult<bool> {
        let verified = self.verifier.verify(credentials, self.clock.now()).await?;
        Ok(verified.is_some())
    }

    /// Verify and log in, persisting the login to the session
    ///
    /// With `remember`, a new remember token replaces the stored one and the
    /// matching recaller becomes available from [`Self::recaller`].
    pub async fn attempt(&mut self, credentials: &Credentials, remember: bool) -> AuthResult<bool> {
        match self.authenticate(credentials).await? {
            Some(user) => {
                self.login(user, remember).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Verify and log in for this guard only: no session, no token
    pub async fn once(&mut self, credentials: &Credentials) -> AuthResult<bool> {
        match self.authenticate(credentials).await? {
            Some(user) => {
                tracing::debug!(guard = self.name, user_id = %user.id, "User authenticated once");
                self.set_current(user, false);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Log in a user that is already trusted
    pub async fn login(&mut self, mut user: User, remember: bool) -> AuthResult<()> {
        if remember {
            let token = self.cycle_remember_token(&mut user).await?;
            self.recaller = Some(Recaller::new(user.id.clone(), token));
        }
        user.record_login(self.clock.now());
        self.update_session(&user.id);

        tracing::info!(guard = self.name, user_id = %user.id, remember, "User logged in");
        self.set_current(user, false);
        Ok(())
    }

    /// Log in by id; `None` (and no state change) when the id is unknown
    pub async fn login_using_id(
        &mut self,
        id: &UserId,
        remember: bool,
    ) -> AuthResult<Option<&User>> {
        let Some(user) = self
            .provider()
            .retrieve_by_id(id)
            .await
            .inspect_err(AuthError::log)?
        else {
            return Ok(None);
        };
        self.login(user, remember).await?;
        Ok(self.user())
    }

    /// Like [`Self::login_using_id`] without session or token
    pub async fn once_using_id(&mut self, id: &UserId) -> AuthResult<Option<&User>> {
        let Some(user) = self
            .provider()
            .retrieve_by_id(id)
            .await
            .inspect_err(AuthError::log)?
        else {
            return Ok(None);
        };
        Ok(Some(self.set_current(user, false)))
    }

    /// Restore the login from a `<user-id>|<token>` recaller
    ///
    /// A recaller that is malformed or no longer matches the stored token
    /// yields `Ok(false)`.
    pub async fn login_via_remember(&mut self, recaller: &str) -> AuthResult<bool> {
        let Ok(recaller) = recaller.parse::<Recaller>() else {
            tracing::debug!(guard = self.name, "Malformed recaller");
            return Ok(false);
        };
        let user = self
            .provider()
            .retrieve_by_token(recaller.id(), recaller.token().as_str())
            .await
            .inspect_err(AuthError::log)?;
        let Some(user) = user else {
            tracing::warn!(guard = self.name, user_id = %recaller.id(), "Remember token rejected");
            return Ok(false);
        };
        if !user.can_login() {
            tracing::warn!(guard = self.name, user_id = %user.id, "Remember login on disabled account");
            return Err(AuthError::AccountLocked);
        }

        self.update_session(&user.id);
        tracing::info!(guard = self.name, user_id = %user.id, "User restored from remember token");
        self.set_current(user, true);
        Ok(true)
    }

    /// Rebuild the state of a returning client
    ///
    /// Tries the session first, then the recaller. Nothing is re-verified for
    /// a session hit.
    pub async fn resume(&mut self, recaller: Option<&str>) -> AuthResult<bool> {
        if self.check() {
            return Ok(true);
        }

        let stored = self
            .session
            .as_ref()
            .and_then(|session| session.get(&self.config.session_key));
        if let Some(stored) = stored {
            let user = match UserId::from_canonical(&stored) {
                Some(id) => self
                    .provider()
                    .retrieve_by_id(&id)
                    .await
                    .inspect_err(AuthError::log)?,
                None => None,
            };
            match user {
                Some(user) if user.can_login() => {
                    tracing::debug!(guard = self.name, user_id = %user.id, "User restored from session");
                    self.set_current(user, false);
                    return Ok(true);
                }
                _ => self.forget_session(),
            }
        }

        match recaller {
            Some(recaller) => self.login_via_remember(recaller).await,
            None => Ok(false),
        }
    }

    /// Verify a bearer token and authenticate its subject for this guard only
    pub async fn authenticate_bearer(&mut self, token: Option<&str>) -> AuthResult<&User> {
        let claims = self.verifier.verify_token(token, self.clock.now())?;
        let user = self
            .provider()
            .retrieve_by_id(&claims.subject_id)
            .await
            .inspect_err(AuthError::log)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !user.can_login() {
            return Err(AuthError::AccountLocked);
        }
        tracing::debug!(guard = self.name, user_id = %user.id, "Bearer token accepted");
        Ok(self.set_current(user, false))
    }

    /// Bearer token for the current user
    pub fn issue_token(&self) -> AuthResult<Option<String>> {
        self.user()
            .map(|user| self.verifier.codec().issue(user, self.clock.now()))
            .transpose()
    }

    /// Force the current user without verification
    pub fn set_user(&mut self, user: User) {
        tracing::debug!(guard = self.name, user_id = %user.id, "User set on guard");
        self.set_current(user, false);
    }

    /// Back to guest; the stored remember token is rotated to a value nobody
    /// holds
    ///
    /// A no-op for a guest. If the rotation fails the state is kept so the
    /// caller can retry.
    pub async fn logout(&mut self) -> AuthResult<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        self.verifier
            .provider()
            .update_remember_token(&mut current.user, RememberToken::generate())
            .await
            .inspect_err(AuthError::log)?;
        let user_id = current.user.id.clone();

        self.forget_session();
        if let Some(session) = &self.session {
            session.invalidate();
        }
        self.current = None;
        self.recaller = None;

        tracing::info!(guard = self.name, user_id = %user_id, "User logged out");
        Ok(())
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    pub fn has_role(&self, role: &str, tenant: &TenantId) -> bool {
        self.user()
            .is_some_and(|user| self.evaluator.has_role(user, role, tenant))
    }

    pub fn has_permission(&self, permission: &str, tenant: &TenantId) -> bool {
        self.user()
            .is_some_and(|user| self.evaluator.has_permission(user, permission, tenant))
    }

    pub fn belongs_to_tenant(&self, tenant: &TenantId) -> bool {
        self.user()
            .is_some_and(|user| self.evaluator.belongs_to_tenant(user, tenant))
    }

    /// `TenantNotAuthorized` without membership, `AuthorizationDenied` without
    /// the grant (or without a user)
    pub fn authorize(&self, permission: &str, tenant: &TenantId) -> AuthResult<()> {
        let Some(user) = self.user() else {
            return Err(AuthError::AuthorizationDenied {
                permission: permission.to_string(),
                tenant: tenant.to_string(),
            });
        };
        let result = self.evaluator.authorize(user, permission, tenant);
        if let Err(err) = &result {
            tracing::debug!(guard = self.name, user_id = %user.id, error = %err, "Authorization refused");
        }
        result
    }

    /// Tenant of the current request, if a tenant context is attached
    pub fn current_tenant(&self) -> Option<TenantId> {
        self.tenants.as_ref()?.current_tenant_id()
    }

    /// Permission check against the current tenant; `false` without one
    pub fn can(&self, permission: &str) -> bool {
        self.current_tenant()
            .is_some_and(|tenant| self.has_permission(permission, &tenant))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Lockout check, verification and failure accounting
    ///
    /// The attempt is counted before the verifier runs, so concurrent guesses
    /// against one identifier cannot outnumber the lockout threshold.
    async fn authenticate(&self, credentials: &Credentials) -> AuthResult<Option<User>> {
        let now = self.clock.now();
        let identifier = credentials.identifier();

        let reserved = identifier
            .map(|identifier| self.acquire_attempt(identifier, now))
            .transpose()?;

        let verified = match self.verifier.verify(credentials, now).await {
            Ok(verified) => verified,
            Err(err) => {
                err.log();
                if let Some(identifier) = identifier {
                    self.throttle.release(identifier);
                }
                return Err(err);
            }
        };
        let Some(user) = verified else {
            if let Some(result) = reserved {
                self.log_failure(&result);
            }
            return Ok(None);
        };

        if let Some(identifier) = identifier {
            self.throttle.clear(identifier);
        }
        if !user.can_login() {
            tracing::warn!(guard = self.name, user_id = %user.id, "Login attempt on disabled account");
            return Err(AuthError::AccountLocked);
        }
        Ok(Some(user))
    }

    fn acquire_attempt(&self, identifier: &str, now: DateTime<Utc>) -> AuthResult<RateLimitResult> {
        self.throttle.acquire(identifier, now).map_err(|until| {
            let retry_after_secs = (until - now).num_seconds().max(1);
            tracing::warn!(guard = self.name, retry_after_secs, "Login attempt during lockout");
            AuthError::LockoutExceeded {
                identifier: identifier.to_string(),
                retry_after_secs,
            }
        })
    }

    fn log_failure(&self, result: &RateLimitResult) {
        if result.is_locked() {
            tracing::warn!(
                guard = self.name,
                attempts = result.attempts,
                "Identifier locked after repeated failures"
            );
        } else {
            tracing::warn!(
                guard = self.name,
                attempts = result.attempts,
                remaining = result.remaining,
                "Failed login attempt"
            );
        }
    }

    async fn cycle_remember_token(&self, user: &mut User) -> AuthResult<RememberToken> {
        let token = RememberToken::generate();
        self.provider()
            .update_remember_token(user, token.clone())
            .await
            .inspect_err(AuthError::log)?;
        tracing::info!(guard = self.name, user_id = %user.id, "Remember token rotated");
        Ok(token)
    }

    fn set_current(&mut self, user: User, via_remember: bool) -> &User {
        &self
            .current
            .insert(Authenticated { user, via_remember })
            .user
    }

    fn update_session(&self, id: &UserId) {
        if let Some(session) = &self.session {
            session.put(&self.config.session_key, id.to_canonical());
            session.regenerate();
        }
    }

    fn forget_session(&self) {
        if let Some(session) = &self.session {
            session.forget(&self.config.session_key);
        }
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("name", &self.name)
            .field("user_id", &self.id())
            .field("via_remember", &self.via_remember())
            .finish_non_exhaustive()
    }
}

/// Resolve `A` for `C` only if something is bound for it
fn resolve_optional<C, A>(container: &Container) -> AuthResult<Option<Arc<A>>>
where
    C: ?Sized + 'static,
    A: ?Sized + Send + Sync + 'static,
{
    if container.bound::<A>() || container.has_contextual::<C, A>() {
        Ok(Some(container.resolve_for::<C, A>()?))
    } else {
        Ok(None)
    }
}

fn short_name(type_name: &'static str) -> &'static str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}
