//! Application Configuration
//!
//! Configuration for the guard, the bearer token codec and the lockout
//! policy.

use std::time::Duration;

use platform::rate_limit::RateLimitConfig;

use crate::domain::value_object::signing_secret::SigningSecret;
use crate::error::{AuthError, AuthResult};

pub const ENV_MAX_ATTEMPTS: &str = "AUTH_MAX_ATTEMPTS";
pub const ENV_LOCKOUT_SECONDS: &str = "AUTH_LOCKOUT_SECONDS";
pub const ENV_TOKEN_TTL_SECONDS: &str = "AUTH_TOKEN_TTL_SECONDS";
pub const ENV_SIGNING_SECRET: &str = "AUTH_SIGNING_SECRET";
pub const ENV_PASSWORD_PEPPER: &str = "AUTH_PASSWORD_PEPPER";

/// Upper bound for `AUTH_LOCKOUT_SECONDS` and `AUTH_TOKEN_TTL_SECONDS` (one year)
pub const MAX_DURATION_SECONDS: u64 = 366 * 24 * 60 * 60;

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// Failed attempts per identifier before lockout
    pub max_attempts: u32,
    /// How long a locked identifier stays locked (15 minutes)
    pub lockout_window: Duration,
    /// Bearer token lifetime (1 hour)
    pub token_ttl: Duration,
    /// Value of the `type` claim in issued tokens
    pub token_type: String,
    /// HMAC-SHA256 key for bearer tokens
    pub signing_secret: SigningSecret,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Session key holding the authenticated user id
    pub session_key: String,
    /// Name under which the client keeps the remember-me recaller
    pub recaller_key: String,
}

impl Default for AuthConfig {
    /// Defaults with a random signing secret; issued tokens do not survive a
    /// restart.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_window: Duration::from_secs(15 * 60),
            token_ttl: Duration::from_secs(3600),
            token_type: "access".to_string(),
            signing_secret: SigningSecret::random(),
            password_pepper: None,
            session_key: "auth_user_id".to_string(),
            recaller_key: "remember_token".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with a fresh random signing secret
    pub fn with_random_secret() -> Self {
        Self {
            signing_secret: SigningSecret::random(),
            ..Default::default()
        }
    }

    /// Create config for development (relaxed lockout, day-long tokens)
    pub fn development() -> Self {
        Self {
            max_attempts: 20,
            lockout_window: Duration::from_secs(60),
            token_ttl: Duration::from_secs(24 * 3600),
            ..Self::with_random_secret()
        }
    }

    /// Read configuration from the process environment
    ///
    /// `AUTH_SIGNING_SECRET` (standard base64) is required; every other
    /// variable falls back to its default.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AuthResult<Self> {
        let secret = lookup(ENV_SIGNING_SECRET)
            .ok_or_else(|| AuthError::Internal(format!("{ENV_SIGNING_SECRET} is not set")))?;

        let mut config = Self {
            signing_secret: SigningSecret::from_base64(&secret)?,
            ..Default::default()
        };

        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            config.max_attempts = parse_number(ENV_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOCKOUT_SECONDS) {
            config.lockout_window = parse_duration(ENV_LOCKOUT_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TOKEN_TTL_SECONDS) {
            config.token_ttl = parse_duration(ENV_TOKEN_TTL_SECONDS, &raw)?;
        }
        config.password_pepper = lookup(ENV_PASSWORD_PEPPER)
            .filter(|pepper| !pepper.is_empty())
            .map(String::into_bytes);

        if config.max_attempts == 0 {
            return Err(AuthError::Internal(format!(
                "{ENV_MAX_ATTEMPTS} must be at least 1"
            )));
        }

        Ok(config)
    }

    /// Lockout policy for the attempt throttle
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_attempts: self.max_attempts,
            window: self.lockout_window,
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("max_attempts", &self.max_attempts)
            .field("lockout_window", &self.lockout_window)
            .field("token_ttl", &self.token_ttl)
            .field("token_type", &self.token_type)
            .field("signing_secret", &self.signing_secret)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .field("session_key", &self.session_key)
            .field("recaller_key", &self.recaller_key)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AuthResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AuthError::Internal(format!("{key} is not a valid number")))
}

fn parse_duration(key: &str, raw: &str) -> AuthResult<Duration> {
    let secs: u64 = parse_number(key, raw)?;
    if secs > MAX_DURATION_SECONDS {
        return Err(AuthError::Internal(format!(
            "{key} must be at most {MAX_DURATION_SECONDS} seconds"
        )));
    }
    Ok(Duration::from_secs(secs))
}
