//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use container::ContainerError;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::PasswordHashError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong secret
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bearer token malformed or signature mismatch
    #[error("Bearer token is invalid")]
    TokenInvalid,

    /// Bearer token absent or empty
    #[error("Bearer token is missing")]
    TokenMissing,

    /// Bearer token past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// Account administratively disabled
    #[error("Account is locked")]
    AccountLocked,

    /// Too many failed attempts for an identifier
    #[error("Too many failed attempts, retry in {retry_after_secs}s")]
    LockoutExceeded {
        identifier: String,
        retry_after_secs: i64,
    },

    /// Member of the tenant, but without the grant
    #[error("Permission {permission} denied in tenant {tenant}")]
    AuthorizationDenied { permission: String, tenant: String },

    /// Not a member of the tenant
    #[error("Not authorized for tenant {tenant}")]
    TenantNotAuthorized { tenant: String },

    /// User provider / storage collaborator failed
    #[error("User provider unavailable: {0}")]
    ProviderUnavailable(#[source] AppError),

    /// Collaborator could not be resolved from the container
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::TokenInvalid => ErrorKind::TokenInvalid,
            AuthError::TokenMissing => ErrorKind::TokenMissing,
            AuthError::SessionExpired => ErrorKind::SessionExpired,
            AuthError::AccountLocked => ErrorKind::AccountLocked,
            AuthError::LockoutExceeded { .. } => ErrorKind::LockoutExceeded,
            AuthError::AuthorizationDenied { .. } => ErrorKind::AuthorizationDenied,
            AuthError::TenantNotAuthorized { .. } => ErrorKind::TenantNotAuthorized,
            AuthError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            AuthError::Container(err) => err.kind(),
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an operator-level fault rather than an end-user outcome
    pub fn is_fault(&self) -> bool {
        self.kind().is_fault()
    }

    /// Provider failure with a message
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        AuthError::ProviderUnavailable(AppError::provider_unavailable(message.into()))
    }

    /// Convert to AppError
    ///
    /// The identifier of a lockout is kept out of the payload; callers that
    /// need it match on the variant.
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::LockoutExceeded {
                retry_after_secs, ..
            } => err.with_context("retry_after_secs", retry_after_secs),
            AuthError::AuthorizationDenied { permission, tenant } => err
                .with_context("permission", permission)
                .with_context("tenant", tenant),
            AuthError::TenantNotAuthorized { tenant } => err.with_context("tenant", tenant),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::ProviderUnavailable(e) => {
                tracing::error!(error = %e, "User provider unavailable");
            }
            AuthError::Container(e) => {
                tracing::error!(error = %e, "Auth collaborator resolution failed");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::LockoutExceeded {
                retry_after_secs, ..
            } => {
                tracing::warn!(retry_after_secs, "Login attempt during lockout");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ProviderUnavailable(inner) => inner,
            AuthError::Container(inner) => inner.into_app_error(),
            other => other.to_app_error(),
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::ProviderUnavailable => AuthError::ProviderUnavailable(err),
            ErrorKind::TokenInvalid => AuthError::TokenInvalid,
            ErrorKind::TokenMissing => AuthError::TokenMissing,
            ErrorKind::SessionExpired => AuthError::SessionExpired,
            ErrorKind::InvalidCredentials => AuthError::InvalidCredentials,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
