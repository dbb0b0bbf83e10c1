//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum shared by every crate of the auth core.

use serde::Serialize;

/// Error classification for the authentication / authorization core
///
/// Each variant carries a stable code (see [`ErrorKind::as_str`]) that boundary
/// layers (HTTP, CLI) map to their own status or exit codes. The core itself
/// never performs that mapping.
///
/// ## Faults vs. outcomes
/// Wrong secrets and bad tokens are expected end-user outcomes. Lockout,
/// locked accounts, provider outages and container misconfiguration are
/// operator-level faults, reported by [`ErrorKind::is_fault`].
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::LockoutExceeded;
/// assert_eq!(kind.as_str(), "LOCKOUT_EXCEEDED");
/// assert!(kind.is_fault());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// Identifier unknown or secret mismatch (indistinguishable on purpose)
    InvalidCredentials,
    /// Bearer token malformed or signature mismatch
    TokenInvalid,
    /// Bearer token absent or empty
    TokenMissing,
    /// Bearer token past its expiry timestamp
    SessionExpired,
    /// Account administratively disabled
    AccountLocked,
    /// Too many failed attempts for an identifier
    LockoutExceeded,
    /// Membership exists but the role/permission check failed
    AuthorizationDenied,
    /// No membership for the requested tenant
    TenantNotAuthorized,
    /// No contextual or global binding for a contract
    UnresolvedDependency,
    /// Contract requested again while already being resolved
    CircularDependency,
    /// User-provider / storage collaborator failed
    ProviderUnavailable,
    /// Hashing, configuration or other internal failure
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::TokenMissing.as_str(), "TOKEN_MISSING");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorKind::TokenInvalid => "TOKEN_INVALID",
            ErrorKind::TokenMissing => "TOKEN_MISSING",
            ErrorKind::SessionExpired => "SESSION_EXPIRED",
            ErrorKind::AccountLocked => "ACCOUNT_LOCKED",
            ErrorKind::LockoutExceeded => "LOCKOUT_EXCEEDED",
            ErrorKind::AuthorizationDenied => "AUTHORIZATION_DENIED",
            ErrorKind::TenantNotAuthorized => "TENANT_NOT_AUTHORIZED",
            ErrorKind::UnresolvedDependency => "UNRESOLVED_DEPENDENCY",
            ErrorKind::CircularDependency => "CIRCULAR_DEPENDENCY",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    /// Whether this kind is an operator/configuration fault
    ///
    /// Faults must be surfaced to the caller; non-faults are ordinary
    /// verification or authorization outcomes.
    #[inline]
    pub const fn is_fault(&self) -> bool {
        matches!(
            self,
            ErrorKind::AccountLocked
                | ErrorKind::LockoutExceeded
                | ErrorKind::ProviderUnavailable
                | ErrorKind::UnresolvedDependency
                | ErrorKind::CircularDependency
                | ErrorKind::Internal
        )
    }

    /// Whether this kind came out of bearer-token verification
    #[inline]
    pub const fn is_token_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::TokenInvalid | ErrorKind::TokenMissing | ErrorKind::SessionExpired
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorKind::InvalidCredentials.as_str(), "INVALID_CREDENTIALS");
        assert_eq!(ErrorKind::SessionExpired.as_str(), "SESSION_EXPIRED");
        assert_eq!(ErrorKind::CircularDependency.as_str(), "CIRCULAR_DEPENDENCY");
        assert_eq!(ErrorKind::ProviderUnavailable.to_string(), "PROVIDER_UNAVAILABLE");
    }

    #[test]
    fn test_is_fault() {
        assert!(ErrorKind::LockoutExceeded.is_fault());
        assert!(ErrorKind::AccountLocked.is_fault());
        assert!(ErrorKind::ProviderUnavailable.is_fault());
        assert!(ErrorKind::UnresolvedDependency.is_fault());
        assert!(!ErrorKind::InvalidCredentials.is_fault());
        assert!(!ErrorKind::TokenInvalid.is_fault());
        assert!(!ErrorKind::AuthorizationDenied.is_fault());
    }

    #[test]
    fn test_serialize_matches_code() {
        let json = serde_json::to_string(&ErrorKind::TenantNotAuthorized).unwrap();
        assert_eq!(json, "\"TENANT_NOT_AUTHORIZED\"");
    }
}
