//! Credential Set
//!
//! What a caller presents to the guard: an identifier with a clear-text
//! secret, or a bearer token.

use platform::password::ClearTextPassword;

#[derive(Debug)]
pub enum Credentials {
    Password {
        identifier: String,
        secret: ClearTextPassword,
    },
    Bearer {
        token: String,
    },
}

impl Credentials {
    /// Identifier and secret as typed at login (NFKC-normalized, no policy)
    pub fn password(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials::Password {
            identifier: identifier.into(),
            secret: ClearTextPassword::for_verification(secret.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer {
            token: token.into(),
        }
    }

    /// Key for attempt throttling
    ///
    /// Bearer tokens are not throttled: a forged token fails on its signature
    /// without touching any account.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Credentials::Password { identifier, .. } => Some(identifier),
            Credentials::Bearer { .. } => None,
        }
    }
}
