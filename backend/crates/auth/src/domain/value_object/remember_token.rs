//! Remember-me Token
//!
//! A user holds at most one remember token. Storing a new one through the
//! user provider is the rotation: every earlier value stops matching.
//!
//! The client keeps a *recaller* of the form `<user-id>|<token>`, with the id
//! in its canonical text form so string ids that look numeric survive.

use std::fmt;
use std::str::FromStr;

use kernel::id::UserId;
use platform::crypto;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Random bytes per token; 45 bytes encode to 60 base64url characters
const TOKEN_BYTES: usize = 45;

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RememberToken(String);

impl RememberToken {
    /// Fresh random token
    pub fn generate() -> Self {
        Self(crypto::random_token(TOKEN_BYTES))
    }

    /// Wrap a stored value
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison with a presented value
    pub fn matches(&self, presented: &str) -> bool {
        !self.0.is_empty() && crypto::constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl fmt::Debug for RememberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RememberToken").field(&"[REDACTED]").finish()
    }
}

/// Client-side remember-me value: user id plus token
#[derive(Clone, PartialEq, Eq)]
pub struct Recaller {
    id: UserId,
    token: RememberToken,
}

impl Recaller {
    pub fn new(id: UserId, token: RememberToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn token(&self) -> &RememberToken {
        &self.token
    }

    /// Value handed to the client
    pub fn to_value(&self) -> String {
        format!("{}|{}", self.id.to_canonical(), self.token.as_str())
    }
}

impl FromStr for Recaller {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tokens are base64url, so the last separator is the one
        let (id, token) = s.rsplit_once('|').ok_or(())?;
        if token.is_empty() {
            return Err(());
        }
        Ok(Self {
            id: UserId::from_canonical(id).ok_or(())?,
            token: RememberToken::from_stored(token),
        })
    }
}

impl fmt::Debug for Recaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recaller")
            .field("id", &self.id)
            .field("token", &self.token)
            .finish()
    }
}
