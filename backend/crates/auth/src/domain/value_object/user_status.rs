//! User Status Value Object
//!
//! Only two states: an account is either usable or administratively
//! disabled. A disabled account presenting correct credentials is reported as
//! `AccountLocked`; deletion is the user provider's concern.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// User account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum UserStatus {
    /// Normal account, can log in
    #[default]
    #[display("active")]
    Active = 0,

    /// Administratively disabled, cannot log in
    #[display("disabled")]
    Disabled = 1,
}

impl UserStatus {
    /// Get numeric ID for storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Check if login is allowed
    #[inline]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Create from numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Active),
            1 => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}
