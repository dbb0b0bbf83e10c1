//! Common ID Types
//!
//! Type-safe ID wrappers for domain entities. Identity records in the
//! back-office come from heterogeneous stores, so an ID value is either an
//! integer or a string.

use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw ID value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Int(v) => write!(f, "{}", v),
            IdValue::Str(v) => f.write_str(v),
        }
    }
}

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type UserId = Id<markers::User>;
///
/// let numeric = UserId::from(42);
/// let textual = UserId::from("usr_7f3a");
/// assert_ne!(numeric, textual);
/// assert_eq!(UserId::parse("42"), numeric);
///
/// // The canonical form survives a round trip through text
/// let padded = UserId::from("00042");
/// assert_eq!(padded.to_canonical(), r#""00042""#);
/// assert_eq!(UserId::from_canonical(&padded.to_canonical()), Some(padded));
/// ```
pub struct Id<T> {
    value: IdValue,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn from_value(value: IdValue) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Parse loose textual input; anything that reads as an `i64` becomes
    /// numeric
    ///
    /// Lossy for string ids that look like integers. Values this process
    /// writes and reads back go through [`Id::to_canonical`].
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => Self::from_value(IdValue::Int(n)),
            Err(_) => Self::from_value(IdValue::Str(raw.to_string())),
        }
    }

    /// Text form that keeps the integer/string distinction: integers bare,
    /// strings as JSON string literals
    pub fn to_canonical(&self) -> String {
        match &self.value {
            IdValue::Int(v) => v.to_string(),
            IdValue::Str(v) => serde_json::Value::String(v.clone()).to_string(),
        }
    }

    /// Inverse of [`Id::to_canonical`]; `None` for anything it never writes
    pub fn from_canonical(raw: &str) -> Option<Self> {
        serde_json::from_str::<IdValue>(raw)
            .ok()
            .map(Self::from_value)
    }

    pub fn value(&self) -> &IdValue {
        &self.value
    }

    pub fn into_value(self) -> IdValue {
        self.value
    }
}

// Manual impls so that the marker type carries no trait bounds.

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> FromStr for Id<T> {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<T> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::from_value(IdValue::Int(value))
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::from_value(IdValue::Str(value.to_string()))
    }
}

impl<T> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::from_value(IdValue::Str(value))
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IdValue::deserialize(deserializer).map(Self::from_value)
    }
}

/// Marker types for different entity IDs
pub mod markers {
    /// Marker for user (authenticatable) IDs
    pub struct User;

    /// Marker for tenant IDs
    pub struct Tenant;
}

/// Type aliases for common IDs
pub type UserId = Id<markers::User>;
pub type TenantId = Id<markers::Tenant>;
