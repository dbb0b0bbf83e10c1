//! Password Hashing and Verification
//!
//! Stored user secrets are Argon2id PHC strings. A secret is NFKC-normalized
//! before it is hashed or checked, so both sides see the same bytes.
//!
//! Registration goes through [`ClearTextPassword::new`], which applies the
//! policy. Login goes through [`ClearTextPassword::for_verification`], which
//! does not.
//!
//! Argon2 is CPU bound; async callers run [`HashedPassword::verify`] and
//! [`verify_decoy`] off the runtime workers.

use std::fmt;
use std::sync::OnceLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Shortest accepted secret, in code points
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted secret, in code points
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Secrets rejected outright, compared lowercase
const DENYLIST: &[&str] = &[
    "password",
    "password1",
    "password123",
    "letmein1",
    "welcome1",
    "admin123",
    "iloveyou",
    "trustno1",
    "changeme",
    "abcdefgh",
];

/// Keyboard runs rejected anywhere in the secret
const KEYBOARD_RUNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Control characters other than tab and newline
    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    /// Denylisted, a single repeated character, a digit run or a keyboard run
    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear-text secret
// ============================================================================

/// Normalized clear-text secret, wiped from memory on drop
///
/// Every clone is wiped on its own drop. `Debug` is redacted.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let registered = ClearTextPassword::new("Correct-Horse-42".to_string()).unwrap();
/// let hashed = registered.hash(Some(b"pepper")).unwrap();
///
/// let presented = ClearTextPassword::for_verification("Correct-Horse-42".to_string());
/// assert!(hashed.verify(&presented, Some(b"pepper")));
/// assert!(!hashed.verify(&presented, None));
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Secret chosen at registration, checked against the policy
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let secret = Self::for_verification(raw);
        check_policy(&secret.0)?;
        Ok(secret)
    }

    /// Secret presented at login; normalized only
    pub fn for_verification(raw: String) -> Self {
        let raw = Zeroizing::new(raw);
        Self(raw.nfkc().collect())
    }

    /// Argon2id hash with a fresh random salt
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let hash = Argon2::default()
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        Ok(HashedPassword {
            phc: hash.to_string(),
        })
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut input = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(pepper) = pepper {
            input.extend_from_slice(pepper);
        }
        input
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Stored hash
// ============================================================================

/// Argon2id hash in PHC string format, safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    phc: String,
}

impl HashedPassword {
    /// Restore a stored hash; the string must parse as PHC
    pub fn from_phc_string(phc: impl Into<String>) -> Result<Self, PasswordHashError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { phc })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.phc
    }

    /// Constant-time check of `password`; `pepper` must match the one used
    /// when hashing
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.phc) else {
            return false;
        };
        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed)
            .is_ok()
    }

    /// Whether the hash was made with another algorithm or with parameters
    /// other than the current defaults
    pub fn needs_rehash(&self) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.phc) else {
            return true;
        };
        if parsed.algorithm != argon2::Algorithm::Argon2id.ident() {
            return true;
        }
        let Ok(params) = argon2::Params::try_from(&parsed) else {
            return true;
        };
        let current = argon2::Params::default();
        params.m_cost() != current.m_cost()
            || params.t_cost() != current.t_cost()
            || params.p_cost() != current.p_cost()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("phc", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Decoy verification
// ============================================================================

/// Hash of a random secret nobody holds, built on first use
fn decoy() -> Option<&'static HashedPassword> {
    static DECOY: OnceLock<Option<HashedPassword>> = OnceLock::new();
    DECOY
        .get_or_init(|| {
            ClearTextPassword::for_verification(crate::crypto::random_token(32))
                .hash(None)
                .ok()
        })
        .as_ref()
}

/// Full Argon2id verification of `password` against the decoy hash
///
/// For lookups that found no stored hash: the caller pays the same cost as a
/// real check, so timing does not tell a missing account from a wrong secret.
/// Always `false`.
pub fn verify_decoy(password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
    if let Some(decoy) = decoy() {
        let _ = decoy.verify(password, pepper);
    }
    false
}

// ============================================================================
// Policy
// ============================================================================

fn check_policy(secret: &str) -> Result<(), PasswordPolicyError> {
    if secret.trim().is_empty() {
        return Err(PasswordPolicyError::EmptyOrWhitespace);
    }

    let actual = secret.chars().count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }
    if actual > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual,
        });
    }

    if secret
        .chars()
        .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
    {
        return Err(PasswordPolicyError::InvalidCharacter);
    }

    if is_predictable(&secret.to_lowercase()) {
        return Err(PasswordPolicyError::CommonPattern);
    }
    Ok(())
}

fn is_predictable(lower: &str) -> bool {
    let mut chars = lower.chars();
    let first = chars.next();
    if chars.all(|c| Some(c) == first) {
        return true;
    }

    DENYLIST.contains(&lower)
        || KEYBOARD_RUNS.iter().any(|run| lower.contains(run))
        || is_digit_run(lower)
}

/// Every digit continues an ascending or descending run (wrapping at 9/0)
fn is_digit_run(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }
    let up = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    let down = digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10);
    up || down
}
