//! Bearer Token Signing Secret
//!
//! Raw key bytes for HMAC-SHA256. Zeroized on drop and never printed.

use std::fmt;

use platform::crypto;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AuthError, AuthResult};

/// Length of generated secrets
pub const GENERATED_SECRET_BYTES: usize = 32;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Wrap configured key bytes; an empty key is rejected
    pub fn new(bytes: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::Internal("Signing secret is empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Decode a standard base64 value as found in configuration
    pub fn from_base64(encoded: &str) -> AuthResult<Self> {
        let bytes = crypto::from_base64(encoded.trim())
            .map_err(|_| AuthError::Internal("Signing secret is not valid base64".to_string()))?;
        Self::new(bytes)
    }

    pub fn random() -> Self {
        Self(crypto::random_bytes(GENERATED_SECRET_BYTES))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningSecret").field(&"[REDACTED]").finish()
    }
}
