//! Bearer Token Codec
//!
//! Wire format:
//! `base64url(header).base64url(payload).base64url(hmac_sha256(header.payload))`
//! with the header fixed to `{"alg":"HS256","typ":"JWT"}`. Timestamps are Unix
//! seconds.

use chrono::{DateTime, TimeDelta, Utc};
use kernel::error::app_error::{AppError, ResultExt};
use kernel::error::kind::ErrorKind;
use kernel::id::UserId;
use platform::crypto;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::signing_secret::SigningSecret;
use crate::error::{AuthError, AuthResult};

const ALGORITHM: &str = "HS256";
const TOKEN_KIND: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub subject_id: UserId,
    pub email: String,
    pub role: String,
    pub issued_at: i64,
    pub expires_at: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: SigningSecret,
    ttl: TimeDelta,
    token_type: String,
}

impl TokenCodec {
    /// A `ttl` beyond what chrono can represent is clamped; issuing with it
    /// then fails instead of wrapping
    pub fn new(secret: SigningSecret, ttl: std::time::Duration, token_type: impl Into<String>) -> Self {
        Self {
            secret,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            token_type: token_type.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.signing_secret.clone(),
            config.token_ttl,
            config.token_type.clone(),
        )
    }

    /// Token for `user`, valid from `now` for the configured lifetime
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("Token lifetime out of range".to_string()))?;
        let claims = TokenClaims {
            subject_id: user.id.clone(),
            email: user.identifier.clone(),
            role: user.role.clone(),
            issued_at: now.timestamp(),
            expires_at: expires_at.timestamp(),
            token_type: self.token_type.clone(),
        };
        self.encode(&claims)
    }

    /// Sign arbitrary claims
    pub fn encode(&self, claims: &TokenClaims) -> AuthResult<String> {
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_KIND.to_string(),
        };
        let header = serde_json::to_vec(&header)
            .map_app_err(ErrorKind::Internal, "Token header encoding failed")?;
        let payload = serde_json::to_vec(claims)
            .map_app_err(ErrorKind::Internal, "Token claims encoding failed")?;

        let signing_input = format!(
            "{}.{}",
            crypto::to_base64url(&header),
            crypto::to_base64url(&payload)
        );
        let signature = crypto::hmac_sha256(self.secret.as_bytes(), signing_input.as_bytes())
            .map_app_err(ErrorKind::Internal, "Token signing failed")?;

        Ok(format!("{}.{}", signing_input, crypto::to_base64url(&signature)))
    }

    /// Check structure, signature and expiry, in that order
    pub fn verify(&self, token: Option<&str>, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::TokenMissing)?;

        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(AuthError::TokenInvalid);
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(AuthError::TokenInvalid);
        }

        let signature = crypto::from_base64url(signature).map_err(|_| AuthError::TokenInvalid)?;
        let signing_input = &token[..header.len() + 1 + payload.len()];
        let valid = crypto::verify_hmac_sha256(
            self.secret.as_bytes(),
            signing_input.as_bytes(),
            &signature,
        )
        .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::TokenInvalid);
        }

        let header: TokenHeader = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::TokenInvalid);
        }

        let claims: TokenClaims = decode_segment(payload)?;
        if now.timestamp() >= claims.expires_at {
            return Err(AuthError::SessionExpired);
        }
        Ok(claims)
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> AuthResult<T> {
    let bytes = crypto::from_base64url(segment).map_err(|_| AuthError::TokenInvalid)?;
    Ok(serde_json::from_slice(&bytes).map_err(AppError::from)?)
}
