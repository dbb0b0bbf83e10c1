//! Credential Verifier
//!
//! Checks a credential set against the user provider without touching any
//! login state. An unknown identifier and a wrong secret produce the same
//! outcome and cost the same Argon2 work, so verification never reveals
//! whether an account exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::{app_error::ResultExt, kind::ErrorKind};
use platform::password::{self, ClearTextPassword};

use crate::application::token::{TokenClaims, TokenCodec};
use crate::domain::entity::user::User;
use crate::domain::repository::UserProvider;
use crate::domain::value_object::credentials::Credentials;
use crate::error::AuthResult;

#[derive(Clone)]
pub struct CredentialVerifier {
    provider: Arc<dyn UserProvider>,
    codec: TokenCodec,
}

impl CredentialVerifier {
    pub fn new(provider: Arc<dyn UserProvider>, codec: TokenCodec) -> Self {
        Self { provider, codec }
    }

    pub fn provider(&self) -> &Arc<dyn UserProvider> {
        &self.provider
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verified user, or `None` when the credentials do not check out
    ///
    /// Token rejections are folded into `None` here; use
    /// [`Self::verify_token`] to learn why a token was refused.
    pub async fn verify(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        match credentials {
            Credentials::Password { identifier, secret } => {
                self.verify_secret(identifier, secret).await
            }
            Credentials::Bearer { token } => match self.verify_token(Some(token), now) {
                Ok(claims) => self.provider.retrieve_by_id(&claims.subject_id).await,
                Err(err) if !err.is_fault() => {
                    tracing::debug!(kind = %err.kind(), "Bearer token rejected");
                    Ok(None)
                }
                Err(err) => Err(err),
            },
        }
    }

    /// An unknown identifier is checked against a decoy hash
    pub async fn verify_secret(
        &self,
        identifier: &str,
        secret: &ClearTextPassword,
    ) -> AuthResult<Option<User>> {
        let Some(user) = self.provider.retrieve_by_credentials(identifier).await? else {
            let secret = secret.clone();
            tokio::task::spawn_blocking(move || password::verify_decoy(&secret, None))
                .await
                .map_app_err(ErrorKind::Internal, "Password check did not complete")?;
            return Ok(None);
        };
        if self.provider.validate_credentials(&user, secret).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Decoded claims, or the reason the token was refused
    pub fn verify_token(&self, token: Option<&str>, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        self.codec.verify(token, now)
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
