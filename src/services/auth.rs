use serde::Serialize;
use uuid::Uuid;

use crate::credentials::{token_fingerprint, verify_password, IssuedToken, TokenSigner};
use crate::db::models::{Role, User};
use crate::error::ClinicError;
use crate::store::{SessionStore, UserStore};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Identity attached to every request that passed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticatedActor {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
    signer: TokenSigner,
}

impl<S> AuthService<S>
where
    S: UserStore + SessionStore + Send + Sync,
{
    pub fn new(store: S, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    /// Exchanges email and password for a session token.
    ///
    /// An unknown email and a wrong password fail the same way.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(IssuedToken, User), ClinicError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClinicError::validation("email and password are required"));
        }

        let Some(user) = self.store.find_user_by_email(email).await? else {
            log::warn!("Login attempt for unknown email {}", email);
            return Err(ClinicError::Auth(INVALID_CREDENTIALS.into()));
        };
        if !verify_password(password, &user.password_hash)? {
            log::warn!("Wrong password for {}", email);
            return Err(ClinicError::Auth(INVALID_CREDENTIALS.into()));
        }

        let issued = self.signer.issue(&user)?;
        log::info!("User {} logged in as {}", user.id, user.role);
        Ok((issued, user))
    }

    /// Revokes `token` until it would have expired anyway.
    pub async fn logout(&self, token: &str) -> Result<(), ClinicError> {
        let claims = self.signer.verify(token)?;
        self.store
            .revoke_token(&token_fingerprint(token), claims.expires_at())
            .await?;
        log::info!("User {} logged out", claims.sub);
        Ok(())
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedActor, ClinicError> {
        let claims = self.signer.verify(token)?;
        if self.store.is_token_revoked(&token_fingerprint(token)).await? {
            return Err(ClinicError::Auth("token has been revoked".into()));
        }
        Ok(AuthenticatedActor {
            id: claims.sub,
            role: claims.role,
        })
    }
}
