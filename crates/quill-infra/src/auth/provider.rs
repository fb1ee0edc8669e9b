//! Email/password authentication provider issuing revocable bearer sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use quill_core::domain::mask_email;
use quill_core::ports::{
    AuthError, AuthProvider, PasswordService, RevocationList, Session, TokenService,
    UserRepository,
};

/// Verifies credentials against the user repository and issues JWT sessions.
///
/// Signing out puts the session's token on the revocation list until it expires.
pub struct PasswordAuthProvider {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    revoked: Arc<dyn RevocationList>,
}

impl PasswordAuthProvider {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
        revoked: Arc<dyn RevocationList>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            revoked,
        }
    }
}

#[async_trait]
impl AuthProvider for PasswordAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        let Some(user) = user else {
            tracing::info!(user_email = %mask_email(email), "Sign-in for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.generate_token(user.id, &user.email)?;
        let expires_at = Utc::now() + TimeDelta::seconds(self.tokens.expiration_seconds());

        tracing::info!(user_id = %user.id, "Signed in");
        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token,
            expires_at,
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.revoked
            .revoke(&session.access_token, session.expires_at)
            .await;
        tracing::info!(user_id = %session.user_id, "Signed out");
        Ok(())
    }

    async fn session_for_token(&self, token: &str) -> Result<Session, AuthError> {
        if self.revoked.is_revoked(token).await {
            return Err(AuthError::Revoked);
        }

        let claims = self.tokens.validate_token(token)?;

        // The account may have been removed since the token was issued
        let user = self
            .users
            .find_by_id(claims.user_id)
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or_else(|| AuthError::InvalidToken("unknown account".to_string()))?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::InvalidToken("bad expiry".to_string()))?;

        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token: token.to_string(),
            expires_at,
        })
    }
}
