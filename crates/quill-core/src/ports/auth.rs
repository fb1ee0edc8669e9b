//! Authentication and authorization ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Claims stored in session tokens.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub email: String,
    pub exp: i64,
}

/// An authenticated session as handed out by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token service trait for session token operations.
pub trait TokenService: Send + Sync {
    /// Issue an access token for a user.
    fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of issued tokens.
    fn expiration_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Tokens signed out before their natural expiry.
#[async_trait]
pub trait RevocationList: Send + Sync {
    /// Remember `token_id` as revoked until `until`.
    async fn revoke(&self, token_id: &str, until: DateTime<Utc>);

    async fn is_revoked(&self, token_id: &str) -> bool;
}

/// The backend's authentication primitive: credential checks and session lifecycle.
/// Knows nothing about roles.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Invalidate the session so its token is no longer accepted.
    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    /// Resolve a bearer token back into a live session.
    async fn session_for_token(&self, token: &str) -> Result<Session, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Session has been signed out")]
    Revoked,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Auth backend error: {0}")]
    Backend(String),
}
