//! Admin authorization gate.
//!
//! Wraps the auth backend with a role check so that the only stable signed-in
//! state is an admin session:
//!
//! ```text
//! SignedOut --login ok + admin role--> Admin(session)
//! Admin(session) --logout | role gone on re-check--> SignedOut
//! ```
//!
//! Every failure path resolves to "not admin".

use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::domain::{Role, mask_email};
use crate::ports::{AuthError, AuthProvider, RoleRepository, Session};

/// Gate state as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    Admin(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::SignedOut => None,
            AuthState::Admin(session) => Some(session),
        }
    }
}

/// Why a login attempt was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The auth backend rejected the credentials.
    Credentials,
    /// The credentials were valid but the account lacks the admin role.
    AdminRequired { user_id: Uuid },
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub reason: Option<DenialReason>,
    pub session: Option<Session>,
}

impl LoginOutcome {
    fn granted(session: Session) -> Self {
        Self {
            success: true,
            error: None,
            reason: None,
            session: Some(session),
        }
    }

    fn denied(reason: DenialReason, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            reason: Some(reason),
            session: None,
        }
    }
}

/// Callback invoked after every state transition. Must not register further listeners.
pub type AuthListener = Box<dyn Fn(&AuthState) + Send + Sync>;

pub const ADMIN_REQUIRED: &str = "Access denied: admin role required";

pub struct AdminGate {
    auth: Arc<dyn AuthProvider>,
    roles: Arc<dyn RoleRepository>,
    state: RwLock<AuthState>,
    listeners: RwLock<Vec<AuthListener>>,
}

impl AdminGate {
    pub fn new(auth: Arc<dyn AuthProvider>, roles: Arc<dyn RoleRepository>) -> Self {
        Self {
            auth,
            roles,
            state: RwLock::new(AuthState::SignedOut),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Role check against the role-assignment table. Query errors count as "no".
    pub async fn is_admin(&self, user_id: Uuid) -> bool {
        match self.roles.has_role(user_id, Role::Admin).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Role check failed, denying");
                false
            }
        }
    }

    /// Sign in and require the admin role without touching the gate's own
    /// state. A non-admin session is signed out again before this returns.
    pub async fn admit(&self, email: &str, password: &str) -> Result<Session, LoginOutcome> {
        let session = match self.auth.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::info!(email = %mask_email(email), error = %e, "Login rejected");
                return Err(LoginOutcome::denied(DenialReason::Credentials, e.to_string()));
            }
        };

        if !self.is_admin(session.user_id).await {
            tracing::warn!(email = %mask_email(email), "Login without admin role, signing out");
            self.discard(&session).await;
            return Err(LoginOutcome::denied(
                DenialReason::AdminRequired {
                    user_id: session.user_id,
                },
                ADMIN_REQUIRED,
            ));
        }

        tracing::info!(email = %mask_email(email), "Admin signed in");
        Ok(session)
    }

    /// [`admit`](Self::admit) and move the gate to the resulting state. A
    /// denied attempt leaves the current session alone unless it belongs to
    /// the same account, which has evidently lost the admin role.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        match self.admit(email, password).await {
            Ok(session) => {
                if let Some(previous) = self.session() {
                    self.discard(&previous).await;
                }
                self.transition(AuthState::Admin(session.clone()));
                LoginOutcome::granted(session)
            }
            Err(outcome) => {
                if let Some(DenialReason::AdminRequired { user_id }) = outcome.reason {
                    if let Some(previous) = self.session().filter(|s| s.user_id == user_id) {
                        self.discard(&previous).await;
                        self.transition(AuthState::SignedOut);
                    }
                }
                outcome
            }
        }
    }

    pub async fn logout(&self) {
        if let Some(session) = self.session() {
            self.discard(&session).await;
            tracing::info!(email = %mask_email(&session.email), "Admin signed out");
        }
        self.transition(AuthState::SignedOut);
    }

    /// Register a listener for state transitions.
    pub fn on_auth_change<F>(&self, listener: F)
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Feed a session change from the auth backend. The role is re-checked every
    /// time since grants can be revoked between sessions.
    pub async fn handle_session_change(&self, session: Option<Session>) -> AuthState {
        let next = match session {
            None => AuthState::SignedOut,
            Some(session) if self.is_admin(session.user_id).await => AuthState::Admin(session),
            Some(session) => {
                tracing::warn!(user_id = %session.user_id, "Session lost admin role");
                self.discard(&session).await;
                AuthState::SignedOut
            }
        };
        self.transition(next.clone());
        next
    }

    /// Re-run the role check for the current session.
    pub async fn reverify(&self) -> AuthState {
        let current = self.session();
        self.handle_session_change(current).await
    }

    /// Stateless per-request check: the token must map to a live session whose
    /// user holds the admin role right now.
    pub async fn authorize(&self, token: &str) -> Result<Session, AuthError> {
        let session = self.auth.session_for_token(token).await?;
        if self.is_admin(session.user_id).await {
            Ok(session)
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    /// Sign out a token presented by a client.
    pub async fn sign_out_token(&self, token: &str) -> Result<(), AuthError> {
        let session = self.auth.session_for_token(token).await?;
        self.auth.sign_out(&session).await
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state().session().cloned()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    async fn discard(&self, session: &Session) {
        if let Err(e) = self.auth.sign_out(session).await {
            tracing::warn!(user_id = %session.user_id, error = %e, "Sign-out failed");
        }
    }

    fn transition(&self, next: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        for listener in self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener(&next);
        }
    }
}
