//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{AuthProvider, ContentStore, TokenService};
use quill_core::services::{AdminGate, LikeService};
use quill_infra::{
    Argon2PasswordService, Backend, BackendKind, InMemoryRevocationList, JwtTokenService,
    PasswordAuthProvider,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendKind,
    pub store: Arc<dyn ContentStore>,
    pub gate: Arc<AdminGate>,
    pub likes: Arc<LikeService>,
    pub tokens: Arc<dyn TokenService>,
    pub identity_salt: Arc<str>,
}

impl AppState {
    /// Build the application state against the configured backend.
    pub async fn new(config: &AppConfig) -> Self {
        let backend = Backend::connect(config.database.as_ref()).await;
        let passwords = Arc::new(Argon2PasswordService::new());

        if !backend.is_remote() {
            match &config.admin {
                Some(admin) => {
                    if let Err(e) = backend
                        .seed_admin(&admin.email, &admin.password, passwords.as_ref())
                        .await
                    {
                        tracing::error!(error = %e, "Failed to seed admin account");
                    }
                }
                None => {
                    tracing::warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set. Admin login disabled.");
                }
            }
        }

        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let state = Self::from_backend(backend, passwords, tokens, &config.identity_salt);

        tracing::info!(backend = state.backend.as_str(), "Application state initialized");
        state
    }

    /// Wire the services on top of an already chosen backend.
    pub fn from_backend(
        backend: Backend,
        passwords: Arc<Argon2PasswordService>,
        tokens: Arc<dyn TokenService>,
        identity_salt: &str,
    ) -> Self {
        let auth: Arc<dyn AuthProvider> = Arc::new(PasswordAuthProvider::new(
            backend.users.clone(),
            passwords,
            tokens.clone(),
            Arc::new(InMemoryRevocationList::new()),
        ));

        Self {
            backend: backend.kind,
            store: backend.store.clone(),
            gate: Arc::new(AdminGate::new(auth, backend.roles.clone())),
            likes: Arc::new(LikeService::new(backend.store)),
            tokens,
            identity_salt: Arc::from(identity_salt),
        }
    }
}
