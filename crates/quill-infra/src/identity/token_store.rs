//! Persistence for the fallback visitor token.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use quill_core::ports::{IdentityError, TokenStore};

/// Keeps the token in a small file, surviving restarts.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read visitor token");
                None
            }
        }
    }

    async fn save(&self, token: &str) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IdentityError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, token)
            .await
            .map_err(|e| IdentityError::Storage(e.to_string()))
    }
}

/// Process-local token storage.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn save(&self, token: &str) -> Result<(), IdentityError> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }
}
