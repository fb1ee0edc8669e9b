//! Anonymous identity ports - IP lookup services and local token persistence.

use async_trait::async_trait;

/// An external "what is my IP" service.
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Fetch the caller's public IP address.
    async fn lookup(&self) -> Result<String, IdentityError>;
}

/// Local persistent storage for the fallback visitor token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Option<String>;

    async fn save(&self, token: &str) -> Result<(), IdentityError>;
}

/// Identity resolution errors. Never escape the resolver.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Lookup timed out")]
    Timeout,

    #[error("Response carried no usable IP")]
    NoIp,

    #[error("Storage error: {0}")]
    Storage(String),
}
