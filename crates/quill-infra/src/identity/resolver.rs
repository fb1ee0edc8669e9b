//! Resolves a stable, privacy-preserving visitor identity.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha2::{Digest, Sha256};

use quill_core::domain::is_valid_identity;
use quill_core::ports::{IpLookup, TokenStore};

/// Salt mixed into every IP hash unless configured otherwise.
pub const DEFAULT_SALT: &str = "quill-anon-v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Salted SHA-256 of an IP address, hex encoded.
pub fn hash_ip(salt: &str, ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(ip.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Loopback and empty addresses never identify a visitor.
pub fn is_usable_ip(ip: &str) -> bool {
    let ip = ip.trim();
    !ip.is_empty() && ip != "127.0.0.1" && ip != "::1" && !ip.eq_ignore_ascii_case("localhost")
}

/// Tries each IP lookup in order, hashing the first usable address; otherwise
/// falls back to a random token persisted in the token store.
///
/// Resolution never fails. Each lookup is bounded by a timeout.
pub struct IdentityResolver {
    lookups: Vec<Arc<dyn IpLookup>>,
    store: Arc<dyn TokenStore>,
    salt: String,
    timeout: Duration,
}

impl IdentityResolver {
    pub fn new(
        lookups: Vec<Arc<dyn IpLookup>>,
        store: Arc<dyn TokenStore>,
        salt: impl Into<String>,
    ) -> Self {
        Self {
            lookups,
            store,
            salt: salt.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(&self) -> String {
        for lookup in &self.lookups {
            match tokio::time::timeout(self.timeout, lookup.lookup()).await {
                Ok(Ok(ip)) if is_usable_ip(&ip) => {
                    tracing::debug!(service = lookup.name(), "Identity resolved from IP");
                    return hash_ip(&self.salt, &ip);
                }
                Ok(Ok(_)) => {
                    tracing::debug!(service = lookup.name(), "Lookup returned a local address");
                }
                Ok(Err(e)) => {
                    tracing::warn!(service = lookup.name(), error = %e, "IP lookup failed");
                }
                Err(_) => {
                    tracing::warn!(service = lookup.name(), "IP lookup timed out");
                }
            }
        }

        self.fallback_token().await
    }

    async fn fallback_token(&self) -> String {
        if let Some(token) = self.store.load().await {
            if is_valid_identity(&token) {
                return token;
            }
            tracing::warn!("Stored visitor token is malformed, replacing it");
        }

        let token = generate_token();
        if let Err(e) = self.store.save(&token).await {
            tracing::warn!(error = %e, "Failed to persist visitor token");
        }
        token
    }
}

/// Random alphanumerics plus the current timestamp in milliseconds.
fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("{random}-{}", Utc::now().timestamp_millis())
}
