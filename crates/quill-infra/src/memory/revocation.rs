//! In-memory token revocation list with expiring entries.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use quill_core::ports::RevocationList;

/// Remembers signed-out tokens until they would have expired anyway.
#[derive(Default)]
pub struct InMemoryRevocationList {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationList for InMemoryRevocationList {
    async fn revoke(&self, token_id: &str, until: DateTime<Utc>) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires| *expires > now);
        entries.insert(token_id.to_string(), until);
    }

    async fn is_revoked(&self, token_id: &str) -> bool {
        let entries = self.entries.read().await;
        let Some(until) = entries.get(token_id) else {
            return false;
        };

        if *until <= Utc::now() {
            drop(entries);
            // Past expiry the token no longer validates, so the entry can go
            self.entries.write().await.remove(token_id);
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_and_check() {
        let list = InMemoryRevocationList::new();
        list.revoke("token-a", Utc::now() + Duration::hours(1)).await;

        assert!(list.is_revoked("token-a").await);
        assert!(!list.is_revoked("token-b").await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_dropped() {
        let list = InMemoryRevocationList::new();
        list.revoke("old", Utc::now() - Duration::seconds(1)).await;

        assert!(!list.is_revoked("old").await);
        assert!(list.entries.read().await.is_empty());
    }
}
