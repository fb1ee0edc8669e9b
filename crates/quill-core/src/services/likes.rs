//! Like toggling with per-(post, visitor) in-flight suppression.
//!
//! A toggle for the same pair is refused while another is still running, which
//! keeps double clicks from racing the check-then-act inside the store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::domain::is_valid_identity;
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::ContentStore;

type InFlightKey = (Uuid, String);

pub struct LikeService {
    store: Arc<dyn ContentStore>,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

impl LikeService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Toggle and return the new state. `DomainError::Busy` while the same pair is in flight.
    pub async fn toggle(&self, post_id: Uuid, identity: &str) -> Result<bool, DomainError> {
        if !is_valid_identity(identity) {
            return Err(DomainError::Validation(vec![FieldError::new(
                "identity",
                "is not a valid visitor token",
            )]));
        }

        let _guard = InFlight::acquire(&self.in_flight, (post_id, identity.to_string()))
            .ok_or(DomainError::Busy)?;

        self.store
            .toggle_like(post_id, identity)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::not_found("post", post_id),
                other => {
                    tracing::error!(%post_id, error = %other, "Like toggle failed");
                    other.into()
                }
            })
    }

    /// Like status for rendering. Errors are logged and read as "not liked".
    pub async fn has_liked(&self, post_id: Uuid, identity: &str) -> bool {
        if !is_valid_identity(identity) {
            return false;
        }
        match self.store.has_liked(post_id, identity).await {
            Ok(liked) => liked,
            Err(e) => {
                tracing::warn!(%post_id, error = %e, "Like status check failed");
                false
            }
        }
    }

    /// Whether the toggle control for this pair should be disabled.
    pub fn is_in_flight(&self, post_id: Uuid, identity: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(post_id, identity.to_string()))
    }
}

struct InFlight<'a> {
    set: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<InFlightKey>>, key: InFlightKey) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then_some(Self { set, key })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, NewComment, Post, PostDraft, PostPatch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Store whose like toggle waits for `release` after announcing itself on `entered`.
    #[derive(Default)]
    struct SlowLikes {
        liked: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ContentStore for SlowLikes {
        async fn list_published(&self) -> Result<Vec<Post>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
            Ok(Vec::new())
        }

        async fn get_by_slug(&self, _slug: &str) -> Result<Option<Post>, RepoError> {
            Ok(None)
        }

        async fn get_by_id(&self, _id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(None)
        }

        async fn create(&self, _draft: PostDraft) -> Result<Post, RepoError> {
            Err(RepoError::NotFound)
        }

        async fn update(&self, _id: Uuid, _patch: PostPatch) -> Result<Post, RepoError> {
            Err(RepoError::NotFound)
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }

        async fn increment_views(&self, _id: Uuid) {}

        async fn toggle_like(&self, _id: Uuid, _identity: &str) -> Result<bool, RepoError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(!self.liked.fetch_xor(true, Ordering::SeqCst))
        }

        async fn has_liked(&self, _id: Uuid, _identity: &str) -> Result<bool, RepoError> {
            Ok(self.liked.load(Ordering::SeqCst))
        }

        async fn list_comments(&self, _post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
            Ok(Vec::new())
        }

        async fn create_comment(&self, _comment: NewComment) -> Result<Comment, RepoError> {
            Err(RepoError::NotFound)
        }

        async fn delete_comment(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_toggle_is_busy_while_first_runs() {
        let store = Arc::new(SlowLikes::default());
        let likes = LikeService::new(store.clone());
        let post_id = Uuid::new_v4();

        let (first, second) = tokio::join!(likes.toggle(post_id, "visitor-1"), async {
            store.entered.notified().await;
            assert!(likes.is_in_flight(post_id, "visitor-1"));
            let second = likes.toggle(post_id, "visitor-1").await;
            store.release.notify_one();
            second
        });

        assert!(first.unwrap());
        assert!(matches!(second, Err(DomainError::Busy)));
        assert!(!likes.is_in_flight(post_id, "visitor-1"));
    }

    #[tokio::test]
    async fn test_other_visitor_is_not_blocked() {
        let store = Arc::new(SlowLikes::default());
        let likes = LikeService::new(store.clone());
        let post_id = Uuid::new_v4();

        let (first, second) = tokio::join!(likes.toggle(post_id, "visitor-1"), async {
            store.entered.notified().await;
            assert!(!likes.is_in_flight(post_id, "visitor-2"));
            store.release.notify_one();
            store.release.notify_one();
            likes.toggle(post_id, "visitor-2").await
        });

        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_identity_is_rejected_before_store() {
        let likes = LikeService::new(Arc::new(SlowLikes::default()));
        let result = likes.toggle(Uuid::new_v4(), "not valid!").await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_in_flight_guard_blocks_duplicates_until_dropped() {
        let set = Mutex::new(HashSet::new());
        let key = (Uuid::new_v4(), "visitor".to_string());

        let first = InFlight::acquire(&set, key.clone());
        assert!(first.is_some());
        assert!(InFlight::acquire(&set, key.clone()).is_none());

        drop(first);
        assert!(InFlight::acquire(&set, key).is_some());
    }
}
