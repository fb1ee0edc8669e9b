//! Client-side post cache with optimistic mutations.
//!
//! Two views are kept: the admin list (every post) and the public list (live
//! posts). They are only written through this type. Each mutation runs in three
//! phases:
//!
//! 1. snapshot both views,
//! 2. apply the presumed result so readers see it before the backend answers,
//! 3. on failure restore the snapshot verbatim; on any outcome mark both views
//!    stale so the next read reconciles with the store.
//!
//! Every invalidation bumps a generation counter. A store read only lands in a
//! view if no invalidation happened while it was in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Post, PostDraft, PostPatch};
use crate::error::{DomainError, RepoError};
use crate::ports::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheView {
    Admin,
    Public,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    posts: Vec<Post>,
    loaded: bool,
    stale: bool,
}

impl Slot {
    fn needs_fetch(&self) -> bool {
        !self.loaded || self.stale
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    admin: Slot,
    public: Slot,
}

pub struct PostCache {
    store: Arc<dyn ContentStore>,
    admin: RwLock<Slot>,
    public: RwLock<Slot>,
    generation: AtomicU64,
}

impl PostCache {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            admin: RwLock::new(Slot::default()),
            public: RwLock::new(Slot::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Admin list, fetched from the store when missing or stale.
    pub async fn admin_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.read_through(CacheView::Admin).await
    }

    /// Public list, fetched from the store when missing or stale.
    pub async fn public_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.read_through(CacheView::Public).await
    }

    /// Current contents of a view without touching the store.
    pub fn cached(&self, view: CacheView) -> Vec<Post> {
        read(self.slot(view)).posts.clone()
    }

    pub fn is_stale(&self, view: CacheView) -> bool {
        read(self.slot(view)).needs_fetch()
    }

    /// Mark both views for refresh.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        write(&self.admin).stale = true;
        write(&self.public).stale = true;
    }

    /// Reload both views from the store now.
    pub async fn refresh(&self) -> Result<(), DomainError> {
        self.invalidate();
        self.admin_posts().await?;
        self.public_posts().await?;
        Ok(())
    }

    pub async fn create(&self, draft: PostDraft) -> Result<Post, DomainError> {
        let draft = draft.prepare()?;
        let optimistic = Post::from_draft(draft.clone(), Utc::now());

        self.mutate(
            move |admin, public| {
                if optimistic.is_live() {
                    public.insert(0, optimistic.clone());
                }
                admin.insert(0, optimistic);
            },
            self.store.create(draft),
        )
        .await
        .map_err(DomainError::from)
    }

    pub async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, DomainError> {
        let patch = patch.prepare()?;
        let now = Utc::now();
        let optimistic_patch = patch.clone();

        self.mutate(
            move |admin, public| {
                let patched = match admin.iter_mut().find(|p| p.id == id) {
                    Some(post) => {
                        post.apply(&optimistic_patch, now);
                        Some(post.clone())
                    }
                    None => public.iter().find(|p| p.id == id).map(|p| {
                        let mut post = p.clone();
                        post.apply(&optimistic_patch, now);
                        post
                    }),
                };

                let Some(patched) = patched else {
                    return;
                };
                let position = public.iter().position(|p| p.id == id);
                match (patched.is_live_at(now), position) {
                    (true, Some(i)) => public[i] = patched,
                    (true, None) => public.insert(0, patched),
                    (false, Some(i)) => {
                        public.remove(i);
                    }
                    (false, None) => {}
                }
            },
            self.store.update(id, patch),
        )
        .await
        .map_err(|e| post_error(e, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.mutate(
            move |admin, public| {
                admin.retain(|p| p.id != id);
                public.retain(|p| p.id != id);
            },
            self.store.delete(id),
        )
        .await
        .map_err(|e| post_error(e, id))
    }

    async fn mutate<T, F, Fut>(&self, apply: F, call: Fut) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Vec<Post>, &mut Vec<Post>),
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let snapshot = self.snapshot();
        {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let mut admin = write(&self.admin);
            let mut public = write(&self.public);
            apply(&mut admin.posts, &mut public.posts);
        }

        let result = call.await;

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Mutation failed, rolling back optimistic update");
            self.restore(snapshot);
        }
        self.invalidate();
        result
    }

    async fn read_through(&self, view: CacheView) -> Result<Vec<Post>, DomainError> {
        let generation = {
            let slot = read(self.slot(view));
            if !slot.needs_fetch() {
                return Ok(slot.posts.clone());
            }
            self.generation.load(Ordering::SeqCst)
        };

        let posts = match view {
            CacheView::Admin => self.store.list_all().await?,
            CacheView::Public => self.store.list_published().await?,
        };

        let mut slot = write(self.slot(view));
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(?view, "Cache changed during fetch, result not stored");
            return Ok(posts);
        }
        slot.posts = posts.clone();
        slot.loaded = true;
        slot.stale = false;
        Ok(posts)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            admin: read(&self.admin).clone(),
            public: read(&self.public).clone(),
        }
    }

    fn restore(&self, snapshot: Snapshot) {
        *write(&self.admin) = snapshot.admin;
        *write(&self.public) = snapshot.public;
    }

    fn slot(&self, view: CacheView) -> &RwLock<Slot> {
        match view {
            CacheView::Admin => &self.admin,
            CacheView::Public => &self.public,
        }
    }
}

fn post_error(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("post", id),
        other => other.into(),
    }
}

fn read(lock: &RwLock<Slot>) -> std::sync::RwLockReadGuard<'_, Slot> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<Slot>) -> std::sync::RwLockWriteGuard<'_, Slot> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, NewComment};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Minimal post-only store; fails every mutation while `failing` is set.
    /// While `hold_lists` is set, `list_all` reads its rows and then waits for
    /// `list_release` before answering.
    #[derive(Default)]
    struct FakeStore {
        posts: Mutex<Vec<Post>>,
        failing: AtomicBool,
        list_calls: AtomicUsize,
        hold_lists: AtomicBool,
        list_entered: tokio::sync::Notify,
        list_release: tokio::sync::Notify,
    }

    impl FakeStore {
        fn check(&self) -> Result<(), RepoError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(RepoError::Connection("backend unreachable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ContentStore for FakeStore {
        async fn list_published(&self) -> Result<Vec<Post>, RepoError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let posts = self.posts.lock().unwrap();
            Ok(posts.iter().filter(|p| p.is_live()).cloned().collect())
        }

        async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let posts = self.posts.lock().unwrap().clone();
            if self.hold_lists.load(Ordering::SeqCst) {
                self.list_entered.notify_one();
                self.list_release.notified().await;
            }
            Ok(posts)
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
            let posts = self.posts.lock().unwrap();
            Ok(posts.iter().find(|p| p.slug == slug).cloned())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            let posts = self.posts.lock().unwrap();
            Ok(posts.iter().find(|p| p.id == id).cloned())
        }

        async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
            self.check()?;
            let post = Post::from_draft(draft, Utc::now());
            self.posts.lock().unwrap().insert(0, post.clone());
            Ok(post)
        }

        async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
            self.check()?;
            let mut posts = self.posts.lock().unwrap();
            let post = posts
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepoError::NotFound)?;
            post.apply(&patch, Utc::now());
            Ok(post.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.check()?;
            self.posts.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn increment_views(&self, _id: Uuid) {}

        async fn toggle_like(&self, _id: Uuid, _identity: &str) -> Result<bool, RepoError> {
            Ok(true)
        }

        async fn has_liked(&self, _id: Uuid, _identity: &str) -> Result<bool, RepoError> {
            Ok(false)
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

    async fn seeded() -> (PostCache, Arc<FakeStore>, Post, Post) {
        let store = Arc::new(FakeStore::default());
        let cache = PostCache::new(store.clone());
        let live = cache
            .create(PostDraft::new("Live", "body", "ex").published(true))
            .await
            .unwrap();
        let draft = cache
            .create(PostDraft::new("Draft", "body", "ex"))
            .await
            .unwrap();
        cache.refresh().await.unwrap();
        (cache, store, live, draft)
    }

    #[tokio::test]
    async fn test_reads_are_cached_until_invalidated() {
        let (cache, store, _, _) = seeded().await;
        let before = store.list_calls.load(Ordering::SeqCst);

        cache.admin_posts().await.unwrap();
        cache.public_posts().await.unwrap();
        assert_eq!(store.list_calls.load(Ordering::SeqCst), before);

        cache.invalidate();
        cache.admin_posts().await.unwrap();
        assert_eq!(store.list_calls.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn test_create_is_visible_before_backend_answers() {
        let (cache, _, _, _) = seeded().await;
        let draft = PostDraft::new("Hidden", "body", "ex").prepare().unwrap();

        // Drive the optimistic phase with a call that checks the cache mid-flight.
        let observed = cache
            .mutate(
                |admin, _| admin.insert(0, Post::from_draft(draft.clone(), Utc::now())),
                async { Ok::<_, RepoError>(cache.cached(CacheView::Admin).len()) },
            )
            .await
            .unwrap();
        assert_eq!(observed, 3);
    }

    #[tokio::test]
    async fn test_create_only_reaches_public_view_when_live() {
        let (cache, _, _, _) = seeded().await;
        cache
            .create(PostDraft::new("Another draft", "b", "e"))
            .await
            .unwrap();
        assert_eq!(cache.admin_posts().await.unwrap().len(), 3);
        assert_eq!(cache.public_posts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_restores_admin_view_exactly() {
        let (cache, store, live, _) = seeded().await;
        let before = cache.cached(CacheView::Admin);

        store.failing.store(true, Ordering::SeqCst);
        let result = cache
            .update(
                live.id,
                PostPatch {
                    title: Some("Changed".into()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Backend(_))));
        assert_eq!(cache.cached(CacheView::Admin), before);
        assert!(cache.is_stale(CacheView::Admin));
        assert!(cache.is_stale(CacheView::Public));
    }

    #[tokio::test]
    async fn test_unpublish_removes_from_public_view() {
        let (cache, _, live, _) = seeded().await;
        cache
            .update(live.id, PostPatch::publish(false))
            .await
            .unwrap();
        assert!(cache.cached(CacheView::Public).is_empty());
        assert!(cache.public_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_upserts_into_public_view() {
        let (cache, _, _, draft) = seeded().await;
        cache
            .update(draft.id, PostPatch::publish(true))
            .await
            .unwrap();
        let public = cache.cached(CacheView::Public);
        assert_eq!(public[0].id, draft.id);
        assert!(public[0].published);
    }

    #[tokio::test]
    async fn test_failed_delete_rolls_back_both_views() {
        let (cache, store, live, _) = seeded().await;
        let admin = cache.cached(CacheView::Admin);
        let public = cache.cached(CacheView::Public);

        store.failing.store(true, Ordering::SeqCst);
        assert!(cache.delete(live.id).await.is_err());
        assert_eq!(cache.cached(CacheView::Admin), admin);
        assert_eq!(cache.cached(CacheView::Public), public);
    }

    #[tokio::test]
    async fn test_invalid_patch_never_reaches_store() {
        let (cache, store, live, _) = seeded().await;
        store.failing.store(true, Ordering::SeqCst);
        let result = cache
            .update(
                live.id,
                PostPatch {
                    title: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(!cache.is_stale(CacheView::Admin));
    }

    #[tokio::test]
    async fn test_update_unknown_post_is_not_found() {
        let (cache, _, _, _) = seeded().await;
        let result = cache.update(Uuid::new_v4(), PostPatch::publish(true)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_fetch_overtaken_by_mutation_stays_stale() {
        let (cache, store, _, _) = seeded().await;
        let cache = Arc::new(cache);
        cache.invalidate();

        store.hold_lists.store(true, Ordering::SeqCst);
        let reader = tokio::spawn({
            let cache = cache.clone();
            async move { cache.admin_posts().await }
        });
        store.list_entered.notified().await;
        store.hold_lists.store(false, Ordering::SeqCst);

        cache
            .create(PostDraft::new("Written mid-read", "body", "ex"))
            .await
            .unwrap();
        store.list_release.notify_one();

        let seen_by_reader = reader.await.unwrap().unwrap();
        assert_eq!(seen_by_reader.len(), 2);
        assert!(cache.is_stale(CacheView::Admin));

        let admin = cache.admin_posts().await.unwrap();
        assert_eq!(admin.len(), 3);
        assert_eq!(admin.len(), store.posts.lock().unwrap().len());
        assert!(!cache.is_stale(CacheView::Admin));
    }
}
