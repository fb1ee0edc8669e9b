//! Cross-crate scenarios over the in-memory backend: cache coordination,
//! the admin gate with real password auth, and like toggling.

#![cfg(feature = "auth")]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::domain::{Comment, NewComment, Post, PostDraft, PostPatch, Role, User};
use quill_core::ports::{
    AuthError, AuthProvider, ContentStore, PasswordService, RoleRepository, UserRepository,
};
use quill_core::services::{AdminGate, CacheView, LikeService, PostCache};
use quill_core::{DomainError, RepoError};
use quill_infra::{
    Argon2PasswordService, InMemoryContentStore, InMemoryRevocationList, InMemoryRoleRepository,
    InMemoryUserRepository, JwtConfig, JwtTokenService, PasswordAuthProvider,
};

fn draft(title: &str) -> PostDraft {
    PostDraft::new(title, "Some **markdown** body", "Short summary")
}

#[tokio::test]
async fn draft_then_publish_end_to_end() {
    let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
    let cache = PostCache::new(store.clone());

    let created = cache.create(draft("Launch notes")).await.unwrap();
    assert!(!created.published);

    let published_ids = |posts: Vec<Post>| posts.into_iter().map(|p| p.id).collect::<Vec<_>>();
    assert!(!published_ids(store.list_published().await.unwrap()).contains(&created.id));
    assert!(published_ids(store.list_all().await.unwrap()).contains(&created.id));

    let updated = cache
        .update(created.id, PostPatch::publish(true))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.slug, created.slug);

    let public = store.list_published().await.unwrap();
    let live = public.iter().find(|p| p.id == created.id).unwrap();
    assert_eq!(live.slug, "launch-notes");
    assert!(published_ids(store.list_all().await.unwrap()).contains(&created.id));

    assert!(
        cache
            .public_posts()
            .await
            .unwrap()
            .iter()
            .any(|p| p.id == created.id)
    );
}

#[tokio::test]
async fn duplicate_slug_through_cache_leaves_views_reconciled() {
    let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
    let cache = PostCache::new(store.clone());
    cache.create(draft("Same title")).await.unwrap();
    cache.admin_posts().await.unwrap();

    let result = cache.create(draft("Same title")).await;

    assert!(matches!(result, Err(DomainError::Duplicate(_))));
    assert_eq!(cache.admin_posts().await.unwrap().len(), 1);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

/// Delegates to an in-memory store, failing updates on demand.
struct FlakyStore {
    inner: InMemoryContentStore,
    fail_updates: AtomicBool,
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn list_published(&self) -> Result<Vec<Post>, RepoError> {
        self.inner.list_published().await
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        self.inner.list_all().await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.inner.get_by_slug(slug).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.inner.get_by_id(id).await
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
        self.inner.create(draft).await
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(RepoError::Connection("connection reset".into()));
        }
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }

    async fn increment_views(&self, id: Uuid) {
        self.inner.increment_views(id).await
    }

    async fn toggle_like(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        self.inner.toggle_like(id, identity).await
    }

    async fn has_liked(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        self.inner.has_liked(id, identity).await
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        self.inner.list_comments(post_id).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        self.inner.create_comment(comment).await
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete_comment(id).await
    }
}

#[tokio::test]
async fn failed_update_restores_admin_view_exactly() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryContentStore::with_mock_data(),
        fail_updates: AtomicBool::new(false),
    });
    let cache = PostCache::new(store.clone());
    let before = cache.admin_posts().await.unwrap();
    let target = before[0].id;

    store.fail_updates.store(true, Ordering::SeqCst);
    let patch = PostPatch {
        title: Some("Renamed".to_string()),
        published: Some(false),
        ..Default::default()
    };
    let result = cache.update(target, patch).await;

    assert!(matches!(result, Err(DomainError::Backend(_))));
    assert_eq!(cache.cached(CacheView::Admin), before);
    assert!(cache.is_stale(CacheView::Admin));
    assert_eq!(cache.admin_posts().await.unwrap(), before);
}

struct Accounts {
    auth: Arc<dyn AuthProvider>,
    roles: Arc<InMemoryRoleRepository>,
    user_id: Uuid,
}

async fn accounts(email: &str, password: &str) -> Accounts {
    let users = Arc::new(InMemoryUserRepository::new());
    let passwords = Arc::new(Argon2PasswordService::new());
    let user = users
        .create(User::new(email.to_string(), passwords.hash(password).unwrap()))
        .await
        .unwrap();

    let auth = Arc::new(PasswordAuthProvider::new(
        users,
        passwords,
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "integration".to_string(),
            ..JwtConfig::default()
        })),
        Arc::new(InMemoryRevocationList::new()),
    ));

    Accounts {
        auth,
        roles: Arc::new(InMemoryRoleRepository::new()),
        user_id: user.id,
    }
}

#[tokio::test]
async fn non_admin_login_fails_closed() {
    let accounts = accounts("writer@example.com", "pw").await;
    let gate = AdminGate::new(accounts.auth.clone(), accounts.roles.clone());

    let outcome = gate.login("writer@example.com", "pw").await;

    assert!(!outcome.success);
    assert!(outcome.session.is_none());
    assert!(!gate.is_signed_in());
    assert!(!gate.is_admin(accounts.user_id).await);
}

#[tokio::test]
async fn admin_session_lifecycle() {
    let accounts = accounts("admin@example.com", "pw").await;
    accounts
        .roles
        .grant(accounts.user_id, Role::Admin)
        .await
        .unwrap();
    let gate = AdminGate::new(accounts.auth.clone(), accounts.roles.clone());

    let outcome = gate.login("admin@example.com", "pw").await;
    assert!(outcome.success);
    let token = outcome.session.unwrap().access_token;
    assert!(gate.authorize(&token).await.is_ok());

    // Revoked server-side between checks
    accounts
        .roles
        .revoke(accounts.user_id, Role::Admin)
        .await
        .unwrap();
    assert!(matches!(
        gate.authorize(&token).await,
        Err(AuthError::InsufficientPermissions)
    ));
    assert!(gate.reverify().await.session().is_none());
    assert!(!gate.is_signed_in());
    assert!(matches!(
        accounts.auth.session_for_token(&token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn like_toggle_pair_restores_counter() {
    let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::with_mock_data());
    let likes = LikeService::new(store.clone());
    let post = store.list_published().await.unwrap().remove(0);

    assert!(likes.toggle(post.id, "visitor-1").await.unwrap());
    assert!(likes.has_liked(post.id, "visitor-1").await);
    assert!(!likes.toggle(post.id, "visitor-1").await.unwrap());

    let after = store.get_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(after.likes, post.likes);
    assert!(matches!(
        likes.toggle(post.id, "not a valid identity!").await,
        Err(DomainError::Validation(_))
    ));
}
