//! Content store port - the single data-access facade for posts, comments and likes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, NewComment, Post, PostDraft, PostPatch};
use crate::error::RepoError;

/// Uniform blog data API. Implemented by the PostgreSQL store and the in-memory mock;
/// callers never branch on which one is active.
///
/// Absent rows are reported as `Ok(None)` / empty lists, not errors, except where a
/// specific identifier must exist (`update`, `delete`, `create_comment`).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Live posts only, newest first.
    async fn list_published(&self) -> Result<Vec<Post>, RepoError>;

    /// Every post regardless of publish state, newest first, with `comment_count` filled.
    async fn list_all(&self) -> Result<Vec<Post>, RepoError>;

    /// The live post with this slug, if any.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Any post by id, live or not. Used by admin editors.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Insert a prepared draft. Fails with `RepoError::Constraint` on a duplicate slug.
    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError>;

    /// Merge a prepared patch. Fails with `RepoError::NotFound` for an unknown id.
    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError>;

    /// Remove a post together with its comments and likes.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Fire-and-forget view counter bump. Failures are logged, never returned.
    async fn increment_views(&self, id: Uuid);

    /// Flip the like state of (post, identity). Returns `true` when the post is now liked.
    async fn toggle_like(&self, id: Uuid, identity: &str) -> Result<bool, RepoError>;

    /// Whether (post, identity) currently has a like. No mutation.
    async fn has_liked(&self, id: Uuid, identity: &str) -> Result<bool, RepoError>;

    /// Comments on a post, oldest first. Unknown posts yield an empty list.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// Attach a prepared comment. Fails with `RepoError::NotFound` if the post is gone.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError>;
}
