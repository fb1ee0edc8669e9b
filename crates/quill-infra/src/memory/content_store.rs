//! In-memory content store with an optional seeded mock dataset.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{
    Comment, DEFAULT_AUTHOR, Like, NewComment, Post, PostDraft, PostPatch,
};
use quill_core::ports::ContentStore;

#[derive(Default)]
struct Tables {
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
}

impl Tables {
    fn comment_count(&self, post_id: Uuid) -> i64 {
        self.comments.iter().filter(|c| c.post_id == post_id).count() as i64
    }

    fn annotated(&self, post: &Post) -> Post {
        let mut post = post.clone();
        post.comment_count = self.comment_count(post.id);
        post
    }

    fn sorted(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter(p))
            .map(|p| self.annotated(p))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    fn slug_taken(&self, slug: &str, except: Option<Uuid>) -> bool {
        self.posts
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }
}

/// Content store kept in process memory.
///
/// Enforces the same constraints the database schema does: unique slugs,
/// one like per (post, identity) and cascading deletes.
#[derive(Default)]
pub struct InMemoryContentStore {
    tables: RwLock<Tables>,
}

impl InMemoryContentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with demo posts, used when no backend is configured.
    pub fn with_mock_data() -> Self {
        let now = Utc::now();
        let seed = |mut draft: PostDraft, created_at| {
            draft.author = DEFAULT_AUTHOR.to_string();
            Post::from_draft(draft, created_at)
        };
        let mut posts = Vec::new();

        let mut welcome = seed(
            PostDraft::new(
                "Welcome to the blog",
                "# Hello\n\nThis is the **first** post. Posts are written in *markdown*.\n\n\
                 - Headers\n- Lists\n- `inline code`\n\n> Quotes too.",
                "A first look around.",
            )
            .with_slug("welcome-to-the-blog")
            .published(true),
            now - Duration::days(7),
        );
        welcome.tags = vec!["meta".to_string()];
        welcome.views = 42;
        welcome.likes = 5;
        posts.push(welcome);

        let mut rust = seed(
            PostDraft::new(
                "Notes on Rust",
                "Some code:\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n\n\
                 Read more at [the Rust site](https://www.rust-lang.org).",
                "Small things learned while writing Rust.",
            )
            .with_slug("notes-on-rust")
            .published(true),
            now - Duration::days(2),
        );
        rust.tags = vec!["rust".to_string(), "programming".to_string()];
        rust.views = 17;
        rust.likes = 2;
        posts.push(rust);

        posts.push(seed(
            PostDraft::new(
                "Upcoming announcement",
                "Something is coming.",
                "Scheduled for later.",
            )
            .with_slug("upcoming-announcement")
            .published(true)
            .scheduled_for(now + Duration::days(3)),
            now - Duration::days(1),
        ));

        posts.push(seed(
            PostDraft::new("Draft ideas", "Half-finished thoughts.", "Not ready yet.")
                .with_slug("draft-ideas"),
            now - Duration::hours(5),
        ));

        let comments = vec![
            NewComment::new(posts[0].id, "Reader", "Great start!")
                .into_comment(now - Duration::days(6)),
            NewComment::new(posts[0].id, "Visitor", "Looking forward to more.")
                .into_comment(now - Duration::days(5)),
        ];

        Self {
            tables: RwLock::new(Tables {
                posts,
                comments,
                likes: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn list_published(&self) -> Result<Vec<Post>, RepoError> {
        let now = Utc::now();
        Ok(self.tables.read().await.sorted(|p| p.is_live_at(now)))
    }

    async fn list_all(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.tables.read().await.sorted(|_| true))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.slug == slug && p.is_live())
            .map(|p| tables.annotated(p)))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.annotated(p)))
    }

    async fn create(&self, draft: PostDraft) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&draft.slug, None) {
            return Err(RepoError::Constraint(format!(
                "slug '{}' already exists",
                draft.slug
            )));
        }

        let post = Post::from_draft(draft, Utc::now());
        tracing::debug!(post_id = %post.id, slug = %post.slug, "Creating post");
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &patch.slug {
            if tables.slug_taken(slug, Some(id)) {
                return Err(RepoError::Constraint(format!("slug '{slug}' already exists")));
            }
        }

        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        post.apply(&patch, Utc::now());
        let post = post.clone();

        Ok(tables.annotated(&post))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }

        tables.comments.retain(|c| c.post_id != id);
        tables.likes.retain(|l| l.post_id != id);
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) {
        let mut tables = self.tables.write().await;
        match tables.posts.iter_mut().find(|p| p.id == id) {
            Some(post) => post.views += 1,
            None => tracing::warn!(post_id = %id, "View increment for unknown post"),
        }
    }

    async fn toggle_like(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let Tables { posts, likes, .. } = &mut *tables;

        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        let liked = match likes
            .iter()
            .position(|l| l.post_id == id && l.identity == identity)
        {
            Some(index) => {
                likes.remove(index);
                post.likes = (post.likes - 1).max(0);
                false
            }
            None => {
                likes.push(Like {
                    post_id: id,
                    identity: identity.to_string(),
                    created_at: Utc::now(),
                });
                post.likes += 1;
                true
            }
        };

        tracing::debug!(post_id = %id, liked, "Like toggled");
        Ok(liked)
    }

    async fn has_liked(&self, id: Uuid, identity: &str) -> Result<bool, RepoError> {
        Ok(self
            .tables
            .read()
            .await
            .likes
            .iter()
            .any(|l| l.post_id == id && l.identity == identity))
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .tables
            .read()
            .await
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RepoError::NotFound);
        }

        let comment = comment.into_comment(Utc::now());
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> PostDraft {
        PostDraft::new(title, "Body", "Summary").prepare().unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_slug_leaves_store_unchanged() {
        let store = InMemoryContentStore::new();
        store.create(draft("Hello")).await.unwrap();
        let before = store.list_all().await.unwrap();

        let result = store.create(draft("Hello")).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert_eq!(store.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_to_taken_slug_rejected() {
        let store = InMemoryContentStore::new();
        store.create(draft("First")).await.unwrap();
        let second = store.create(draft("Second")).await.unwrap();

        let patch = PostPatch {
            slug: Some("first".to_string()),
            ..Default::default()
        };
        let result = store.update(second.id, patch).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert_eq!(
            store.get_by_id(second.id).await.unwrap().unwrap().slug,
            "second"
        );
    }

    #[tokio::test]
    async fn test_scheduled_visibility() {
        let store = InMemoryContentStore::new();
        let now = Utc::now();
        let future = store
            .create(
                draft("Future")
                    .published(true)
                    .scheduled_for(now + Duration::hours(1)),
            )
            .await
            .unwrap();
        let past = store
            .create(
                draft("Past")
                    .published(true)
                    .scheduled_for(now - Duration::hours(1)),
            )
            .await
            .unwrap();

        let published: Vec<Uuid> = store
            .list_published()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();

        assert!(!published.contains(&future.id));
        assert!(published.contains(&past.id));
        assert!(store.get_by_slug("future").await.unwrap().is_none());
        assert!(store.get_by_slug("past").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_like_toggle_pair_restores_counter() {
        let store = InMemoryContentStore::new();
        let post = store.create(draft("Liked").published(true)).await.unwrap();

        assert!(store.toggle_like(post.id, "visitor").await.unwrap());
        assert!(store.has_liked(post.id, "visitor").await.unwrap());
        assert_eq!(store.get_by_id(post.id).await.unwrap().unwrap().likes, 1);

        assert!(!store.toggle_like(post.id, "visitor").await.unwrap());
        assert!(!store.has_liked(post.id, "visitor").await.unwrap());
        assert_eq!(store.get_by_id(post.id).await.unwrap().unwrap().likes, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = InMemoryContentStore::new();
        let post = store.create(draft("Doomed").published(true)).await.unwrap();
        store
            .create_comment(NewComment::new(post.id, "Reader", "Hi"))
            .await
            .unwrap();
        store.toggle_like(post.id, "visitor").await.unwrap();

        store.delete(post.id).await.unwrap();

        assert!(store.list_comments(post.id).await.unwrap().is_empty());
        assert!(!store.has_liked(post.id, "visitor").await.unwrap());
        assert!(matches!(
            store.delete(post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_comment_count_annotation() {
        let store = InMemoryContentStore::new();
        let post = store.create(draft("Talked about")).await.unwrap();
        store
            .create_comment(NewComment::new(post.id, "A", "one"))
            .await
            .unwrap();
        store
            .create_comment(NewComment::new(post.id, "B", "two"))
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].comment_count, 2);
    }

    #[tokio::test]
    async fn test_views_increment_and_unknown_post() {
        let store = InMemoryContentStore::new();
        let post = store.create(draft("Viewed")).await.unwrap();

        store.increment_views(post.id).await;
        store.increment_views(Uuid::new_v4()).await;

        assert_eq!(store.get_by_id(post.id).await.unwrap().unwrap().views, 1);
    }

    #[tokio::test]
    async fn test_mock_data_mixes_states() {
        let store = InMemoryContentStore::with_mock_data();
        let all = store.list_all().await.unwrap();
        let published = store.list_published().await.unwrap();

        assert_eq!(all.len(), 4);
        assert_eq!(published.len(), 2);
        assert!(published[0].created_at > published[1].created_at);
        assert!(store.get_by_slug("draft-ideas").await.unwrap().is_none());
        assert!(
            store
                .get_by_slug("upcoming-announcement")
                .await
                .unwrap()
                .is_none()
        );
    }
}
