use chrono::{DateTime, Utc};
use serde::Serialize;

use super::post::{Post, PostStatus};

/// Aggregate numbers shown on the admin dashboard and console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlogStats {
    pub total: usize,
    pub published: usize,
    pub scheduled: usize,
    pub drafts: usize,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl BlogStats {
    pub fn from_posts(posts: &[Post], now: DateTime<Utc>) -> Self {
        posts.iter().fold(Self::default(), |mut stats, post| {
            stats.total += 1;
            match post.status_at(now) {
                PostStatus::Published => stats.published += 1,
                PostStatus::Scheduled => stats.scheduled += 1,
                PostStatus::Draft => stats.drafts += 1,
            }
            stats.views += post.views;
            stats.likes += post.likes;
            stats.comments += post.comment_count;
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostDraft;
    use chrono::Duration;

    #[test]
    fn test_from_posts() {
        let now = Utc::now();
        let mut live = Post::from_draft(PostDraft::new("a", "b", "c").published(true), now);
        live.views = 10;
        live.likes = 3;
        live.comment_count = 2;
        let draft = Post::from_draft(PostDraft::new("d", "e", "f"), now);
        let scheduled = Post::from_draft(
            PostDraft::new("g", "h", "i")
                .published(true)
                .scheduled_for(now + Duration::days(1)),
            now,
        );

        let stats = BlogStats::from_posts(&[live, draft, scheduled], now);
        assert_eq!(
            stats,
            BlogStats {
                total: 3,
                published: 1,
                scheduled: 1,
                drafts: 1,
                views: 10,
                likes: 3,
                comments: 2,
            }
        );
    }
}
