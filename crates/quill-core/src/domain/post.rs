use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, FieldError};

/// Author name used when a draft leaves it blank.
pub const DEFAULT_AUTHOR: &str = "Admin";

/// Post entity - a single blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Markdown source.
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub publish_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub views: i64,
    /// Derived; only populated by listings that annotate it.
    pub comment_count: i64,
    pub allow_comments: bool,
    pub author: String,
    pub location: Option<String>,
}

/// Where a post stands from a public reader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Post {
    /// Build a fresh post from a validated draft: new id, timestamps, zeroed counters.
    pub fn from_draft(draft: PostDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            excerpt: draft.excerpt,
            slug: draft.slug,
            cover_image: draft.cover_image,
            tags: draft.tags,
            published: draft.published,
            publish_at: draft.publish_at,
            created_at: now,
            updated_at: now,
            likes: 0,
            views: 0,
            comment_count: 0,
            allow_comments: draft.allow_comments,
            author: draft.author,
            location: draft.location,
        }
    }

    /// A post is live iff it is published and its publish time (if any) has passed.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.published && self.publish_at.is_none_or(|at| at <= now)
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PostStatus {
        if !self.published {
            PostStatus::Draft
        } else if self.is_live_at(now) {
            PostStatus::Published
        } else {
            PostStatus::Scheduled
        }
    }

    /// Merge a patch into this post and refresh `updated_at`.
    pub fn apply(&mut self, patch: &PostPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(excerpt) = &patch.excerpt {
            self.excerpt = excerpt.clone();
        }
        if let Some(slug) = &patch.slug {
            self.slug = slug.clone();
        }
        if let Some(cover_image) = &patch.cover_image {
            self.cover_image = cover_image.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        if let Some(publish_at) = patch.publish_at {
            self.publish_at = publish_at;
        }
        if let Some(allow_comments) = patch.allow_comments {
            self.allow_comments = allow_comments;
        }
        if let Some(author) = &patch.author {
            self.author = author.clone();
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        self.updated_at = now;
    }

    /// Estimated reading time in minutes at 200 words per minute.
    pub fn reading_minutes(&self) -> u32 {
        let words = self.content.split_whitespace().count() as u32;
        words.div_ceil(200).max(1)
    }
}

/// Fields an author supplies when creating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    /// Derived from the title when left empty.
    pub slug: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub publish_at: Option<DateTime<Utc>>,
    pub allow_comments: bool,
    pub author: String,
    pub location: Option<String>,
}

impl PostDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            excerpt: excerpt.into(),
            allow_comments: true,
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.publish_at = Some(at);
        self
    }

    /// Trim, fill derived fields and validate. Runs before anything reaches a backend.
    pub fn prepare(mut self) -> Result<Self, DomainError> {
        self.title = self.title.trim().to_string();
        self.excerpt = self.excerpt.trim().to_string();
        self.slug = self.slug.trim().to_string();
        if self.slug.is_empty() {
            self.slug = slugify(&self.title);
        }
        if self.author.trim().is_empty() {
            self.author = DEFAULT_AUTHOR.to_string();
        }
        self.tags = normalize_tags(std::mem::take(&mut self.tags));

        let mut errors = Vec::new();
        require("title", &self.title, &mut errors);
        require("content", &self.content, &mut errors);
        require("excerpt", &self.excerpt, &mut errors);
        check_slug(&self.slug, &mut errors);

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub cover_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
    pub publish_at: Option<Option<DateTime<Utc>>>,
    pub allow_comments: Option<bool>,
    pub author: Option<String>,
    pub location: Option<Option<String>>,
}

impl PostPatch {
    pub fn publish(published: bool) -> Self {
        Self {
            published: Some(published),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate only the fields being changed.
    pub fn prepare(mut self) -> Result<Self, DomainError> {
        let mut errors = Vec::new();
        if let Some(title) = self.title.as_mut() {
            *title = title.trim().to_string();
            require("title", title, &mut errors);
        }
        if let Some(content) = &self.content {
            require("content", content, &mut errors);
        }
        if let Some(excerpt) = self.excerpt.as_mut() {
            *excerpt = excerpt.trim().to_string();
            require("excerpt", excerpt, &mut errors);
        }
        if let Some(slug) = self.slug.as_mut() {
            *slug = slug.trim().to_string();
            check_slug(slug, &mut errors);
        }
        if let Some(tags) = self.tags.take() {
            self.tags = Some(normalize_tags(tags));
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(DomainError::Validation(errors))
        }
    }
}

fn require(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
}

fn check_slug(slug: &str, errors: &mut Vec<FieldError>) {
    if slug.is_empty() {
        errors.push(FieldError::new("slug", "is required"));
    } else if !is_valid_slug(slug) {
        errors.push(FieldError::new(
            "slug",
            "may only contain lowercase letters, digits and single hyphens",
        ));
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Lowercase ASCII alphanumerics separated by single hyphens, no leading or trailing hyphen.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// Derive a URL-safe slug from free text.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
