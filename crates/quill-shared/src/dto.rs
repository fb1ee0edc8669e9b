//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login result. Failures come back as `success: false` with an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl LoginResponse {
    pub fn granted(access_token: String, expires_in: i64) -> Self {
        Self {
            success: true,
            error: None,
            access_token: Some(access_token),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(expires_in),
        }
    }

    pub fn denied(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            access_token: None,
            token_type: None,
            expires_in: None,
        }
    }
}

/// The admin session behind a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to create a post. Omitted slug is derived from the title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial post update. For nullable fields an explicit `null` clears the value
/// and an absent key leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub cover_image: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub publish_at: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub location: Option<Option<String>>,
}

/// Any present value, including `null`, becomes `Some`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Post as listed: everything but the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub slug: String,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    /// `draft`, `scheduled` or `published`
    pub status: String,
    pub publish_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub views: i64,
    pub comment_count: i64,
    pub author: String,
    pub location: Option<String>,
    pub reading_minutes: u32,
}

/// A single post with its markdown source and rendered HTML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub content: String,
    pub html: String,
    pub allow_comments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub author: String,
    pub body: String,
}

/// Comment with its body escaped for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub body_html: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total: usize,
    pub published: usize,
    pub scheduled: usize,
    pub drafts: usize,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdatePostRequest = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(absent.title.as_deref(), Some("New"));
        assert_eq!(absent.cover_image, None);

        let cleared: UpdatePostRequest =
            serde_json::from_str(r#"{"cover_image": null, "publish_at": null}"#).unwrap();
        assert_eq!(cleared.cover_image, Some(None));
        assert_eq!(cleared.publish_at, Some(None));

        let set: UpdatePostRequest =
            serde_json::from_str(r#"{"location": "Berlin"}"#).unwrap();
        assert_eq!(set.location, Some(Some("Berlin".to_string())));
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreatePostRequest =
            serde_json::from_str(r#"{"title": "T", "content": "C", "excerpt": "E"}"#).unwrap();

        assert!(!request.published);
        assert!(request.tags.is_empty());
        assert!(request.slug.is_none());
    }

    #[test]
    fn test_denied_login_omits_token() {
        let json = serde_json::to_value(LoginResponse::denied("nope")).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
        assert!(json.get("access_token").is_none());
    }
}
