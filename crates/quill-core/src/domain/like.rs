use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One visitor's like on one post. At most one per (post, identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub post_id: Uuid,
    /// Anonymous identity token of the visitor.
    pub identity: String,
    pub created_at: DateTime<Utc>,
}

/// Longest identity token the stores accept.
pub const MAX_IDENTITY_LEN: usize = 128;

/// Identity tokens are opaque, but must be short and free of control characters.
pub fn is_valid_identity(identity: &str) -> bool {
    !identity.is_empty()
        && identity.len() <= MAX_IDENTITY_LEN
        && identity
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
