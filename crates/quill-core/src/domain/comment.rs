use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, FieldError};

/// Longest comment body accepted.
pub const MAX_COMMENT_LEN: usize = 2000;

/// A reader remark attached to a post. Bodies are plain text, never markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a visitor supplies when commenting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author: String,
    pub body: String,
}

impl NewComment {
    pub fn new(post_id: Uuid, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            post_id,
            author: author.into(),
            body: body.into(),
        }
    }

    pub fn prepare(mut self) -> Result<Self, DomainError> {
        self.author = self.author.trim().to_string();
        self.body = self.body.trim().to_string();

        let mut errors = Vec::new();
        if self.author.is_empty() {
            errors.push(FieldError::new("author", "is required"));
        }
        if self.body.is_empty() {
            errors.push(FieldError::new("body", "is required"));
        } else if self.body.chars().count() > MAX_COMMENT_LEN {
            errors.push(FieldError::new(
                "body",
                format!("must be at most {MAX_COMMENT_LEN} characters"),
            ));
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    pub fn into_comment(self, now: DateTime<Utc>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id: self.post_id,
            author: self.author,
            body: self.body,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_trims_and_validates() {
        let ok = NewComment::new(Uuid::new_v4(), " ana ", " nice post ")
            .prepare()
            .unwrap();
        assert_eq!(ok.author, "ana");
        assert_eq!(ok.body, "nice post");

        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(NewComment::new(Uuid::new_v4(), "ana", long).prepare().is_err());
        assert!(NewComment::new(Uuid::new_v4(), "", "hi").prepare().is_err());
    }
}
