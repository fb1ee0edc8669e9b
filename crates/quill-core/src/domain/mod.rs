//! Domain entities - the core business objects.

mod comment;
mod like;
mod post;
mod stats;
mod user;

pub use comment::{Comment, MAX_COMMENT_LEN, NewComment};
pub use like::{Like, MAX_IDENTITY_LEN, is_valid_identity};
pub use post::{DEFAULT_AUTHOR, Post, PostDraft, PostPatch, PostStatus, is_valid_slug, slugify};
pub use stats::BlogStats;
pub use user::{Role, User, mask_email};
