//! SeaORM entities for the blog tables.

pub mod comment;
pub mod like;
pub mod post;
pub mod user;
pub mod user_role;
