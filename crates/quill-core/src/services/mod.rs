//! Application services built purely on the ports.

mod admin_gate;
mod likes;
mod post_cache;

pub use admin_gate::{
    ADMIN_REQUIRED, AdminGate, AuthListener, AuthState, DenialReason, LoginOutcome,
};
pub use likes::LikeService;
pub use post_cache::{CacheView, PostCache};
