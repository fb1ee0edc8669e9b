//! # Quill Shared
//!
//! Wire types shared between the API server and its clients.
//! Kept free of server-side dependencies so clients can compile it too.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldErrorBody};
