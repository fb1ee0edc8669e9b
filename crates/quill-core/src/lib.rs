//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! This crate contains the blog's business rules with zero infrastructure dependencies:
//! entities, ports implemented by `quill-infra`, and the services the binaries drive
//! (admin gate, optimistic post cache, like toggling).

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldError, RepoError};
