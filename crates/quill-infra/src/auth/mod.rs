//! Authentication implementations.

#[cfg(feature = "auth")]
mod jwt;
#[cfg(feature = "auth")]
mod password;
mod provider;

#[cfg(feature = "auth")]
pub use jwt::{JwtConfig, JwtTokenService};
#[cfg(feature = "auth")]
pub use password::Argon2PasswordService;
pub use provider::PasswordAuthProvider;
