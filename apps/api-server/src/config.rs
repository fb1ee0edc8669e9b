//! Application configuration loaded from environment variables.

use std::env;

use quill_infra::identity::DEFAULT_SALT;
use quill_infra::{DatabaseConfig, JwtConfig};

/// Credentials for the admin account seeded into the in-memory mock.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub admin: Option<AdminSeed>,
    /// Salt mixed into hashed visitor addresses.
    pub identity_salt: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            admin,
            identity_salt: env::var("IDENTITY_SALT").unwrap_or_else(|_| DEFAULT_SALT.to_string()),
        }
    }
}
