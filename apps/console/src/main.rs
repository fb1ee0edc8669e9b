//! # Quill Console
//!
//! Command-style admin console over the same content store as the API server.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quill_core::ports::{AuthProvider, IpLookup};
use quill_infra::identity::DEFAULT_SALT;
use quill_infra::{
    Argon2PasswordService, Backend, DatabaseConfig, FileTokenStore, HttpIpLookup,
    IdentityResolver, InMemoryRevocationList, JwtConfig, JwtTokenService, PasswordAuthProvider,
};

mod command;
mod console;

use command::Command;
use console::{Console, Reply};

const PROMPT: &str = "quill> ";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let console = build_console().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Quill console. Type 'help' for commands.");
    loop {
        prompt(PROMPT)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let reply = match console.execute(command).await {
            Ok(Reply::NeedPassword(email)) => {
                prompt("password: ")?;
                let password = lines.next_line().await?.unwrap_or_default();
                console.login(&email, &password).await
            }
            Ok(reply) => reply,
            Err(e) => {
                println!("Error: {e}");
                continue;
            }
        };

        match reply {
            Reply::Lines(out) => out.iter().for_each(|l| println!("{l}")),
            Reply::Clear => print!("\x1B[2J\x1B[H"),
            Reply::Exit => break,
            Reply::NeedPassword(_) => {}
        }
    }

    if console.is_signed_in() {
        console.logout().await;
    }
    Ok(())
}

fn prompt(text: &str) -> anyhow::Result<()> {
    print!("{text}");
    std::io::stdout().flush().context("failed to flush stdout")
}

async fn build_console() -> anyhow::Result<Console> {
    let backend = Backend::connect(DatabaseConfig::from_env().as_ref()).await;
    let passwords = Arc::new(Argon2PasswordService::new());

    if !backend.is_remote() {
        if let (Ok(email), Ok(password)) =
            (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"))
        {
            backend
                .seed_admin(&email, &password, passwords.as_ref())
                .await
                .context("failed to seed admin account")?;
        }
    }

    let auth: Arc<dyn AuthProvider> = Arc::new(PasswordAuthProvider::new(
        backend.users.clone(),
        passwords,
        Arc::new(JwtTokenService::new(JwtConfig::from_env())),
        Arc::new(InMemoryRevocationList::new()),
    ));

    let timeout = Duration::from_millis(
        std::env::var("IDENTITY_LOOKUP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000),
    );
    let lookups = HttpIpLookup::defaults(timeout)
        .into_iter()
        .map(|lookup| Arc::new(lookup) as Arc<dyn IpLookup>)
        .collect();
    let token_path = std::env::var("IDENTITY_TOKEN_PATH")
        .unwrap_or_else(|_| ".quill/visitor-token".to_string());
    let salt = std::env::var("IDENTITY_SALT").unwrap_or_else(|_| DEFAULT_SALT.to_string());

    let resolver = IdentityResolver::new(lookups, Arc::new(FileTokenStore::new(token_path)), salt)
        .with_timeout(timeout);

    tracing::info!(backend = backend.kind.as_str(), "Console ready");
    Ok(Console::new(backend, auth, resolver))
}

/// Logs go to stderr so command output stays clean.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,console=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
