//! Command dispatch for the admin console.
//!
//! Reads go through the post cache, writes through its optimistic mutations,
//! and every admin-only command re-checks the role before running.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use quill_core::domain::{BlogStats, Post, PostDraft, PostPatch};
use quill_core::error::DomainError;
use quill_core::ports::{AuthProvider, ContentStore, Session};
use quill_core::services::{AdminGate, AuthState, LikeService, PostCache};
use quill_infra::{Backend, BackendKind, IdentityResolver};

use crate::command::{Command, HELP};

/// What the terminal loop should do with a command's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Lines(Vec<String>),
    /// The password still has to be read for this email.
    NeedPassword(String),
    Clear,
    Exit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Reply::Lines(vec![text.into()])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Sign in as admin first (login <email>)")]
    NotSignedIn,

    #[error("No post matches '{0}'")]
    NoMatch(String),

    #[error("'{0}' matches more than one post, type more of the id")]
    Ambiguous(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub struct Console {
    backend: BackendKind,
    store: Arc<dyn ContentStore>,
    gate: Arc<AdminGate>,
    cache: Arc<PostCache>,
    likes: LikeService,
    resolver: IdentityResolver,
    visitor: OnceCell<String>,
}

impl Console {
    pub fn new(backend: Backend, auth: Arc<dyn AuthProvider>, resolver: IdentityResolver) -> Self {
        let gate = Arc::new(AdminGate::new(auth, backend.roles.clone()));
        let cache = Arc::new(PostCache::new(backend.store.clone()));

        let listener_cache = cache.clone();
        gate.on_auth_change(move |state| {
            if *state == AuthState::SignedOut {
                listener_cache.invalidate();
            }
        });

        Self {
            backend: backend.kind,
            likes: LikeService::new(backend.store.clone()),
            store: backend.store,
            gate,
            cache,
            resolver,
            visitor: OnceCell::new(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.gate.is_signed_in()
    }

    pub fn cache(&self) -> &PostCache {
        &self.cache
    }

    pub async fn login(&self, email: &str, password: &str) -> Reply {
        let outcome = self.gate.login(email, password).await;
        match outcome.session {
            Some(session) => {
                self.cache.invalidate();
                Reply::line(format!("Signed in as {}", session.email))
            }
            None => Reply::line(format!(
                "Login failed: {}",
                outcome.error.unwrap_or_else(|| "unknown error".to_string())
            )),
        }
    }

    pub async fn logout(&self) {
        self.gate.logout().await;
    }

    pub async fn execute(&self, command: Command) -> Result<Reply, ConsoleError> {
        match command {
            Command::Login { email } => Ok(Reply::NeedPassword(email)),
            Command::Logout => {
                if !self.gate.is_signed_in() {
                    return Ok(Reply::line("Not signed in"));
                }
                self.gate.logout().await;
                Ok(Reply::line("Signed out"))
            }
            Command::List => self.list().await,
            Command::Stats => {
                self.require_admin().await?;
                let posts = self.cache.admin_posts().await?;
                Ok(Reply::Lines(stats_lines(&BlogStats::from_posts(
                    &posts,
                    Utc::now(),
                ))))
            }
            Command::Show(id) => {
                self.require_admin().await?;
                let id = self.admin_id(&id).await?;
                let post = self
                    .store
                    .get_by_id(id)
                    .await
                    .map_err(DomainError::from)?
                    .ok_or_else(|| DomainError::not_found("post", id))?;
                Ok(Reply::Lines(post_lines(&post)))
            }
            Command::Edit { id, patch } => {
                self.require_admin().await?;
                let id = self.admin_id(&id).await?;
                let post = self.cache.update(id, patch).await?;
                Ok(Reply::line(format!("Updated '{}'", post.title)))
            }
            Command::Publish(id) => self.set_published(&id, true).await,
            Command::Unpublish(id) => self.set_published(&id, false).await,
            Command::Delete(id) => {
                self.require_admin().await?;
                let id = self.admin_id(&id).await?;
                self.cache.delete(id).await?;
                Ok(Reply::line(format!("Deleted {}", short_id(id))))
            }
            Command::New { title } => {
                self.require_admin().await?;
                let draft = PostDraft::new(
                    title.clone(),
                    format!("# {title}\n\nStart writing here."),
                    title,
                );
                let post = self.cache.create(draft).await?;
                Ok(Reply::line(format!(
                    "Created draft {} ({})",
                    short_id(post.id),
                    post.slug
                )))
            }
            Command::Comments(id) => {
                self.require_admin().await?;
                let id = self.admin_id(&id).await?;
                let comments = self
                    .store
                    .list_comments(id)
                    .await
                    .map_err(DomainError::from)?;
                if comments.is_empty() {
                    return Ok(Reply::line("No comments"));
                }
                Ok(Reply::Lines(
                    comments
                        .iter()
                        .map(|c| {
                            format!(
                                "{}  {}  {}: {}",
                                short_id(c.id),
                                c.created_at.format("%Y-%m-%d %H:%M"),
                                c.author,
                                c.body.replace('\n', " ")
                            )
                        })
                        .collect(),
                ))
            }
            Command::Like(id) => {
                let posts = self.cache.public_posts().await?;
                let id = resolve_id(&id, &posts)?;
                let visitor = self.visitor().await;
                let liked = self.likes.toggle(id, visitor).await?;
                Ok(Reply::line(if liked { "Liked" } else { "Like removed" }))
            }
            Command::Whoami => Ok(Reply::Lines(vec![
                format!("Backend:  {}", self.backend.as_str()),
                match self.gate.session() {
                    Some(session) => format!("Session:  {} (admin)", session.email),
                    None => "Session:  signed out".to_string(),
                },
                format!("Visitor:  {}", self.visitor().await),
            ])),
            Command::Refresh => {
                self.cache.refresh().await?;
                let view = if self.gate.is_signed_in() {
                    self.cache.admin_posts().await?
                } else {
                    self.cache.public_posts().await?
                };
                Ok(Reply::line(format!("Refreshed, {} posts", view.len())))
            }
            Command::Help => Ok(Reply::Lines(HELP.iter().map(|l| l.to_string()).collect())),
            Command::Clear => Ok(Reply::Clear),
            Command::Exit => Ok(Reply::Exit),
        }
    }

    async fn list(&self) -> Result<Reply, ConsoleError> {
        let posts = if self.gate.is_signed_in() {
            self.cache.admin_posts().await?
        } else {
            self.cache.public_posts().await?
        };
        if posts.is_empty() {
            return Ok(Reply::line("No posts"));
        }

        let now = Utc::now();
        let mut lines = vec![format!(
            "{:<8}  {:<9}  {:>6}  {:>5}  {:>8}  TITLE",
            "ID", "STATUS", "VIEWS", "LIKES", "COMMENTS"
        )];
        lines.extend(posts.iter().map(|p| {
            format!(
                "{:<8}  {:<9}  {:>6}  {:>5}  {:>8}  {}",
                short_id(p.id),
                p.status_at(now).as_str(),
                p.views,
                p.likes,
                p.comment_count,
                p.title
            )
        }));
        Ok(Reply::Lines(lines))
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<Reply, ConsoleError> {
        self.require_admin().await?;
        let id = self.admin_id(id).await?;
        let post = self.cache.update(id, PostPatch::publish(published)).await?;
        Ok(Reply::line(format!(
            "'{}' is now {}",
            post.title,
            post.status_at(Utc::now())
        )))
    }

    async fn require_admin(&self) -> Result<Session, ConsoleError> {
        if !self.gate.is_signed_in() {
            return Err(ConsoleError::NotSignedIn);
        }
        match self.gate.reverify().await {
            AuthState::Admin(session) => Ok(session),
            AuthState::SignedOut => Err(ConsoleError::NotSignedIn),
        }
    }

    async fn admin_id(&self, text: &str) -> Result<Uuid, ConsoleError> {
        let posts = self.cache.admin_posts().await?;
        resolve_id(text, &posts)
    }

    async fn visitor(&self) -> &str {
        self.visitor
            .get_or_init(|| self.resolver.resolve())
            .await
            .as_str()
    }
}

/// A full UUID, or a prefix matching exactly one of `posts`.
fn resolve_id(text: &str, posts: &[Post]) -> Result<Uuid, ConsoleError> {
    if let Ok(id) = Uuid::parse_str(text) {
        return Ok(id);
    }

    let prefix = text.to_ascii_lowercase();
    let mut matches = posts
        .iter()
        .filter(|p| p.id.to_string().starts_with(&prefix));

    match (matches.next(), matches.next()) {
        (Some(post), None) => Ok(post.id),
        (Some(_), Some(_)) => Err(ConsoleError::Ambiguous(text.to_string())),
        (None, _) => Err(ConsoleError::NoMatch(text.to_string())),
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn stats_lines(stats: &BlogStats) -> Vec<String> {
    vec![
        format!("Posts:      {}", stats.total),
        format!("Published:  {}", stats.published),
        format!("Scheduled:  {}", stats.scheduled),
        format!("Drafts:     {}", stats.drafts),
        format!("Views:      {}", stats.views),
        format!("Likes:      {}", stats.likes),
        format!("Comments:   {}", stats.comments),
    ]
}

fn post_lines(post: &Post) -> Vec<String> {
    let now = Utc::now();
    let mut lines = vec![
        format!("Title:      {}", post.title),
        format!("Id:         {}", post.id),
        format!("Slug:       {}", post.slug),
        format!("Status:     {}", post.status_at(now)),
        format!("Author:     {}", post.author),
        format!("Tags:       {}", post.tags.join(", ")),
    ];
    if let Some(at) = post.publish_at {
        lines.push(format!("Publish at: {}", at.to_rfc3339()));
    }
    if let Some(cover) = &post.cover_image {
        lines.push(format!("Cover:      {cover}"));
    }
    if let Some(location) = &post.location {
        lines.push(format!("Location:   {location}"));
    }
    lines.extend([
        format!(
            "Comments:   {} ({})",
            post.comment_count,
            if post.allow_comments { "open" } else { "closed" }
        ),
        format!("Views:      {}  Likes: {}", post.views, post.likes),
        format!("Reading:    {} min", post.reading_minutes()),
        format!("Created:    {}", post.created_at.to_rfc3339()),
        format!("Updated:    {}", post.updated_at.to_rfc3339()),
        format!("Excerpt:    {}", post.excerpt),
        String::new(),
    ]);
    lines.extend(post.content.lines().map(str::to_string));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::domain::Role;
    use quill_core::ports::RoleRepository;
    use quill_infra::{
        Argon2PasswordService, InMemoryRevocationList, InMemoryTokenStore, JwtConfig,
        JwtTokenService, PasswordAuthProvider,
    };

    const EMAIL: &str = "admin@example.com";
    const PASSWORD: &str = "correct-horse";

    async fn console() -> (Console, Arc<dyn RoleRepository>, Uuid) {
        let backend = Backend::in_memory();
        let passwords = Arc::new(Argon2PasswordService::new());
        let admin_id = backend
            .seed_admin(EMAIL, PASSWORD, passwords.as_ref())
            .await
            .unwrap();
        let roles = backend.roles.clone();

        let auth = Arc::new(PasswordAuthProvider::new(
            backend.users.clone(),
            passwords,
            Arc::new(JwtTokenService::new(JwtConfig::default())),
            Arc::new(InMemoryRevocationList::new()),
        ));
        let resolver =
            IdentityResolver::new(Vec::new(), Arc::new(InMemoryTokenStore::new()), "test");

        (Console::new(backend, auth, resolver), roles, admin_id)
    }

    fn lines(reply: Reply) -> Vec<String> {
        match reply {
            Reply::Lines(lines) => lines,
            other => panic!("expected lines, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signed_out_list_shows_public_view() {
        let (console, _, _) = console().await;
        let out = lines(console.execute(Command::List).await.unwrap());

        // header + two live posts
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|l| !l.contains("Draft ideas")));
    }

    #[tokio::test]
    async fn test_mutations_need_admin() {
        let (console, _, _) = console().await;
        let err = console
            .execute(Command::New {
                title: "Nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::NotSignedIn));
        assert!(matches!(
            console.execute(Command::Stats).await,
            Err(ConsoleError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_login_command_asks_for_password() {
        let (console, _, _) = console().await;
        let reply = console
            .execute("login admin@example.com".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(reply, Reply::NeedPassword(EMAIL.to_string()));

        let reply = console.login(EMAIL, "wrong").await;
        assert_eq!(lines(reply), vec!["Login failed: Invalid credentials"]);
        assert!(!console.is_signed_in());
    }

    #[tokio::test]
    async fn test_new_then_publish_by_prefix() {
        let (console, _, _) = console().await;
        console.login(EMAIL, PASSWORD).await;

        let out = lines(
            console
                .execute(Command::New {
                    title: "Console Post".into(),
                })
                .await
                .unwrap(),
        );
        assert!(out[0].starts_with("Created draft"));
        assert!(out[0].ends_with("(console-post)"));

        let created = console
            .cache()
            .admin_posts()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.slug == "console-post")
            .unwrap();
        assert!(!created.published);

        let prefix = created.id.to_string()[..8].to_string();
        let out = lines(console.execute(Command::Publish(prefix)).await.unwrap());
        assert_eq!(out, vec!["'Console Post' is now published"]);

        let public = console.cache().public_posts().await.unwrap();
        assert!(public.iter().any(|p| p.id == created.id));
    }

    #[tokio::test]
    async fn test_invalid_edit_surfaces_field_error() {
        let (console, _, _) = console().await;
        console.login(EMAIL, PASSWORD).await;
        let id = console.cache().admin_posts().await.unwrap()[0].id;

        let command: Command = format!("edit {id} slug Not A Slug").parse().unwrap();
        let err = console.execute(command).await.unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Domain(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_role_loss_signs_out_and_invalidates() {
        let (console, roles, admin_id) = console().await;
        console.login(EMAIL, PASSWORD).await;
        console.cache().admin_posts().await.unwrap();
        assert!(!console.cache().is_stale(quill_core::services::CacheView::Admin));

        roles.revoke(admin_id, Role::Admin).await.unwrap();
        let err = console.execute(Command::Stats).await.unwrap_err();

        assert!(matches!(err, ConsoleError::NotSignedIn));
        assert!(!console.is_signed_in());
        assert!(console.cache().is_stale(quill_core::services::CacheView::Admin));
    }

    #[tokio::test]
    async fn test_like_toggles_with_fallback_identity() {
        let (console, _, _) = console().await;
        let id = console.cache().public_posts().await.unwrap()[0].id;

        let out = lines(console.execute(Command::Like(id.to_string())).await.unwrap());
        assert_eq!(out, vec!["Liked"]);
        let out = lines(console.execute(Command::Like(id.to_string())).await.unwrap());
        assert_eq!(out, vec!["Like removed"]);
    }

    #[test]
    fn test_resolve_id_prefixes() {
        let a = Post::from_draft(PostDraft::new("A", "a", "a"), Utc::now());
        let mut b = Post::from_draft(PostDraft::new("B", "b", "b"), Utc::now());
        b.id = Uuid::parse_str("ffffffff-0000-4000-8000-000000000000").unwrap();
        let posts = vec![a.clone(), b.clone()];

        assert_eq!(resolve_id("ffff", &posts).unwrap(), b.id);
        assert_eq!(resolve_id(&a.id.to_string(), &posts).unwrap(), a.id);
        assert!(matches!(
            resolve_id("zz", &posts),
            Err(ConsoleError::NoMatch(_))
        ));
        assert!(matches!(
            resolve_id("", &posts),
            Err(ConsoleError::Ambiguous(_))
        ));
    }
}
