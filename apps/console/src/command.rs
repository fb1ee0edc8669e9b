//! Console command parsing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use quill_core::domain::PostPatch;

pub const EDITABLE_FIELDS: &str =
    "title, excerpt, content, slug, author, tags, cover, location, comments, published, publish_at";

pub const HELP: &[&str] = &[
    "login <email>                  sign in as admin (password is prompted)",
    "logout                         sign out",
    "list                           list posts (all posts when signed in)",
    "stats                          totals across every post",
    "show <id>                      show a post",
    "edit <id> <field> <value>      change one field",
    "publish <id>                   publish a post",
    "unpublish <id>                 move a post back to drafts",
    "delete <id>                    delete a post and its comments and likes",
    "new <title>                    create a draft",
    "comments <id>                  list comments on a post",
    "like <id>                      toggle your like on a live post",
    "whoami                         show session and visitor identity",
    "refresh                        reload posts from the backend",
    "help                           this list",
    "clear                          clear the screen",
    "exit                           quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String },
    Logout,
    List,
    Stats,
    Show(String),
    Edit { id: String, patch: PostPatch },
    Publish(String),
    Unpublish(String),
    Delete(String),
    New { title: String },
    Comments(String),
    Like(String),
    Whoami,
    Refresh,
    Help,
    Clear,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown field '{0}'. Editable fields: {EDITABLE_FIELDS}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

fn single_arg(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    match split_word(rest) {
        ("", _) => Err(CommandError::Usage(usage)),
        (word, "") => Ok(word.to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn no_args(rest: &str, command: Command, usage: &'static str) -> Result<Command, CommandError> {
    if rest.trim().is_empty() {
        Ok(command)
    } else {
        Err(CommandError::Usage(usage))
    }
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        _ => Err(CommandError::InvalidValue {
            field,
            message: "expected on/off".to_string(),
        }),
    }
}

fn clearable(value: &str) -> Option<String> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Build a single-field patch. `none` (or nothing) clears a nullable field.
pub fn field_patch(field: &str, value: &str) -> Result<PostPatch, CommandError> {
    let value = value.trim();
    let mut patch = PostPatch::default();

    match field.to_ascii_lowercase().as_str() {
        "title" => patch.title = Some(value.to_string()),
        "excerpt" => patch.excerpt = Some(value.to_string()),
        // Literal "\n" sequences become line breaks so whole bodies fit on one line.
        "content" => patch.content = Some(value.replace("\\n", "\n")),
        "slug" => patch.slug = Some(value.to_string()),
        "author" => patch.author = Some(value.to_string()),
        "tags" => patch.tags = Some(value.split(',').map(str::to_string).collect()),
        "cover" | "cover_image" => patch.cover_image = Some(clearable(value)),
        "location" => patch.location = Some(clearable(value)),
        "comments" | "allow_comments" => {
            patch.allow_comments = Some(parse_bool("comments", value)?)
        }
        "published" => patch.published = Some(parse_bool("published", value)?),
        "publish_at" | "schedule" => {
            patch.publish_at = Some(match clearable(value) {
                None => None,
                Some(at) => Some(
                    DateTime::parse_from_rfc3339(&at)
                        .map_err(|e| CommandError::InvalidValue {
                            field: "publish_at",
                            message: format!("{e} (expected RFC 3339, e.g. 2025-01-31T09:00:00Z)"),
                        })?
                        .with_timezone(&Utc),
                ),
            })
        }
        other => return Err(CommandError::UnknownField(other.to_string())),
    }

    Ok(patch)
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = split_word(line.trim());

        match name.to_ascii_lowercase().as_str() {
            "login" => Ok(Command::Login {
                email: single_arg(rest, "login <email>")?,
            }),
            "logout" => no_args(rest, Command::Logout, "logout"),
            "list" | "ls" => no_args(rest, Command::List, "list"),
            "stats" => no_args(rest, Command::Stats, "stats"),
            "show" => Ok(Command::Show(single_arg(rest, "show <id>")?)),
            "edit" => {
                const USAGE: &str = "edit <id> <field> <value>";
                let (id, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                if id.is_empty() || field.is_empty() {
                    return Err(CommandError::Usage(USAGE));
                }
                Ok(Command::Edit {
                    id: id.to_string(),
                    patch: field_patch(field, value)?,
                })
            }
            "publish" => Ok(Command::Publish(single_arg(rest, "publish <id>")?)),
            "unpublish" => Ok(Command::Unpublish(single_arg(rest, "unpublish <id>")?)),
            "delete" | "rm" => Ok(Command::Delete(single_arg(rest, "delete <id>")?)),
            "new" => {
                let title = rest.trim();
                if title.is_empty() {
                    return Err(CommandError::Usage("new <title>"));
                }
                Ok(Command::New {
                    title: title.to_string(),
                })
            }
            "comments" => Ok(Command::Comments(single_arg(rest, "comments <id>")?)),
            "like" => Ok(Command::Like(single_arg(rest, "like <id>")?)),
            "whoami" => no_args(rest, Command::Whoami, "whoami"),
            "refresh" => no_args(rest, Command::Refresh, "refresh"),
            "help" | "?" => Ok(Command::Help),
            "clear" => Ok(Command::Clear),
            "exit" | "quit" => Ok(Command::Exit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
