//! Block and inline markdown rendering.

use regex::{Captures, Regex};

use crate::sanitize::{escape_html, sanitize_html, sanitize_url};

// Regex patterns - these are valid static patterns that cannot fail
#[allow(clippy::unwrap_used)]
static HEADER_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+?)(?:\s+#+)?\s*$").unwrap());

#[allow(clippy::unwrap_used)]
static UNORDERED_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());

#[allow(clippy::unwrap_used)]
static ORDERED_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^\s*\d{1,9}[.)]\s+(.*)$").unwrap());

#[allow(clippy::unwrap_used)]
static QUOTE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^\s*>\s?(.*)$").unwrap());

#[allow(clippy::unwrap_used)]
static INLINE_CODE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

// URLs may contain one level of balanced parentheses
#[allow(clippy::unwrap_used)]
static IMAGE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"!\[([^\]\n]*)\]\(\s*((?:[^()\s]|\([^()\s]*\))+)(?:\s+"([^"\n]*)")?\s*\)"#)
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static LINK_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"\[([^\]\n]+)\]\(\s*((?:[^()\s]|\([^()\s]*\))+)(?:\s+"([^"\n]*)")?\s*\)"#)
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static BOLD_STAR_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").unwrap());

#[allow(clippy::unwrap_used)]
static BOLD_UNDERSCORE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"__([^_\n]+?)__").unwrap());

#[allow(clippy::unwrap_used)]
static ITALIC_STAR_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());

#[allow(clippy::unwrap_used)]
static ITALIC_UNDERSCORE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\b_([^_\n]+)_\b").unwrap());

#[allow(clippy::unwrap_used)]
static PLACEHOLDER_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new("\u{1}(\\d+)\u{2}").unwrap());

const PLACEHOLDER_OPEN: char = '\u{1}';
const PLACEHOLDER_CLOSE: char = '\u{2}';

/// Render markdown to sanitized HTML.
///
/// Empty or whitespace-only input renders to an empty string. Never fails:
/// malformed input (an unterminated fence, a half-written link) renders as text.
pub fn render(source: &str) -> String {
    if source.trim().is_empty() {
        return String::new();
    }

    let text: String = source
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !matches!(*c, '\0' | PLACEHOLDER_OPEN | PLACEHOLDER_CLOSE))
        .collect();

    let mut renderer = Renderer::default();
    let html = renderer.blocks(&text);
    let html = renderer.restore(html);
    sanitize_html(&html)
}

enum Block {
    Paragraph(Vec<String>),
    List { ordered: bool, items: Vec<String> },
    Quote(Vec<String>),
}

#[derive(Default)]
struct Renderer {
    // Fragments already rendered and escaped, swapped out of the text while
    // later substitutions run.
    stash: Vec<String>,
}

impl Renderer {
    fn blocks(&mut self, text: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut current: Option<Block> = None;
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            let trimmed = line.trim_start();

            if let Some(info) = trimmed.strip_prefix("```") {
                self.flush(&mut current, &mut out);
                let mut code: Vec<&str> = Vec::new();
                for inner in lines.by_ref() {
                    if inner.trim_start().starts_with("```") {
                        break;
                    }
                    code.push(inner);
                }
                out.push(code_block(info, &code.join("\n")));
                continue;
            }

            if trimmed.is_empty() {
                self.flush(&mut current, &mut out);
                continue;
            }

            if let Some(caps) = HEADER_RE.captures(line) {
                self.flush(&mut current, &mut out);
                let level = caps[1].len();
                let body = self.inline(&caps[2]);
                out.push(format!("<h{level}>{body}</h{level}>"));
                continue;
            }

            if let Some(caps) = UNORDERED_RE.captures(line) {
                self.push_item(&mut current, &mut out, false, &caps[1]);
                continue;
            }

            if let Some(caps) = ORDERED_RE.captures(line) {
                self.push_item(&mut current, &mut out, true, &caps[1]);
                continue;
            }

            if let Some(caps) = QUOTE_RE.captures(line) {
                if !matches!(current, Some(Block::Quote(_))) {
                    self.flush(&mut current, &mut out);
                    current = Some(Block::Quote(Vec::new()));
                }
                if let Some(Block::Quote(quoted)) = current.as_mut() {
                    quoted.push(caps[1].to_string());
                }
                continue;
            }

            if !matches!(current, Some(Block::Paragraph(_))) {
                self.flush(&mut current, &mut out);
                current = Some(Block::Paragraph(Vec::new()));
            }
            if let Some(Block::Paragraph(paragraph)) = current.as_mut() {
                paragraph.push(line.trim().to_string());
            }
        }

        self.flush(&mut current, &mut out);
        out.join("\n")
    }

    fn push_item(
        &mut self,
        current: &mut Option<Block>,
        out: &mut Vec<String>,
        ordered: bool,
        item: &str,
    ) {
        let same_list =
            matches!(current, Some(Block::List { ordered: o, .. }) if *o == ordered);
        if !same_list {
            self.flush(current, out);
            *current = Some(Block::List {
                ordered,
                items: Vec::new(),
            });
        }
        if let Some(Block::List { items, .. }) = current.as_mut() {
            items.push(item.trim().to_string());
        }
    }

    fn flush(&mut self, current: &mut Option<Block>, out: &mut Vec<String>) {
        let Some(block) = current.take() else {
            return;
        };
        let html = match block {
            Block::Paragraph(lines) => format!("<p>{}</p>", self.inline_lines(&lines)),
            Block::Quote(lines) => {
                format!("<blockquote>{}</blockquote>", self.inline_lines(&lines))
            }
            Block::List { ordered, items } => {
                let tag = if ordered { "ol" } else { "ul" };
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", self.inline(item)))
                    .collect();
                format!("<{tag}>{items}</{tag}>")
            }
        };
        out.push(html);
    }

    fn inline_lines(&mut self, lines: &[String]) -> String {
        lines
            .iter()
            .map(|line| self.inline(line))
            .collect::<Vec<_>>()
            .join("<br>")
    }

    /// Inline code, images and links are rendered first and stashed so the
    /// escaping and emphasis passes never see their contents.
    fn inline(&mut self, text: &str) -> String {
        let text = INLINE_CODE_RE
            .replace_all(text, |caps: &Captures| {
                self.stash(format!("<code>{}</code>", escape_html(&caps[1])))
            })
            .into_owned();

        let text = IMAGE_RE
            .replace_all(&text, |caps: &Captures| {
                let src = escape_html(&sanitize_url(&caps[2]));
                let alt = escape_html(&caps[1]);
                let title = caps
                    .get(3)
                    .map(|t| format!(" title=\"{}\"", escape_html(t.as_str())))
                    .unwrap_or_default();
                self.stash(format!(
                    "<img src=\"{src}\" alt=\"{alt}\"{title} loading=\"lazy\">"
                ))
            })
            .into_owned();

        let text = LINK_RE
            .replace_all(&text, |caps: &Captures| {
                let href = sanitize_url(&caps[2]);
                let external = href.starts_with("http://") || href.starts_with("https://");
                let title = caps
                    .get(3)
                    .map(|t| format!(" title=\"{}\"", escape_html(t.as_str())))
                    .unwrap_or_default();
                let target = if external {
                    " target=\"_blank\" rel=\"noopener noreferrer\""
                } else {
                    ""
                };
                let label = emphasis(&escape_html(&caps[1]));
                self.stash(format!(
                    "<a href=\"{}\"{title}{target}>{label}</a>",
                    escape_html(&href)
                ))
            })
            .into_owned();

        emphasis(&escape_html(&text))
    }

    fn stash(&mut self, html: String) -> String {
        self.stash.push(html);
        format!("{PLACEHOLDER_OPEN}{}{PLACEHOLDER_CLOSE}", self.stash.len() - 1)
    }

    /// Swap stashed fragments back in. Link labels may hold inline code
    /// placeholders, so this repeats until nothing is left to replace.
    fn restore(&self, mut html: String) -> String {
        for _ in 0..4 {
            if !html.contains(PLACEHOLDER_OPEN) {
                break;
            }
            html = PLACEHOLDER_RE
                .replace_all(&html, |caps: &Captures| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| self.stash.get(i))
                        .cloned()
                        .unwrap_or_default()
                })
                .into_owned();
        }
        html
    }
}

fn emphasis(escaped: &str) -> String {
    let text = BOLD_STAR_RE.replace_all(escaped, "<strong>$1</strong>");
    let text = BOLD_UNDERSCORE_RE.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC_STAR_RE.replace_all(&text, "<em>$1</em>");
    ITALIC_UNDERSCORE_RE
        .replace_all(&text, "<em>$1</em>")
        .into_owned()
}

fn code_block(info: &str, code: &str) -> String {
    let language: String = info
        .trim()
        .chars()
        .take_while(|c| !c.is_whitespace())
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '#' | '.'))
        .collect();
    let class = if language.is_empty() {
        String::new()
    } else {
        format!(" class=\"language-{language}\"")
    };
    format!("<pre><code{class}>{}</code></pre>", escape_html(code))
}
