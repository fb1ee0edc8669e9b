//! # Quill Markdown
//!
//! Renders the markdown subset authors use in posts and sanitizes the result.
//!
//! Supported: `#`-`###` headers, `**bold**`/`__bold__`, `*italic*`/`_italic_`,
//! fenced code blocks with a language tag, inline code, links, images,
//! unordered and ordered lists, blockquotes, paragraphs and line breaks.
//!
//! Raw HTML in the source is escaped, not interpreted. The rendered output always
//! passes through [`sanitize_html`], which only lets an explicit allow-list of tags
//! and attributes through.

mod render;
mod sanitize;

pub use render::render;
pub use sanitize::{ALLOWED_ATTRIBUTES, ALLOWED_TAGS, escape_html, sanitize_html, sanitize_url};
