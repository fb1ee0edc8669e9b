//! HTML allow-list sanitizer and URL scheme filter.

use regex::{Captures, Regex};

/// Tags that survive sanitization.
pub const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "p", "br", "ul", "ol", "li", "strong", "em", "b", "i", "blockquote", "code",
    "pre", "a", "img", "span", "div",
];

/// Attributes that survive sanitization. `data-*` and event handlers never do.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "class", "href", "src", "alt", "title", "target", "rel", "loading",
];

/// Disallowed tags whose content goes too.
const DROP_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "textarea", "title",
    "svg", "math",
];

const VOID_TAGS: &[&str] = &["br", "img"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

const BLOCKED_URL: &str = "#";

// Regex patterns - these are valid static patterns that cannot fail
#[allow(clippy::unwrap_used)]
static TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?(?:-->|$)|<(/?)([A-Za-z][A-Za-z0-9]*)([^<>]*?)(/?)>").unwrap()
});

#[allow(clippy::unwrap_used)]
static ATTR_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});

#[allow(clippy::unwrap_used)]
static ENTITY_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]{2,8});?").unwrap()
});

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Neutralize script-capable URLs.
///
/// `http:`, `https:`, `mailto:` and `tel:` pass, as do root-relative, fragment,
/// relative and schemeless URLs. Every other scheme (`javascript:`, `data:`,
/// `vbscript:`, ...) becomes `#`. Whitespace and control characters are ignored
/// when detecting the scheme, the way browsers ignore them.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_control() && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match scheme_of(&compact) {
        Some(scheme) if !SAFE_SCHEMES.contains(&scheme) => BLOCKED_URL.to_string(),
        _ => trimmed.to_string(),
    }
}

fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let boundary = url.find(['/', '?', '#']).unwrap_or(url.len());
    if colon > boundary {
        return None;
    }
    let scheme = &url[..colon];
    let mut bytes = scheme.bytes();
    let valid = bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    valid.then_some(scheme)
}

/// Strip everything not on the allow-list from an HTML fragment.
///
/// Disallowed tags are removed (with their content for script-like tags),
/// disallowed attributes dropped, `href`/`src` run through [`sanitize_url`],
/// comments removed and stray angle brackets in text escaped.
#[allow(clippy::unwrap_used)] // Capture group 0 always exists
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut skipping: Option<String> = None;

    for caps in TAG_RE.captures_iter(html) {
        let whole = caps.get(0).unwrap();
        if skipping.is_none() {
            push_text(&mut out, &html[last..whole.start()]);
        }
        last = whole.end();

        // Comment
        let Some(name) = caps.get(2) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = !caps[1].is_empty();

        if let Some(target) = &skipping {
            if closing && *target == name {
                skipping = None;
            }
            continue;
        }

        if DROP_WITH_CONTENT.contains(&name.as_str()) {
            if !closing && caps[4].is_empty() {
                skipping = Some(name);
            }
            continue;
        }

        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        if closing {
            if !VOID_TAGS.contains(&name.as_str()) {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
            continue;
        }

        out.push('<');
        out.push_str(&name);
        push_attributes(&mut out, &caps[3]);
        out.push('>');
    }

    if skipping.is_none() {
        push_text(&mut out, &html[last..]);
    }
    out
}

fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn push_attributes(out: &mut String, raw: &str) {
    let mut seen: Vec<String> = Vec::new();
    for caps in ATTR_RE.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        if !ALLOWED_ATTRIBUTES.contains(&name.as_str()) || seen.contains(&name) {
            continue;
        }

        let raw_value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        let mut value = decode_entities(raw_value);
        if name == "href" || name == "src" {
            value = sanitize_url(&value);
        }

        out.push(' ');
        out.push_str(&name);
        out.push_str("=\"");
        out.push_str(&escape_html(&value));
        out.push('"');
        seen.push(name);
    }
}

/// Decode the character references a browser would decode inside an attribute.
fn decode_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().map(to_char)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().map(to_char)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn to_char(code: u32) -> char {
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "colon" => ':',
        "Tab" => '\t',
        "NewLine" => '\n',
        "nbsp" => '\u{a0}',
        "sol" => '/',
        "lpar" => '(',
        "rpar" => ')',
        _ => return None,
    };
    Some(c)
}
