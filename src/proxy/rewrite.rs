//! Textual rewriting of HTML and CSS so that embedded resources load back
//! through the relay. Pattern based, not DOM aware.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use reqwest::Url;

/// Path every rewritten reference points at; the target follows, encoded.
pub const RELAY_PREFIX: &str = "/api/proxy?url=";

/// References with these prefixes are left as they are.
const PRESERVED_PREFIXES: [&str; 5] = ["#", "data:", "javascript:", "mailto:", "tel:"];

static ATTR_DOUBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*"([^"]*)""#).expect("attribute pattern"));
static ATTR_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(href|src)\s*=\s*'([^']*)'"#).expect("attribute pattern"));
static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\(\s*["']?([^"')]*)["']?\s*\)"#).expect("url() pattern"));
static CSS_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)@import\s+["']([^"']*)["']"#).expect("@import pattern"));
static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(\s[^>]*)?>").expect("head pattern"));

/// How a fetched body is treated, by its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Css,
    Other,
}

impl ContentKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("text/html") {
            ContentKind::Html
        } else if lower.contains("text/css") {
            ContentKind::Css
        } else {
            ContentKind::Other
        }
    }
}

/// The relay path for `target`.
pub fn relay_url(target: &Url) -> String {
    format!("{RELAY_PREFIX}{}", urlencoding::encode(target.as_str()))
}

fn has_scheme(reference: &str) -> bool {
    match reference.find(':') {
        Some(colon) => {
            let scheme = &reference[..colon];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// The absolute URL a reference should be relayed to, or `None` when it must
/// stay untouched.
///
/// Root-relative and relative references are resolved against `base`.
/// Absolute and protocol-relative references are relayed only when they point
/// at another host over plain HTTP.
pub fn relay_target(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with(RELAY_PREFIX) {
        return None;
    }
    let lower = reference.to_ascii_lowercase();
    if PRESERVED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }

    if reference.starts_with("//") || lower.starts_with("http://") || lower.starts_with("https://") {
        let resolved = base.join(reference).ok()?;
        return (resolved.scheme() == "http" && !same_host(&resolved, base)).then_some(resolved);
    }
    if has_scheme(reference) {
        return None;
    }

    base.join(reference).ok()
}

fn rewrite_attributes(body: &str, pattern: &Regex, quote: char, base: &Url) -> String {
    pattern
        .replace_all(body, |caps: &Captures| match relay_target(&caps[2], base) {
            Some(target) => format!("{}={quote}{}{quote}", &caps[1], relay_url(&target)),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rewrite `url(...)` and quoted `@import` references.
pub fn rewrite_css(body: &str, base: &Url) -> String {
    let body = CSS_URL.replace_all(body, |caps: &Captures| match relay_target(&caps[1], base) {
        Some(target) => format!("url(\"{}\")", relay_url(&target)),
        None => caps[0].to_string(),
    });
    CSS_IMPORT
        .replace_all(&body, |caps: &Captures| match relay_target(&caps[1], base) {
            Some(target) => format!("@import \"{}\"", relay_url(&target)),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rewrite `href`/`src` attributes and inline CSS, then add a `<base>` tag
/// pointing at `base` when the document has none.
pub fn rewrite_html(body: &str, base: &Url) -> String {
    let body = rewrite_attributes(body, &ATTR_DOUBLE, '"', base);
    let body = rewrite_attributes(&body, &ATTR_SINGLE, '\'', base);
    let body = rewrite_css(&body, base);
    insert_base_tag(&body, base)
}

/// The tag covers references the patterns above never see, such as script
/// built URLs and `srcset`. It also makes browsers resolve the root-relative
/// `/api/proxy?url=` links against the target host rather than the relay, so
/// pages served this way only load those links when the relay shares an
/// origin with the target. Callers that need relay links to survive must
/// strip the tag or make `RELAY_PREFIX` absolute.
fn insert_base_tag(body: &str, base: &Url) -> String {
    if body.to_ascii_lowercase().contains("<base") {
        return body.to_string();
    }
    match HEAD_OPEN.find(body) {
        Some(head) => {
            let href = base.as_str().replace('"', "&quot;");
            format!(
                "{}\n<base href=\"{href}\">{}",
                &body[..head.end()],
                &body[head.end()..]
            )
        }
        None => body.to_string(),
    }
}

/// Rewrite a body according to its kind; other kinds pass through unchanged.
pub fn rewrite_body(kind: ContentKind, body: &str, base: &Url) -> String {
    match kind {
        ContentKind::Html => rewrite_html(body, base),
        ContentKind::Css => rewrite_css(body, base),
        ContentKind::Other => body.to_string(),
    }
}
