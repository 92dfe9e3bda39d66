//! String utility functions.
//!
//! Label generation for field keys and HTML escaping for rendered components.

use regex::Regex;
use std::sync::OnceLock;

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use crudkit_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// assert_eq!(capfirst("HELLO"), "HELLO");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Turns a field key into a human-readable title.
///
/// Splits on underscores, hyphens, and camelCase boundaries, then capitalizes
/// each word.
///
/// # Examples
///
/// ```
/// use crudkit_core::utils::text::title_from_key;
///
/// assert_eq!(title_from_key("first_name"), "First Name");
/// assert_eq!(title_from_key("phoneNumber"), "Phone Number");
/// assert_eq!(title_from_key("url"), "Url");
/// ```
pub fn title_from_key(key: &str) -> String {
    static CAMEL: OnceLock<Regex> = OnceLock::new();
    let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

    let spaced = camel.replace_all(key, "$1 $2");
    spaced
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(capfirst)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes the five HTML-significant characters.
///
/// # Examples
///
/// ```
/// use crudkit_core::utils::text::escape_html;
///
/// assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"),
///     "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strips HTML tags from a string, returning only the text content.
///
/// Regex-based; not a sanitizer.
///
/// # Examples
///
/// ```
/// use crudkit_core::utils::text::strip_tags;
///
/// assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
/// ```
pub fn strip_tags(s: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    tag_re.replace_all(s, "").into_owned()
}

/// Truncates a string to at most `n` characters, ending with "...".
///
/// # Examples
///
/// ```
/// use crudkit_core::utils::text::truncate_chars;
///
/// assert_eq!(truncate_chars("Hello, World!", 5), "He...");
/// assert_eq!(truncate_chars("Hi", 10), "Hi");
/// ```
pub fn truncate_chars(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= n {
        return s.to_string();
    }
    if n <= 3 {
        return ".".repeat(n);
    }
    let mut result: String = chars[..n - 3].iter().collect();
    result.push_str("...");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── title_from_key ───────────────────────────────────────────────

    #[test]
    fn test_title_from_snake_case() {
        assert_eq!(title_from_key("date_of_birth"), "Date Of Birth");
    }

    #[test]
    fn test_title_from_camel_case() {
        assert_eq!(title_from_key("maxRetryCount"), "Max Retry Count");
    }

    #[test]
    fn test_title_from_leading_underscore() {
        assert_eq!(title_from_key("_id"), "Id");
    }

    #[test]
    fn test_title_from_empty() {
        assert_eq!(title_from_key(""), "");
    }

    // ── escape_html ──────────────────────────────────────────────────

    #[test]
    fn test_escape_html_plain() {
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_escape_html_script() {
        assert_eq!(
            escape_html("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    // ── strip_tags / truncate ────────────────────────────────────────

    #[test]
    fn test_strip_tags_nested() {
        assert_eq!(strip_tags("<div><p>a</p><p>b</p></div>"), "ab");
    }

    #[test]
    fn test_truncate_chars_exact() {
        assert_eq!(truncate_chars("Hello", 5), "Hello");
    }

    #[test]
    fn test_truncate_chars_tiny_n() {
        assert_eq!(truncate_chars("Hello", 2), "..");
    }
}
