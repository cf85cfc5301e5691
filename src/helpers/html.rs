//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Schemes a link or image may use once embedded in a page
const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

/// Return the URL if it is safe to embed in an `href`/`src` attribute
///
/// Relative URLs pass through. Absolute URLs must use one of the allowed
/// schemes, so `javascript:` and `data:` links are dropped.
///
/// # Examples
/// ```ignore
/// safe_url("https://example.com") // -> Some("https://example.com")
/// safe_url("javascript:alert(1)") // -> None
/// ```
pub fn safe_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let scheme_end = url.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(pos) if url[pos..].starts_with(':') => {
            let scheme = url[..pos].to_ascii_lowercase();
            if ALLOWED_SCHEMES.contains(&scheme.as_str()) {
                Some(url)
            } else {
                None
            }
        }
        _ => Some(url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("https://example.com/a"), Some("https://example.com/a"));
        assert_eq!(safe_url("/post/hello/"), Some("/post/hello/"));
        assert_eq!(safe_url("#top"), Some("#top"));
        assert_eq!(safe_url("mailto:me@example.com"), Some("mailto:me@example.com"));
        assert_eq!(safe_url("JavaScript:alert(1)"), None);
        assert_eq!(safe_url(" data:text/html;base64,xx"), None);
        assert_eq!(safe_url(""), None);
    }
}
