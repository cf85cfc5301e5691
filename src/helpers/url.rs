//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters kept verbatim in a path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/assets/style.css") // -> "/blog/assets/style.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/post/hello/") // -> "https://example.com/blog/post/hello/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Site path of a post page, with the uid percent-encoded
pub fn post_path(root: &str, uid: &str) -> String {
    format!(
        "{}/post/{}/",
        root.trim_end_matches('/'),
        utf8_percent_encode(uid, PATH_SEGMENT)
    )
}

/// Path, relative to the site root, of the data file of a listing page
///
/// Page 1 is the listing itself; pages from 2 on are written as
/// `pages/<n>.json` for the "load more" script of a static build.
pub fn page_data_path(number: usize) -> String {
    format!("pages/{}.json", number)
}

/// Whether a uid can be used as a single output directory name
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.root = "/blog/".to_string();
        config
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/assets/style.css"), "/blog/assets/style.css");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "post/hello/"),
            "https://example.com/blog/post/hello/"
        );
    }

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("/", "hello-world"), "/post/hello-world/");
        assert_eq!(post_path("/blog/", "olá mundo"), "/blog/post/ol%C3%A1%20mundo/");
    }

    #[test]
    fn test_page_data_path() {
        assert_eq!(page_data_path(2), "pages/2.json");
        assert_eq!(url_for(&test_config(), &page_data_path(3)), "/blog/pages/3.json");
    }

    #[test]
    fn test_is_valid_uid() {
        assert!(is_valid_uid("como-utilizar-hooks"));
        assert!(!is_valid_uid(""));
        assert!(!is_valid_uid(".."));
        assert!(!is_valid_uid("../etc"));
        assert!(!is_valid_uid("a\\b"));
    }
}
