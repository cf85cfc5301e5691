//! Content sources - where posts come from
//!
//! The rest of the crate only talks to [`ContentSource`]. A single instance
//! is created at startup and shared as `Arc<dyn ContentSource>`, so tests
//! and offline runs can swap in [`MemorySource`].

mod memory;
mod prismic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{PostPage, RawPost};
use crate::error::Result;

pub use memory::MemorySource;
pub use prismic::PrismicClient;

#[cfg(test)]
pub(crate) use memory::fixtures;

/// Opaque continuation token pointing at the next page of results
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PostPage {
    /// Cursor of the page following this one
    pub fn cursor(&self) -> Option<Cursor> {
        self.next_page.as_deref().map(Cursor::new)
    }
}

/// Options for a typed document query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    /// Ordering expression, e.g. `[document.first_publication_date desc]`
    pub orderings: Option<String>,
}

impl QueryOptions {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }
}

/// A headless CMS holding post documents
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents of a type
    async fn get_by_type(&self, document_type: &str, options: &QueryOptions) -> Result<PostPage>;

    /// A single document by uid
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawPost>;

    /// The page a continuation cursor points at
    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_cursor() {
        let page = PostPage {
            results: Vec::new(),
            next_page: Some("https://repo.cdn.prismic.io/api/v2/documents/search?page=2".into()),
        };
        assert_eq!(
            page.cursor().unwrap().as_str(),
            "https://repo.cdn.prismic.io/api/v2/documents/search?page=2"
        );
        assert!(PostPage::default().cursor().is_none());
    }

    #[test]
    fn test_query_options() {
        let options = QueryOptions::with_page_size(5);
        assert_eq!(options.page_size, Some(5));
        assert_eq!(options.page, None);
    }
}
