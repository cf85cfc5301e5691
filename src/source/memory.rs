//! In-memory content source
//!
//! Serves a fixed list of pages. Used by the test suite and by `--fixture`
//! runs, where the pages come from a JSON file shaped like
//! `[[post, post], [post]]`.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ContentSource, Cursor, QueryOptions};
use crate::content::{PostPage, RawPost};
use crate::error::{BlogError, Result};

const CURSOR_PREFIX: &str = "memory://page/";

/// Content source backed by pages held in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: Vec<Vec<RawPost>>,
    requests: AtomicUsize,
    failures: AtomicUsize,
    latency: Option<Duration>,
}

impl MemorySource {
    /// Create a source serving the given pages in order
    pub fn new(pages: Vec<Vec<RawPost>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Load pages from a JSON fixture file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let pages: Vec<Vec<RawPost>> = serde_json::from_str(&content)?;
        tracing::info!(
            "Loaded {} fixture pages from {:?}",
            pages.len(),
            path.as_ref()
        );
        Ok(Self::new(pages))
    }

    /// Delay every page request, to exercise slow networks
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` requests fail with a network error
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of requests served or failed so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Cursor pointing at a page index
    pub fn cursor_for(index: usize) -> Cursor {
        Cursor::new(format!("{}{}", CURSOR_PREFIX, index))
    }

    fn page(&self, index: usize) -> PostPage {
        let results = self.pages.get(index).cloned().unwrap_or_default();
        let next_page = (index + 1 < self.pages.len())
            .then(|| Self::cursor_for(index + 1).as_str().to_string());
        PostPage { results, next_page }
    }

    async fn begin_request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(BlogError::Network("simulated connection failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn get_by_type(&self, _document_type: &str, _options: &QueryOptions) -> Result<PostPage> {
        self.begin_request().await?;
        Ok(self.page(0))
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawPost> {
        self.begin_request().await?;
        self.pages
            .iter()
            .flatten()
            .find(|post| post.uid == uid)
            .cloned()
            .ok_or_else(|| BlogError::NotFound(format!("{}/{}", document_type, uid)))
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostPage> {
        self.begin_request().await?;
        let index = cursor
            .as_str()
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n < self.pages.len())
            .ok_or_else(|| BlogError::MalformedResponse(format!("Unknown cursor: {}", cursor)))?;
        Ok(self.page(index))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::content::{ContentSection, PostData, RawPost, RichTextBlock};

    /// A post with one short section
    pub fn post(uid: &str, date: &str) -> RawPost {
        RawPost {
            uid: uid.to_string(),
            first_publication_date: Some(date.to_string()),
            data: PostData {
                title: format!("Title of {}", uid),
                subtitle: format!("Subtitle of {}", uid),
                author: "Joseph Oliveira".to_string(),
                banner: Default::default(),
                content: vec![ContentSection {
                    heading: "Intro".to_string(),
                    body: vec![RichTextBlock::paragraph("Some words here")],
                }],
            },
        }
    }

    /// Pages of posts with the given sizes and distinct uids
    pub fn pages(sizes: &[usize]) -> Vec<Vec<RawPost>> {
        let mut n = 0;
        sizes
            .iter()
            .map(|&size| {
                (0..size)
                    .map(|_| {
                        n += 1;
                        post(&format!("post-{}", n), "2021-03-01T00:00:00Z")
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::pages;
    use super::*;

    #[tokio::test]
    async fn test_pages_chain_through_cursors() {
        let source = MemorySource::new(pages(&[2, 1]));

        let first = source.get_by_type("posts", &QueryOptions::default()).await.unwrap();
        assert_eq!(first.results.len(), 2);
        let cursor = first.cursor().unwrap();

        let second = source.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.results[0].uid, "post-3");
        assert!(second.next_page.is_none());
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let source = MemorySource::new(pages(&[1, 1]));
        assert_eq!(source.get_by_uid("posts", "post-2").await.unwrap().uid, "post-2");
        assert!(matches!(
            source.get_by_uid("posts", "missing").await,
            Err(BlogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_next() {
        let source = MemorySource::new(pages(&[1, 1]));
        source.fail_next(1);
        let cursor = MemorySource::cursor_for(1);
        assert!(source.fetch_page(&cursor).await.unwrap_err().is_network());
        assert!(source.fetch_page(&cursor).await.is_ok());

        source.fail_next(1);
        assert!(source.get_by_uid("posts", "post-1").await.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn test_unknown_cursor() {
        let source = MemorySource::new(pages(&[1]));
        let err = source.fetch_page(&Cursor::new("memory://page/7")).await.unwrap_err();
        assert!(matches!(err, BlogError::MalformedResponse(_)));
    }

    #[test]
    fn test_load_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, serde_json::to_string(&pages(&[2, 1])).unwrap()).unwrap();

        let source = MemorySource::load(&path).unwrap();
        assert_eq!(source.page(0).results.len(), 2);
        assert_eq!(source.page(0).next_page.as_deref(), Some("memory://page/1"));
    }
}
