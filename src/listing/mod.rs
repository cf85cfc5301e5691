//! Post listing accumulator
//!
//! Holds the posts shown on a listing page and the cursor of the next page.
//! `load_more` follows the cursor, converts the new page to display posts and
//! appends them. The list only ever grows at its end, a failed request leaves
//! it untouched, and only one request per listing is ever in flight since a
//! cursor is consumed by the response that replaces it.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::content::{to_display_posts, DisplayPost, PostPage, RawPost};
use crate::error::Result;
use crate::helpers::DateFormatter;
use crate::source::{ContentSource, Cursor};

/// Result of a `load_more` call
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A page was fetched; these posts were appended
    Loaded(Vec<DisplayPost>),
    /// There is no next page; nothing was requested
    Exhausted,
    /// Another call is still waiting for its page; nothing was requested
    InFlight,
}

/// Point-in-time copy of a listing's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub posts: Vec<DisplayPost>,
    pub cursor: Option<Cursor>,
    /// Message of the last failed `load_more`, cleared by the next success
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct ListingState {
    posts: Vec<DisplayPost>,
    cursor: Option<Cursor>,
    last_error: Option<String>,
}

/// Accumulates pages of posts behind a "load more" action
pub struct PostListing {
    source: Arc<dyn ContentSource>,
    formatter: DateFormatter,
    state: RwLock<ListingState>,
    loading: Mutex<()>,
}

impl PostListing {
    /// Seed a listing with its first page and the cursor that follows it
    pub fn initialize(
        source: Arc<dyn ContentSource>,
        formatter: DateFormatter,
        first_page: &[RawPost],
        cursor: Option<Cursor>,
    ) -> Result<Self> {
        let posts = to_display_posts(first_page, &formatter)?;
        tracing::debug!(
            "Listing initialized with {} posts (more: {})",
            posts.len(),
            cursor.is_some()
        );

        Ok(Self {
            source,
            formatter,
            state: RwLock::new(ListingState {
                posts,
                cursor,
                last_error: None,
            }),
            loading: Mutex::new(()),
        })
    }

    /// Seed a listing from a page returned by the content source
    pub fn from_page(
        source: Arc<dyn ContentSource>,
        formatter: DateFormatter,
        page: &PostPage,
    ) -> Result<Self> {
        Self::initialize(source, formatter, &page.results, page.cursor())
    }

    /// Fetch the next page and append it
    ///
    /// Errors are returned to the caller and recorded as the listing's last
    /// error; posts and cursor keep their previous values.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let Ok(_loading) = self.loading.try_lock() else {
            tracing::debug!("load_more ignored, a request is already in flight");
            return Ok(LoadOutcome::InFlight);
        };

        let Some(cursor) = self.state.read().await.cursor.clone() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let fetched = self
            .source
            .fetch_page(&cursor)
            .await
            .and_then(|page| {
                let posts = to_display_posts(&page.results, &self.formatter)?;
                Ok((posts, page.cursor()))
            });

        let mut state = self.state.write().await;
        match fetched {
            Ok((posts, next)) => {
                warn_duplicates(&state.posts, &posts);
                state.posts.extend(posts.iter().cloned());
                state.cursor = next;
                state.last_error = None;
                tracing::debug!(
                    "Appended {} posts, {} displayed (more: {})",
                    posts.len(),
                    state.posts.len(),
                    state.cursor.is_some()
                );
                Ok(LoadOutcome::Loaded(posts))
            }
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Posts displayed so far, in display order
    pub async fn posts(&self) -> Vec<DisplayPost> {
        self.state.read().await.posts.clone()
    }

    pub async fn cursor(&self) -> Option<Cursor> {
        self.state.read().await.cursor.clone()
    }

    /// Whether a "load more" action should be offered
    pub async fn has_more(&self) -> bool {
        self.state.read().await.cursor.is_some()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        let state = self.state.read().await;
        ListingSnapshot {
            posts: state.posts.clone(),
            cursor: state.cursor.clone(),
            last_error: state.last_error.clone(),
        }
    }
}

/// Overlapping pages are appended as-is; duplicates are only reported
fn warn_duplicates(existing: &[DisplayPost], incoming: &[DisplayPost]) {
    let seen: HashSet<&str> = existing.iter().map(DisplayPost::uid).collect();
    for post in incoming.iter().filter(|p| seen.contains(p.uid())) {
        tracing::warn!("Post {} appears on more than one page", post.uid());
    }
}
