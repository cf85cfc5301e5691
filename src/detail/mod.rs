//! Post detail rendering: reading time, formatted date and section bodies

use serde::Serialize;

use crate::content::richtext::{as_html_with_root, as_text};
use crate::content::{ContentSection, RawPost, RichTextBlock};
use crate::error::Result;
use crate::helpers::{safe_url, DateFormatter};

/// Reading speed used for the read time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Total words of a post: section headings plus the plain text of each body
pub fn count_words(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            section.heading.split_whitespace().count()
                + as_text(&section.body).split_whitespace().count()
        })
        .sum()
}

/// Minutes needed to read a post, rounded up
///
/// An empty post reads in zero minutes.
pub fn compute_read_time(content: &[ContentSection]) -> usize {
    count_words(content).div_ceil(WORDS_PER_MINUTE)
}

/// Render a section body to HTML that is safe to embed as-is
///
/// Links to other documents resolve to post pages under `root`.
pub fn render_body(body: &[RichTextBlock], root: &str) -> String {
    as_html_with_root(body, root)
}

/// A content section ready for the post template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub heading: String,
    pub html: String,
}

/// Everything the post page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub formatted_date: Option<String>,
    pub read_time_minutes: usize,
    /// Sections in the order the content source returned them
    pub sections: Vec<RenderedSection>,
}

impl PostDetail {
    /// Build the detail of a post for a site served under `root`
    pub fn from_raw(post: &RawPost, formatter: &DateFormatter, root: &str) -> Result<Self> {
        let formatted_date = post
            .first_publication_date
            .as_deref()
            .map(|date| formatter.format_timestamp(date))
            .transpose()?;

        let sections = post
            .data
            .content
            .iter()
            .map(|section| RenderedSection {
                heading: section.heading.clone(),
                html: render_body(&section.body, root),
            })
            .collect();

        Ok(Self {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            banner_url: post
                .data
                .banner
                .url
                .as_deref()
                .and_then(safe_url)
                .map(str::to_string),
            formatted_date,
            read_time_minutes: compute_read_time(&post.data.content),
            sections,
        })
    }
}

/// What a post page shows while its route may still be resolving
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    /// The post is still being fetched; only a placeholder is shown
    Loading,
    Ready(Box<PostDetail>),
}

impl DetailView {
    /// Build the view for a post that may not be resolved yet
    pub fn resolve(
        post: Option<&RawPost>,
        formatter: &DateFormatter,
        root: &str,
    ) -> Result<Self> {
        match post {
            None => Ok(DetailView::Loading),
            Some(post) => Ok(DetailView::Ready(Box::new(PostDetail::from_raw(
                post, formatter, root,
            )?))),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DetailView::Loading)
    }
}
