//! Generator module - writes the listing and post pages to the public directory

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::content::{to_display_posts, PostPage, RawPost};
use crate::detail::DetailView;
use crate::error::BlogError;
use crate::helpers::{is_valid_uid, page_data_path, url_for, DateFormatter};
use crate::listing::{ListingSnapshot, PostListing};
use crate::source::{ContentSource, QueryOptions};
use crate::templates::{TemplateRenderer, ASSETS};
use crate::Blog;

/// Summary of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedSite {
    /// First page of the listing, used to seed listings created later
    pub initial_page: PostPage,
    /// Listing pages, the index included
    pub pages_written: usize,
    pub posts_written: usize,
}

/// Data file of a listing page after the first
///
/// `next` is the site path of the following data file, `None` on the last
/// page.
#[derive(Debug, Serialize)]
struct PageData {
    html: String,
    next: Option<String>,
}

/// Static site generator over a content source
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
    formatter: DateFormatter,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&blog.config)?;
        let formatter = blog.date_formatter()?;

        Ok(Self {
            blog: blog.clone(),
            source,
            renderer,
            formatter,
        })
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn formatter(&self) -> &DateFormatter {
        &self.formatter
    }

    pub fn source(&self) -> &Arc<dyn ContentSource> {
        &self.source
    }

    /// Generate the listing, the data files of its later pages and one page
    /// per listed post
    pub async fn generate(&self) -> Result<GeneratedSite> {
        fs::create_dir_all(&self.blog.public_dir)?;
        self.write_assets()?;

        let initial_page = self.first_page().await?;
        let listing =
            PostListing::from_page(self.source.clone(), self.formatter.clone(), &initial_page)?;
        self.write_index(&listing.snapshot().await)?;
        let mut posts_written = self.write_posts(&initial_page.results)?;

        let pages_dir = self.blog.public_dir.join("pages");
        if pages_dir.exists() {
            fs::remove_dir_all(&pages_dir)?;
        }

        let mut pages_written = 1;
        let mut seen = HashSet::new();
        let mut cursor = initial_page.cursor();
        while let Some(current) = cursor {
            if !seen.insert(current.clone()) {
                tracing::warn!("Cursor {} was already followed, stopping", current);
                break;
            }

            let page = self.source.fetch_page(&current).await?;
            cursor = page.cursor();
            pages_written += 1;

            let next = cursor
                .as_ref()
                .map(|_| url_for(&self.blog.config, &page_data_path(pages_written + 1)));
            self.write_page_data(pages_written, &page.results, next)?;
            posts_written += self.write_posts(&page.results)?;
        }

        tracing::info!(
            "Generated {} listing pages and {} posts",
            pages_written,
            posts_written
        );

        Ok(GeneratedSite {
            initial_page,
            pages_written,
            posts_written,
        })
    }

    /// First page of posts, as configured
    pub async fn first_page(&self) -> crate::error::Result<PostPage> {
        let config = &self.blog.config;
        self.source
            .get_by_type(
                &config.document_type,
                &QueryOptions::with_page_size(config.page_size),
            )
            .await
    }

    /// Write the listing page
    pub fn write_index(&self, listing: &ListingSnapshot) -> crate::error::Result<PathBuf> {
        let html = self.renderer.render_index(listing)?;
        let output_path = self.blog.public_dir.join("index.html");
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// Write the data file of listing page `number`
    fn write_page_data(
        &self,
        number: usize,
        posts: &[RawPost],
        next: Option<String>,
    ) -> crate::error::Result<PathBuf> {
        let posts = to_display_posts(posts, &self.formatter)?;
        let data = PageData {
            html: self.renderer.render_post_list(&posts)?,
            next,
        };

        let output_path = self.blog.public_dir.join(page_data_path(number));
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, serde_json::to_string(&data)?)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// Write the pages of fetched posts, skipping uids that cannot name a
    /// directory
    fn write_posts(&self, posts: &[RawPost]) -> crate::error::Result<usize> {
        let mut written = 0;
        for post in posts {
            if !is_valid_uid(&post.uid) {
                tracing::warn!("Skipping post with unusable uid {:?}", post.uid);
                continue;
            }
            self.write_post(post)?;
            written += 1;
        }
        Ok(written)
    }

    /// Output file of a post page, `None` if the uid cannot name a directory
    pub fn post_output_path(&self, uid: &str) -> Option<PathBuf> {
        is_valid_uid(uid).then(|| {
            self.blog
                .public_dir
                .join("post")
                .join(uid)
                .join("index.html")
        })
    }

    /// Fetch a post by uid and write its page
    pub async fn generate_post(&self, uid: &str) -> crate::error::Result<PathBuf> {
        let post = self
            .source
            .get_by_uid(&self.blog.config.document_type, uid)
            .await?;
        self.write_post(&post)
    }

    /// Write the page of a resolved post
    pub fn write_post(&self, post: &RawPost) -> crate::error::Result<PathBuf> {
        let output_path = self
            .post_output_path(&post.uid)
            .ok_or_else(|| BlogError::NotFound(post.uid.clone()))?;

        let view = DetailView::resolve(Some(post), &self.formatter, &self.blog.config.root)?;
        let html = self.renderer.render_detail(&view)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated post: {:?}", output_path);
        Ok(output_path)
    }

    /// Placeholder page shown while a post is generated on demand
    pub fn render_loading(&self) -> crate::error::Result<String> {
        self.renderer.render_detail(&DetailView::Loading)
    }

    fn write_assets(&self) -> Result<()> {
        let assets_dir = self.blog.public_dir.join("assets");
        fs::create_dir_all(&assets_dir)?;
        for (name, content) in ASSETS {
            fs::write(assets_dir.join(name), content)?;
        }
        Ok(())
    }
}
