//! List the posts of the content source

use anyhow::Result;
use std::sync::Arc;

use crate::content::DisplayPost;
use crate::listing::{LoadOutcome, PostListing};
use crate::source::{ContentSource, QueryOptions};
use crate::Blog;

/// Collect every post by following the listing cursor to the last page
pub async fn collect(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Vec<DisplayPost>> {
    let config = &blog.config;
    let first = source
        .get_by_type(
            &config.document_type,
            &QueryOptions::with_page_size(config.page_size),
        )
        .await?;

    let listing = PostListing::from_page(source, blog.date_formatter()?, &first)?;
    while let LoadOutcome::Loaded(posts) = listing.load_more().await? {
        tracing::debug!("Fetched {} more posts", posts.len());
    }

    Ok(listing.posts().await)
}

/// Print every post, newest first as the source orders them
pub async fn run(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<()> {
    let posts = collect(blog, source).await?;

    println!("Posts ({}):", posts.len());
    for post in posts {
        println!(
            "  {} - {} [{}]",
            post.formatted_date().unwrap_or("unpublished"),
            post.title(),
            post.uid()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures::pages;
    use crate::source::MemorySource;

    #[tokio::test]
    async fn test_collect_walks_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = Arc::new(MemorySource::new(pages(&[2, 2, 1])));

        let posts = collect(&blog, source.clone()).await.unwrap();
        assert_eq!(posts.len(), 5);
        assert_eq!(posts[4].uid(), "post-5");
        assert_eq!(source.requests(), 3);
    }

    #[tokio::test]
    async fn test_collect_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = MemorySource::new(pages(&[1, 1]));
        source.fail_next(1);

        assert!(collect(&blog, Arc::new(source)).await.is_err());
    }
}
