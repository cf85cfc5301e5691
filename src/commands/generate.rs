//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::generator::{GeneratedSite, Generator};
use crate::source::ContentSource;
use crate::Blog;

/// Generate the listing page and the pages of the listed posts
pub async fn run(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<GeneratedSite> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, source)?;
    let site = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        site.posts_written,
        duration.as_secs_f64()
    );

    Ok(site)
}
