//! headless-blog: a static blog generator backed by a headless CMS
//!
//! Posts are fetched from a Prismic repository, the listing page is built
//! from the first page of results with a "load more" action that follows the
//! pagination cursor, and each post page shows its publication date in the
//! configured locale and an estimated reading time.

pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::generator::GeneratedSite;
use crate::helpers::DateFormatter;
use crate::source::{ContentSource, PrismicClient};

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new blog from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Date formatter for the configured locale, timezone and pattern
    pub fn date_formatter(&self) -> error::Result<DateFormatter> {
        DateFormatter::from_config(&self.config)
    }

    /// Create the content source client; call once per process
    pub fn connect(&self) -> error::Result<Arc<dyn ContentSource>> {
        Ok(Arc::new(PrismicClient::from_config(&self.config)?))
    }

    /// Generate the static site
    pub async fn generate(&self, source: Arc<dyn ContentSource>) -> Result<GeneratedSite> {
        commands::generate::run(self, source).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.config.document_type, "posts");
    }

    #[test]
    fn test_new_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "public_dir: dist\napi_endpoint: https://repo.cdn.prismic.io/api/v2\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("dist"));
        assert!(blog.connect().is_ok());
    }

    #[test]
    fn test_connect_without_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert!(blog.connect().is_err());
    }
}
