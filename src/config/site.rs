//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    /// Appended to every page title as "{title} | {title_suffix}"
    pub title_suffix: String,
    pub description: String,
    pub logo: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content source
    pub api_endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,

    // Date / Time format
    pub locale: String,
    pub timezone: String,
    pub date_format: String,

    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            title_suffix: "spacetraveling".to_string(),
            description: String::new(),
            logo: "/Logo.png".to_string(),
            language: "pt-BR".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),

            api_endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 20,

            locale: "pt_BR".to_string(),
            timezone: "UTC".to_string(),
            date_format: "dd MMM yyyy".to_string(),

            labels: LabelsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Title for the `<title>` element of a page
    pub fn page_title(&self, title: &str) -> String {
        if self.title_suffix.is_empty() {
            title.to_string()
        } else {
            format!("{} | {}", title, self.title_suffix)
        }
    }
}

/// User-facing strings rendered by the templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub load_more: String,
    pub loading: String,
    pub load_failed: String,
    pub read_time_suffix: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            load_more: "Carregar mais posts".to_string(),
            loading: "Carregando...".to_string(),
            load_failed: "Não foi possível carregar mais posts.".to_string(),
            read_time_suffix: "min".to_string(),
        }
    }
}

/// Preview server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Live listing accumulators kept in memory, oldest evicted first
    pub max_listings: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_listings: 256 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.document_type, "posts");
        assert_eq!(config.date_format, "dd MMM yyyy");
        assert_eq!(config.locale, "pt_BR");
        assert_eq!(config.labels.load_more, "Carregar mais posts");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
api_endpoint: https://my-repo.cdn.prismic.io/api/v2
page_size: 5
labels:
  load_more: Load more
server:
  max_listings: 8
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.api_endpoint, "https://my-repo.cdn.prismic.io/api/v2");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.labels.load_more, "Load more");
        assert_eq!(config.labels.loading, "Carregando...");
        assert_eq!(config.server.max_listings, 8);
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn test_page_title() {
        let mut config = SiteConfig::default();
        config.title_suffix = "Ignews".to_string();
        assert_eq!(config.page_title("Hello"), "Hello | Ignews");
        config.title_suffix.clear();
        assert_eq!(config.page_title("Hello"), "Hello");
    }
}
