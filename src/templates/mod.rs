//! Built-in blog theme rendered with the Tera template engine
//!
//! Templates and assets are embedded in the binary. Autoescaping stays on,
//! so only pre-rendered rich text bodies are marked `safe`.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{LabelsConfig, SiteConfig};
use crate::content::DisplayPost;
use crate::detail::{DetailView, PostDetail};
use crate::error::Result;
use crate::helpers::{full_url_for, html_escape, page_data_path, post_path, url_for};
use crate::listing::ListingSnapshot;

/// Static files written to `<public>/assets/`
pub const ASSETS: [(&str, &str); 2] = [
    ("style.css", include_str!("theme/assets/style.css")),
    ("load_more.js", include_str!("theme/assets/load_more.js")),
];

/// Seconds before the loading placeholder reloads itself
const LOADING_REFRESH_SECS: u32 = 1;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    labels: LabelsConfig,
    config: SiteConfig,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("theme/partials/post_list.html"),
            ),
            // Icons
            ("icons/calendar.html", include_str!("theme/icons/calendar.html")),
            ("icons/user.html", include_str!("theme/icons/user.html")),
            ("icons/clock.html", include_str!("theme/icons/clock.html")),
        ])?;

        // Slashes stay literal so paths and URLs read naturally in the output
        tera.set_escape_fn(html_escape);
        tera.register_filter("post_url", post_url_filter);

        Ok(Self {
            tera,
            site: SiteData::from_config(config),
            labels: config.labels.clone(),
            config: config.clone(),
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Listing page for the current state of a listing
    pub fn render_index(&self, listing: &ListingSnapshot) -> Result<String> {
        let mut context = self.base_context(&self.config.title);
        context.insert("posts", &listing.posts);
        context.insert("has_more", &listing.cursor.is_some());
        context.insert("static_next", &url_for(&self.config, &page_data_path(2)));
        context.insert("load_error", &listing.last_error.is_some());
        self.render("index.html", &context)
    }

    /// Listing entries alone, appended by the "load more" script
    pub fn render_post_list(&self, posts: &[DisplayPost]) -> Result<String> {
        let mut context = self.base_context("");
        context.insert("posts", posts);
        self.render("partials/post_list.html", &context)
    }

    /// Post page, or the loading placeholder while the post resolves
    pub fn render_detail(&self, view: &DetailView) -> Result<String> {
        match view {
            DetailView::Loading => self.render_loading(),
            DetailView::Ready(post) => self.render_post(post),
        }
    }

    fn render_post(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.base_context(&self.config.page_title(&post.title));
        context.insert("post", post);
        context.insert(
            "canonical_url",
            &full_url_for(&self.config, &post_path("", &post.uid)),
        );
        self.render("post.html", &context)
    }

    fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context(&self.config.page_title(&self.labels.loading));
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.render("loading.html", &context)
    }

    fn base_context(&self, page_title: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("labels", &self.labels);
        context.insert("page_title", page_title);
        context
    }
}

/// Tera filter: site path of a post from its uid
fn post_url_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let uid = tera::try_get_value!("post_url", "value", String, value);
    let root = match args.get("root") {
        Some(val) => tera::try_get_value!("post_url", "root", String, val),
        None => "/".to_string(),
    };
    Ok(tera::Value::String(post_path(&root, &uid)))
}

/// Site-wide values available to every template
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    /// Root path, always ending with `/`
    pub root: String,
    pub logo: String,
    pub generator: String,
}

impl SiteData {
    fn from_config(config: &SiteConfig) -> Self {
        let logo = if config.logo.starts_with("http://") || config.logo.starts_with("https://") {
            config.logo.clone()
        } else {
            url_for(config, &config.logo)
        };

        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, ""),
            logo,
            generator: format!("headless-blog {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::DateFormatter;
    use crate::source::fixtures::post;

    fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(&SiteConfig::default()).unwrap()
    }

    fn snapshot(has_more: bool, last_error: Option<String>) -> ListingSnapshot {
        let formatter = DateFormatter::default();
        let posts = ["first-post", "second-post"]
            .iter()
            .map(|uid| DisplayPost::from_raw(&post(uid, "2021-03-01T00:00:00Z"), &formatter))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        ListingSnapshot {
            posts,
            cursor: has_more.then(|| crate::source::Cursor::new("memory://page/1")),
            last_error,
        }
    }

    #[test]
    fn test_render_index() {
        let html = renderer().render_index(&snapshot(true, None)).unwrap();
        assert!(html.contains(r#"href="/post/first-post/""#));
        assert!(html.contains("Title of second-post"));
        assert!(html.contains("01 mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#"id="load-error" hidden"#));
        assert!(html.contains("<title>spacetraveling</title>"));
        assert!(html.contains(r#"data-static-next="/pages/2.json""#));

        // The script reads the attribute the index writes
        let (_, script) = ASSETS[1];
        assert!(script.contains("data-static-next"));
    }

    #[test]
    fn test_render_index_last_page_with_error() {
        let html = renderer()
            .render_index(&snapshot(false, Some("down".to_string())))
            .unwrap();
        assert!(!html.contains("Carregar mais posts"));
        assert!(!html.contains(r#"id="load-error" hidden"#));
    }

    #[test]
    fn test_render_post_list_escapes() {
        let mut raw = post("x", "2021-03-01T00:00:00Z");
        raw.data.title = "<script>alert(1)</script>".to_string();
        let display = DisplayPost::from_raw(&raw, &DateFormatter::default()).unwrap();

        let html = renderer().render_post_list(&[display]).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_detail() {
        let raw = post("my-post", "2022-05-20T14:00:00Z");
        let view = DetailView::resolve(Some(&raw), &DateFormatter::default(), "/").unwrap();

        let html = renderer().render_detail(&view).unwrap();
        assert!(html.contains("<title>Title of my-post | spacetraveling</title>"));
        assert!(html.contains("<h1>Title of my-post</h1>"));
        assert!(html.contains(r#"href="http://localhost:4000/post/my-post/""#));
        assert!(html.contains("20 mai 2022"));
        assert!(html.contains("1 min"));
        assert!(html.contains("<h2>Intro</h2>"));
        assert!(html.contains("<p>Some words here</p>"));
    }

    #[test]
    fn test_render_loading() {
        let html = renderer().render_detail(&DetailView::Loading).unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains(r#"http-equiv="refresh""#));
    }

    #[test]
    fn test_site_data_root() {
        let mut config = SiteConfig::default();
        config.root = "/blog".to_string();
        let site = SiteData::from_config(&config);
        assert_eq!(site.root, "/blog/");
        assert_eq!(site.logo, "/blog/Logo.png");
    }
}
