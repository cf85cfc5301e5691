//! Preview server
//!
//! Serves the generated site, backs the "load more" button with one listing
//! per page view, and generates post pages that were not built statically
//! the first time they are requested.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::PostPage;
use crate::error::BlogError;
use crate::generator::Generator;
use crate::listing::{LoadOutcome, PostListing};
use crate::source::ContentSource;
use crate::Blog;

/// Server state
pub struct ServerState {
    generator: Generator,
    public_dir: std::path::PathBuf,
    /// First page every new listing starts from
    initial_page: PostPage,
    listings: Mutex<Listings>,
    /// Post pages being generated on demand; entries leave once resolved
    pending: Mutex<HashMap<String, watch::Receiver<Option<Resolution>>>>,
}

/// Live listings, oldest first
struct Listings {
    next_id: u64,
    live: IndexMap<u64, Arc<PostListing>>,
    capacity: usize,
}

impl Listings {
    fn insert(&mut self, listing: PostListing) -> u64 {
        while self.live.len() >= self.capacity.max(1) {
            if let Some((id, _)) = self.live.shift_remove_index(0) {
                tracing::debug!("Evicted listing {}", id);
            }
        }
        self.next_id += 1;
        self.live.insert(self.next_id, Arc::new(listing));
        self.next_id
    }
}

/// How long a request waits for an on-demand page before the loading
/// placeholder is served instead
const RESOLVE_WAIT: Duration = Duration::from_millis(500);

/// Outcome of generating a post page on demand
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolution {
    Written,
    Missing,
    Failed,
}

impl ServerState {
    pub fn new(blog: &Blog, generator: Generator, initial_page: PostPage) -> Self {
        Self {
            generator,
            public_dir: blog.public_dir.clone(),
            initial_page,
            listings: Mutex::new(Listings {
                next_id: 0,
                live: IndexMap::new(),
                capacity: blog.config.server.max_listings,
            }),
            pending: Mutex::new(HashMap::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatedListing {
    id: u64,
    has_more: bool,
}

/// Response of a "load more" request
#[derive(Debug, Default, Serialize)]
struct MoreResponse {
    status: &'static str,
    html: String,
    appended: usize,
    has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Error returned by the API handlers
struct ApiError(StatusCode, String);

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        let status = match err {
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::Network(_) | BlogError::Status { .. } | BlogError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = MoreResponse {
            status: "error",
            error: Some(self.1),
            ..MoreResponse::default()
        };
        (self.0, Json(body)).into_response()
    }
}

/// Build the router, mounted under the site root
pub fn router(state: Arc<ServerState>, root: &str) -> Router {
    let app = Router::new()
        .route("/api/listings", post(create_listing))
        .route("/api/listings/:id/more", post(load_more))
        .route("/post/:slug", get(post_page))
        .route("/post/:slug/", get(post_page))
        .fallback_service(ServeDir::new(&state.public_dir))
        .with_state(state);

    let root = root.trim_end_matches('/');
    if root.is_empty() {
        app
    } else {
        Router::new().nest(root, app)
    }
}

/// Start the preview server
pub async fn start(
    blog: &Blog,
    source: Arc<dyn ContentSource>,
    ip: &str,
    port: u16,
    generate: bool,
    open: bool,
) -> Result<()> {
    let generator = Generator::new(blog, source)?;
    let initial_page = if generate {
        tracing::info!("Generating static files...");
        generator.generate().await?.initial_page
    } else {
        generator.first_page().await?
    };

    let state = Arc::new(ServerState::new(blog, generator, initial_page));
    let app = router(state, &blog.config.root).layer(TraceLayer::new_for_http());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, blog.config.root);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `POST /api/listings`: start a listing from the initial page
async fn create_listing(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<CreatedListing>, ApiError> {
    let listing = PostListing::from_page(
        state.generator.source().clone(),
        state.generator.formatter().clone(),
        &state.initial_page,
    )?;
    let has_more = listing.has_more().await;
    let id = state.listings.lock().await.insert(listing);
    tracing::debug!("Created listing {}", id);

    Ok(Json(CreatedListing { id, has_more }))
}

/// `POST /api/listings/:id/more`: append the next page of a listing
async fn load_more(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let listing = state
        .listings
        .lock()
        .await
        .live
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("Unknown listing: {}", id)))?;

    let response = match listing.load_more().await? {
        LoadOutcome::Loaded(posts) => MoreResponse {
            status: "loaded",
            html: state.generator.renderer().render_post_list(&posts)?,
            appended: posts.len(),
            has_more: listing.has_more().await,
            error: None,
        },
        LoadOutcome::Exhausted => MoreResponse {
            status: "exhausted",
            ..MoreResponse::default()
        },
        LoadOutcome::InFlight => {
            let body = MoreResponse {
                status: "in_flight",
                has_more: true,
                ..MoreResponse::default()
            };
            return Ok((StatusCode::CONFLICT, Json(body)).into_response());
        }
    };

    Ok(Json(response).into_response())
}

/// `GET /post/:slug`: serve a post page, generating it when it was not built
///
/// Every miss asks the content source again, so posts published after the
/// server started are found.
async fn post_page(State(state): State<Arc<ServerState>>, Path(slug): Path<String>) -> Response {
    let Some(path) = state.generator.post_output_path(&slug) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    if let Ok(content) = tokio::fs::read_to_string(&path).await {
        return Html(content).into_response();
    }

    let mut outcome = {
        let mut pending = state.pending.lock().await;
        match pending.get(&slug) {
            Some(outcome) => outcome.clone(),
            None => {
                let (tx, rx) = watch::channel(None);
                pending.insert(slug.clone(), rx.clone());
                tokio::spawn(resolve_post(state.clone(), slug.clone(), tx));
                rx
            }
        }
    };

    let wait = async { outcome.wait_for(Option::is_some).await.ok().and_then(|r| *r) };
    let resolution = tokio::time::timeout(RESOLVE_WAIT, wait).await.ok().flatten();

    match resolution {
        Some(Resolution::Missing) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Some(Resolution::Written) => match tokio::fs::read_to_string(&path).await {
            Ok(content) => Html(content).into_response(),
            Err(_) => loading_page(&state),
        },
        Some(Resolution::Failed) | None => loading_page(&state),
    }
}

fn loading_page(state: &ServerState) -> Response {
    match state.generator.render_loading() {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Generate a post page and hand the outcome to the waiting requests
async fn resolve_post(
    state: Arc<ServerState>,
    slug: String,
    outcome: watch::Sender<Option<Resolution>>,
) {
    let resolution = match state.generator.generate_post(&slug).await {
        Ok(path) => {
            tracing::info!("Generated on demand: {:?}", path);
            Resolution::Written
        }
        Err(BlogError::NotFound(_)) => {
            tracing::info!("No post for slug {}", slug);
            Resolution::Missing
        }
        Err(e) => {
            // Retried by the next request
            tracing::warn!("Failed to generate post {}: {}", slug, e);
            Resolution::Failed
        }
    };

    state.pending.lock().await.remove(&slug);
    let _ = outcome.send(Some(resolution));
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
