//! Error types shared by the content source, listing and renderers

use thiserror::Error;

/// Errors raised while fetching or rendering blog content
#[derive(Error, Debug)]
pub enum BlogError {
    /// The content source could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// The content source answered with a non-2xx status
    #[error("Content source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The response is missing expected fields or carries unparsable values
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlogError {
    /// Whether the failure came from talking to the content source
    pub fn is_network(&self) -> bool {
        matches!(self, BlogError::Network(_) | BlogError::Status { .. })
    }
}

impl From<reqwest::Error> for BlogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BlogError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            BlogError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            BlogError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BlogError {
    fn from(err: serde_json::Error) -> Self {
        BlogError::MalformedResponse(err.to_string())
    }
}

impl From<tera::Error> for BlogError {
    fn from(err: tera::Error) -> Self {
        BlogError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
