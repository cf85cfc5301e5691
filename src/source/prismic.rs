//! Prismic REST API (v2) client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{ContentSource, Cursor, QueryOptions};
use crate::config::SiteConfig;
use crate::content::{PostPage, RawPost};
use crate::error::{BlogError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API root document, only the refs are of interest
#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for one Prismic repository
pub struct PrismicClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as
    /// `https://my-repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(BlogError::Config(
                "api_endpoint is not set in _config.yml".to_string(),
            ));
        }

        let http = Client::builder()
            .user_agent(concat!("headless-blog/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BlogError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            access_token: access_token.filter(|token| !token.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    /// Create a client from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(&config.api_endpoint, config.access_token.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Master ref of the repository, fetched once per client
    async fn master_ref(&self) -> Result<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let root: ApiRoot = self.get_json(self.authorized(self.http.get(&self.endpoint))).await?;
                let master = root
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .ok_or_else(|| {
                        BlogError::MalformedResponse("API root has no master ref".to_string())
                    })?;
                tracing::debug!("Using Prismic master ref {}", master.reference);
                Ok::<_, BlogError>(master.reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: String, options: &QueryOptions) -> Result<PostPage> {
        let reference = self.master_ref().await?.to_string();
        let url = format!("{}/documents/search", self.endpoint);
        let request = self
            .http
            .get(&url)
            .query(&search_params(&reference, &predicate, options));
        self.get_json(self.authorized(request)).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlogError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn get_by_type(&self, document_type: &str, options: &QueryOptions) -> Result<PostPage> {
        tracing::info!("Fetching {} documents from {}", document_type, self.endpoint);
        self.search(at("document.type", document_type), options).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<RawPost> {
        tracing::debug!("Fetching {} document {}", document_type, uid);
        let path = format!("my.{}.uid", document_type);
        let page = self
            .search(at(&path, uid), &QueryOptions::with_page_size(1))
            .await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| BlogError::NotFound(format!("{}/{}", document_type, uid)))
    }

    async fn fetch_page(&self, cursor: &Cursor) -> Result<PostPage> {
        tracing::debug!("Following cursor {}", cursor);
        let mut request = self.http.get(cursor.as_str());
        if !cursor.as_str().contains("access_token=") {
            request = self.authorized(request);
        }
        self.get_json(request).await
    }
}

/// `at` predicate in Prismic's query syntax
fn at(path: &str, value: &str) -> String {
    format!(
        r#"[[at({}, "{}")]]"#,
        path,
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn search_params(reference: &str, predicate: &str, options: &QueryOptions) -> Vec<(&'static str, String)> {
    let mut params = vec![("ref", reference.to_string()), ("q", predicate.to_string())];
    if let Some(page_size) = options.page_size {
        params.push(("pageSize", page_size.to_string()));
    }
    if let Some(page) = options.page {
        params.push(("page", page.to_string()));
    }
    if let Some(orderings) = &options.orderings {
        params.push(("orderings", orderings.clone()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_endpoint() {
        assert!(matches!(
            PrismicClient::new("  ", None),
            Err(BlogError::Config(_))
        ));
    }

    #[test]
    fn test_new_trims_endpoint_and_empty_token() {
        let client =
            PrismicClient::new("https://repo.cdn.prismic.io/api/v2/", Some(String::new())).unwrap();
        assert_eq!(client.endpoint(), "https://repo.cdn.prismic.io/api/v2");
        assert!(client.access_token.is_none());
    }

    #[test]
    fn test_at_predicate() {
        assert_eq!(at("document.type", "posts"), r#"[[at(document.type, "posts")]]"#);
        assert_eq!(
            at("my.posts.uid", r#"say-"hi""#),
            r#"[[at(my.posts.uid, "say-\"hi\"")]]"#
        );
    }

    #[test]
    fn test_search_params() {
        let options = QueryOptions {
            page_size: Some(2),
            page: None,
            orderings: Some("[document.first_publication_date desc]".to_string()),
        };
        let params = search_params("master", "[[q]]", &options);
        assert_eq!(
            params,
            vec![
                ("ref", "master".to_string()),
                ("q", "[[q]]".to_string()),
                ("pageSize", "2".to_string()),
                ("orderings", "[document.first_publication_date desc]".to_string()),
            ]
        );
    }

    #[test]
    fn test_api_root_master_ref() {
        let json = r#"{"refs": [
            {"id": "preview", "ref": "abc", "label": "Preview"},
            {"id": "master", "ref": "YF3sXhIAACQAiL7j", "label": "Master", "isMasterRef": true}
        ]}"#;
        let root: ApiRoot = serde_json::from_str(json).unwrap();
        let master = root.refs.into_iter().find(|r| r.is_master_ref).unwrap();
        assert_eq!(master.reference, "YF3sXhIAACQAiL7j");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = PrismicClient::new("http://127.0.0.1:9/api/v2", None).unwrap();
        let err = client
            .get_by_type("posts", &QueryOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_network(), "{:?}", err);
    }
}
