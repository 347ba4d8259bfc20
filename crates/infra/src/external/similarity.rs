//! Name-similarity search pass-through.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use thiserror::Error;

const SIMILARITY_BY_NAME_PATH: &str = "products/similarity_by_name";

/// Upstream response, returned to the caller byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Similarity search failure.
///
/// `status` is the upstream HTTP status when the service answered at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("similarity search failed: {message}")]
pub struct SimilarityError {
    pub status: Option<u16>,
    pub message: String,
}

#[async_trait::async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn search_by_name(&self, name: &str) -> Result<SimilarityResponse, SimilarityError>;
}

#[derive(Debug, Serialize)]
struct SimilarityRequest<'a> {
    name: &'a str,
}

/// HTTP similarity search: `POST {base}/products/similarity_by_name` with `{"name": ..}`.
#[derive(Debug, Clone)]
pub struct HttpSimilaritySearch {
    client: Client,
    url: String,
}

impl HttpSimilaritySearch {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: super::endpoint(base_url, SIMILARITY_BY_NAME_PATH),
        })
    }
}

#[async_trait::async_trait]
impl SimilaritySearch for HttpSimilaritySearch {
    async fn search_by_name(&self, name: &str) -> Result<SimilarityResponse, SimilarityError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SimilarityRequest { name })
            .send()
            .await
            .map_err(|e| SimilarityError {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SimilarityError {
                status: Some(status.as_u16()),
                message: format!("upstream responded with status {status}"),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| SimilarityError {
            status: None,
            message: e.to_string(),
        })?;

        Ok(SimilarityResponse {
            content_type,
            body: body.to_vec(),
        })
    }
}
