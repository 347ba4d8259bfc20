//! Category classifier client.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use stockroom_core::ProductId;

const CLASSIFY_BATCH_PATH: &str = "products/classify_batch";

/// Failure of a classification round trip.
///
/// This error only ever reaches the enrichment log; it is never returned to the
/// caller of a create operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// Connection, timeout or other transport failure.
    #[error("classifier request failed: {0}")]
    Transport(String),

    #[error("classifier responded with status {0}")]
    Status(u16),

    #[error("classifier response could not be parsed: {0}")]
    Malformed(String),
}

/// Predicts a category for an existing product.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// `Ok(None)` means the service answered but had no usable prediction.
    async fn classify(&self, id: ProductId) -> Result<Option<String>, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct ClassifyBatchRequest {
    product_ids: Vec<ProductId>,
}

/// HTTP classifier: `PUT {base}/products/classify_batch` with `{"product_ids": [id]}`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: super::endpoint(base_url, CLASSIFY_BATCH_PATH),
        })
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, id: ProductId) -> Result<Option<String>, ClassifierError> {
        let request = ClassifyBatchRequest {
            product_ids: vec![id],
        };

        let response = self
            .client
            .put(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        Ok(first_prediction(&body))
    }
}

/// Category of the first element of a `[{"id": .., "category": ..}, ..]` response.
///
/// Anything else (not an array, empty array, missing or blank category) is "no
/// usable prediction".
fn first_prediction(body: &Value) -> Option<String> {
    body.as_array()?
        .first()?
        .get("category")?
        .as_str()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_category_of_first_element() {
        let body = json!([{"id": 1, "category": "Electronics"}, {"id": 2, "category": "Toys"}]);
        assert_eq!(first_prediction(&body), Some("Electronics".to_string()));
    }

    #[test]
    fn unusable_responses_yield_no_prediction() {
        assert_eq!(first_prediction(&json!([])), None);
        assert_eq!(first_prediction(&json!({"category": "Electronics"})), None);
        assert_eq!(first_prediction(&json!([{"id": 1}])), None);
        assert_eq!(first_prediction(&json!([{"id": 1, "category": ""}])), None);
        assert_eq!(first_prediction(&json!([{"id": 1, "category": 7}])), None);
        assert_eq!(first_prediction(&json!(null)), None);
    }

    #[test]
    fn request_body_matches_batch_contract() {
        let body = serde_json::to_value(ClassifyBatchRequest {
            product_ids: vec![ProductId::new(12)],
        })
        .unwrap();
        assert_eq!(body, json!({"product_ids": [12]}));
    }
}
