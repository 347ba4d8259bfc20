//! Best-effort category enrichment after product creation.
//!
//! A product created without a category gets exactly one synchronous classification
//! attempt. Whatever happens during that attempt, the create operation has already
//! succeeded: failures are logged and the originally created record is kept.
//!
//! ```text
//! Created ──(category supplied)──────────────────────────▶ NotRequested
//!    │
//!    └─(no category)─▶ classify(id) ─▶ update(category) ─▶ get(id) ─▶ Classified
//!                          │                 │               │
//!                          └──── any failure / no prediction ┴──────▶ Unclassified
//! ```
//!
//! There are no retries and no background resumption.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use stockroom_products::{Product, ProductPatch};

use crate::catalog_store::{CatalogStore, CatalogStoreError};
use crate::external::{Classifier, ClassifierError};

/// Why a product stayed uncategorized.
///
/// Deliberately has no conversion into the catalog's caller-facing error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnrichmentFailure {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("classifier returned no usable category")]
    NoPrediction,

    #[error("failed to apply predicted category: {0}")]
    Apply(CatalogStoreError),
}

/// Terminal state of one creation's enrichment.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// The caller supplied a category; the classifier was not consulted.
    NotRequested(Product),
    /// Category applied; the record was re-read after the update.
    Classified(Product),
    /// The originally created record, unchanged.
    Unclassified {
        product: Product,
        reason: EnrichmentFailure,
    },
}

impl EnrichmentOutcome {
    pub fn into_product(self) -> Product {
        match self {
            Self::NotRequested(p) | Self::Classified(p) => p,
            Self::Unclassified { product, .. } => product,
        }
    }
}

/// Runs the classify → update → re-read sequence for freshly created products.
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    store: Arc<dyn CatalogStore>,
    classifier: Arc<dyn Classifier>,
}

impl EnrichmentCoordinator {
    pub fn new(store: Arc<dyn CatalogStore>, classifier: Arc<dyn Classifier>) -> Self {
        Self { store, classifier }
    }

    /// Attempt to classify `created` once. Never fails.
    #[instrument(skip(self, created), fields(product_id = %created.id))]
    pub async fn enrich(&self, created: Product) -> EnrichmentOutcome {
        match self.classify_and_apply(&created).await {
            Ok(product) => {
                info!(category = %product.category, "product classified");
                EnrichmentOutcome::Classified(product)
            }
            Err(reason) => {
                warn!(error = %reason, "category enrichment failed; product stays uncategorized");
                EnrichmentOutcome::Unclassified {
                    product: created,
                    reason,
                }
            }
        }
    }

    async fn classify_and_apply(&self, created: &Product) -> Result<Product, EnrichmentFailure> {
        let category = self
            .classifier
            .classify(created.id)
            .await?
            .ok_or(EnrichmentFailure::NoPrediction)?;

        self.store
            .update(created.id, ProductPatch::category(category))
            .await
            .map_err(EnrichmentFailure::Apply)?;

        self.store
            .get(created.id)
            .await
            .map_err(EnrichmentFailure::Apply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use stockroom_core::ProductId;
    use stockroom_products::NewProduct;

    use crate::catalog_store::InMemoryCatalogStore;

    /// Classifier double with a canned answer that records every call.
    struct StubClassifier {
        answer: Result<Option<String>, ClassifierError>,
        calls: Mutex<Vec<ProductId>>,
        /// Deletes the product before answering (simulates a concurrent delete).
        delete_from: Option<Arc<InMemoryCatalogStore>>,
    }

    impl StubClassifier {
        fn answering(answer: Result<Option<String>, ClassifierError>) -> Self {
            Self {
                answer,
                calls: Mutex::new(Vec::new()),
                delete_from: None,
            }
        }

        fn calls(&self) -> Vec<ProductId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, id: ProductId) -> Result<Option<String>, ClassifierError> {
            self.calls.lock().unwrap().push(id);
            if let Some(store) = &self.delete_from {
                store.delete(id).await.unwrap();
            }
            self.answer.clone()
        }
    }

    async fn uncategorized(store: &InMemoryCatalogStore) -> Product {
        store
            .create(NewProduct {
                name: "Mystery Box".to_string(),
                price: 9.99,
                quantity: 1,
                in_stock: true,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn applies_prediction_and_returns_refreshed_record() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let classifier = Arc::new(StubClassifier::answering(Ok(Some("Toys".to_string()))));
        let coordinator = EnrichmentCoordinator::new(store.clone(), classifier.clone());
        let created = uncategorized(&store).await;

        let outcome = coordinator.enrich(created.clone()).await;

        match outcome {
            EnrichmentOutcome::Classified(product) => assert_eq!(product.category, "Toys"),
            other => panic!("expected Classified, got {other:?}"),
        }
        assert_eq!(store.get(created.id).await.unwrap().category, "Toys");
        assert_eq!(classifier.calls(), vec![created.id]);
    }

    #[tokio::test]
    async fn classifier_failure_keeps_original_record() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let classifier = Arc::new(StubClassifier::answering(Err(ClassifierError::Status(503))));
        let coordinator = EnrichmentCoordinator::new(store.clone(), classifier.clone());
        let created = uncategorized(&store).await;

        let outcome = coordinator.enrich(created.clone()).await;

        assert_eq!(
            outcome,
            EnrichmentOutcome::Unclassified {
                product: created.clone(),
                reason: EnrichmentFailure::Classifier(ClassifierError::Status(503)),
            }
        );
        assert_eq!(store.get(created.id).await.unwrap().category, "");
        assert_eq!(classifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_prediction_keeps_original_record() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let classifier = Arc::new(StubClassifier::answering(Ok(None)));
        let coordinator = EnrichmentCoordinator::new(store.clone(), classifier);
        let created = uncategorized(&store).await;

        let outcome = coordinator.enrich(created.clone()).await;

        match outcome {
            EnrichmentOutcome::Unclassified { product, reason } => {
                assert_eq!(product, created);
                assert_eq!(reason, EnrichmentFailure::NoPrediction);
            }
            other => panic!("expected Unclassified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_delete_during_classification_is_absorbed() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let classifier = Arc::new(StubClassifier {
            answer: Ok(Some("Toys".to_string())),
            calls: Mutex::new(Vec::new()),
            delete_from: Some(store.clone()),
        });
        let coordinator = EnrichmentCoordinator::new(store.clone(), classifier);
        let created = uncategorized(&store).await;

        let outcome = coordinator.enrich(created.clone()).await;

        assert_eq!(
            outcome,
            EnrichmentOutcome::Unclassified {
                product: created.clone(),
                reason: EnrichmentFailure::Apply(CatalogStoreError::NotFound(created.id)),
            }
        );
    }
}
