//! Catalog application service.
//!
//! Composes the store port, the enrichment coordinator and the similarity
//! delegate into the operations exposed over HTTP. Every operation is
//! request-scoped: IO calls are awaited in sequence and no state is kept here.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::{error, instrument};

use stockroom_core::{DomainError, ProductId};
use stockroom_products::{
    NewProduct, Product, ProductFilter, ProductPatch, added_in_last_days, average_product_price,
    top_n_by_price, total_inventory_value,
};

use crate::catalog_store::{CatalogStore, CatalogStoreError};
use crate::enrichment::{EnrichmentCoordinator, EnrichmentOutcome};
use crate::external::{Classifier, SimilarityError, SimilarityResponse, SimilaritySearch};

/// Status reported when the similarity service gave no status of its own.
pub const DEFAULT_UPSTREAM_FAILURE_STATUS: u16 = 500;

/// Caller-visible failure of a catalog operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product with ID {0} not found")]
    NotFound(ProductId),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{message}")]
    ExternalService { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CatalogStoreError> for CatalogError {
    fn from(err: CatalogStoreError) -> Self {
        match err {
            CatalogStoreError::NotFound(id) => Self::NotFound(id),
            CatalogStoreError::Rejected(msg) => Self::Validation(msg),
            CatalogStoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
        }
    }
}

impl From<SimilarityError> for CatalogError {
    fn from(err: SimilarityError) -> Self {
        Self::ExternalService {
            status: err.status.unwrap_or(DEFAULT_UPSTREAM_FAILURE_STATUS),
            message: "Failed to search similar products by name".to_string(),
        }
    }
}

/// Product catalog operations.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    enrichment: EnrichmentCoordinator,
    similarity: Arc<dyn SimilaritySearch>,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        classifier: Arc<dyn Classifier>,
        similarity: Arc<dyn SimilaritySearch>,
    ) -> Self {
        Self {
            enrichment: EnrichmentCoordinator::new(store.clone(), classifier),
            store,
            similarity,
        }
    }

    /// Create a product, then classify it if no category was supplied.
    ///
    /// Only validation and store failures can fail this call; enrichment is
    /// best-effort (see [`crate::enrichment`]).
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product, CatalogError> {
        product.validate()?;
        let classify = product.needs_classification();

        let created = self.store.create(product).await?;

        let outcome = if classify {
            self.enrichment.enrich(created).await
        } else {
            EnrichmentOutcome::NotRequested(created)
        };
        Ok(outcome.into_product())
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.list_all().await?)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        patch.validate()?;
        Ok(self.store.update(id, patch).await?)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        Ok(self.store.delete(id).await?)
    }

    /// Products matching `filter`, in no particular order.
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        filter.validate()?;
        Ok(self.store.query(filter).await?)
    }

    pub async fn total_inventory_value(&self) -> Result<f64, CatalogError> {
        let products = self.store.list_all().await?;
        Ok(total_inventory_value(&products))
    }

    /// Quantity-weighted value per record; see [`average_product_price`].
    pub async fn average_product_price(&self) -> Result<f64, CatalogError> {
        let products = self.store.list_all().await?;
        Ok(average_product_price(&products))
    }

    pub async fn top_n_expensive(&self, n: i64) -> Result<Vec<Product>, CatalogError> {
        let products = self.store.list_all().await?;
        Ok(top_n_by_price(products, n))
    }

    /// Products added in the last `days` days, relative to the local clock.
    pub async fn added_in_last_days(&self, days: i64) -> Result<Vec<Product>, CatalogError> {
        self.added_in_last_days_at(days, Local::now()).await
    }

    /// Same as [`Self::added_in_last_days`] with an explicit `now`.
    pub async fn added_in_last_days_at<Tz: TimeZone>(
        &self,
        days: i64,
        now: DateTime<Tz>,
    ) -> Result<Vec<Product>, CatalogError>
    where
        Tz::Offset: Send + Sync,
    {
        let products = self.store.list_all().await?;
        Ok(added_in_last_days(products, days, &now))
    }

    /// Forward `name` to the similarity service and hand back its body verbatim.
    #[instrument(skip(self))]
    pub async fn search_by_name_similarity(&self, name: &str) -> Result<SimilarityResponse, CatalogError> {
        self.similarity.search_by_name(name).await.map_err(|e| {
            error!(error = %e, status = ?e.status, "similarity search failed");
            CatalogError::from(e)
        })
    }
}
