use std::sync::Arc;

use thiserror::Error;

use stockroom_core::ProductId;
use stockroom_products::{NewProduct, Product, ProductFilter, ProductPatch};

/// Errors surfaced by a `CatalogStore` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogStoreError {
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The backend refused the write (e.g. a check constraint).
    #[error("write rejected: {0}")]
    Rejected(String),

    /// I/O or backend failure.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Durable product storage.
///
/// ## Contract
///
/// - `create` assigns `id`, `created_at` and `updated_at`; category defaults to `""`
///   and tags to the empty sequence.
/// - `update` overwrites only the fields present in the patch (tags wholesale) and
///   refreshes `updated_at`. It must be a single conditional write: a concurrent
///   delete yields `NotFound`, never a resurrected row.
/// - `get`, `update` and `delete` fail with `NotFound` for a missing id.
/// - `list_all` and `query` return records in no particular order.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product, CatalogStoreError>;

    async fn get(&self, id: ProductId) -> Result<Product, CatalogStoreError>;

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogStoreError>;

    async fn delete(&self, id: ProductId) -> Result<(), CatalogStoreError>;

    async fn list_all(&self) -> Result<Vec<Product>, CatalogStoreError>;

    /// Records matching `filter`.
    ///
    /// The default evaluates the filter in process; backends with a query language
    /// may push it down as long as the semantics are identical.
    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogStoreError> {
        if filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }
        Ok(filter.apply(self.list_all().await?))
    }
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn create(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        (**self).create(product).await
    }

    async fn get(&self, id: ProductId) -> Result<Product, CatalogStoreError> {
        (**self).get(id).await
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogStoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), CatalogStoreError> {
        (**self).delete(id).await
    }

    async fn list_all(&self) -> Result<Vec<Product>, CatalogStoreError> {
        (**self).list_all().await
    }

    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogStoreError> {
        (**self).query(filter).await
    }
}
