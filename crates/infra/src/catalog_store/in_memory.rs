use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use stockroom_core::ProductId;
use stockroom_products::{NewProduct, Product, ProductPatch, decode_tags, encode_tags};

use super::r#trait::{CatalogStore, CatalogStoreError};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Row as persisted: tags are kept in their comma-joined form, exactly like the
/// relational adapter, so the decode path is exercised on every read.
#[derive(Debug, Clone)]
struct StoredProduct {
    name: String,
    category: String,
    price: f64,
    quantity: i64,
    in_stock: bool,
    description: Option<String>,
    image_url: Option<String>,
    tags: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredProduct {
    fn to_product(&self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price,
            quantity: self.quantity,
            in_stock: self.in_stock,
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            tags: decode_tags(self.tags.as_deref()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(tags) = patch.tags {
            self.tags = encode_tags(&tags);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Default)]
struct Rows {
    last_id: i64,
    by_id: HashMap<ProductId, StoredProduct>,
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Ids start at 1 and are never reused.
pub struct InMemoryCatalogStore {
    rows: RwLock<Rows>,
    clock: Clock,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Store whose `created_at` / `updated_at` come from `clock`.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            rows: RwLock::new(Rows::default()),
            clock: Box::new(clock),
        }
    }

    fn poisoned() -> CatalogStoreError {
        CatalogStoreError::Backend("lock poisoned".to_string())
    }
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryCatalogStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryCatalogStore")
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn create(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        let now = (self.clock)();
        let stored = StoredProduct {
            category: product.category_or_default().to_string(),
            tags: encode_tags(product.tags_or_default()),
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            in_stock: product.in_stock,
            description: product.description,
            image_url: product.image_url,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        rows.last_id += 1;
        let id = ProductId::new(rows.last_id);
        let created = stored.to_product(id);
        rows.by_id.insert(id, stored);
        Ok(created)
    }

    async fn get(&self, id: ProductId) -> Result<Product, CatalogStoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        rows.by_id
            .get(&id)
            .map(|row| row.to_product(id))
            .ok_or(CatalogStoreError::NotFound(id))
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogStoreError> {
        let now = (self.clock)();
        // Lookup and write happen under one write lock.
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let row = rows.by_id.get_mut(&id).ok_or(CatalogStoreError::NotFound(id))?;
        row.apply(patch, now);
        Ok(row.to_product(id))
    }

    async fn delete(&self, id: ProductId) -> Result<(), CatalogStoreError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        rows.by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(CatalogStoreError::NotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<Product>, CatalogStoreError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .by_id
            .iter()
            .map(|(id, row)| row.to_product(*id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;
    use std::sync::Arc;
    use stockroom_products::ProductFilter;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            category: None,
            price: 10.0,
            quantity: 3,
            in_stock: true,
            description: None,
            image_url: None,
            tags: None,
        }
    }

    /// Clock that advances one minute per reading.
    fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let next = Arc::new(Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        move || {
            let mut guard = next.lock().unwrap();
            let now = *guard;
            *guard = now + Duration::minutes(1);
            now
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_defaults() {
        let store = InMemoryCatalogStore::new();

        let first = store.create(new_product("a")).await.unwrap();
        let second = store.create(new_product("b")).await.unwrap();

        assert_eq!(first.id, ProductId::new(1));
        assert_eq!(second.id, ProductId::new(2));
        assert_eq!(first.category, "");
        assert!(first.tags.is_empty());
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn tags_round_trip_in_order() {
        let store = InMemoryCatalogStore::new();
        let mut input = new_product("tagged");
        input.tags = Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]);

        let created = store.create(input).await.unwrap();
        let read = store.get(created.id).await.unwrap();

        assert_eq!(read.tags, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn get_after_delete_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let created = store.create(new_product("gone")).await.unwrap();

        store.delete(created.id).await.unwrap();

        assert_eq!(
            store.get(created.id).await.unwrap_err(),
            CatalogStoreError::NotFound(created.id)
        );
        assert_eq!(
            store.delete(created.id).await.unwrap_err(),
            CatalogStoreError::NotFound(created.id)
        );
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryCatalogStore::new();
        let first = store.create(new_product("a")).await.unwrap();
        store.delete(first.id).await.unwrap();

        let second = store.create(new_product("b")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn update_overwrites_only_supplied_fields() {
        let store = InMemoryCatalogStore::with_clock(ticking_clock());
        let mut input = new_product("lamp");
        input.category = Some("Home".to_string());
        input.tags = Some(vec!["desk".to_string()]);
        let created = store.create(input).await.unwrap();

        let patch = ProductPatch {
            price: Some(12.5),
            tags: Some(vec!["desk".to_string(), "led".to_string()]),
            ..ProductPatch::default()
        };
        let updated = store.update(created.id, patch).await.unwrap();

        assert_eq!(updated.name, "lamp");
        assert_eq!(updated.category, "Home");
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.tags, vec!["desk", "led"]);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_without_tags_keeps_existing_tags() {
        let store = InMemoryCatalogStore::new();
        let mut input = new_product("lamp");
        input.tags = Some(vec!["desk".to_string()]);
        let created = store.create(input).await.unwrap();

        let updated = store
            .update(created.id, ProductPatch::category("Home"))
            .await
            .unwrap();
        assert_eq!(updated.tags, vec!["desk"]);
    }

    #[tokio::test]
    async fn update_with_empty_tags_clears_them() {
        let store = InMemoryCatalogStore::new();
        let mut input = new_product("lamp");
        input.tags = Some(vec!["desk".to_string()]);
        let created = store.create(input).await.unwrap();

        let patch = ProductPatch {
            tags: Some(vec![]),
            ..ProductPatch::default()
        };
        let updated = store.update(created.id, patch).await.unwrap();
        assert!(updated.tags.is_empty());
    }

    #[tokio::test]
    async fn update_clears_nullable_fields_only_when_explicitly_null() {
        let store = InMemoryCatalogStore::new();
        let mut input = new_product("lamp");
        input.description = Some("warm white".to_string());
        input.image_url = Some("https://img.example/lamp.png".to_string());
        let created = store.create(input).await.unwrap();

        let untouched = store
            .update(created.id, ProductPatch::category("Home"))
            .await
            .unwrap();
        assert_eq!(untouched.description.as_deref(), Some("warm white"));

        let patch = ProductPatch {
            description: Some(None),
            ..ProductPatch::default()
        };
        let cleared = store.update(created.id, patch).await.unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.image_url.as_deref(), Some("https://img.example/lamp.png"));

        let patch = ProductPatch {
            image_url: Some(Some("https://img.example/lamp-2.png".to_string())),
            ..ProductPatch::default()
        };
        let replaced = store.update(created.id, patch).await.unwrap();
        assert_eq!(replaced.image_url.as_deref(), Some("https://img.example/lamp-2.png"));
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let err = store
            .update(ProductId::new(99), ProductPatch::category("x"))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogStoreError::NotFound(ProductId::new(99)));
    }

    #[tokio::test]
    async fn query_uses_filter_semantics() {
        let store = InMemoryCatalogStore::new();
        for (name, price) in [("cheap", 5.0), ("mid", 50.0), ("pricey", 500.0)] {
            let mut p = new_product(name);
            p.price = price;
            store.create(p).await.unwrap();
        }

        let filter = ProductFilter {
            min_price: Some(5.0),
            max_price: Some(50.0),
            ..ProductFilter::default()
        };
        let mut names: Vec<String> = store
            .query(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["cheap", "mid"]);

        let inverted = ProductFilter {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..ProductFilter::default()
        };
        assert!(store.query(&inverted).await.unwrap().is_empty());
    }
}
