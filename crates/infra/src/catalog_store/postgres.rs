//! Postgres-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | CatalogStoreError |
//! |------------|----------------------|-------------------|
//! | Database (check constraint violation) | `23514` | `Rejected` |
//! | Database (not-null violation) | `23502` | `Rejected` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / network / decode | N/A | `Backend` |
//!
//! ## Atomicity
//!
//! `update` and `delete` are single statements keyed on `id`; whether the row
//! existed is read from the same statement (`RETURNING` / rows affected), so a
//! concurrent delete can never be overwritten by a stale update.

use std::sync::Arc;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockroom_core::ProductId;
use stockroom_products::{NewProduct, Product, ProductFilter, ProductPatch, decode_tags, encode_tags};

use super::r#trait::{CatalogStore, CatalogStoreError};

const PRODUCT_COLUMNS: &str = "id, name, category, price, quantity, in_stock, description, image_url, tags, created_at, updated_at";

/// Postgres-backed product store.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    /// Create a new PostgresCatalogStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, CatalogStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `products` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), CatalogStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id          BIGSERIAL PRIMARY KEY,
                name        TEXT NOT NULL,
                category    TEXT NOT NULL DEFAULT '',
                price       DOUBLE PRECISION NOT NULL CHECK (price >= 0),
                quantity    BIGINT NOT NULL DEFAULT 0 CHECK (quantity >= 0),
                in_stock    BOOLEAN NOT NULL DEFAULT TRUE,
                description TEXT NULL,
                image_url   TEXT NULL,
                tags        TEXT NULL,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self, product), err)]
    async fn create(&self, product: NewProduct) -> Result<Product, CatalogStoreError> {
        let sql = format!(
            r#"
            INSERT INTO products (name, category, price, quantity, in_stock, description, image_url, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&product.name)
            .bind(product.category_or_default())
            .bind(product.price)
            .bind(product.quantity)
            .bind(product.in_stock)
            .bind(&product.description)
            .bind(&product.image_url)
            .bind(encode_tags(product.tags_or_default()))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;

        row_to_product(&row)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get(&self, id: ProductId) -> Result<Product, CatalogStoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?
            .ok_or(CatalogStoreError::NotFound(id))?;

        row_to_product(&row)
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogStoreError> {
        // NULL parameters keep the current value. Nullable columns and tags carry an
        // explicit "supplied" flag so that NULL can also be written.
        let sql = format!(
            r#"
            UPDATE products SET
                name        = COALESCE($2, name),
                category    = COALESCE($3, category),
                price       = COALESCE($4, price),
                quantity    = COALESCE($5, quantity),
                in_stock    = COALESCE($6, in_stock),
                description = CASE WHEN $7 THEN $8 ELSE description END,
                image_url   = CASE WHEN $9 THEN $10 ELSE image_url END,
                tags        = CASE WHEN $11 THEN $12 ELSE tags END,
                updated_at  = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let tags_supplied = patch.tags.is_some();
        let tags = patch.tags.as_deref().and_then(encode_tags);

        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(patch.name)
            .bind(patch.category)
            .bind(patch.price)
            .bind(patch.quantity)
            .bind(patch.in_stock)
            .bind(patch.description.is_some())
            .bind(patch.description.flatten())
            .bind(patch.image_url.is_some())
            .bind(patch.image_url.flatten())
            .bind(tags_supplied)
            .bind(tags)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?
            .ok_or(CatalogStoreError::NotFound(id))?;

        row_to_product(&row)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<(), CatalogStoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogStoreError::NotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<Product>, CatalogStoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products");

        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all", e))?;

        rows.iter().map(row_to_product).collect()
    }

    #[instrument(skip(self), err)]
    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogStoreError> {
        if filter.is_unsatisfiable() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::TEXT IS NULL OR category = $1)
              AND ($2::DOUBLE PRECISION IS NULL OR price >= $2)
              AND ($3::DOUBLE PRECISION IS NULL OR price <= $3)
              AND ($4::BOOLEAN IS NULL OR in_stock = $4)
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(&filter.category)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(filter.in_stock)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query", e))?;

        rows.iter().map(row_to_product).collect()
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, CatalogStoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_row", e);

    let tags: Option<String> = row.try_get("tags").map_err(decode)?;

    Ok(Product {
        id: ProductId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        quantity: row.try_get("quantity").map_err(decode)?,
        in_stock: row.try_get("in_stock").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        image_url: row.try_get("image_url").map_err(decode)?,
        tags: decode_tags(tags.as_deref()),
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

/// Map SQLx errors to CatalogStoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> CatalogStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // check_violation, not_null_violation
                Some("23514") | Some("23502") => CatalogStoreError::Rejected(msg),
                _ => CatalogStoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            CatalogStoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => CatalogStoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_store() -> PostgresCatalogStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PostgresCatalogStore::connect(&url, 2).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a scratch Postgres database"]
    async fn update_writes_null_only_for_explicitly_cleared_columns() {
        let store = scratch_store().await;
        let created = store
            .create(NewProduct {
                name: "Desk Lamp".to_string(),
                price: 30.0,
                quantity: 2,
                in_stock: true,
                description: Some("warm white".to_string()),
                image_url: Some("https://img.example/lamp.png".to_string()),
                tags: Some(vec!["desk".to_string(), "led".to_string()]),
                ..NewProduct::default()
            })
            .await
            .unwrap();

        let untouched = store
            .update(created.id, ProductPatch::category("Home"))
            .await
            .unwrap();
        assert_eq!(untouched.description.as_deref(), Some("warm white"));
        assert_eq!(untouched.tags, vec!["desk", "led"]);

        let patch = ProductPatch {
            description: Some(None),
            ..ProductPatch::default()
        };
        let cleared = store.update(created.id, patch).await.unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.image_url.as_deref(), Some("https://img.example/lamp.png"));
        assert_eq!(cleared.category, "Home");

        store.delete(created.id).await.unwrap();
        assert_eq!(
            store.get(created.id).await.unwrap_err(),
            CatalogStoreError::NotFound(created.id)
        );
    }
}
