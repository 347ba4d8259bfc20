use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use tracing::info;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

type ApiResponse = axum::response::Response;

const DEFAULT_SIMILARITY_CONTENT_TYPE: &str = "application/json";

/// Unauthenticated catalog reads, aggregates and similarity search.
pub fn public_router() -> Router {
    Router::new()
        .route("/filter", get(filter_products))
        .route("/FindAll", get(find_all))
        .route("/FindOne/:id", get(find_one))
        .route("/FindTotalInventoryValue", get(total_inventory_value))
        .route("/FindAverageProductPrice", get(average_product_price))
        .route("/GetTopNExpensiveProducts/:n", get(top_n_expensive))
        .route("/GetProductsAddedinLastNDays/:n", get(added_in_last_days))
        .route("/search-similarity", post(search_similarity))
}

/// Catalog writes; mounted behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/CreateProduct", post(create_product))
        .route("/UpdateProduct/:id", patch(update_product))
        .route("/DeleteProduct/:id", delete(delete_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.catalog.create(body.into()).await {
        Ok(product) => {
            info!(
                product_id = %product.id,
                subject = principal.subject(),
                username = principal.username(),
                "product created"
            );
            (StatusCode::CREATED, Json(product)).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn filter_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::FilterQuery>, QueryRejection>,
) -> ApiResponse {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::query_rejection_to_response(e),
    };
    let filter = match query.into_filter() {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match services.catalog.filter(&filter).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn find_all(Extension(services): Extension<Arc<AppServices>>) -> ApiResponse {
    match services.catalog.list_all().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn find_one(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResponse {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get(id).await {
        Ok(product) => Json(product).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn total_inventory_value(Extension(services): Extension<Arc<AppServices>>) -> ApiResponse {
    match services.catalog.total_inventory_value().await {
        Ok(value) => Json(value).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn average_product_price(Extension(services): Extension<Arc<AppServices>>) -> ApiResponse {
    match services.catalog.average_product_price().await {
        Ok(value) => Json(value).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn top_n_expensive(
    Extension(services): Extension<Arc<AppServices>>,
    Path(n): Path<String>,
) -> ApiResponse {
    let n = match dto::parse_count(&n) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.top_n_expensive(n).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn added_in_last_days(
    Extension(services): Extension<Arc<AppServices>>,
    Path(n): Path<String>,
) -> ApiResponse {
    let days = match dto::parse_count(&n) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.added_in_last_days(days).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateProductRequest>, JsonRejection>,
) -> ApiResponse {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.catalog.update(id, body.into()).await {
        Ok(product) => {
            info!(
                product_id = %id,
                subject = principal.subject(),
                username = principal.username(),
                "product updated"
            );
            Json(product).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResponse {
    let id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete(id).await {
        Ok(()) => {
            info!(
                product_id = %id,
                subject = principal.subject(),
                username = principal.username(),
                "product deleted"
            );
            Json(serde_json::json!({ "id": id, "deleted": true })).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}

/// Responds with the similarity service's body and content type untouched.
pub async fn search_similarity(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SimilarityRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_rejection_to_response(e),
    };

    match services.catalog.search_by_name_similarity(&body.name).await {
        Ok(found) => {
            let content_type = found
                .content_type
                .unwrap_or_else(|| DEFAULT_SIMILARITY_CONTENT_TYPE.to_string());
            (StatusCode::CREATED, [(header::CONTENT_TYPE, content_type)], found.body).into_response()
        }
        Err(e) => errors::catalog_error_to_response(e),
    }
}
