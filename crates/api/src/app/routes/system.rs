use axum::{http::StatusCode, http::header, response::IntoResponse};

const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The OpenAPI 3.1 description of this service.
pub async fn openapi() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/yaml; charset=utf-8")],
        OPENAPI_YAML,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_catalog_route() {
        assert!(OPENAPI_YAML.starts_with("openapi: 3.1.0"));
        for path in [
            "/products/CreateProduct:",
            "/products/FindAll:",
            "/products/FindOne/{id}:",
            "/products/UpdateProduct/{id}:",
            "/products/DeleteProduct/{id}:",
            "/products/filter:",
            "/products/FindTotalInventoryValue:",
            "/products/FindAverageProductPrice:",
            "/products/GetTopNExpensiveProducts/{n}:",
            "/products/GetProductsAddedinLastNDays/{n}:",
            "/products/search-similarity:",
        ] {
            assert!(OPENAPI_YAML.contains(path), "missing {path}");
        }
    }
}
