use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockroom_infra::CatalogError;

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        CatalogError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CatalogError::ExternalService { status, message } => json_error(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "external_service_error",
            message,
        ),
        CatalogError::Internal(msg) => {
            error!(error = %msg, "catalog operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

/// Malformed, mistyped or unknown body fields, and a missing JSON content type.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::ProductId;

    #[test]
    fn maps_catalog_errors_to_status_codes() {
        let cases = [
            (CatalogError::NotFound(ProductId::new(7)), StatusCode::NOT_FOUND),
            (CatalogError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (CatalogError::Internal("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                CatalogError::ExternalService { status: 404, message: "x".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                CatalogError::ExternalService { status: 1000, message: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(catalog_error_to_response(err).status(), expected);
        }
    }
}
