//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/classifier/similarity wiring from config
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use stockroom_auth::{Hs256JwtValidator, JwtValidator};
use stockroom_infra::CatalogConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Secret used when `JWT_SECRET` is not configured. Development only.
pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: CatalogConfig) -> anyhow::Result<Router> {
    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        warn!("JWT_SECRET not set; using insecure dev default");
        DEV_JWT_SECRET.to_string()
    });
    let mut validator = Hs256JwtValidator::new(jwt_secret.into_bytes());
    if let Some(iss) = &config.jwt_issuer {
        validator = validator.with_issuer(iss);
    }
    if let Some(aud) = &config.jwt_audience {
        validator = validator.with_audience(aud);
    }
    let jwt: Arc<dyn JwtValidator> = Arc::new(validator);

    let services = Arc::new(services::build_services(&config).await?);

    Ok(build_router(services, jwt, &config.cors_origin))
}

/// Assemble routes and layers around already-built services.
pub fn build_router(services: Arc<services::AppServices>, jwt: Arc<dyn JwtValidator>, cors_origin: &str) -> Router {
    let auth_state = middleware::AuthState { jwt };

    // Writes require a bearer token; `route_layer` keeps unknown paths at 404.
    let protected = routes::products::protected_router().route_layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api", get(routes::system::openapi))
        .nest("/products", routes::products::public_router().merge(protected))
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origin)),
        )
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(err) => {
            warn!("ignoring invalid CORS origin '{origin}': {err}");
            layer
        }
    }
}
