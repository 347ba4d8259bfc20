//! Infrastructure layer: catalog service, storage adapters, config, external services.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod enrichment;
pub mod external;

pub use catalog::{CatalogError, CatalogService};
pub use config::{CatalogConfig, ConfigError, ServiceEndpoint};
