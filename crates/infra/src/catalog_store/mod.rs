//! Durable CRUD + filtered-read boundary over product records.
//!
//! The domain only ever sees `Product` with tags in sequence form; each adapter
//! owns the comma-joined persisted representation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use r#trait::{CatalogStore, CatalogStoreError};
