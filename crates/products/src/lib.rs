//! Products domain module.
//!
//! This crate contains the catalog's business rules (record model, filter
//! semantics, aggregate statistics, tag encoding), implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod filter;
pub mod product;
pub mod stats;
pub mod tags;

pub use filter::ProductFilter;
pub use product::{NewProduct, Product, ProductPatch};
pub use stats::{
    added_in_last_days, average_product_price, recency_cutoff, top_n_by_price,
    total_inventory_value,
};
pub use tags::{decode_tags, encode_tags};
