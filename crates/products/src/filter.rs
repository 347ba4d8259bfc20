//! Filter specification for catalog queries.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::product::Product;

/// Optional constraints narrowing a catalog query.
///
/// Present fields are combined with logical AND; absent fields impose no
/// constraint. Both price bounds are inclusive. Result order is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Exact, case-sensitive match.
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
}

impl ProductFilter {
    pub fn validate(&self) -> DomainResult<()> {
        for (field, bound) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if bound.is_some_and(|v| !v.is_finite()) {
                return Err(DomainError::validation(format!(
                    "{field} must be a finite number"
                )));
            }
        }
        Ok(())
    }

    /// `minPrice > maxPrice` can never match anything; this is not an error.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!((self.min_price, self.max_price), (Some(min), Some(max)) if min > max)
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if product.category != *category {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.in_stock.is_some_and(|in_stock| product.in_stock != in_stock) {
            return false;
        }
        true
    }

    pub fn apply(&self, products: impl IntoIterator<Item = Product>) -> Vec<Product> {
        if self.is_unsatisfiable() {
            return Vec::new();
        }
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}
