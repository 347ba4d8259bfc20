use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId};

/// A catalog record as presented to callers.
///
/// `tags` is always the sequence form here; the comma-joined representation only
/// exists inside store adapters (see [`crate::tags`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Empty string means "uncategorized".
    pub category: String,
    pub price: f64,
    pub quantity: i64,
    pub in_stock: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// `price × quantity` for this record.
    pub fn inventory_value(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Caller-supplied fields for a new product.
///
/// `id`, `created_at` and `updated_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub in_stock: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        validate_quantity(self.quantity)?;
        validate_inventory_value(self.price, self.quantity)?;
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    /// Category the store should persist (`""` when none was supplied).
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    pub fn tags_or_default(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    /// True when the caller supplied no category (absent or empty).
    pub fn needs_classification(&self) -> bool {
        self.category_or_default().is_empty()
    }
}

/// Partial update: only fields that are `Some` are written.
///
/// `tags`, when present, replaces the whole sequence. The nullable columns
/// (`description`, `image_url`) carry a second level: `Some(None)` clears the
/// value, which is what an explicit JSON `null` deserializes to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

/// Maps a field that is present in the input (even as `null`) to `Some(_)`.
/// Absent fields never reach this and fall back to `None` through `default`.
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProductPatch {
    /// Patch that only sets the category.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let (Some(price), Some(quantity)) = (self.price, self.quantity) {
            validate_inventory_value(price, quantity)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation(
            "price must be a finite number greater than or equal to 0",
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation(
            "quantity must be greater than or equal to 0",
        ));
    }
    Ok(())
}

/// `price × quantity` feeds every value aggregate and must stay representable.
fn validate_inventory_value(price: f64, quantity: i64) -> DomainResult<()> {
    if !(price * quantity as f64).is_finite() {
        return Err(DomainError::validation(
            "price multiplied by quantity exceeds the representable range",
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> DomainResult<()> {
    if let Some(idx) = tags.iter().position(|t| t.trim().is_empty()) {
        return Err(DomainError::validation(format!(
            "tags must not contain blank values (index {idx})"
        )));
    }
    Ok(())
}
