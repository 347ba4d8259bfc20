use axum::http::StatusCode;
use serde::Deserialize;

use stockroom_core::ProductId;
use stockroom_products::product::present;
use stockroom_products::{NewProduct, ProductFilter, ProductPatch};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub in_stock: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(body: CreateProductRequest) -> Self {
        Self {
            name: body.name,
            category: body.category,
            price: body.price,
            quantity: body.quantity,
            in_stock: body.in_stock,
            description: body.description,
            image_url: body.image_url,
            tags: body.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub in_stock: Option<bool>,
    /// `null` clears the stored value; an absent key leaves it unchanged.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(body: UpdateProductRequest) -> Self {
        Self {
            name: body.name,
            category: body.category,
            price: body.price,
            quantity: body.quantity,
            in_stock: body.in_stock,
            description: body.description,
            image_url: body.image_url,
            tags: body.tags,
        }
    }
}

/// Raw filter query string. Values are parsed by hand so that a bad number or
/// boolean produces a field-specific message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: Option<String>,
}

impl FilterQuery {
    pub fn into_filter(self) -> Result<ProductFilter, axum::response::Response> {
        Ok(ProductFilter {
            category: self.category,
            min_price: parse_price("minPrice", self.min_price.as_deref())?,
            max_price: parse_price("maxPrice", self.max_price.as_deref())?,
            in_stock: match self.in_stock.as_deref() {
                None => None,
                Some("true") => Some(true),
                Some("false") => Some(false),
                Some(_) => {
                    return Err(errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "validation_error",
                        "inStock must be a boolean value (true or false)",
                    ));
                }
            },
        })
    }
}

fn parse_price(field: &str, raw: Option<&str>) -> Result<Option<f64>, axum::response::Response> {
    raw.map(|s| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("{field} must be a number"),
                )
            })
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    pub name: String,
}

// -------------------------
// Path parameters
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub fn parse_count(raw: &str) -> Result<i64, axum::response::Response> {
    raw.trim()
        .parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_count", "N must be an integer"))
}
