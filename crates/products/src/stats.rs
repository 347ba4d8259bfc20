//! Aggregate statistics over the catalog.
//!
//! Every function takes the full product set as read from the store and imposes
//! its own ordering; store iteration order is never relied upon.

use chrono::{DateTime, Days, TimeDelta, TimeZone, Utc};

use crate::product::Product;

/// Σ `price × quantity` over all products. `0` for an empty catalog.
pub fn total_inventory_value(products: &[Product]) -> f64 {
    products.iter().map(Product::inventory_value).sum()
}

/// Σ `price × quantity` divided by the number of products. `0` for an empty catalog.
///
/// NOTE: despite the name this is the average per-record inventory value, not the
/// arithmetic mean of `price`. The formula is part of the published contract of
/// `FindAverageProductPrice` and is kept as is.
pub fn average_product_price(products: &[Product]) -> f64 {
    if products.is_empty() {
        return 0.0;
    }
    total_inventory_value(products) / products.len() as f64
}

/// The `n` most expensive products: price descending, ties by id ascending.
///
/// `n <= 0` yields an empty result; `n` larger than the catalog yields all of it.
pub fn top_n_by_price(mut products: Vec<Product>, n: i64) -> Vec<Product> {
    if n <= 0 {
        return Vec::new();
    }
    products.sort_by(|a, b| b.price.total_cmp(&a.price).then_with(|| a.id.cmp(&b.id)));
    products.truncate(usize::try_from(n).unwrap_or(usize::MAX));
    products
}

/// Start of the "last `days` days" window relative to `now`.
///
/// Subtracts calendar days in `now`'s time zone, keeping the wall-clock time (so
/// month/year roll-over and DST behave like calendar arithmetic, not fixed 24h
/// steps). `days == 0` gives `now` itself; negative values move into the future.
/// Falls back to fixed 24h steps when the shifted local time does not exist.
/// `None` means the shift is out of the representable range.
pub fn recency_cutoff<Tz: TimeZone>(now: &DateTime<Tz>, days: i64) -> Option<DateTime<Utc>> {
    let step = Days::new(days.unsigned_abs());
    let calendar = if days >= 0 {
        now.clone().checked_sub_days(step)
    } else {
        now.clone().checked_add_days(step)
    };

    calendar.map(|dt| dt.with_timezone(&Utc)).or_else(|| {
        TimeDelta::try_days(days).and_then(|delta| now.with_timezone(&Utc).checked_sub_signed(delta))
    })
}

/// Products with `created_at >= now - days`, newest first (ties by id ascending).
///
/// `now` is evaluated once by the caller and shared by every comparison.
pub fn added_in_last_days<Tz: TimeZone>(
    products: Vec<Product>,
    days: i64,
    now: &DateTime<Tz>,
) -> Vec<Product> {
    let mut selected: Vec<Product> = match recency_cutoff(now, days) {
        Some(cutoff) => products
            .into_iter()
            .filter(|p| p.created_at >= cutoff)
            .collect(),
        // Window reaches further back than any representable time.
        None if days > 0 => products,
        None => Vec::new(),
    };

    selected.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    selected
}
