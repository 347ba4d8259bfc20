//! Persisted form of product tags.
//!
//! Tags travel through the domain as an ordered `Vec<String>` but are stored as a
//! single comma-joined column. Only store adapters call into this module.
//!
//! Tag values that themselves contain a comma cannot be represented; they are
//! split apart on the way back out.

/// Separator used in the persisted form.
pub const TAG_DELIMITER: char = ',';

/// Encode tags for storage. An empty sequence is stored as `None`.
pub fn encode_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(tags.join(&TAG_DELIMITER.to_string()))
}

/// Decode the persisted form back into the ordered sequence.
///
/// Each segment is trimmed and blank segments are dropped, so `None`, `""` and
/// `" , "` all decode to an empty sequence.
pub fn decode_tags(stored: Option<&str>) -> Vec<String> {
    match stored {
        Some(raw) => raw
            .split(TAG_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}
