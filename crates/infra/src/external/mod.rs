//! Clients for the external services the catalog talks to.
//!
//! Each service sits behind a trait so it can be replaced with a test double;
//! the HTTP implementations take their endpoint and timeout explicitly.

pub mod classifier;
pub mod similarity;

pub use classifier::{Classifier, ClassifierError, HttpClassifier};
pub use similarity::{HttpSimilaritySearch, SimilarityError, SimilarityResponse, SimilaritySearch};

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
