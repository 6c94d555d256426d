//! Shared application state

use herbarium_model::Classifier;
use std::sync::Arc;

/// Shared application state.
///
/// The classifier is constructed once at startup and injected here;
/// request handlers never touch a global. It is immutable after
/// initialization, so sharing is a plain `Arc` with no locking.
#[derive(Clone)]
pub struct AppState {
    /// The resolved image classifier
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}
