use std::sync::Arc;

use crate::{db::HistoryStore, services::RecommendationEngine};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    /// Read side of the recommendation history
    pub history: Arc<dyn HistoryStore>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            history,
        }
    }
}
