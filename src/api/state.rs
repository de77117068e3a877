use std::sync::Arc;

use crate::services::RecommendationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
    pub default_top_n: usize,
}

impl AppState {
    pub fn new(recommendations: RecommendationService, default_top_n: usize) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
            default_top_n,
        }
    }
}
