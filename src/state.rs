use crate::config::AppConfig;
use crate::domain::recommendation::RecommendationEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub engine: RecommendationEngine,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            engine: RecommendationEngine::new(),
        }
    }
}

pub type SharedState = Arc<AppState>;
