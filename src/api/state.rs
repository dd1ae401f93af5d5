use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::AppResult,
    services::{
        aggregator::{build_aggregator, Aggregator},
        categories::CategoryBoard,
        search_session::SearchSession,
    },
};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub categories: Arc<CategoryBoard>,
    pub search_debounce: Duration,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, categories: Arc<CategoryBoard>, search_debounce: Duration) -> Self {
        Self {
            aggregator,
            categories,
            search_debounce,
        }
    }

    /// Builds the provider clients and the category board from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let aggregator = Arc::new(build_aggregator(config)?);
        let categories = Arc::new(CategoryBoard::new(aggregator.clone(), config.category_stagger()));
        Ok(Self::new(aggregator, categories, config.search_debounce()))
    }

    /// New debounced search box backed by the shared aggregator
    pub fn search_session(&self) -> SearchSession {
        SearchSession::new(self.aggregator.clone(), self.search_debounce)
    }
}
