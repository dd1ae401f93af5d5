//! Scripted provider for session and category tests.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{MovieSummary, ProviderKind, SearchPage},
    services::{aggregator::Aggregator, cancel::RequestToken, keys::KeyPool, providers::MovieProvider},
};

/// Answers every search with one movie per query, after an optional per-query
/// delay. Ignores the request token so late completions can be observed.
#[derive(Default)]
pub struct ScriptedProvider {
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(q, _)| q.clone()).collect()
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl MovieProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tmdb
    }

    async fn search(&self, query: &str, _page: u32, _token: &RequestToken) -> AppResult<SearchPage> {
        self.calls.lock().push((query.to_string(), Instant::now()));
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        Ok(SearchPage {
            results: vec![MovieSummary::new(format!("id-{}", query), query)],
            total: 1,
        })
    }

    async fn get_by_id(&self, id: &str, _token: &RequestToken) -> AppResult<MovieSummary> {
        Err(AppError::NotFound(id.to_string()))
    }
}

/// Aggregator whose only keyed provider is `provider`
pub fn scripted_aggregator(provider: Arc<ScriptedProvider>) -> Arc<Aggregator> {
    let keys = KeyPool::new().with_keys(ProviderKind::Tmdb, "test-key");
    Arc::new(Aggregator::new(vec![provider as Arc<dyn MovieProvider>], keys))
}
