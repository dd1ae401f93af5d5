use std::sync::Arc;

use crate::{
    cache::ResponseCache,
    config::Config,
    error::{AppError, AppResult},
    models::{fallback, MovieSummary, ProviderKind, SearchPage},
    services::{
        cancel::RequestToken,
        keys::KeyPool,
        providers::{
            sanitize_query, ImdbProvider, MovieProvider, OmdbProvider, ProviderContext,
            TmdbProvider,
        },
    },
};

fn priority(kind: ProviderKind) -> usize {
    ProviderKind::PRIORITY
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(usize::MAX)
}

/// Tries providers in fixed priority order and returns the first usable result
///
/// Results are never merged across providers. Provider failures are logged and
/// absorbed; only caller cancellation stops the walk early. `search` on page 1
/// always ends in something renderable (real results or the static fallback
/// set). Later pages end in an empty page instead, so a pager walking past the
/// last real page stops rather than seeing the fallback set again. `get_details`
/// ends in `AllProvidersFailed` when no fallback record exists.
#[derive(Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn MovieProvider>>,
    keys: KeyPool,
}

impl Aggregator {
    /// Creates an aggregator; providers are ordered by `ProviderKind::PRIORITY`
    /// regardless of the order they are passed in
    pub fn new(mut providers: Vec<Arc<dyn MovieProvider>>, keys: KeyPool) -> Self {
        providers.sort_by_key(|p| priority(p.kind()));
        Self { providers, keys }
    }

    /// Wires the three HTTP provider clients against one shared key pool and cache
    pub fn from_config(config: &Config, ctx: ProviderContext) -> Self {
        let keys = ctx.keys.clone();
        let providers: Vec<Arc<dyn MovieProvider>> = vec![
            Arc::new(TmdbProvider::new(ctx.clone(), config.primary_api_url.clone())),
            Arc::new(OmdbProvider::new(ctx.clone(), config.secondary_api_url.clone())),
            Arc::new(ImdbProvider::new(ctx, config.tertiary_api_url.clone())),
        ];
        Self::new(providers, keys)
    }

    pub fn keys(&self) -> &KeyPool {
        &self.keys
    }

    /// Provider kinds in the order they are tried
    pub fn provider_order(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Providers that currently have at least one key
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers
            .iter()
            .map(|p| p.kind())
            .filter(|kind| self.keys.has_keys(*kind))
            .collect()
    }

    pub async fn search(&self, query: &str, page: u32, token: &RequestToken) -> AppResult<SearchPage> {
        let query = sanitize_query(query);
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }

        for provider in &self.providers {
            if token.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let kind = provider.kind();
            if !self.keys.has_keys(kind) {
                tracing::debug!(provider = %kind, "No API key configured, skipping provider");
                continue;
            }

            match provider.search(&query, page, token).await {
                Ok(results) if !results.is_empty() => {
                    tracing::info!(
                        provider = %kind,
                        query = %query,
                        results = results.results.len(),
                        "Search served"
                    );
                    return Ok(results);
                }
                Ok(_) => {
                    tracing::debug!(provider = %kind, query = %query, "No results, trying next provider");
                }
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Provider search failed, trying next provider");
                }
            }
        }

        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        if page > 1 {
            tracing::debug!(query = %query, page = page, "No provider has this page, returning empty page");
            return Ok(SearchPage::empty());
        }

        tracing::warn!(query = %query, "All providers skipped or failed, serving fallback results");
        Ok(fallback::search_page())
    }

    pub async fn get_details(&self, id: &str, token: &RequestToken) -> AppResult<MovieSummary> {
        let id = sanitize_query(id);
        if id.is_empty() {
            return Err(AppError::InvalidInput("Movie ID is required".to_string()));
        }

        for provider in &self.providers {
            if token.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let kind = provider.kind();
            if !self.keys.has_keys(kind) {
                tracing::debug!(provider = %kind, "No API key configured, skipping provider");
                continue;
            }

            match provider.get_by_id(&id, token).await {
                Ok(movie) => return Ok(movie),
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    tracing::warn!(provider = %kind, movie_id = %id, error = %e, "Provider lookup failed, trying next provider");
                }
            }
        }

        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        fallback::details(&id).ok_or_else(|| {
            tracing::warn!(movie_id = %id, "All providers failed and no fallback record exists");
            AppError::AllProvidersFailed(id.clone())
        })
    }
}

/// Convenience constructor used by the binary and the integration tests
pub fn build_aggregator(config: &Config) -> AppResult<Aggregator> {
    let ctx = ProviderContext::new(
        crate::services::providers::build_http_client()?,
        KeyPool::from_config(config),
        ResponseCache::new(config.cache_ttl(), config.cache_capacity),
        config.request_timeout(),
    );
    Ok(Aggregator::from_config(config, ctx))
}
