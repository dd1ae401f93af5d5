/// Movie metadata provider abstraction
///
/// Each provider client knows exactly one external schema. It builds request
/// URLs, parses responses and normalizes them into `MovieSummary`; no other
/// module ever sees a raw provider payload. All clients share one key pool,
/// one response cache and the request plumbing below.
use parking_lot::Mutex;
use reqwest::{header, Client as HttpClient, RequestBuilder, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    cache::ResponseCache,
    error::{AppError, AppResult},
    models::{MovieSummary, ProviderKind, SearchPage},
    services::{
        cancel::{self, Deadline, RequestToken},
        keys::KeyPool,
    },
};

pub mod imdb;
pub mod omdb;
pub mod tmdb;

pub use imdb::ImdbProvider;
pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

const MAX_QUERY_LEN: usize = 100;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Which provider this client talks to; also selects its key ring
    fn kind(&self) -> ProviderKind;

    /// Search movies by free text
    ///
    /// Fails with `ProviderUnavailable` when no key is configured, `Auth` on a
    /// rejected key (the key is rotated before returning), `RateLimited`,
    /// `Timeout`/`Cancelled` when the deadline or the caller's token fires
    /// first, and `MalformedResponse` when the body does not decode.
    async fn search(&self, query: &str, page: u32, token: &RequestToken) -> AppResult<SearchPage>;

    /// Fetch one movie by its provider-specific id
    ///
    /// Same failures as `search`, plus `NotFound` when the provider has no
    /// such record.
    async fn get_by_id(&self, id: &str, token: &RequestToken) -> AppResult<MovieSummary>;
}

/// Strips characters that could break URL construction or leak into
/// downstream markup, trims, and caps the length
pub fn sanitize_query(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_QUERY_LEN)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Builds the HTTP client shared by all providers
pub fn build_http_client() -> AppResult<HttpClient> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    let client = HttpClient::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .default_headers(headers)
        .build()?;

    Ok(client)
}

/// Minimum spacing between two requests to the same provider
pub fn min_request_gap(provider: ProviderKind) -> Duration {
    match provider {
        ProviderKind::Tmdb => Duration::from_millis(50),
        ProviderKind::Omdb => Duration::from_millis(100),
        ProviderKind::Imdb => Duration::ZERO,
    }
}

/// Per-provider request spacing
///
/// Each request reserves the next free slot for its provider before it
/// suspends, so concurrent callers queue up one gap apart.
#[derive(Clone, Default)]
pub struct Throttle {
    next_slot: Arc<Mutex<HashMap<ProviderKind, Instant>>>,
}

impl Throttle {
    /// Reserves a request slot and returns how long to wait for it
    pub fn reserve(&self, provider: ProviderKind) -> Duration {
        let now = Instant::now();
        let mut slots = self.next_slot.lock();
        let slot = slots
            .get(&provider)
            .copied()
            .filter(|slot| *slot > now)
            .unwrap_or(now);
        slots.insert(provider, slot + min_request_gap(provider));
        slot - now
    }
}

/// Shared dependencies handed to every provider client
#[derive(Clone)]
pub struct ProviderContext {
    pub http_client: HttpClient,
    pub keys: KeyPool,
    pub cache: ResponseCache,
    pub timeout: Duration,
    pub throttle: Throttle,
}

impl ProviderContext {
    pub fn new(http_client: HttpClient, keys: KeyPool, cache: ResponseCache, timeout: Duration) -> Self {
        Self {
            http_client,
            keys,
            cache,
            timeout,
            throttle: Throttle::default(),
        }
    }

    /// Current key for `provider`, or `ProviderUnavailable`
    pub fn api_key(&self, provider: ProviderKind) -> AppResult<String> {
        self.keys
            .current_key(provider)
            .ok_or(AppError::ProviderUnavailable(provider))
    }

    /// Records that the provider rejected `rejected`, the key the request was sent with
    pub fn reject_key(&self, provider: ProviderKind, rejected: &str) -> AppError {
        self.keys.rotate_from(provider, rejected);
        AppError::Auth(provider)
    }

    /// Sends `request` (built with `api_key`) and returns the response body
    ///
    /// The request first waits for its provider's throttle slot, observing the
    /// caller's token. The exchange (headers and body) is then raced against
    /// the caller's token combined with a deadline of `self.timeout`. HTTP 401
    /// rotates away from `api_key`, 429 maps to `RateLimited` and 404 to
    /// `NotFound`; any other non-success status becomes `Upstream`.
    pub async fn send(
        &self,
        provider: ProviderKind,
        api_key: &str,
        request: RequestBuilder,
        token: &RequestToken,
    ) -> AppResult<String> {
        let wait = self.throttle.reserve(provider);
        if !wait.is_zero() {
            tracing::debug!(provider = %provider, wait_ms = wait.as_millis() as u64, "Throttling provider request");
            if !cancel::sleep(token, wait).await {
                return Err(AppError::Cancelled);
            }
        }

        let deadline = Deadline::after(self.timeout);
        let linked = cancel::any_of(&[token.clone(), deadline.token().clone()]);

        tracing::debug!(provider = %provider, "Sending provider request");

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                return Err(self.reject_key(provider, api_key));
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(AppError::RateLimited(provider));
            }
            if status == StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(format!("{} returned 404", provider)));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    provider = %provider,
                    status = %status,
                    body = %body.chars().take(200).collect::<String>(),
                    "Provider request failed"
                );
                return Err(AppError::Upstream {
                    provider,
                    status: status.as_u16(),
                });
            }

            Ok(response.text().await?)
        };

        match cancel::guarded(&linked, exchange).await {
            Some(result) => result,
            None if token.is_cancelled() => {
                tracing::debug!(provider = %provider, "Provider request cancelled by caller");
                Err(AppError::Cancelled)
            }
            None => {
                tracing::warn!(
                    provider = %provider,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Provider request timed out"
                );
                Err(AppError::Timeout(provider))
            }
        }
    }
}

/// Parses a JSON body, mapping decode failures to `MalformedResponse`
pub(crate) fn decode<T: serde::de::DeserializeOwned>(provider: ProviderKind, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            provider = %provider,
            error = %e,
            "Failed to deserialize provider response"
        );
        AppError::malformed(provider, e.to_string())
    })
}

/// Decodes list items one by one, dropping entries that do not match the schema
pub(crate) fn decode_items<T: serde::de::DeserializeOwned>(items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}
