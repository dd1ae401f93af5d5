use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{config::Config, models::ProviderKind};

/// Splits a comma-delimited key list, trimming entries and dropping blanks
pub fn parse_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Default)]
struct KeyRing {
    keys: Vec<String>,
    cursor: usize,
}

impl KeyRing {
    fn current(&self) -> Option<String> {
        self.keys.get(self.cursor).cloned()
    }

    fn advance(&mut self, provider: ProviderKind) {
        if self.keys.len() > 1 {
            self.cursor = (self.cursor + 1) % self.keys.len();
            tracing::warn!(
                provider = %provider,
                cursor = self.cursor,
                key_count = self.keys.len(),
                "Rotated API key"
            );
        }
    }
}

/// Rotation pool of API keys, one ring per provider
///
/// Cloning shares the underlying rings. A provider with no ring, or an
/// empty ring, reports `has_keys() == false`.
#[derive(Clone, Default)]
pub struct KeyPool {
    rings: Arc<Mutex<HashMap<ProviderKind, KeyRing>>>,
}

impl KeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the pool from the `*_API_KEY(S)` configuration values
    pub fn from_config(config: &Config) -> Self {
        let pool = Self::new();
        if let Some(raw) = &config.primary_api_keys {
            pool.set_keys(ProviderKind::Tmdb, parse_keys(raw));
        }
        if let Some(raw) = &config.secondary_api_keys {
            pool.set_keys(ProviderKind::Omdb, parse_keys(raw));
        }
        if let Some(raw) = &config.tertiary_api_key {
            let key = raw.trim();
            if !key.is_empty() {
                pool.set_keys(ProviderKind::Imdb, vec![key.to_string()]);
            }
        }
        pool
    }

    /// Builder-style helper taking a comma-delimited list
    pub fn with_keys(self, provider: ProviderKind, raw: &str) -> Self {
        self.set_keys(provider, parse_keys(raw));
        self
    }

    /// Replaces the keys for `provider` and resets its cursor
    pub fn set_keys(&self, provider: ProviderKind, keys: Vec<String>) {
        self.rings
            .lock()
            .insert(provider, KeyRing { keys, cursor: 0 });
    }

    pub fn current_key(&self, provider: ProviderKind) -> Option<String> {
        let rings = self.rings.lock();
        rings.get(&provider)?.current()
    }

    /// Advances the cursor and returns the new current key
    ///
    /// A no-op for providers with zero or one key.
    pub fn rotate(&self, provider: ProviderKind) -> Option<String> {
        let mut rings = self.rings.lock();
        let ring = rings.get_mut(&provider)?;
        ring.advance(provider);
        ring.current()
    }

    /// Rotates away from `rejected` only if it is still the current key
    ///
    /// Requests in flight on the same key may all be rejected; the first one
    /// to report moves the cursor and the rest find it already moved.
    pub fn rotate_from(&self, provider: ProviderKind, rejected: &str) -> Option<String> {
        let mut rings = self.rings.lock();
        let ring = rings.get_mut(&provider)?;
        if ring.current().as_deref() == Some(rejected) {
            ring.advance(provider);
        } else {
            tracing::debug!(provider = %provider, cursor = ring.cursor, "Rejected key already rotated out");
        }
        ring.current()
    }

    pub fn has_keys(&self, provider: ProviderKind) -> bool {
        self.key_count(provider) > 0
    }

    pub fn key_count(&self, provider: ProviderKind) -> usize {
        self.rings
            .lock()
            .get(&provider)
            .map_or(0, |ring| ring.keys.len())
    }

    /// Current rotation cursor for `provider`
    pub fn cursor(&self, provider: ProviderKind) -> usize {
        self.rings
            .lock()
            .get(&provider)
            .map_or(0, |ring| ring.cursor)
    }
}
