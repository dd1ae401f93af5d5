use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Search {
        provider: ProviderKind,
        query: String,
        page: u32,
    },
    Details {
        provider: ProviderKind,
        id: String,
    },
}

impl CacheKey {
    pub fn search(provider: ProviderKind, query: &str, page: u32) -> Self {
        CacheKey::Search {
            provider,
            query: query.to_string(),
            page,
        }
    }

    pub fn details(provider: ProviderKind, id: &str) -> Self {
        CacheKey::Details {
            provider,
            id: id.to_string(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search {
                provider,
                query,
                page,
            } => write!(f, "{}:search:{}:{}", provider, query.to_lowercase(), page),
            CacheKey::Details { provider, id } => write!(f, "{}:movie:{}", provider, id),
        }
    }
}

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

impl CacheInner {
    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }
}

/// Bounded in-memory response cache shared by all providers
///
/// Entries expire `ttl` after they were stored; expiry is checked when an
/// entry is read. Eviction is FIFO by insertion: when the cache is full and a
/// new key is stored, the oldest inserted entry is dropped. Reads do not
/// affect eviction order, re-storing an existing key moves it to the newest
/// position.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheInner>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent, expired, or holds a value that
    /// does not decode as `T`.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        let value = {
            let mut inner = self.inner.lock();
            let expired = match inner.entries.get(&key) {
                Some(entry) => entry.stored_at.elapsed() > self.ttl,
                None => return None,
            };
            if expired {
                inner.remove(&key);
                tracing::debug!(key = %key, "Cache entry expired");
                return None;
            }
            inner.entries.get(&key)?.value.clone()
        };

        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache deserialization error");
                None
            }
        }
    }

    /// Stores a value, evicting the oldest entry if the cache is full
    pub fn set<T: serde::Serialize>(&self, key: &CacheKey, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let key = key.to_string();
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            inner.remove(&key);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                tracing::debug!(evicted = %oldest, "Cache full, evicted oldest entry");
            }
        }

        inner.entries.insert(
            key.clone(),
            CacheEntry {
                value: json,
                stored_at: Instant::now(),
            },
        );
        inner.order.push_back(key);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(&key.to_string())
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str) -> CacheKey {
        CacheKey::search(ProviderKind::Tmdb, query, 1)
    }

    #[test]
    fn test_cache_key_display_search() {
        let key = CacheKey::search(ProviderKind::Tmdb, "Batman", 2);
        assert_eq!(format!("{}", key), "tmdb:search:batman:2");
    }

    #[test]
    fn test_cache_key_display_details() {
        let key = CacheKey::details(ProviderKind::Omdb, "tt0111161");
        assert_eq!(format!("{}", key), "omdb:movie:tt0111161");
    }

    #[test]
    fn test_cache_miss() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        let retrieved: Option<Vec<String>> = cache.get(&key("nonexistent"));
        assert_eq!(retrieved, None);
    }

    #[test]
    fn test_set_then_get() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        let value = vec!["item1".to_string(), "item2".to_string()];
        cache.set(&key("batman"), &value);

        let retrieved: Option<Vec<String>> = cache.get(&key("batman"));
        assert_eq!(retrieved, Some(value));
    }

    #[test]
    fn test_key_is_case_insensitive_on_query() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        cache.set(&key("Batman"), &1u32);
        assert_eq!(cache.get::<u32>(&key("BATMAN")), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        cache.set(&key("batman"), &"fresh");

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(cache.get::<String>(&key("batman")).as_deref(), Some("fresh"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get::<String>(&key("batman")), None);
        assert!(!cache.contains(&key("batman")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_timestamp() {
        let cache = ResponseCache::new(Duration::from_secs(10), 10);
        cache.set(&key("a"), &1u32);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(&key("a"), &2u32);
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get::<u32>(&key("a")), Some(2));
    }

    #[test]
    fn test_eviction_removes_exactly_the_oldest() {
        let cache = ResponseCache::new(Duration::from_secs(600), 3);
        cache.set(&key("a"), &1u32);
        cache.set(&key("b"), &2u32);
        cache.set(&key("c"), &3u32);

        cache.set(&key("d"), &4u32);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&key("a")));
        assert!(cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
        assert_eq!(cache.get::<u32>(&key("d")), Some(4));
    }

    #[test]
    fn test_reads_do_not_change_eviction_order() {
        let cache = ResponseCache::new(Duration::from_secs(600), 2);
        cache.set(&key("a"), &1u32);
        cache.set(&key("b"), &2u32);

        // FIFO: reading "a" does not protect it
        assert_eq!(cache.get::<u32>(&key("a")), Some(1));
        cache.set(&key("c"), &3u32);

        assert!(!cache.contains(&key("a")));
        assert!(cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
    }

    #[test]
    fn test_restoring_existing_key_moves_it_to_newest() {
        let cache = ResponseCache::new(Duration::from_secs(600), 2);
        cache.set(&key("a"), &1u32);
        cache.set(&key("b"), &2u32);
        cache.set(&key("a"), &10u32);

        assert_eq!(cache.len(), 2);
        cache.set(&key("c"), &3u32);

        assert!(!cache.contains(&key("b")));
        assert_eq!(cache.get::<u32>(&key("a")), Some(10));
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        cache.set(&key("a"), &1u32);
        cache.set(&key("b"), &2u32);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get::<u32>(&key("a")), None);
    }

    #[test]
    fn test_type_mismatch_is_a_miss() {
        let cache = ResponseCache::new(Duration::from_secs(600), 10);
        cache.set(&key("a"), &"not a number");
        assert_eq!(cache.get::<u32>(&key("a")), None);
    }
}
