use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Comma-separated TMDB API keys (primary provider)
    #[serde(default)]
    pub primary_api_keys: Option<String>,

    /// Comma-separated OMDb API keys (secondary provider)
    #[serde(default)]
    pub secondary_api_keys: Option<String>,

    /// Single IMDb-API key (tertiary provider)
    #[serde(default)]
    pub tertiary_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_primary_api_url")]
    pub primary_api_url: String,

    /// OMDb API base URL
    #[serde(default = "default_secondary_api_url")]
    pub secondary_api_url: String,

    /// IMDb-API base URL
    #[serde(default = "default_tertiary_api_url")]
    pub tertiary_api_url: String,

    /// Wall-clock bound for each outbound provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Response cache time-to-live
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached responses
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Quiet period after the last keystroke before a search is issued
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Delay between dispatching consecutive category loads
    #[serde(default = "default_category_stagger_ms")]
    pub category_stagger_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_primary_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_secondary_api_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_tertiary_api_url() -> String {
    "https://imdb-api.com/en/API".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_cache_ttl_secs() -> u64 {
    600 // 10 minutes
}

fn default_cache_capacity() -> usize {
    50
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_category_stagger_ms() -> u64 {
    500
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_api_keys: None,
            secondary_api_keys: None,
            tertiary_api_key: None,
            primary_api_url: default_primary_api_url(),
            secondary_api_url: default_secondary_api_url(),
            tertiary_api_url: default_tertiary_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            search_debounce_ms: default_search_debounce_ms(),
            category_stagger_ms: default_category_stagger_ms(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn category_stagger(&self) -> Duration {
        Duration::from_millis(self.category_stagger_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
