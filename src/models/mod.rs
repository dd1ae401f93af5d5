use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod fallback;

/// External movie-metadata provider, in fixed priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// TMDB v3 (primary)
    Tmdb,
    /// OMDb (secondary)
    Omdb,
    /// IMDb-API (tertiary fallback)
    Imdb,
}

impl ProviderKind {
    /// Provider priority used by the aggregator. Static, never reordered at runtime.
    pub const PRIORITY: [ProviderKind; 3] = [ProviderKind::Tmdb, ProviderKind::Omdb, ProviderKind::Imdb];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Tmdb => "tmdb",
            ProviderKind::Omdb => "omdb",
            ProviderKind::Imdb => "imdb",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized, provider-agnostic movie record
///
/// `id` is provider-specific: the same title fetched from two providers has two
/// different ids. Every other field is optional and left empty when the
/// provider omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster_url: Option<String>,
    pub genre: Option<String>,
    /// 0–10 scale
    pub rating: Option<f64>,
    pub plot: Option<String>,
    pub runtime: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub media_type: String,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
}

impl MovieSummary {
    /// Creates a record with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            poster_url: None,
            genre: None,
            rating: None,
            plot: None,
            runtime: None,
            director: None,
            actors: None,
            media_type: "movie".to_string(),
            trailer_url: None,
            backdrop_url: None,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub results: Vec<MovieSummary>,
    pub total: u64,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Maps provider placeholder values ("N/A", blank) to `None`
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}
