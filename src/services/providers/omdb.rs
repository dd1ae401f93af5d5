/// OMDb provider (secondary)
///
/// OMDb reports most failures with HTTP 200 and a `"Response": "False"` body,
/// so the `Error` string is classified here before anything is normalized.
/// All fields arrive as strings, with `"N/A"` standing in for missing values.
use serde::Deserialize;

use crate::{
    cache::CacheKey,
    cached,
    error::{AppError, AppResult},
    models::{present, MovieSummary, ProviderKind, SearchPage},
    services::{
        cancel::RequestToken,
        providers::{decode, decode_items, sanitize_query, MovieProvider, ProviderContext},
    },
};

#[derive(Debug, Deserialize)]
struct OmdbEnvelope {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<serde_json::Value>,
    #[serde(rename = "totalResults", default)]
    total_results: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbMovie {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Type", default)]
    media_type: Option<String>,
}

impl From<OmdbMovie> for MovieSummary {
    fn from(movie: OmdbMovie) -> Self {
        MovieSummary {
            id: movie.imdb_id,
            title: present(movie.title).unwrap_or_else(|| "Unknown Title".to_string()),
            year: present(movie.year),
            poster_url: present(movie.poster),
            genre: present(movie.genre),
            rating: present(movie.imdb_rating).and_then(|r| r.parse::<f64>().ok()),
            plot: present(movie.plot),
            runtime: present(movie.runtime),
            director: present(movie.director),
            actors: present(movie.actors),
            media_type: present(movie.media_type).unwrap_or_else(|| "movie".to_string()),
            trailer_url: None,
            backdrop_url: None,
        }
    }
}

/// Outcome of an OMDb `Response: "False"` body
#[derive(Debug, PartialEq)]
enum OmdbFailure {
    InvalidKey,
    LimitReached,
    NoMatch,
    Other(String),
}

fn classify(envelope: &OmdbEnvelope) -> Option<OmdbFailure> {
    if envelope.response.as_deref() != Some("False") {
        return None;
    }

    let message = envelope.error.clone().unwrap_or_default();
    let lowered = message.to_lowercase();
    let failure = if lowered.contains("invalid api key") || lowered.contains("no api key") {
        OmdbFailure::InvalidKey
    } else if lowered.contains("limit reached") {
        OmdbFailure::LimitReached
    } else if lowered.contains("not found") || lowered.contains("incorrect imdb id") {
        OmdbFailure::NoMatch
    } else {
        OmdbFailure::Other(message)
    };
    Some(failure)
}

#[derive(Clone)]
pub struct OmdbProvider {
    ctx: ProviderContext,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(ctx: ProviderContext, api_url: impl Into<String>) -> Self {
        Self {
            ctx,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Maps a `Response: "False"` body to the error taxonomy, rotating the key
    /// when OMDb rejects it
    fn failure_to_error(&self, failure: OmdbFailure, api_key: &str, subject: &str) -> AppError {
        match failure {
            OmdbFailure::InvalidKey => self.ctx.reject_key(self.kind(), api_key),
            OmdbFailure::LimitReached => AppError::RateLimited(self.kind()),
            OmdbFailure::NoMatch => AppError::NotFound(format!("omdb {}", subject)),
            OmdbFailure::Other(message) => AppError::malformed(self.kind(), message),
        }
    }

    fn parse_search(&self, api_key: &str, body: &str) -> AppResult<SearchPage> {
        let envelope: OmdbEnvelope = decode(self.kind(), body)?;
        match classify(&envelope) {
            Some(OmdbFailure::NoMatch) => return Ok(SearchPage::empty()),
            Some(failure) => return Err(self.failure_to_error(failure, api_key, "search")),
            None => {}
        }

        let response: OmdbSearchResponse = decode(self.kind(), body)?;
        let results: Vec<MovieSummary> = decode_items::<OmdbMovie>(response.search)
            .into_iter()
            .map(MovieSummary::from)
            .collect();
        let total = response
            .total_results
            .and_then(|t| t.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Ok(SearchPage {
            total: total.max(results.len() as u64),
            results,
        })
    }

    fn parse_details(&self, api_key: &str, id: &str, body: &str) -> AppResult<MovieSummary> {
        let envelope: OmdbEnvelope = decode(self.kind(), body)?;
        if let Some(failure) = classify(&envelope) {
            return Err(self.failure_to_error(failure, api_key, &format!("movie {}", id)));
        }

        let movie: OmdbMovie = decode(self.kind(), body)?;
        Ok(movie.into())
    }
}

#[async_trait::async_trait]
impl MovieProvider for OmdbProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Omdb
    }

    async fn search(&self, query: &str, page: u32, token: &RequestToken) -> AppResult<SearchPage> {
        let query = sanitize_query(query);
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }
        let page = page.max(1);
        let api_key = self.ctx.api_key(self.kind())?;

        cached!(
            self.ctx.cache,
            CacheKey::search(self.kind(), &query, page),
            async {
                let url = format!("{}/", self.api_url);
                let page_param = page.to_string();
                let request = self.ctx.http_client.get(&url).query(&[
                    ("apikey", api_key.as_str()),
                    ("s", query.as_str()),
                    ("page", page_param.as_str()),
                    ("type", "movie"),
                ]);

                let body = self.ctx.send(self.kind(), &api_key, request, token).await?;
                let results = self.parse_search(&api_key, &body)?;

                tracing::info!(
                    query = %query,
                    page = page,
                    results = results.results.len(),
                    provider = "omdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn get_by_id(&self, id: &str, token: &RequestToken) -> AppResult<MovieSummary> {
        let id = sanitize_query(id);
        if id.is_empty() {
            return Err(AppError::InvalidInput("Movie ID is required".to_string()));
        }
        let api_key = self.ctx.api_key(self.kind())?;

        cached!(
            self.ctx.cache,
            CacheKey::details(self.kind(), &id),
            async {
                let url = format!("{}/", self.api_url);
                let request = self.ctx.http_client.get(&url).query(&[
                    ("apikey", api_key.as_str()),
                    ("i", id.as_str()),
                    ("plot", "full"),
                ]);

                let body = self.ctx.send(self.kind(), &api_key, request, token).await?;
                let movie = self.parse_details(&api_key, &id, &body)?;

                tracing::info!(movie_id = %id, provider = "omdb", "Movie details fetched");

                Ok::<_, AppError>(movie)
            }
        )
    }
}
