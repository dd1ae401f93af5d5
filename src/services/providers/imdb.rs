/// IMDb-API provider (tertiary fallback)
///
/// The key travels as a path segment rather than a query parameter, errors come
/// back as HTTP 200 with a non-empty `errorMessage`, and search has no paging:
/// page 1 carries every result.
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

/// Placeholder image IMDb-API returns for titles without artwork
const NO_PICTURE_MARKER: &str = "nopicture";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImdbSearchResponse {
    #[serde(default)]
    results: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImdbSearchResult {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    image: Option<String>,
    /// e.g. "(2008)" or "2008 Video"
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImdbTitle {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    full_title: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(rename = "imDbRating", default)]
    imdb_rating: Option<String>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    runtime_str: Option<String>,
    #[serde(default)]
    directors: Option<String>,
    #[serde(default)]
    stars: Option<String>,
    #[serde(rename = "type", default)]
    title_type: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

fn poster(image: Option<String>) -> Option<String> {
    present(image).filter(|url| !url.contains(NO_PICTURE_MARKER))
}

/// First four-digit run in `text`
fn extract_year(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(4)
        .find(|w| w.iter().all(char::is_ascii_digit))
        .map(|w| w.iter().collect())
}

impl From<ImdbSearchResult> for MovieSummary {
    fn from(result: ImdbSearchResult) -> Self {
        let mut movie = MovieSummary::new(
            result.id,
            present(result.title).unwrap_or_else(|| "Unknown Title".to_string()),
        );
        movie.year = result.description.as_deref().and_then(extract_year);
        movie.poster_url = poster(result.image);
        movie
    }
}

impl ImdbTitle {
    fn into_summary(self, requested_id: &str) -> MovieSummary {
        MovieSummary {
            id: present(self.id).unwrap_or_else(|| requested_id.to_string()),
            title: present(self.title)
                .or_else(|| present(self.full_title))
                .unwrap_or_else(|| "Unknown Title".to_string()),
            year: present(self.year),
            poster_url: poster(self.image),
            genre: present(self.genres),
            rating: present(self.imdb_rating).and_then(|r| r.parse::<f64>().ok()),
            plot: present(self.plot),
            runtime: present(self.runtime_str),
            director: present(self.directors),
            actors: present(self.stars),
            media_type: present(self.title_type)
                .map(|t| t.to_lowercase())
                .unwrap_or_else(|| "movie".to_string()),
            trailer_url: None,
            backdrop_url: None,
        }
    }
}

#[derive(Clone)]
pub struct ImdbProvider {
    ctx: ProviderContext,
    api_url: String,
}

impl ImdbProvider {
    pub fn new(ctx: ProviderContext, api_url: impl Into<String>) -> Self {
        Self {
            ctx,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Classifies a non-empty `errorMessage`; `None` for other messages
    fn classify_error(&self, api_key: &str, message: &str) -> Option<AppError> {
        let lowered = message.to_lowercase();
        if lowered.contains("invalid api key") {
            Some(self.ctx.reject_key(self.kind(), api_key))
        } else if lowered.contains("maximum usage") {
            Some(AppError::RateLimited(self.kind()))
        } else {
            None
        }
    }

    fn parse_search(&self, api_key: &str, body: &str) -> AppResult<SearchPage> {
        let response: ImdbSearchResponse = decode(self.kind(), body)?;

        if let Some(message) = present(response.error_message) {
            return Err(self
                .classify_error(api_key, &message)
                .unwrap_or_else(|| AppError::malformed(self.kind(), message)));
        }

        let results: Vec<MovieSummary> =
            decode_items::<ImdbSearchResult>(response.results.unwrap_or_default())
                .into_iter()
                .map(MovieSummary::from)
                .collect();

        Ok(SearchPage {
            total: results.len() as u64,
            results,
        })
    }

    fn parse_details(&self, api_key: &str, id: &str, body: &str) -> AppResult<MovieSummary> {
        let mut title: ImdbTitle = decode(self.kind(), body)?;

        if let Some(message) = present(title.error_message.take()) {
            return Err(self
                .classify_error(api_key, &message)
                .unwrap_or_else(|| AppError::NotFound(format!("imdb movie {}", id))));
        }
        if present(title.title.clone()).is_none() && present(title.full_title.clone()).is_none() {
            return Err(AppError::NotFound(format!("imdb movie {}", id)));
        }

        Ok(title.into_summary(id))
    }
}

#[async_trait::async_trait]
impl MovieProvider for ImdbProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Imdb
    }

    async fn search(&self, query: &str, page: u32, token: &RequestToken) -> AppResult<SearchPage> {
        let query = sanitize_query(query);
        if query.is_empty() {
            return Ok(SearchPage::empty());
        }
        let api_key = self.ctx.api_key(self.kind())?;
        // No paging upstream: page 1 already carries every result
        if page > 1 {
            return Ok(SearchPage::empty());
        }

        cached!(
            self.ctx.cache,
            CacheKey::search(self.kind(), &query, 1),
            async {
                let url = format!(
                    "{}/SearchMovie/{}/{}",
                    self.api_url,
                    urlencoding::encode(&api_key),
                    urlencoding::encode(&query)
                );
                let request = self.ctx.http_client.get(&url);

                let body = self.ctx.send(self.kind(), &api_key, request, token).await?;
                let results = self.parse_search(&api_key, &body)?;

                tracing::info!(
                    query = %query,
                    results = results.results.len(),
                    provider = "imdb",
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
                let url = format!(
                    "{}/Title/{}/{}",
                    self.api_url,
                    urlencoding::encode(&api_key),
                    urlencoding::encode(&id)
                );
                let request = self.ctx.http_client.get(&url);

                let body = self.ctx.send(self.kind(), &api_key, request, token).await?;
                let movie = self.parse_details(&api_key, &id, &body)?;

                tracing::info!(movie_id = %id, provider = "imdb", "Movie details fetched");

                Ok::<_, AppError>(movie)
            }
        )
    }
}
