/// TMDB v3 provider (primary)
///
/// API Flow:
/// 1. Search: /search/movie?query&page → numeric TMDB ids
/// 2. Details: /movie/{id}?append_to_response=videos,credits → genres, runtime, crew, cast,
///    trailer, backdrop
///
/// Search results carry only `genre_ids`, so `genre` is left empty for them.
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

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/w1280";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const TOP_BILLED_CAST: usize = 5;

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    genres: Option<Vec<TmdbGenre>>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    credits: Option<TmdbCredits>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    videos: Option<TmdbVideos>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    name: String,
    #[serde(default)]
    job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: String,
    #[serde(default)]
    site: Option<String>,
    #[serde(rename = "type", default)]
    video_type: Option<String>,
}

impl TmdbVideos {
    /// First YouTube video tagged as a trailer
    fn trailer_url(self) -> Option<String> {
        self.results
            .into_iter()
            .find(|video| {
                video.video_type.as_deref() == Some("Trailer") && video.site.as_deref() == Some("YouTube")
            })
            .and_then(|video| present(Some(video.key)))
            .map(|key| format!("{}{}", YOUTUBE_WATCH_URL, key))
    }
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        let title = present(movie.title)
            .or_else(|| present(movie.original_title))
            .unwrap_or_else(|| "Unknown Title".to_string());

        let year = present(movie.release_date)
            .map(|date| date.chars().take(4).collect::<String>())
            .filter(|year| year.len() == 4);

        let genre = movie
            .genres
            .map(|genres| {
                genres
                    .into_iter()
                    .map(|g| g.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .filter(|joined| !joined.is_empty());

        // TMDB reports 0 for unrated titles
        let rating = movie
            .vote_average
            .filter(|v| *v > 0.0)
            .map(|v| (v * 10.0).round() / 10.0);

        let credits = movie.credits.unwrap_or_default();
        let director = credits
            .crew
            .into_iter()
            .find(|member| member.job.as_deref() == Some("Director"))
            .map(|member| member.name);
        let actors = Some(
            credits
                .cast
                .into_iter()
                .take(TOP_BILLED_CAST)
                .map(|member| member.name)
                .collect::<Vec<_>>()
                .join(", "),
        )
        .filter(|joined| !joined.is_empty());

        MovieSummary {
            id: movie.id.to_string(),
            title,
            year,
            poster_url: present(movie.poster_path).map(|path| format!("{}{}", IMAGE_BASE_URL, path)),
            genre,
            rating,
            plot: present(movie.overview),
            runtime: movie.runtime.filter(|m| *m > 0).map(|m| format!("{} min", m)),
            director,
            actors,
            media_type: "movie".to_string(),
            trailer_url: movie.videos.and_then(TmdbVideos::trailer_url),
            backdrop_url: present(movie.backdrop_path).map(|path| format!("{}{}", BACKDROP_BASE_URL, path)),
        }
    }
}

fn parse_search(body: &str) -> AppResult<SearchPage> {
    let response: TmdbSearchResponse = decode(ProviderKind::Tmdb, body)?;
    let results: Vec<MovieSummary> = decode_items::<TmdbMovie>(response.results)
        .into_iter()
        .map(MovieSummary::from)
        .collect();

    Ok(SearchPage {
        total: response.total_results.max(results.len() as u64),
        results,
    })
}

fn parse_details(body: &str) -> AppResult<MovieSummary> {
    let movie: TmdbMovie = decode(ProviderKind::Tmdb, body)?;
    Ok(movie.into())
}

#[derive(Clone)]
pub struct TmdbProvider {
    ctx: ProviderContext,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(ctx: ProviderContext, api_url: impl Into<String>) -> Self {
        Self {
            ctx,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl MovieProvider for TmdbProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tmdb
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
                let url = format!("{}/search/movie", self.api_url);
                let page_param = page.to_string();
                let request = self.ctx.http_client.get(&url).query(&[
                    ("api_key", api_key.as_str()),
                    ("query", query.as_str()),
                    ("page", page_param.as_str()),
                ]);

                let body = self.ctx.send(self.kind(), &api_key, request, token).await?;
                let results = parse_search(&body)?;

                tracing::info!(
                    query = %query,
                    page = page,
                    results = results.results.len(),
                    provider = "tmdb",
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
                let url = format!("{}/movie/{}", self.api_url, urlencoding::encode(&id));
                let request = self.ctx.http_client.get(&url).query(&[
                    ("api_key", api_key.as_str()),
                    ("append_to_response", "videos,credits"),
                ]);

                let body = self
                    .ctx
                    .send(self.kind(), &api_key, request, token)
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound(_) => AppError::NotFound(format!("tmdb movie {}", id)),
                        other => other,
                    })?;
                let movie = parse_details(&body)?;

                tracing::info!(movie_id = %id, provider = "tmdb", "Movie details fetched");

                Ok::<_, AppError>(movie)
            }
        )
    }
}
