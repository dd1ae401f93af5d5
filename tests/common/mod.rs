//! In-process stand-ins for the external movie providers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use myflix_api::{
    cache::ResponseCache,
    config::Config,
    services::{
        aggregator::Aggregator,
        keys::KeyPool,
        providers::{build_http_client, ProviderContext},
    },
};

struct MockRoute {
    prefix: String,
    status: StatusCode,
    body: Value,
}

struct MockState {
    routes: Vec<MockRoute>,
    delay: Duration,
    requests: Mutex<Vec<Uri>>,
}

/// A running mock provider
#[derive(Clone)]
pub struct MockProvider {
    pub url: String,
    state: Arc<MockState>,
}

impl MockProvider {
    pub fn requests(&self) -> Vec<Uri> {
        self.state.requests.lock().clone()
    }

    pub fn hits(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// Value of query parameter `name` on every recorded request
    pub fn query_values(&self, name: &str) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|uri| {
                uri.query()?.split('&').find_map(|pair| {
                    let (key, value) = pair.split_once('=')?;
                    (key == name).then(|| value.to_string())
                })
            })
            .collect()
    }
}

/// Routes are matched by path prefix, first match wins; unmatched paths get 404
#[derive(Default)]
pub struct MockBuilder {
    routes: Vec<MockRoute>,
    delay: Duration,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, status: StatusCode, body: Value) -> Self {
        self.routes.push(MockRoute {
            prefix: prefix.to_string(),
            status,
            body,
        });
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn start(self) -> MockProvider {
        let state = Arc::new(MockState {
            routes: self.routes,
            delay: self.delay,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockProvider {
            url: format!("http://{}", address),
            state,
        }
    }
}

async fn respond(State(state): State<Arc<MockState>>, request: Request) -> impl IntoResponse {
    let uri = request.uri().clone();
    state.requests.lock().push(uri.clone());

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    match state.routes.iter().find(|route| uri.path().starts_with(&route.prefix)) {
        Some(route) => (route.status, Json(route.body.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "status_message": "not found" }))),
    }
}

/// Primary provider answering "batman" with three movies
pub async fn tmdb_ok() -> MockProvider {
    MockBuilder::new()
        .route("/search/movie", StatusCode::OK, tmdb_search_body())
        .route("/movie/", StatusCode::OK, tmdb_details_body())
        .start()
        .await
}

pub async fn tmdb_unauthorized() -> MockProvider {
    MockBuilder::new()
        .route(
            "/",
            StatusCode::UNAUTHORIZED,
            json!({ "status_code": 7, "status_message": "Invalid API key: You must be granted a valid key.", "success": false }),
        )
        .start()
        .await
}

pub async fn omdb_ok() -> MockProvider {
    MockBuilder::new()
        .route("/", StatusCode::OK, omdb_search_body())
        .start()
        .await
}

pub async fn imdb_ok() -> MockProvider {
    MockBuilder::new()
        .route("/SearchMovie/", StatusCode::OK, imdb_search_body())
        .start()
        .await
}

pub fn tmdb_search_body() -> Value {
    json!({
        "page": 1,
        "results": [
            {
                "id": 268,
                "title": "Batman",
                "original_title": "Batman",
                "release_date": "1989-06-23",
                "poster_path": "/cij4dd21v2Rk2YtUQbV5kW69WB2.jpg",
                "vote_average": 7.23,
                "overview": "Batman must face his most ruthless nemesis."
            },
            {
                "id": 414906,
                "title": "The Batman",
                "release_date": "2022-03-01",
                "poster_path": "/74xTEgt7R36Fpooo50r9T25onhq.jpg",
                "vote_average": 7.7
            },
            {
                "id": 272,
                "title": "Batman Begins",
                "release_date": "2005-06-10",
                "poster_path": null,
                "vote_average": 0
            }
        ],
        "total_pages": 1,
        "total_results": 3
    })
}

pub fn tmdb_details_body() -> Value {
    json!({
        "id": 155,
        "title": "The Dark Knight",
        "release_date": "2008-07-16",
        "poster_path": "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
        "genres": [{ "id": 18, "name": "Drama" }, { "id": 28, "name": "Action" }],
        "vote_average": 8.516,
        "overview": "Batman raises the stakes in his war on crime.",
        "runtime": 152,
        "backdrop_path": "/nMKdUUepR0i5zn0y1T4CsSB5chy.jpg",
        "videos": {
            "results": [{ "key": "EXeTwQWrcwY", "site": "YouTube", "type": "Trailer" }]
        },
        "credits": {
            "cast": [{ "name": "Christian Bale" }, { "name": "Heath Ledger" }],
            "crew": [{ "name": "Christopher Nolan", "job": "Director" }]
        }
    })
}

pub fn omdb_search_body() -> Value {
    json!({
        "Search": [
            { "Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "https://m.media-amazon.com/images/M/begins.jpg" },
            { "Title": "Batman v Superman: Dawn of Justice", "Year": "2016", "imdbID": "tt2975590", "Type": "movie", "Poster": "N/A" }
        ],
        "totalResults": "2",
        "Response": "True"
    })
}

pub fn imdb_search_body() -> Value {
    json!({
        "searchType": "Movie",
        "expression": "batman",
        "results": [
            { "id": "tt0468569", "resultType": "Title", "image": "https://imdb-api.com/images/original/dk.jpg", "title": "The Dark Knight", "description": "(2008)" }
        ],
        "errorMessage": ""
    })
}

/// Configuration pointing every provider at the given base URLs
pub fn config_for(primary: &MockProvider, secondary: &MockProvider, tertiary: &MockProvider) -> Config {
    Config {
        primary_api_url: primary.url.clone(),
        secondary_api_url: secondary.url.clone(),
        tertiary_api_url: tertiary.url.clone(),
        ..Config::default()
    }
}

/// Aggregator wired like the binary, but exposing its cache to the test
pub fn aggregator_with_cache(config: &Config) -> (Aggregator, ResponseCache) {
    let cache = ResponseCache::new(config.cache_ttl(), config.cache_capacity);
    let ctx = ProviderContext::new(
        build_http_client().unwrap(),
        KeyPool::from_config(config),
        cache.clone(),
        config.request_timeout(),
    );
    (Aggregator::from_config(config, ctx), cache)
}
