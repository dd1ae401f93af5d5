use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{MovieSummary, ProviderKind, SearchPage},
    services::{cancel::RequestToken, categories::CategoryRow},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: Vec<ProviderKind>,
}

/// Token for one HTTP request
///
/// Axum drops the handler future when the client goes away; the guard then
/// cancels the token and any provider call still waiting on it.
fn request_token() -> (RequestToken, tokio_util::sync::DropGuard) {
    let token = RequestToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// Health check endpoint; lists providers that currently have a key
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        providers: state.aggregator.available_providers(),
    })
}

/// Searches movies across providers
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchPage>> {
    let (token, _guard) = request_token();
    let page = params.page.max(1);

    tracing::debug!(query = %params.query, page, "Search requested");

    let results = state.aggregator.search(&params.query, page, &token).await?;
    Ok(Json(results))
}

/// Full record for one movie
pub async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieSummary>> {
    let (token, _guard) = request_token();
    let movie = state.aggregator.get_details(&id, &token).await?;
    Ok(Json(movie))
}

/// Current state of every home page category
pub async fn categories(State(state): State<AppState>) -> Json<Vec<CategoryRow>> {
    Json(state.categories.snapshot())
}

/// Restarts the staggered category load
pub async fn refresh_categories(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    // Runs detached; the board owns cancellation of superseded loads
    drop(state.categories.refresh());
    (StatusCode::ACCEPTED, Json(json!({ "status": "refreshing" })))
}
