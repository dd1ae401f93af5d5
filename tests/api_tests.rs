mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use common::{config_for, imdb_ok, omdb_ok, tmdb_ok, MockProvider};
use myflix_api::{
    api::{create_router, AppState},
    config::Config,
    services::search_session::SearchState,
};

struct TestApp {
    server: TestServer,
    state: AppState,
    tmdb: MockProvider,
}

async fn create_test_app(with_keys: bool) -> TestApp {
    let (tmdb, omdb, imdb) = (tmdb_ok().await, omdb_ok().await, imdb_ok().await);
    let mut config = Config {
        category_stagger_ms: 0,
        search_debounce_ms: 50,
        ..config_for(&tmdb, &omdb, &imdb)
    };
    if with_keys {
        config.primary_api_keys = Some("k1".to_string());
    }

    let state = AppState::from_config(&config).unwrap();
    let server = TestServer::new(create_router(state.clone())).unwrap();
    TestApp { server, state, tmdb }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(true).await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], serde_json::json!(["tmdb"]));
}

#[tokio::test]
async fn test_search_returns_normalized_page() {
    let app = create_test_app(true).await;

    let response = app
        .server
        .get("/search")
        .add_query_param("query", "batman")
        .await;

    response.assert_status_ok();
    assert!(response.headers().get("x-request-id").is_some());
    let body: Value = response.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["results"][1]["title"], "The Batman");
    assert_eq!(body["results"][1]["year"], "2022");
    assert_eq!(body["results"][1]["mediaType"], "movie");
}

#[tokio::test]
async fn test_search_page_is_clamped() {
    let app = create_test_app(true).await;

    app.server
        .get("/search")
        .add_query_param("query", "batman")
        .add_query_param("page", 0)
        .await
        .assert_status_ok();

    assert_eq!(app.tmdb.query_values("page"), vec!["1".to_string()]);
}

#[tokio::test]
async fn test_blank_search_is_empty() {
    let app = create_test_app(true).await;

    let response = app.server.get("/search").add_query_param("query", "  <>  ").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 0);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(0));
    assert_eq!(app.tmdb.hits(), 0);
}

#[tokio::test]
async fn test_search_without_keys_serves_fallback() {
    let app = create_test_app(false).await;

    let response = app.server.get("/search").add_query_param("query", "batman").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"][0]["id"], "tt0111161");
    assert_eq!(app.tmdb.hits(), 0);
}

#[tokio::test]
async fn test_movie_details() {
    let app = create_test_app(false).await;

    let response = app.server.get("/movies/tt0068646").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "The Godfather");

    let response = app.server.get("/movies/tt9999999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("tt9999999"));
}

#[tokio::test]
async fn test_categories_refresh() {
    let app = create_test_app(false).await;

    let rows: Vec<Value> = app.server.get("/categories").await.json();
    let names: Vec<&str> = rows.iter().filter_map(|row| row["name"].as_str()).collect();
    assert_eq!(names, vec!["trending", "action", "comedy", "drama"]);

    app.server
        .post("/categories/refresh")
        .await
        .assert_status(StatusCode::ACCEPTED);

    let mut rows: Vec<Value> = Vec::new();
    for _ in 0..50 {
        rows = app.server.get("/categories").await.json();
        if rows.iter().all(|row| row["loading"] == false && !row["updatedAt"].is_null()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    for row in &rows {
        assert_eq!(row["loading"], false);
        // Every term hits the fallback set, which de-duplicates to three movies
        assert_eq!(row["movies"].as_array().map(Vec::len), Some(3));
        assert!(row["error"].is_null());
    }
}

#[tokio::test]
async fn test_search_session_reaches_results() {
    let app = create_test_app(true).await;
    let session = app.state.search_session();

    let handle = session.input("batman").unwrap();
    assert_eq!(session.state(), SearchState::Typing { query: "batman".to_string() });
    handle.await.unwrap();

    match session.state() {
        SearchState::Results { query, page } => {
            assert_eq!(query, "batman");
            assert_eq!(page.results.len(), 3);
        }
        other => panic!("unexpected state: {:?}", other),
    }
}
