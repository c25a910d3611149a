use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shared::domain::GenreId;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct CatalogServerState {
    seen_requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    reject_with: Arc<Mutex<Option<(u16, i32, String)>>>,
}

async fn list_category(
    State(state): State<CatalogServerState>,
    Path(category): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state
        .seen_requests
        .lock()
        .await
        .push((format!("movie/{category}"), query.clone()));

    if let Some((status, code, message)) = state.reject_with.lock().await.clone() {
        let status = StatusCode::from_u16(status).expect("status code");
        return (
            status,
            Json(json!({ "status_code": code, "status_message": message })),
        )
            .into_response();
    }

    let page: u32 = query
        .get("page")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1);
    Json(json!({
        "page": page,
        "results": [
            {
                "id": 100,
                "title": "First",
                "overview": "opening title",
                "release_date": "2026-09-01",
                "genre_ids": [28, 12]
            },
            {
                "id": 101,
                "title": "Second",
                "release_date": "",
                "genre_ids": []
            }
        ],
        "total_pages": 7,
        "total_results": 140
    }))
    .into_response()
}

async fn genre_list(
    State(state): State<CatalogServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    state
        .seen_requests
        .lock()
        .await
        .push(("genre/movie/list".to_string(), query));
    Json(json!({
        "genres": [
            { "id": 28, "name": "Action" },
            { "id": 12, "name": "Adventure" }
        ]
    }))
}

async fn search_movies(
    State(state): State<CatalogServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let title = query.get("query").cloned().unwrap_or_default();
    state
        .seen_requests
        .lock()
        .await
        .push(("search/movie".to_string(), query));
    Json(json!({
        "page": 1,
        "results": [
            { "id": 7, "title": title, "genre_ids": [18] }
        ],
        "total_pages": 1,
        "total_results": 1
    }))
}

async fn spawn_catalog_server() -> Result<(String, CatalogServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = CatalogServerState::default();
    let app = Router::new()
        .route("/movie/:category", get(list_category))
        .route("/genre/movie/list", get(genre_list))
        .route("/search/movie", get(search_movies))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[tokio::test]
async fn fetch_page_sends_paging_params_and_decodes_the_payload() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    // Base url without a trailing slash must be tolerated.
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    let page = catalog
        .fetch_page(3, MovieCategory::Upcoming)
        .await
        .expect("fetch page");

    assert_eq!(page.page, 3);
    assert_eq!(page.total_pages, 7);
    assert_eq!(page.movies.len(), 2);
    assert_eq!(page.movies[0].genre_ids, vec![GenreId(28), GenreId(12)]);
    assert!(page.movies[0].release_date.is_some());
    assert_eq!(page.movies[1].release_date, None);
    assert!(page.movies[1].genre_names.is_empty());

    let seen = state.seen_requests.lock().await;
    assert_eq!(seen.len(), 1);
    let (path, query) = &seen[0];
    assert_eq!(path, "movie/upcoming");
    assert_eq!(query.get("api_key").map(String::as_str), Some("test-key"));
    assert_eq!(query.get("language").map(String::as_str), Some("en-US"));
    assert_eq!(query.get("page").map(String::as_str), Some("3"));
}

#[tokio::test]
async fn fetch_page_maps_categories_to_their_path_segments() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    catalog
        .fetch_page(1, MovieCategory::NowPlaying)
        .await
        .expect("now playing");
    catalog
        .fetch_page(1, MovieCategory::TopRated)
        .await
        .expect("top rated");

    let seen = state.seen_requests.lock().await;
    let paths: Vec<&str> = seen.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(paths, vec!["movie/now_playing", "movie/top_rated"]);
}

#[tokio::test]
async fn fetch_page_rejects_page_zero_without_a_request() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    let err = catalog
        .fetch_page(0, MovieCategory::Upcoming)
        .await
        .expect_err("must fail");
    assert!(
        err.to_string().contains("numbered from 1"),
        "unexpected error: {err}"
    );
    assert!(state.seen_requests.lock().await.is_empty());
}

#[tokio::test]
async fn non_success_response_surfaces_the_api_status_message() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    *state.reject_with.lock().await = Some((
        401,
        7,
        "Invalid API key: You must be granted a valid key.".to_string(),
    ));
    let catalog = TmdbCatalog::with_base_url(&server_url, "bad-key").expect("catalog");

    let err = catalog
        .fetch_page(1, MovieCategory::Upcoming)
        .await
        .expect_err("must fail");
    let rendered = format!("{err:#}");
    assert!(
        rendered.contains("Invalid API key"),
        "unexpected error: {rendered}"
    );
    assert!(rendered.contains("movie/upcoming"), "unexpected error: {rendered}");
}

#[tokio::test]
async fn fetch_genres_decodes_the_lookup_table() {
    let (server_url, _state) = spawn_catalog_server().await.expect("spawn server");
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    let genres = catalog.fetch_genres().await.expect("fetch genres");
    assert_eq!(genres.len(), 2);
    assert_eq!(genres[0].name, "Action");
    assert_eq!(genres[1].id, GenreId(12));
}

#[tokio::test]
async fn search_sends_the_query_and_decodes_results() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    let page = catalog.search_movies("dune", 2).await.expect("search");
    assert_eq!(page.movies.len(), 1);
    assert_eq!(page.movies[0].title, "dune");

    let seen = state.seen_requests.lock().await;
    let (path, query) = &seen[0];
    assert_eq!(path, "search/movie");
    assert_eq!(query.get("query").map(String::as_str), Some("dune"));
    assert_eq!(query.get("page").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn search_rejects_a_blank_query_without_a_request() {
    let (server_url, state) = spawn_catalog_server().await.expect("spawn server");
    let catalog = TmdbCatalog::with_base_url(&server_url, "test-key").expect("catalog");

    let err = catalog.search_movies("  ", 1).await.expect_err("must fail");
    assert!(
        err.to_string().contains("must not be empty"),
        "unexpected error: {err}"
    );
    assert!(state.seen_requests.lock().await.is_empty());
}
