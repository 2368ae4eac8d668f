use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use movie_picker_api::{
    error::{AppError, AppResult},
    models::{
        DiscoverFilters, DiscoverPage, DiscoverResult, MovieId, TmdbGenre, TmdbMovie, TmdbVideo,
        TmdbWatchProvider,
    },
    routes::{create_router, AppState},
    services::{Catalog, SelectorSettings},
};

/// Catalog with 500 pages of 20 movies each; movie 404 has no videos
struct FakeCatalog;

#[async_trait::async_trait]
impl Catalog for FakeCatalog {
    async fn discover(&self, page: u32, _filters: &DiscoverFilters) -> AppResult<DiscoverPage> {
        Ok(DiscoverPage {
            page,
            results: (0..20)
                .map(|i| DiscoverResult {
                    id: page as i64 * 100 + i,
                })
                .collect(),
            total_pages: 500,
        })
    }

    async fn movie_details(&self, movie_id: MovieId, _language: &str) -> AppResult<TmdbMovie> {
        Ok(TmdbMovie {
            id: movie_id,
            title: format!("Movie {}", movie_id),
            poster_path: Some(format!("/{}.jpg", movie_id)),
            ..Default::default()
        })
    }

    async fn movie_videos(&self, movie_id: MovieId, _language: &str) -> AppResult<Vec<TmdbVideo>> {
        if movie_id == 404 {
            return Ok(Vec::new());
        }
        Ok(vec![
            TmdbVideo {
                key: "teaser".to_string(),
                site: "YouTube".to_string(),
                video_type: "Teaser".to_string(),
                official: true,
                size: 1080,
            },
            TmdbVideo {
                key: "trailer".to_string(),
                site: "YouTube".to_string(),
                video_type: "Trailer".to_string(),
                official: true,
                size: 1080,
            },
        ])
    }

    async fn watch_providers(
        &self,
        _watch_region: &str,
        _language: &str,
    ) -> AppResult<Vec<TmdbWatchProvider>> {
        Ok(vec![
            TmdbWatchProvider {
                display_priority: 9,
                logo_path: Some("/hulu.png".to_string()),
                provider_name: "Hulu".to_string(),
                provider_id: 15,
            },
            TmdbWatchProvider {
                display_priority: 1,
                logo_path: Some("/netflix.png".to_string()),
                provider_name: "Netflix".to_string(),
                provider_id: 8,
            },
            TmdbWatchProvider {
                display_priority: 0,
                logo_path: None,
                provider_name: "Local Rental".to_string(),
                provider_id: 77,
            },
        ])
    }

    async fn genres(&self, language: &str) -> AppResult<Vec<TmdbGenre>> {
        if language != "en" {
            return Err(AppError::CatalogUnavailable(format!("unexpected language {}", language)));
        }
        Ok(vec![TmdbGenre {
            id: 28,
            name: "Action".to_string(),
        }])
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Catalog whose every call fails upstream
struct DownCatalog;

#[async_trait::async_trait]
impl Catalog for DownCatalog {
    async fn discover(&self, _page: u32, _filters: &DiscoverFilters) -> AppResult<DiscoverPage> {
        Err(AppError::CatalogUnavailable("connection refused".to_string()))
    }

    async fn movie_details(&self, _movie_id: MovieId, _language: &str) -> AppResult<TmdbMovie> {
        Err(AppError::CatalogUnavailable("connection refused".to_string()))
    }

    async fn movie_videos(&self, _movie_id: MovieId, _language: &str) -> AppResult<Vec<TmdbVideo>> {
        Err(AppError::CatalogUnavailable("connection refused".to_string()))
    }

    async fn watch_providers(
        &self,
        _watch_region: &str,
        _language: &str,
    ) -> AppResult<Vec<TmdbWatchProvider>> {
        Err(AppError::CatalogUnavailable("connection refused".to_string()))
    }

    async fn genres(&self, _language: &str) -> AppResult<Vec<TmdbGenre>> {
        Err(AppError::CatalogUnavailable("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

fn server_with(catalog: Arc<dyn Catalog>) -> TestServer {
    let state = Arc::new(AppState::in_memory(catalog, SelectorSettings::default()));
    TestServer::new(create_router(state)).unwrap()
}

fn create_test_server() -> TestServer {
    server_with(Arc::new(FakeCatalog))
}

fn room(seed: &str, player: &str) -> Value {
    json!({
        "seed": seed,
        "playerSessionId": player,
        "language": "en-US"
    })
}

fn ids(movies: &[Value]) -> Vec<i64> {
    movies.iter().map(|m| m["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("frontend-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "frontend-42");
}

#[tokio::test]
async fn test_request_id_reaches_session_handlers() {
    let server = create_test_server();
    server
        .post("/api/v1/session/create-room")
        .json(&room("RQ01", "p1"))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/session/fetch-more")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("frontend-43"),
        )
        .json(&room("RQ01", "p1"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "frontend-43");

    let response = server
        .get("/api/v1/session/common-likes")
        .add_query_param("playerSessionId", "p1")
        .await;
    response.assert_status_ok();
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_two_players_see_the_same_movies() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/session/create-room")
        .json(&room("ab12", "p1"))
        .await;
    response.assert_status_ok();
    let created: Vec<Value> = response.json();
    assert_eq!(created.len(), 10);
    assert!(created[0]["posterUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://image.tmdb.org/t/p/w780/"));

    let response = server
        .post("/api/v1/session/join-room")
        .json(&room("AB12", "p2"))
        .await;
    response.assert_status_ok();
    let joined: Vec<Value> = response.json();
    assert_eq!(ids(&created), ids(&joined));

    let p1: Vec<Value> = server
        .post("/api/v1/session/fetch-more")
        .json(&room("AB12", "p1"))
        .await
        .json();
    let p2: Vec<Value> = server
        .post("/api/v1/session/fetch-more")
        .json(&room("AB12", "p2"))
        .await
        .json();
    assert_eq!(ids(&p1), ids(&p2));
    assert_ne!(ids(&p1), ids(&created));
}

#[tokio::test]
async fn test_third_player_is_rejected() {
    let server = create_test_server();
    server
        .post("/api/v1/session/create-room")
        .json(&room("CD34", "p1"))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/session/join-room")
        .json(&room("CD34", "p2"))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/session/join-room")
        .json(&room("CD34", "p3"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["kind"], "room_full");
}

#[tokio::test]
async fn test_seed_validation_comes_first() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/session/join-room")
        .json(&room("AB-2", "p1"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["kind"], "invalid_seed");

    let response = server
        .post("/api/v1/session/join-room")
        .json(&room("ZZZZ", "p1"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["kind"], "room_not_found");
}

#[tokio::test]
async fn test_duplicate_room_and_player_conflicts() {
    let server = create_test_server();
    server
        .post("/api/v1/session/create-room")
        .json(&room("EF56", "p1"))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/session/create-room")
        .json(&room("EF56", "p2"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["kind"], "seed_already_in_use");

    let response = server
        .post("/api/v1/session/create-room")
        .json(&room("GH78", "p1"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["kind"], "player_already_exists");
}

#[tokio::test]
async fn test_likes_and_matches() {
    let server = create_test_server();
    server
        .post("/api/v1/session/create-room")
        .json(&room("LK01", "p1"))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/session/join-room")
        .json(&room("LK01", "p2"))
        .await
        .assert_status_ok();

    let like = |player: &str, movie_id: i64| {
        json!({ "seed": "LK01", "playerSessionId": player, "movieId": movie_id })
    };

    let response = server
        .post("/api/v1/session/add-to-likes")
        .json(&like("p1", 550))
        .await;
    response.assert_status_ok();
    assert!(!response.json::<bool>());

    let response = server
        .post("/api/v1/session/add-to-likes")
        .json(&like("p2", 550))
        .await;
    assert!(response.json::<bool>());

    let response = server
        .post("/api/v1/session/add-to-likes")
        .json(&like("p2", 550))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["kind"], "already_liked");

    let response = server
        .get("/api/v1/session/common-likes")
        .add_query_param("playerSessionId", "p1")
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<i64>>(), vec![550]);
}

#[tokio::test]
async fn test_fetch_more_in_someone_elses_room() {
    let server = create_test_server();
    server
        .post("/api/v1/session/create-room")
        .json(&room("AA11", "p1"))
        .await
        .assert_status_ok();
    server
        .post("/api/v1/session/create-room")
        .json(&room("BB22", "p2"))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/session/fetch-more")
        .json(&room("BB22", "p1"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["kind"], "session_not_found");
}

#[tokio::test]
async fn test_rejoin_and_leave() {
    let server = create_test_server();
    let can_rejoin = |player: &'static str| {
        server
            .get("/api/v1/session/can-player-rejoin")
            .add_query_param("playerSessionId", player)
    };

    assert!(!can_rejoin("p1").await.json::<bool>());

    server
        .post("/api/v1/session/create-room")
        .json(&room("RJ01", "p1"))
        .await
        .assert_status_ok();
    assert!(can_rejoin("p1").await.json::<bool>());

    let exists = server.get("/api/v1/session/room-exists/rj01").await;
    exists.assert_status_ok();
    assert!(exists.json::<bool>());
    assert!(!server
        .get("/api/v1/session/room-exists/NONE")
        .await
        .json::<bool>());

    server
        .post("/api/v1/session/leave-room")
        .json(&json!({ "playerSessionId": "p1" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(!can_rejoin("p1").await.json::<bool>());

    let response = server
        .post("/api/v1/session/leave-room")
        .json(&json!({ "playerSessionId": "p1" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["kind"], "player_detached");
}

#[tokio::test]
async fn test_catalog_outage_is_bad_gateway() {
    let server = server_with(Arc::new(DownCatalog));

    let response = server
        .post("/api/v1/session/create-room")
        .json(&room("UP01", "p1"))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(response.json::<Value>()["kind"], "catalog_unavailable");

    server
        .get("/api/v1/tmdb/genres")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_youtube_trailer() {
    let server = create_test_server();

    let response = server.get("/api/v1/tmdb/youtube-trailer/550/en-US").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<String>(),
        "https://www.youtube.com/embed/trailer"
    );

    server
        .get("/api/v1/tmdb/youtube-trailer/404/en-US")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_watch_providers_and_genres() {
    let server = create_test_server();

    let response = server.get("/api/v1/tmdb/watch-providers/US/en-US").await;
    response.assert_status_ok();
    let providers: Vec<Value> = response.json();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0]["providerName"], "Netflix");
    assert_eq!(
        providers[0]["logoUrl"],
        "https://image.tmdb.org/t/p/w92/netflix.png"
    );
    assert_eq!(providers[1]["providerName"], "Hulu");

    let genres: Vec<Value> = server.get("/api/v1/tmdb/genres").await.json();
    assert_eq!(genres, vec![json!({ "id": 28, "name": "Action" })]);
}
