use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{Catalog, MovieSelector, RoomRegistry, RoomService, SelectorSettings},
};

pub mod session;
pub mod tmdb;

/// Shared handler state
pub struct AppState {
    pub rooms: RoomService,
    pub catalog: Arc<dyn Catalog>,
}

impl AppState {
    pub fn new(rooms: RoomService) -> Self {
        let catalog = Arc::clone(rooms.selector().catalog());
        Self { rooms, catalog }
    }

    /// State with an empty, unpersisted registry
    pub fn in_memory(catalog: Arc<dyn Catalog>, settings: SelectorSettings) -> Self {
        let selector = MovieSelector::new(catalog, settings);
        Self::new(RoomService::new(selector, RoomRegistry::new(), None))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/create-room", post(session::create_room))
        .route("/session/join-room", post(session::join_room))
        .route("/session/fetch-more", post(session::fetch_more))
        .route("/session/add-to-likes", post(session::add_to_likes))
        .route("/session/leave-room", post(session::leave_room))
        .route("/session/can-player-rejoin", get(session::can_player_rejoin))
        .route("/session/common-likes", get(session::common_likes))
        .route("/session/room-exists/:seed", get(session::room_exists))
        .route(
            "/tmdb/youtube-trailer/:movie_id/:language",
            get(tmdb::youtube_trailer),
        )
        .route(
            "/tmdb/watch-providers/:region/:language",
            get(tmdb::watch_providers),
        )
        .route("/tmdb/genres", get(tmdb::genres))
}

/// CORS for the frontend; any origin when none is configured
pub fn cors_layer(frontend_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    Ok(match frontend_origin {
        Some(origin) => layer.allow_origin(origin.parse::<HeaderValue>()?),
        None => layer.allow_origin(Any),
    })
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_origin() {
        assert!(cors_layer(Some("http://localhost:4200")).is_ok());
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
