use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{LikeRequest, MovieId, MovieResponse, PlayerRequest, RoomRequest},
    routes::AppState,
};

/// Opens a room and returns the first batch of movies
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RoomRequest>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    tracing::info!(
        request_id = %request_id,
        seed = %request.seed,
        player_session_id = %request.player_session_id,
        "Processing create-room request"
    );

    let movies = state.rooms.create_room(&request).await?;
    Ok(Json(movies))
}

/// Joins (or reconnects to) a room and returns the first batch of movies
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RoomRequest>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    tracing::info!(
        request_id = %request_id,
        seed = %request.seed,
        player_session_id = %request.player_session_id,
        "Processing join-room request"
    );

    let movies = state.rooms.join_room(&request).await?;
    Ok(Json(movies))
}

pub async fn fetch_more(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RoomRequest>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    tracing::info!(
        request_id = %request_id,
        seed = %request.seed,
        player_session_id = %request.player_session_id,
        "Processing fetch-more request"
    );

    let movies = state.rooms.fetch_more(&request).await?;
    Ok(Json(movies))
}

/// Records a like; the body is `true` when it completes a match
pub async fn add_to_likes(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<LikeRequest>,
) -> AppResult<Json<bool>> {
    tracing::info!(
        request_id = %request_id,
        seed = %request.seed,
        player_session_id = %request.player_session_id,
        movie_id = request.movie_id,
        "Processing add-to-likes request"
    );

    let common = state.rooms.add_like(&request).await?;
    Ok(Json(common))
}

pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PlayerRequest>,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        player_session_id = %request.player_session_id,
        "Processing leave-room request"
    );

    state.rooms.leave_room(&request.player_session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn can_player_rejoin(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(request): Query<PlayerRequest>,
) -> Json<bool> {
    tracing::debug!(
        request_id = %request_id,
        player_session_id = %request.player_session_id,
        "Processing can-player-rejoin request"
    );

    Json(state.rooms.can_rejoin(&request.player_session_id).await)
}

pub async fn common_likes(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(request): Query<PlayerRequest>,
) -> AppResult<Json<Vec<MovieId>>> {
    tracing::debug!(
        request_id = %request_id,
        player_session_id = %request.player_session_id,
        "Processing common-likes request"
    );

    let likes = state.rooms.common_likes(&request.player_session_id).await?;
    Ok(Json(likes))
}

pub async fn room_exists(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(seed): Path<String>,
) -> AppResult<Json<bool>> {
    tracing::debug!(request_id = %request_id, seed = %seed, "Processing room-exists request");

    Ok(Json(state.rooms.room_exists(&seed).await?))
}
