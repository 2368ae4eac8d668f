use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{GenreResponse, MovieId, ProviderResponse},
    routes::AppState,
    services::media,
};

/// Genre names are always served in English
const GENRE_LANGUAGE: &str = "en";

/// Embed URL of the movie's best YouTube trailer
pub async fn youtube_trailer(
    State(state): State<Arc<AppState>>,
    Path((movie_id, language)): Path<(MovieId, String)>,
) -> AppResult<Json<String>> {
    let videos = state.catalog.movie_videos(movie_id, &language).await?;

    let trailer = media::best_trailer(&videos)
        .ok_or_else(|| AppError::NotFound(format!("No trailer for movie {}", movie_id)))?;

    Ok(Json(media::trailer_url(trailer)))
}

pub async fn watch_providers(
    State(state): State<Arc<AppState>>,
    Path((region, language)): Path<(String, String)>,
) -> AppResult<Json<Vec<ProviderResponse>>> {
    let providers = state.catalog.watch_providers(&region, &language).await?;
    Ok(Json(media::popular_providers(providers)))
}

pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<GenreResponse>>> {
    let genres = state.catalog.genres(GENRE_LANGUAGE).await?;
    Ok(Json(genres.into_iter().map(GenreResponse::from).collect()))
}
