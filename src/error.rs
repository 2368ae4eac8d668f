use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Player session id {0} already exists")]
    PlayerAlreadyExists(String),

    #[error("Seed {0} is already used by another room")]
    SeedAlreadyInUse(String),

    #[error("No room found for seed {0}")]
    RoomNotFound(String),

    #[error("Room {0} already has two players")]
    RoomFull(String),

    #[error("No session found for seed {seed} and player session id {player_session_id}")]
    SessionNotFound {
        seed: String,
        player_session_id: String,
    },

    #[error("Player session id {0} not found")]
    PlayerNotFound(String),

    #[error("Player session id {0} is not in a room")]
    PlayerDetached(String),

    #[error("Movie {movie_id} already liked by player session id {player_session_id}")]
    AlreadyLiked {
        movie_id: i64,
        player_session_id: String,
    },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Seed sequence corrupt: {0}")]
    SequenceCorrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::CatalogUnavailable(err.to_string())
    }
}

impl AppError {
    /// Stable machine-readable name, sent alongside the message so clients can branch on it
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidSeed(_) => "invalid_seed",
            AppError::PlayerAlreadyExists(_) => "player_already_exists",
            AppError::SeedAlreadyInUse(_) => "seed_already_in_use",
            AppError::RoomNotFound(_) => "room_not_found",
            AppError::RoomFull(_) => "room_full",
            AppError::SessionNotFound { .. } => "session_not_found",
            AppError::PlayerNotFound(_) => "player_not_found",
            AppError::PlayerDetached(_) => "player_detached",
            AppError::AlreadyLiked { .. } => "already_liked",
            AppError::CatalogUnavailable(_) => "catalog_unavailable",
            AppError::ItemNotFound(_) => "item_not_found",
            AppError::SequenceCorrupt(_) => "sequence_corrupt",
            AppError::Database(_) => "database",
            AppError::Cache(_) => "cache",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidSeed(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::RoomNotFound(_)
            | AppError::SessionNotFound { .. }
            | AppError::PlayerNotFound(_)
            | AppError::PlayerDetached(_)
            | AppError::ItemNotFound(_)
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PlayerAlreadyExists(_)
            | AppError::SeedAlreadyInUse(_)
            | AppError::RoomFull(_)
            | AppError::AlreadyLiked { .. } => StatusCode::CONFLICT,
            AppError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::SequenceCorrupt(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "Request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
