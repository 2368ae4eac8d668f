use serde::{Deserialize, Serialize};

pub mod seed;
pub mod session;

pub use seed::Seed;
pub use session::{Player, RoomChange, Session};

/// TMDB movie identifier
pub type MovieId = i64;

pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w780";
pub const TMDB_LOGO_BASE_URL: &str = "https://image.tmdb.org/t/p/w92";
pub const IMDB_TITLE_BASE_URL: &str = "https://www.imdb.com/title/";

// ============================================================================
// Requests
// ============================================================================

/// Body of create-room, join-room and fetch-more
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub seed: String,
    pub player_session_id: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub genres: Option<Vec<i64>>,
    #[serde(default)]
    pub watch_region: Option<String>,
    #[serde(default)]
    pub watch_providers: Option<Vec<i64>>,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl RoomRequest {
    /// Catalog filters carried by this request
    pub fn filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            language: self.language.clone(),
            genres: self.genres.clone().unwrap_or_default(),
            watch_region: self
                .watch_region
                .as_ref()
                .filter(|region| !region.trim().is_empty())
                .cloned(),
            watch_providers: self.watch_providers.clone().unwrap_or_default(),
        }
    }
}

/// Body of add-to-likes
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub seed: String,
    pub player_session_id: String,
    pub movie_id: MovieId,
}

/// Body or query of the per-player endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    pub player_session_id: String,
}

/// Filters applied to a discover query
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoverFilters {
    pub language: String,
    pub genres: Vec<i64>,
    pub watch_region: Option<String>,
    pub watch_providers: Vec<i64>,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// One page of `/discover/movie`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<DiscoverResult>,
    #[serde(default)]
    pub total_pages: u32,
}

impl DiscoverPage {
    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.results.iter().map(|result| result.id).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResult {
    pub id: MovieId,
}

/// Response of `/movie/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: MovieId,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub spoken_languages: Vec<TmdbSpokenLanguage>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbSpokenLanguage {
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub iso_639_1: Option<String>,
    pub name: String,
}

/// Entry of `/movie/{id}/videos`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub size: u32,
}

/// Entry of `/watch/providers/movie`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbWatchProvider {
    #[serde(default)]
    pub display_priority: i32,
    #[serde(default)]
    pub logo_path: Option<String>,
    pub provider_name: String,
    pub provider_id: i64,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreResponse {
    pub id: i64,
    pub name: String,
}

impl From<TmdbGenre> for GenreResponse {
    fn from(genre: TmdbGenre) -> Self {
        Self {
            id: genre.id,
            name: genre.name,
        }
    }
}

/// A movie as shown on a player's card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub id: MovieId,
    pub title: String,
    pub backdrop_url: Option<String>,
    pub poster_url: Option<String>,
    pub genres: Vec<GenreResponse>,
    pub imdb_url: Option<String>,
    pub overview: Option<String>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    pub runtime: Option<u32>,
    pub spoken_languages: Vec<String>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<TmdbMovie> for MovieResponse {
    fn from(movie: TmdbMovie) -> Self {
        let image_url = |path: Option<String>| {
            non_empty(path).map(|p| format!("{}{}", TMDB_IMAGE_BASE_URL, p))
        };

        Self {
            id: movie.id,
            title: movie.title,
            backdrop_url: image_url(movie.backdrop_path),
            poster_url: image_url(movie.poster_path),
            genres: movie.genres.into_iter().map(GenreResponse::from).collect(),
            imdb_url: non_empty(movie.imdb_id).map(|id| format!("{}{}", IMDB_TITLE_BASE_URL, id)),
            overview: non_empty(movie.overview),
            popularity: movie.popularity,
            release_date: non_empty(movie.release_date),
            runtime: movie.runtime,
            spoken_languages: movie
                .spoken_languages
                .into_iter()
                .map(|language| language.name)
                .collect(),
            status: non_empty(movie.status),
            tagline: non_empty(movie.tagline),
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
        }
    }
}

/// A streaming provider offered as a discover filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_url: Option<String>,
}

impl From<TmdbWatchProvider> for ProviderResponse {
    fn from(provider: TmdbWatchProvider) -> Self {
        Self {
            provider_id: provider.provider_id,
            provider_name: provider.provider_name,
            logo_url: non_empty(provider.logo_path)
                .map(|path| format!("{}{}", TMDB_LOGO_BASE_URL, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fight_club() -> TmdbMovie {
        TmdbMovie {
            id: 550,
            backdrop_path: Some("/back.jpg".to_string()),
            genres: vec![TmdbGenre {
                id: 18,
                name: "Drama".to_string(),
            }],
            imdb_id: Some("tt0137523".to_string()),
            overview: Some("An insomniac office worker...".to_string()),
            popularity: Some(61.4),
            poster_path: Some("/poster.jpg".to_string()),
            release_date: Some("1999-10-15".to_string()),
            runtime: Some(139),
            spoken_languages: vec![TmdbSpokenLanguage {
                english_name: Some("English".to_string()),
                iso_639_1: Some("en".to_string()),
                name: "English".to_string(),
            }],
            status: Some("Released".to_string()),
            tagline: Some("Mischief. Mayhem. Soap.".to_string()),
            title: "Fight Club".to_string(),
            vote_average: Some(8.4),
            vote_count: Some(26280),
        }
    }

    #[test]
    fn test_movie_response_builds_urls() {
        let movie: MovieResponse = fight_club().into();
        assert_eq!(movie.id, 550);
        assert_eq!(
            movie.backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w780/back.jpg")
        );
        assert_eq!(
            movie.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w780/poster.jpg")
        );
        assert_eq!(
            movie.imdb_url.as_deref(),
            Some("https://www.imdb.com/title/tt0137523")
        );
        assert_eq!(movie.spoken_languages, vec!["English".to_string()]);
        assert_eq!(movie.genres[0].name, "Drama");
    }

    #[test]
    fn test_movie_response_drops_blank_fields() {
        let movie: MovieResponse = TmdbMovie {
            imdb_id: Some(String::new()),
            release_date: Some(String::new()),
            backdrop_path: None,
            ..fight_club()
        }
        .into();
        assert_eq!(movie.imdb_url, None);
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.backdrop_url, None);
    }

    #[test]
    fn test_movie_response_serializes_camel_case() {
        let movie: MovieResponse = fight_club().into();
        let json = serde_json::to_value(&movie).unwrap();
        assert!(json.get("posterUrl").is_some());
        assert!(json.get("voteAverage").is_some());
        assert!(json.get("poster_url").is_none());
    }

    #[test]
    fn test_tmdb_movie_tolerates_sparse_payload() {
        let movie: TmdbMovie = serde_json::from_str(r#"{"id": 42, "title": "Sparse"}"#).unwrap();
        assert_eq!(movie.id, 42);
        assert!(movie.genres.is_empty());
        assert_eq!(movie.runtime, None);
    }

    #[test]
    fn test_room_request_filters() {
        let request: RoomRequest = serde_json::from_str(
            r#"{"seed":"ab12","playerSessionId":"p1","genres":[28,12],"watchRegion":"  "}"#,
        )
        .unwrap();
        let filters = request.filters();
        assert_eq!(filters.language, "en-US");
        assert_eq!(filters.genres, vec![28, 12]);
        assert_eq!(filters.watch_region, None);
        assert!(filters.watch_providers.is_empty());
    }

    #[test]
    fn test_provider_response_logo_url() {
        let provider = TmdbWatchProvider {
            display_priority: 1,
            logo_path: Some("/netflix.png".to_string()),
            provider_name: "Netflix".to_string(),
            provider_id: 8,
        };
        let response: ProviderResponse = provider.into();
        assert_eq!(
            response.logo_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w92/netflix.png")
        );
    }
}
