//! TMDB v3 catalog
//!
//! Discovery runs against `/discover/movie` sorted by popularity with adult
//! titles and videos excluded. Genre and provider filters are OR-ed.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        DiscoverFilters, DiscoverPage, MovieId, TmdbGenre, TmdbMovie, TmdbVideo, TmdbWatchProvider,
    },
    services::catalog::Catalog,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

const DISCOVER_CACHE_TTL: u64 = 3600; // 1 hour
const MOVIE_CACHE_TTL: u64 = 86400; // 1 day
const LIST_CACHE_TTL: u64 = 604800; // 1 week
const DISCOVER_SORT_BY: &str = "popularity.desc";

#[derive(Debug, Deserialize)]
struct VideoResults {
    #[serde(default)]
    results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
struct ProviderResults {
    #[serde(default)]
    results: Vec<TmdbWatchProvider>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<TmdbGenre>,
}

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl TmdbCatalog {
    pub fn new(cache: Option<Cache>, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Query parameters of a discover request
    fn discover_query(page: u32, filters: &DiscoverFilters) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("include_adult", "false".to_string()),
            ("include_video", "false".to_string()),
            ("language", filters.language.clone()),
            ("page", page.to_string()),
            ("sort_by", DISCOVER_SORT_BY.to_string()),
        ];

        if !filters.genres.is_empty() {
            query.push(("with_genres", join_or(&filters.genres)));
        }
        if let Some(region) = &filters.watch_region {
            query.push(("watch_region", region.clone()));
        }
        if !filters.watch_providers.is_empty() {
            query.push(("with_watch_providers", join_or(&filters.watch_providers)));
        }

        query
    }

    /// GETs `path` and decodes the JSON body.
    ///
    /// A 404 becomes `ItemNotFound(what)`; any other failure status becomes
    /// `CatalogUnavailable`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::ItemNotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, body = %body, "TMDB request failed");
            return Err(AppError::CatalogUnavailable(format!(
                "TMDB returned status {} for {}",
                status, what
            )));
        }

        Ok(response.json().await?)
    }
}

fn join_or(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

#[async_trait::async_trait]
impl Catalog for TmdbCatalog {
    async fn discover(&self, page: u32, filters: &DiscoverFilters) -> AppResult<DiscoverPage> {
        cached!(
            self.cache.as_ref(),
            CacheKey::DiscoverPage {
                page,
                filters: filters.clone(),
            },
            DISCOVER_CACHE_TTL,
            async move {
                let query = Self::discover_query(page, filters);
                let result: DiscoverPage = self
                    .get_json("/discover/movie", &query, &format!("discover page {}", page))
                    .await?;

                tracing::info!(
                    page,
                    results = result.results.len(),
                    total_pages = result.total_pages,
                    catalog = "tmdb",
                    "Discover page fetched"
                );

                Ok::<_, AppError>(result)
            }
        )
    }

    async fn movie_details(&self, movie_id: MovieId, language: &str) -> AppResult<TmdbMovie> {
        cached!(
            self.cache.as_ref(),
            CacheKey::MovieDetails {
                movie_id,
                language: language.to_string(),
            },
            MOVIE_CACHE_TTL,
            async move {
                let query = [("language", language.to_string())];
                let movie: TmdbMovie = self
                    .get_json(
                        &format!("/movie/{}", movie_id),
                        &query,
                        &format!("movie {}", movie_id),
                    )
                    .await?;

                tracing::debug!(movie_id, title = %movie.title, "Movie details fetched");

                Ok::<_, AppError>(movie)
            }
        )
    }

    async fn movie_videos(&self, movie_id: MovieId, language: &str) -> AppResult<Vec<TmdbVideo>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::MovieVideos {
                movie_id,
                language: language.to_string(),
            },
            MOVIE_CACHE_TTL,
            async move {
                let query = [("language", language.to_string())];
                let videos: VideoResults = self
                    .get_json(
                        &format!("/movie/{}/videos", movie_id),
                        &query,
                        &format!("videos of movie {}", movie_id),
                    )
                    .await?;
                Ok::<_, AppError>(videos.results)
            }
        )
    }

    async fn watch_providers(
        &self,
        watch_region: &str,
        language: &str,
    ) -> AppResult<Vec<TmdbWatchProvider>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::WatchProviders {
                watch_region: watch_region.to_string(),
                language: language.to_string(),
            },
            LIST_CACHE_TTL,
            async move {
                let query = [
                    ("language", language.to_string()),
                    ("watch_region", watch_region.to_string()),
                ];
                let providers: ProviderResults = self
                    .get_json(
                        "/watch/providers/movie",
                        &query,
                        &format!("watch providers for {}", watch_region),
                    )
                    .await?;

                tracing::info!(
                    watch_region = %watch_region,
                    providers = providers.results.len(),
                    "Watch providers fetched"
                );

                Ok::<_, AppError>(providers.results)
            }
        )
    }

    async fn genres(&self, language: &str) -> AppResult<Vec<TmdbGenre>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Genres(language.to_string()),
            LIST_CACHE_TTL,
            async move {
                let query = [("language", language.to_string())];
                let list: GenreList = self
                    .get_json("/genre/movie/list", &query, "genre list")
                    .await?;
                Ok::<_, AppError>(list.genres)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(query: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_discover_query_defaults() {
        let filters = DiscoverFilters {
            language: "en-US".to_string(),
            ..Default::default()
        };
        let query = TmdbCatalog::discover_query(42, &filters);

        assert_eq!(lookup(&query, "page"), Some("42"));
        assert_eq!(lookup(&query, "language"), Some("en-US"));
        assert_eq!(lookup(&query, "sort_by"), Some("popularity.desc"));
        assert_eq!(lookup(&query, "include_adult"), Some("false"));
        assert_eq!(lookup(&query, "with_genres"), None);
        assert_eq!(lookup(&query, "watch_region"), None);
        assert_eq!(lookup(&query, "with_watch_providers"), None);
    }

    #[test]
    fn test_discover_query_ors_filters() {
        let filters = DiscoverFilters {
            language: "ro-RO".to_string(),
            genres: vec![28, 35],
            watch_region: Some("RO".to_string()),
            watch_providers: vec![8, 337],
        };
        let query = TmdbCatalog::discover_query(1, &filters);

        assert_eq!(lookup(&query, "with_genres"), Some("28|35"));
        assert_eq!(lookup(&query, "watch_region"), Some("RO"));
        assert_eq!(lookup(&query, "with_watch_providers"), Some("8|337"));
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let catalog = TmdbCatalog::new(
            None,
            "key".to_string(),
            "https://api.themoviedb.org/3/".to_string(),
        );
        assert_eq!(catalog.api_url, "https://api.themoviedb.org/3");
        assert_eq!(catalog.name(), "tmdb");
    }

    #[test]
    fn test_discover_page_decodes() {
        let page: DiscoverPage = serde_json::from_str(
            r#"{"page": 3, "results": [{"id": 550, "title": "Fight Club"}, {"id": 13}], "total_pages": 41, "total_results": 812}"#,
        )
        .unwrap();
        assert_eq!(page.movie_ids(), vec![550, 13]);
        assert_eq!(page.total_pages, 41);
    }

    #[test]
    fn test_video_results_decode() {
        let videos: VideoResults = serde_json::from_str(
            r#"{"id": 550, "results": [{"key": "abc", "site": "YouTube", "type": "Trailer", "official": true, "size": 1080}]}"#,
        )
        .unwrap();
        assert_eq!(videos.results.len(), 1);
        assert_eq!(videos.results[0].video_type, "Trailer");
    }
}
