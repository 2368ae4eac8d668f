//! Movie catalog abstraction
//!
//! The room logic only needs a handful of read operations from the catalog:
//! paged discovery, per-movie details and a few lookup lists. They are kept
//! behind a trait so the TMDB client can be swapped for a fake in tests.
use crate::{
    error::AppResult,
    models::{DiscoverFilters, DiscoverPage, MovieId, TmdbGenre, TmdbMovie, TmdbVideo, TmdbWatchProvider},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// One page of discovery results for the given filters.
    ///
    /// `total_pages` of the returned page is 0 when nothing matches the filters.
    async fn discover(&self, page: u32, filters: &DiscoverFilters) -> AppResult<DiscoverPage>;

    /// Full attributes of one movie
    async fn movie_details(&self, movie_id: MovieId, language: &str) -> AppResult<TmdbMovie>;

    async fn movie_videos(&self, movie_id: MovieId, language: &str) -> AppResult<Vec<TmdbVideo>>;

    async fn watch_providers(
        &self,
        watch_region: &str,
        language: &str,
    ) -> AppResult<Vec<TmdbWatchProvider>>;

    async fn genres(&self, language: &str) -> AppResult<Vec<TmdbGenre>>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}
