use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{DiscoverFilters, DiscoverPage, MovieId, MovieResponse, Seed},
    services::catalog::Catalog,
};

/// Highest discover page a seed may land on
pub const MAX_DISCOVER_PAGE: u32 = 300;
/// Results per TMDB discover page
pub const DISCOVER_PAGE_SIZE: usize = 20;
/// Movies returned for one seed
pub const MOVIES_PER_BATCH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorSettings {
    pub max_page: u32,
    pub page_size: usize,
    pub batch_size: usize,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            max_page: MAX_DISCOVER_PAGE,
            page_size: DISCOVER_PAGE_SIZE,
            batch_size: MOVIES_PER_BATCH,
        }
    }
}

/// Turns a seed into a reproducible batch of movies.
///
/// The seed's value seeds one random stream that picks the discover page,
/// the fallback page when the filters yield fewer pages, and the movie
/// indices on that page. Same seed and filters, same movies in the same order.
#[derive(Clone)]
pub struct MovieSelector {
    catalog: Arc<dyn Catalog>,
    settings: SelectorSettings,
}

impl MovieSelector {
    pub fn new(catalog: Arc<dyn Catalog>, settings: SelectorSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Movie ids the seed selects, in draw order
    pub async fn select_ids(&self, seed: &Seed, filters: &DiscoverFilters) -> AppResult<Vec<MovieId>> {
        let mut rng = seed.rng();
        let mut page = rng.gen_range(0..self.settings.max_page.max(1)) + 1;

        let mut results = self.catalog.discover(page, filters).await?;

        if results.total_pages == 0 {
            tracing::info!(seed = %seed, page, "No discover results for filters");
            return Ok(Vec::new());
        }

        if results.total_pages < page {
            let retry = rng.gen_range(0..results.total_pages) + 1;
            tracing::info!(
                seed = %seed,
                page,
                total_pages = results.total_pages,
                retry,
                "Discover page beyond last page, redrawing"
            );
            page = retry;
            results = self.catalog.discover(page, filters).await?;
        }

        let ids = self.pick_from_page(&mut rng, &results);

        tracing::debug!(seed = %seed, page, picked = ids.len(), "Selected movies from discover page");

        Ok(ids)
    }

    /// Movies the seed selects, with full details, in draw order.
    ///
    /// Detail lookups run concurrently; the first failing lookup fails the
    /// whole batch.
    pub async fn select(&self, seed: &Seed, filters: &DiscoverFilters) -> AppResult<Vec<MovieResponse>> {
        let ids = self.select_ids(seed, filters).await?;

        let tasks: Vec<_> = ids
            .into_iter()
            .map(|movie_id| {
                let catalog = Arc::clone(&self.catalog);
                let language = filters.language.clone();
                tokio::spawn(async move { catalog.movie_details(movie_id, &language).await })
            })
            .collect();

        let mut movies = Vec::with_capacity(tasks.len());
        for task in tasks {
            let movie = task
                .await
                .map_err(|e| AppError::Internal(format!("Movie lookup task failed: {}", e)))??;
            movies.push(MovieResponse::from(movie));
        }

        tracing::info!(
            seed = %seed,
            movies = movies.len(),
            catalog = self.catalog.name(),
            "Fetched movie batch"
        );

        Ok(movies)
    }

    fn pick_from_page(&self, rng: &mut ChaCha8Rng, page: &DiscoverPage) -> Vec<MovieId> {
        let ids = page.movie_ids();
        let available = ids.len().min(self.settings.page_size);

        draw_distinct(rng, available, self.settings.batch_size)
            .into_iter()
            .map(|index| ids[index])
            .collect()
    }
}

/// Draws `count` distinct indices below `bound`, redrawing duplicates.
///
/// `count` is capped at `bound`.
pub fn draw_distinct(rng: &mut ChaCha8Rng, bound: usize, count: usize) -> Vec<usize> {
    let wanted = count.min(bound);
    let mut picked = Vec::with_capacity(wanted);

    while picked.len() < wanted {
        let index = rng.gen_range(0..bound);
        if !picked.contains(&index) {
            picked.push(index);
        }
    }

    picked
}
