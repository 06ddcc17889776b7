/// Remote catalog abstraction
///
/// The watchlist only consumes catalog data; providers turn a search query or a
/// category listing into `MovieSummary` records keyed by the catalog's integer id.
use crate::{
    error::AppResult,
    models::{MovieCategory, MovieSummary},
};

pub mod tmdb;

/// Trait for remote movie catalogs
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search for movies by title
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>>;

    /// Fetch one of the curated listings (popular, top rated, ...)
    async fn movies_by_category(&self, category: MovieCategory) -> AppResult<Vec<MovieSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
