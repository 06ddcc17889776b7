use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieCategory, MovieDetails},
    services::{providers::CatalogProvider, WatchlistService},
};

/// Catalog lookups as the screens consume them
///
/// Delegates fetching to the configured `CatalogProvider` and marks each result
/// with its current watchlist membership.
#[derive(Clone)]
pub struct CatalogService {
    provider: Arc<dyn CatalogProvider>,
    watchlist: WatchlistService,
}

impl CatalogService {
    pub fn new(provider: Arc<dyn CatalogProvider>, watchlist: WatchlistService) -> Self {
        Self {
            provider,
            watchlist,
        }
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<MovieDetails>> {
        let movies = self.provider.search_movies(query).await?;
        self.watchlist.annotate(movies).await
    }

    pub async fn category(&self, category: MovieCategory) -> AppResult<Vec<MovieDetails>> {
        let movies = self.provider.movies_by_category(category).await?;
        self.watchlist.annotate(movies).await
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}
