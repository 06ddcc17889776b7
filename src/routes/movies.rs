use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MovieCategory, MovieDetails},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

/// Handler for movie search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieDetails>>> {
    let movies = state.catalog.search(&params.q).await?;
    Ok(Json(movies))
}

/// Handler for category listings (popular, top_rated, upcoming, now_playing)
pub async fn category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<MovieDetails>>> {
    let category: MovieCategory = category.parse()?;
    let movies = state.catalog.category(category).await?;
    Ok(Json(movies))
}
