use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{MovieDetails, MovieSummary, WatchlistEntry},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub id: i64,
    pub notification: String,
    pub in_watchlist: bool,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub id: i64,
    pub in_watchlist: bool,
}

/// Current watchlist content
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let entries = state.watchlist.snapshot().await?;
    Ok(Json(entries))
}

/// Live watchlist as Server-Sent Events, one `watchlist` event per snapshot.
/// The stream ends when the server shuts down.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let snapshots = state.watchlist.watchlist()?;

    tracing::info!(request_id = %request_id, "Watchlist stream subscribed");

    let events = snapshots
        .take_until(state.shutdown_signal())
        .map(|entries| Event::default().event("watchlist").json_data(entries));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handler for "add to watchlist"
pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(summary): Json<MovieSummary>,
) -> AppResult<Json<MutationResponse>> {
    tracing::info!(request_id = %request_id, movie_id = summary.id, "Processing add request");

    let notification = state.watchlist.add_movie(&summary).await?;
    Ok(Json(MutationResponse {
        id: summary.id,
        in_watchlist: true,
        notification: notification.to_string(),
    }))
}

/// Handler for "remove from watchlist"
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(summary): Json<MovieSummary>,
) -> AppResult<Json<MutationResponse>> {
    tracing::info!(request_id = %request_id, movie_id = summary.id, "Processing remove request");

    let notification = state.watchlist.remove_movie(&summary).await?;
    Ok(Json(MutationResponse {
        id: summary.id,
        in_watchlist: false,
        notification: notification.to_string(),
    }))
}

/// Details of a saved movie
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<MovieDetails>> {
    state
        .watchlist
        .details(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {} is not in the watchlist", id)))
}

pub async fn exists(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<MembershipResponse>> {
    let in_watchlist = state.watchlist.is_in_watchlist(id).await?;
    Ok(Json(MembershipResponse { id, in_watchlist }))
}
