use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub message: Option<String>,
}

/// Returns the pending banner message, if any
pub async fn current(State(state): State<Arc<AppState>>) -> Json<NotificationResponse> {
    Json(NotificationResponse {
        message: state
            .watchlist
            .current_notification()
            .map(|n| n.to_string()),
    })
}

/// Marks the banner as shown
pub async fn clear(State(state): State<Arc<AppState>>) -> StatusCode {
    state.watchlist.clear_notification();
    StatusCode::NO_CONTENT
}
