use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{future::Future, sync::Arc};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{CatalogService, WatchlistService},
};

pub mod movies;
pub mod notifications;
pub mod watchlist;

/// Services shared by every handler
pub struct AppState {
    pub watchlist: WatchlistService,
    pub catalog: CatalogService,
    shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(watchlist: WatchlistService, catalog: CatalogService) -> Self {
        let (_, shutdown) = watch::channel(false);
        Self {
            watchlist,
            catalog,
            shutdown,
        }
    }

    /// Ends long-lived responses once `true` is sent on the paired sender
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Resolves when the server starts shutting down; never resolves without a sender
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut shutdown = self.shutdown.clone();
        async move {
            let stopping = shutdown.wait_for(|stopping| *stopping).await.is_ok();
            if !stopping {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(Arc::new(state))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/movies/category/:category", get(movies::category))
        .route("/watchlist", get(watchlist::list).post(watchlist::add))
        .route("/watchlist/remove", post(watchlist::remove))
        .route("/watchlist/stream", get(watchlist::stream))
        .route("/watchlist/:id", get(watchlist::details))
        .route("/watchlist/:id/exists", get(watchlist::exists))
        .route(
            "/notification",
            get(notifications::current).delete(notifications::clear),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
