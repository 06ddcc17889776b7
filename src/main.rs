use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use watchlist_api::{
    config::Config,
    db::SqliteWatchlistStore,
    routes::{create_router, AppState},
    services::{CatalogService, TmdbProvider, WatchlistService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("watchlist_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(SqliteWatchlistStore::open(&config.store_config()).await?);
    let watchlist = WatchlistService::new(store.clone());

    let provider = Arc::new(TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));
    let catalog = CatalogService::new(provider, watchlist.clone());
    tracing::info!(provider = catalog.provider_name(), "Catalog provider configured");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = create_router(AppState::new(watchlist, catalog).with_shutdown(shutdown_rx));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            // Watchlist streams never finish on their own
            shutdown_tx.send_replace(true);
        })
        .await?;

    store.close().await;

    Ok(())
}
