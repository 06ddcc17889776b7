use std::{future::Future, sync::Arc};
use tokio::sync::watch;
use tracing::{instrument, Instrument};

use crate::{
    db::{WatchlistStore, WatchlistStream},
    error::{AppError, AppResult},
    models::{MovieDetails, MovieSummary, MovieView, Notification, WatchlistEntry},
};

/// Entry point the presentation layer uses for everything watchlist-related
///
/// Wraps the store with the duplicate guard, translates `MovieSummary` into
/// `WatchlistEntry`, and holds the notification slot that drives one-shot banners.
///
/// `add_movie` checks and then writes without a lock, so two concurrent adds of the
/// same id may both report "added". The store's replace semantics keep the table at
/// one row either way.
///
/// Mutations run on their own task: a caller that goes away mid-call does not
/// abandon the write or its notification.
#[derive(Clone)]
pub struct WatchlistService {
    store: Arc<dyn WatchlistStore>,
    notification: Arc<watch::Sender<Option<Notification>>>,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn WatchlistStore>) -> Self {
        let (notification, _) = watch::channel(None);
        Self {
            store,
            notification: Arc::new(notification),
        }
    }

    /// Saves a movie unless its id is already present
    #[instrument(skip(self, summary), fields(movie_id = summary.id))]
    pub async fn add_movie(&self, summary: &MovieSummary) -> AppResult<Notification> {
        let service = self.clone();
        let entry = WatchlistEntry::from(summary);

        detach(async move {
            if service.store.exists(entry.id).await? {
                tracing::info!("Movie already in watchlist");
                return Ok(service.notify(Notification::AlreadyPresent));
            }

            service.store.upsert(&entry).await?;

            tracing::info!(title = %entry.title, "Movie added to watchlist");
            Ok(service.notify(Notification::Added { title: entry.title }))
        })
        .await
    }

    /// Deletes unconditionally; reports removal whether or not a row existed
    #[instrument(skip(self, summary), fields(movie_id = summary.id))]
    pub async fn remove_movie(&self, summary: &MovieSummary) -> AppResult<Notification> {
        let service = self.clone();
        let entry = WatchlistEntry::from(summary);

        detach(async move {
            service.store.delete(&entry).await?;

            tracing::info!(title = %entry.title, "Movie removed from watchlist");
            Ok(service.notify(Notification::Removed { title: entry.title }))
        })
        .await
    }

    pub async fn is_in_watchlist(&self, id: i64) -> AppResult<bool> {
        self.store.exists(id).await
    }

    /// Live watchlist; same contract as the store's `observe_all`
    pub fn watchlist(&self) -> AppResult<WatchlistStream> {
        self.store.observe_all()
    }

    pub async fn snapshot(&self) -> AppResult<Vec<WatchlistEntry>> {
        self.store.list().await
    }

    /// Details of a saved movie, if present
    pub async fn details(&self, id: i64) -> AppResult<Option<MovieDetails>> {
        let entry = self.store.find(id).await?;
        Ok(entry.map(|e| MovieView::Saved(e).into_details(true)))
    }

    /// Normalizes catalog results, flagging the ones already saved
    pub async fn annotate(&self, summaries: Vec<MovieSummary>) -> AppResult<Vec<MovieDetails>> {
        let mut details = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let in_watchlist = self.store.exists(summary.id).await?;
            details.push(MovieView::Summary(summary).into_details(in_watchlist));
        }
        Ok(details)
    }

    /// Subscribes to the notification slot
    pub fn notifications(&self) -> watch::Receiver<Option<Notification>> {
        self.notification.subscribe()
    }

    pub fn current_notification(&self) -> Option<Notification> {
        self.notification.borrow().clone()
    }

    /// Called by the consumer once the message has been shown
    pub fn clear_notification(&self) {
        self.notification.send_replace(None);
    }

    fn notify(&self, notification: Notification) -> Notification {
        self.notification.send_replace(Some(notification.clone()));
        notification
    }
}

/// Runs a mutation to completion on its own task and waits for the outcome
async fn detach<F>(mutation: F) -> AppResult<Notification>
where
    F: Future<Output = AppResult<Notification>> + Send + 'static,
{
    tokio::spawn(mutation.instrument(tracing::Span::current()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Watchlist write task failed");
            AppError::Internal(format!("Watchlist write task failed: {}", e))
        })?
}
