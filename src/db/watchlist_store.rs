use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sqlx::SqlitePool;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::instrument;

#[cfg(test)]
use mockall::automock;

use crate::{
    config::StoreConfig,
    db::create_pool,
    error::{AppError, AppResult},
    models::WatchlistEntry,
};

const SELECT_ALL: &str =
    "SELECT id, title, poster_path, vote_average, overview FROM watchlist ORDER BY id ASC";

/// Live view of the whole watchlist table
///
/// Yields the current content first, then one full snapshot per committed change.
pub type WatchlistStream = BoxStream<'static, Vec<WatchlistEntry>>;

/// Durable CRUD over the watchlist table
///
/// Every mutation goes through `upsert` or `delete`; rows handed out are owned snapshots.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Inserts the row, replacing any row with the same id entirely
    async fn upsert(&self, entry: &WatchlistEntry) -> AppResult<()>;

    /// Removes the row matching `entry.id`; absent rows are a no-op
    async fn delete(&self, entry: &WatchlistEntry) -> AppResult<()>;

    /// Point lookup against committed state
    async fn find(&self, id: i64) -> AppResult<Option<WatchlistEntry>>;

    /// True iff a row with `id` is committed right now
    async fn exists(&self, id: i64) -> AppResult<bool>;

    /// One-shot snapshot ordered by id
    async fn list(&self) -> AppResult<Vec<WatchlistEntry>>;

    /// Subscribes a new observer of the full table
    fn observe_all(&self) -> AppResult<WatchlistStream>;
}

/// Latest published snapshot and the fan-out channel, swapped together
struct Publisher {
    latest: Vec<WatchlistEntry>,
    tx: Option<broadcast::Sender<Vec<WatchlistEntry>>>,
}

/// SQLite-backed watchlist store
pub struct SqliteWatchlistStore {
    pool: SqlitePool,
    /// Held across write, re-read and publish so snapshots go out in commit order
    write_gate: tokio::sync::Mutex<()>,
    publisher: Mutex<Publisher>,
}

impl SqliteWatchlistStore {
    /// Opens (creating if needed) the database and applies schema migrations
    pub async fn open(config: &StoreConfig) -> AppResult<Self> {
        let pool = create_pool(config).await?;
        Self::from_pool(pool, config.channel_capacity).await
    }

    /// Wraps an existing pool, migrating it first
    pub async fn from_pool(pool: SqlitePool, channel_capacity: usize) -> AppResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;

        let latest = sqlx::query_as::<_, WatchlistEntry>(SELECT_ALL)
            .fetch_all(&pool)
            .await?;
        let (tx, _) = broadcast::channel(channel_capacity.max(1));

        tracing::info!(rows = latest.len(), "Watchlist store opened");

        Ok(Self {
            pool,
            write_gate: tokio::sync::Mutex::new(()),
            publisher: Mutex::new(Publisher {
                latest,
                tx: Some(tx),
            }),
        })
    }

    /// Ends every live subscription and closes the pool
    pub async fn close(&self) {
        let _gate = self.write_gate.lock().await;
        self.publisher().tx = None;
        self.pool.close().await;
        tracing::info!("Watchlist store closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn publisher(&self) -> MutexGuard<'_, Publisher> {
        self.publisher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, rows: Vec<WatchlistEntry>) {
        let mut publisher = self.publisher();
        publisher.latest = rows.clone();

        let subscribers = match &publisher.tx {
            // No receivers is not a failure; the snapshot is still kept for late subscribers
            Some(tx) => tx.send(rows).unwrap_or(0),
            None => 0,
        };

        tracing::debug!(
            rows = publisher.latest.len(),
            subscribers,
            "Published watchlist snapshot"
        );
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlistStore {
    #[instrument(skip(self, entry), fields(movie_id = entry.id))]
    async fn upsert(&self, entry: &WatchlistEntry) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO watchlist (id, title, poster_path, vote_average, overview)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.title)
        .bind(&entry.poster_path)
        .bind(entry.vote_average)
        .bind(&entry.overview)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query_as::<_, WatchlistEntry>(SELECT_ALL)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(title = %entry.title, "Watchlist entry upserted");
        self.publish(rows);
        Ok(())
    }

    #[instrument(skip(self, entry), fields(movie_id = entry.id))]
    async fn delete(&self, entry: &WatchlistEntry) -> AppResult<()> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM watchlist WHERE id = ?")
            .bind(entry.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::debug!("Delete matched no row");
            return Ok(());
        }

        let rows = sqlx::query_as::<_, WatchlistEntry>(SELECT_ALL)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Watchlist entry deleted");
        self.publish(rows);
        Ok(())
    }

    async fn find(&self, id: i64) -> AppResult<Option<WatchlistEntry>> {
        let entry = sqlx::query_as::<_, WatchlistEntry>(
            "SELECT id, title, poster_path, vote_average, overview FROM watchlist WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM watchlist WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn list(&self) -> AppResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistEntry>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    fn observe_all(&self) -> AppResult<WatchlistStream> {
        let publisher = self.publisher();
        let tx = publisher
            .tx
            .as_ref()
            .ok_or(AppError::Storage(sqlx::Error::PoolClosed))?;

        // Subscribing under the publisher lock pairs the initial snapshot with the
        // exact point in the broadcast sequence it reflects.
        let rx = tx.subscribe();
        let initial = publisher.latest.clone();

        tracing::debug!(
            subscribers = tx.receiver_count(),
            "New watchlist subscriber"
        );

        Ok(snapshot_stream(initial, rx))
    }
}

fn snapshot_stream(
    initial: Vec<WatchlistEntry>,
    rx: broadcast::Receiver<Vec<WatchlistEntry>>,
) -> WatchlistStream {
    let updates = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(snapshot) => Some((snapshot, rx)),
            Err(RecvError::Lagged(skipped)) => {
                // Skip straight to the newest buffered snapshot
                let mut newest = None;
                loop {
                    match rx.try_recv() {
                        Ok(snapshot) => newest = Some(snapshot),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    }
                }
                tracing::warn!(skipped, "Watchlist subscriber lagged, resynchronised");
                newest.map(|snapshot| (snapshot, rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    stream::once(async move { initial }).chain(updates).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{MovieSummary, Notification},
        services::WatchlistService,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    async fn open_store(dir: &TempDir) -> SqliteWatchlistStore {
        SqliteWatchlistStore::open(&StoreConfig::new(dir.path().join("watchlist.db")))
            .await
            .unwrap()
    }

    fn entry(id: i64, title: &str) -> WatchlistEntry {
        WatchlistEntry {
            id,
            title: title.to_string(),
            poster_path: None,
            vote_average: None,
            overview: None,
        }
    }

    fn ids(rows: &[WatchlistEntry]) -> Vec<i64> {
        rows.iter().map(|e| e.id).collect()
    }

    async fn next(stream: &mut WatchlistStream) -> Vec<WatchlistEntry> {
        timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("no emission in time")
            .expect("stream ended")
    }

    async fn assert_quiet(stream: &mut WatchlistStream) {
        assert!(timeout(Duration::from_millis(50), stream.next())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_upsert_then_find() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut fight_club = entry(550, "Fight Club");
        fight_club.vote_average = Some(8.8);
        fight_club.poster_path = Some("/fc.jpg".to_string());
        store.upsert(&fight_club).await.unwrap();

        assert_eq!(store.find(550).await.unwrap(), Some(fight_club));
        assert_eq!(store.find(551).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.upsert(&entry(550, "Fight Club")).await.unwrap();
        let mut replacement = entry(550, "Fight Club (Director's Cut)");
        replacement.overview = Some("Mischief. Mayhem. Soap.".to_string());
        store.upsert(&replacement).await.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows, vec![replacement]);
    }

    #[tokio::test]
    async fn test_exists_tracks_committed_state() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert!(!store.exists(550).await.unwrap());
        store.upsert(&entry(550, "Fight Club")).await.unwrap();
        assert!(store.exists(550).await.unwrap());
        store.delete(&entry(550, "Fight Club")).await.unwrap();
        assert!(!store.exists(550).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.upsert(&entry(13, "Forrest Gump")).await.unwrap();

        store.delete(&entry(999, "Untitled")).await.unwrap();

        assert_eq!(ids(&store.list().await.unwrap()), vec![13]);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        for (id, title) in [(680, "Pulp Fiction"), (13, "Forrest Gump"), (550, "Fight Club")] {
            store.upsert(&entry(id, title)).await.unwrap();
        }

        assert_eq!(ids(&store.list().await.unwrap()), vec![13, 550, 680]);
    }

    #[tokio::test]
    async fn test_observe_all_emits_current_content_on_subscribe() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.upsert(&entry(550, "Fight Club")).await.unwrap();

        let mut first = store.observe_all().unwrap();
        let mut second = store.observe_all().unwrap();

        assert_eq!(ids(&next(&mut first).await), vec![550]);
        assert_eq!(ids(&next(&mut second).await), vec![550]);
    }

    #[tokio::test]
    async fn test_every_change_reaches_every_subscriber_once() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut first = store.observe_all().unwrap();
        let mut second = store.observe_all().unwrap();
        assert!(next(&mut first).await.is_empty());
        assert!(next(&mut second).await.is_empty());

        store.upsert(&entry(550, "Fight Club")).await.unwrap();
        store.upsert(&entry(603, "The Matrix")).await.unwrap();
        store.delete(&entry(550, "Fight Club")).await.unwrap();

        for stream in [&mut first, &mut second] {
            assert_eq!(ids(&next(stream).await), vec![550]);
            assert_eq!(ids(&next(stream).await), vec![550, 603]);
            assert_eq!(ids(&next(stream).await), vec![603]);
            assert_quiet(stream).await;
        }
    }

    #[tokio::test]
    async fn test_noop_delete_does_not_emit() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut stream = store.observe_all().unwrap();
        assert!(next(&mut stream).await.is_empty());

        store.delete(&entry(999, "Untitled")).await.unwrap();

        let mut pending = tokio_test::task::spawn(stream.next());
        tokio_test::assert_pending!(pending.poll());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_resynchronises_to_latest() {
        let dir = TempDir::new().unwrap();
        let mut config = StoreConfig::new(dir.path().join("watchlist.db"));
        config.channel_capacity = 2;
        let store = SqliteWatchlistStore::open(&config).await.unwrap();

        let mut slow = store.observe_all().unwrap();
        for id in 1..=5 {
            store.upsert(&entry(id, "Movie")).await.unwrap();
        }

        assert!(next(&mut slow).await.is_empty());
        assert_eq!(ids(&next(&mut slow).await), vec![1, 2, 3, 4, 5]);
        assert_quiet(&mut slow).await;
    }

    #[tokio::test]
    async fn test_concurrent_upserts_to_different_ids() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir).await);

        let mut tasks = Vec::new();
        for id in 0..20 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.upsert(&entry(id, &format!("Movie {}", id))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(ids(&store.list().await.unwrap()), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let dir = TempDir::new().unwrap();

        let store = open_store(&dir).await;
        store.upsert(&entry(550, "Fight Club")).await.unwrap();
        store.close().await;

        let reopened = open_store(&dir).await;
        assert!(reopened.exists(550).await.unwrap());
        let mut stream = reopened.observe_all().unwrap();
        assert_eq!(ids(&next(&mut stream).await), vec![550]);
    }

    #[tokio::test]
    async fn test_mutations_complete_after_caller_leaves() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir).await);
        let service = WatchlistService::new(store.clone());
        let fight_club = MovieSummary::new(550, "Fight Club");

        let mut stream = store.observe_all().unwrap();
        assert!(next(&mut stream).await.is_empty());

        // Hold the gate so the add is still pending when its caller is dropped
        let gate = store.write_gate.lock().await;
        let abandoned = timeout(Duration::from_millis(50), service.add_movie(&fight_club)).await;
        assert!(abandoned.is_err());
        drop(gate);

        assert_eq!(ids(&next(&mut stream).await), vec![550]);
        assert!(store.exists(550).await.unwrap());

        let mut notifications = service.notifications();
        let reported = timeout(
            Duration::from_secs(2),
            notifications.wait_for(|notification| notification.is_some()),
        )
        .await
        .unwrap()
        .unwrap()
        .clone();
        assert_eq!(
            reported,
            Some(Notification::Added {
                title: "Fight Club".to_string()
            })
        );

        let gate = store.write_gate.lock().await;
        let abandoned =
            timeout(Duration::from_millis(50), service.remove_movie(&fight_club)).await;
        assert!(abandoned.is_err());
        drop(gate);

        assert!(next(&mut stream).await.is_empty());
        assert!(!store.exists(550).await.unwrap());
    }

    #[tokio::test]
    async fn test_close_ends_streams_and_fails_later_calls() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut stream = store.observe_all().unwrap();
        assert!(next(&mut stream).await.is_empty());

        store.close().await;

        assert!(store.is_closed());
        assert!(timeout(Duration::from_secs(2), stream.next())
            .await
            .unwrap()
            .is_none());
        assert!(store.observe_all().is_err());
        let err = store.upsert(&entry(1, "Late")).await.unwrap_err();
        assert!(err.is_storage_fault());
    }
}
