pub mod sqlite;
pub mod watchlist_store;

pub use sqlite::create_pool;
pub use watchlist_store::{SqliteWatchlistStore, WatchlistStore, WatchlistStream};
