pub mod catalog;
pub mod providers;
pub mod watchlist;

pub use catalog::CatalogService;
pub use providers::{tmdb::TmdbProvider, CatalogProvider};
pub use watchlist::WatchlistService;
