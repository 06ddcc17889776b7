use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{watchlist::display_title, MovieSummary, WatchlistEntry};

/// A movie as the details screen receives it: fresh from the catalog or saved locally
#[derive(Debug, Clone, PartialEq)]
pub enum MovieView {
    Summary(MovieSummary),
    Saved(WatchlistEntry),
}

/// Where a `MovieDetails` was built from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovieSource {
    Catalog,
    Watchlist,
}

/// Canonical view model shared by every screen that shows a single movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub in_watchlist: bool,
    pub source: MovieSource,
}

impl MovieView {
    /// Normalizes either shape into one `MovieDetails`
    pub fn into_details(self, in_watchlist: bool) -> MovieDetails {
        match self {
            MovieView::Summary(summary) => MovieDetails {
                id: summary.id,
                title: display_title(summary.title.as_deref()),
                poster_path: summary.poster_path,
                vote_average: summary.vote_average,
                overview: summary.overview,
                backdrop_path: summary.backdrop_path,
                release_date: summary.release_date,
                in_watchlist,
                source: MovieSource::Catalog,
            },
            MovieView::Saved(entry) => MovieDetails {
                id: entry.id,
                title: entry.title,
                poster_path: entry.poster_path,
                vote_average: entry.vote_average,
                overview: entry.overview,
                backdrop_path: None,
                release_date: None,
                in_watchlist,
                source: MovieSource::Watchlist,
            },
        }
    }
}

impl From<MovieSummary> for MovieView {
    fn from(summary: MovieSummary) -> Self {
        MovieView::Summary(summary)
    }
}

impl From<WatchlistEntry> for MovieView {
    fn from(entry: WatchlistEntry) -> Self {
        MovieView::Saved(entry)
    }
}
