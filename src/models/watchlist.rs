use serde::{Deserialize, Serialize};

use super::MovieSummary;

/// Title stored when the catalog omitted one
pub const UNTITLED: &str = "Untitled";

/// One saved movie, keyed by the catalog's movie id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct WatchlistEntry {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
}

/// Blank titles count as missing
pub(crate) fn display_title(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNTITLED.to_string(),
    }
}

impl From<&MovieSummary> for WatchlistEntry {
    fn from(summary: &MovieSummary) -> Self {
        Self {
            id: summary.id,
            title: display_title(summary.title.as_deref()),
            poster_path: summary.poster_path.clone(),
            vote_average: summary.vote_average,
            overview: summary.overview.clone(),
        }
    }
}

impl From<&WatchlistEntry> for MovieSummary {
    fn from(entry: &WatchlistEntry) -> Self {
        Self {
            id: entry.id,
            title: Some(entry.title.clone()),
            poster_path: entry.poster_path.clone(),
            vote_average: entry.vote_average,
            overview: entry.overview.clone(),
            backdrop_path: None,
            release_date: None,
        }
    }
}
