use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

pub mod movie_view;
pub mod notification;
pub mod watchlist;

pub use movie_view::{MovieDetails, MovieSource, MovieView};
pub use notification::Notification;
pub use watchlist::{WatchlistEntry, UNTITLED};

/// Transient movie record fetched from the remote catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

impl MovieSummary {
    /// Summary carrying only an id and a title
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            poster_path: None,
            vote_average: None,
            overview: None,
            backdrop_path: None,
            release_date: None,
        }
    }
}

/// Catalog listings the home screen pulls from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovieCategory {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
}

impl MovieCategory {
    /// Path segment used by the catalog API
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieCategory::Popular => "popular",
            MovieCategory::TopRated => "top_rated",
            MovieCategory::Upcoming => "upcoming",
            MovieCategory::NowPlaying => "now_playing",
        }
    }
}

impl Display for MovieCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MovieCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "popular" => Ok(MovieCategory::Popular),
            "top_rated" => Ok(MovieCategory::TopRated),
            "upcoming" => Ok(MovieCategory::Upcoming),
            "now_playing" => Ok(MovieCategory::NowPlaying),
            other => Err(AppError::InvalidInput(format!(
                "Unknown movie category: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged list response from TMDB search and category endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// Raw movie record as TMDB returns it
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// TMDB sends an empty string for unknown dates
    #[serde(default)]
    pub release_date: Option<String>,
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        let release_date = movie
            .release_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        MovieSummary {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path,
            vote_average: movie.vote_average,
            overview: movie.overview.filter(|o| !o.is_empty()),
            backdrop_path: movie.backdrop_path,
            release_date,
        }
    }
}
