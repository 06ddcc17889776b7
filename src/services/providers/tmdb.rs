/// TMDB (The Movie Database) provider
///
/// API Flow:
/// 1. Search: /search/movie?query= → paged `results`
/// 2. Listings: /movie/{popular|top_rated|upcoming|now_playing} → paged `results`
///
/// Only the first page is requested; screens show one page at a time.
use crate::{
    error::{AppError, AppResult},
    models::{MovieCategory, MovieSummary, TmdbPage},
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }

    /// Issues a GET and decodes the paged result list
    async fn fetch_page(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Vec<MovieSummary>> {
        let url = self.endpoint(path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw TMDB API response");

        let page: TmdbPage = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })?;

        Ok(page.results.into_iter().map(MovieSummary::from).collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let movies = self
            .fetch_page("search/movie", &[("query", query), ("include_adult", "false")])
            .await?;

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = "tmdb",
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn movies_by_category(&self, category: MovieCategory) -> AppResult<Vec<MovieSummary>> {
        let movies = self
            .fetch_page(&format!("movie/{}", category.as_str()), &[])
            .await?;

        tracing::info!(
            category = %category,
            results = movies.len(),
            provider = "tmdb",
            "Category listing fetched"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
