use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database file holding the watchlist table
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Upper bound on pooled SQLite connections
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Snapshots buffered per watchlist subscriber before it is resynchronised
    #[serde(default = "default_watchlist_channel_capacity")]
    pub watchlist_channel_capacity: usize,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings needed to open the watchlist store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub channel_capacity: usize,
}

impl StoreConfig {
    /// Store settings for a database file with default pool and channel sizes
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: default_database_max_connections(),
            channel_capacity: default_watchlist_channel_capacity(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("watchlist.db")
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_watchlist_channel_capacity() -> usize {
    64
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.database_path.clone(),
            max_connections: self.database_max_connections,
            channel_capacity: self.watchlist_channel_capacity,
        }
    }

    /// Address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
