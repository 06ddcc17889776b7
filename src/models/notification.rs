use serde::Serialize;
use std::fmt::Display;

/// Most recent user-facing watchlist message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Added { title: String },
    AlreadyPresent,
    Removed { title: String },
}

impl Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::Added { title } => write!(f, "✅ Added to Watchlist: {}", title),
            Notification::AlreadyPresent => write!(f, "⚠️ Movie already in Watchlist"),
            Notification::Removed { title } => write!(f, "❌ Removed from Watchlist: {}", title),
        }
    }
}
