use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, normalized representation of one feed entry.
///
/// `title` is the merge key: two entries with the same title are the same item,
/// the one processed later wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Epoch millis of the entry's ISO date, the sort key. `None` when missing.
    pub date: Option<i64>,
    /// Publication timestamp carried through to the published feeds.
    pub time: Option<DateTime<Utc>>,
    pub author: String,
    pub cover: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

impl Item {
    /// Categories followed by tags, without repeats.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.categories.len() + self.tags.len());
        for label in self.categories.iter().chain(self.tags.iter()) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }
}

/// A parsed source document, consumed as soon as its entries are merged.
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub title: Option<String>,
    pub link: Option<String>,
    pub entries: Vec<RawEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub iso_date: Option<DateTime<Utc>>,
    pub pub_date: Option<DateTime<Utc>>,
    pub content_snippet: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub author: Option<String>,
    pub enclosure: Option<RawEnclosure>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawEnclosure {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("rss-aggregator/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed size exceeds limit: {size_mb}MB from {url}")]
    FeedTooLarge { url: String, size_mb: usize },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Failed to encode {format} feed: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AggregatorError {
    /// Transport-level failures (as opposed to document or local errors).
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            AggregatorError::Fetch(_)
                | AggregatorError::HttpStatus { .. }
                | AggregatorError::FeedTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
