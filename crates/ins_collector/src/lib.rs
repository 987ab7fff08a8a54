use std::time::Duration;

pub mod collector;
pub mod sources;

pub use collector::Collector;
pub use sources::newsdata::NewsDataSource;
pub use sources::{NewsSource, SourceArticle};

pub const DEFAULT_BASE_URL: &str = "https://newsdata.io/api/1/news";

/// Value shipped in sample `.env` files; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_newsdata_key_here";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "artificial intelligence",
    "computer vision",
    "machine learning",
    "deep learning",
    "inteligencia artificial",
    "visao computacional",
    "automation",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub language: String,
    pub country: String,
    pub keywords: Vec<String>,
    /// Pause between two keyword searches.
    pub keyword_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "pt".to_string(),
            country: "br".to_string(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            keyword_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// True when an API key is present, non-blank and not the placeholder.
    pub fn is_valid(&self) -> bool {
        self.api_key
            .as_deref()
            .map(str::trim)
            .is_some_and(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
    }
}

pub mod prelude {
    pub use super::{Collector, Config, NewsDataSource, NewsSource, SourceArticle};
    pub use ins_core::{Error, NewArticle, Result};
}
