use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use ins_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

use super::{NewsSource, SourceArticle};
use crate::Config;

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    status: String,
    #[serde(rename = "totalResults", default)]
    total_results: Option<u64>,
    #[serde(default)]
    results: Option<Vec<NewsDataArticle>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// NewsData.io sends some fields either as a string or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn joined(self) -> String {
        match self {
            OneOrMany::One(value) => value,
            OneOrMany::Many(values) => values.join(", "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsDataArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, alias = "url")]
    link: Option<String>,
    #[serde(default, alias = "image")]
    image_url: Option<String>,
    #[serde(default, alias = "source")]
    source_id: Option<String>,
    #[serde(default, alias = "author")]
    creator: Option<OneOrMany>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    country: Option<OneOrMany>,
}

impl From<NewsDataArticle> for SourceArticle {
    fn from(raw: NewsDataArticle) -> Self {
        SourceArticle {
            published_at: raw.pub_date.as_deref().and_then(parse_pub_date),
            title: raw.title,
            description: raw.description,
            content: raw.content,
            url: raw.link,
            image_url: raw.image_url,
            source: raw.source_id,
            author: raw.creator.map(OneOrMany::joined),
            language: raw.language,
            country: raw.country.map(OneOrMany::joined),
        }
    }
}

/// `pubDate` comes as `YYYY-MM-DD HH:MM:SS` in UTC, occasionally as RFC 3339.
fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            debug!("Ignoring unparseable pubDate: {}", value);
            None
        }
    }
}

pub struct NewsDataSource {
    client: Client,
    config: Config,
    base_url: Url,
}

impl fmt::Debug for NewsDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsDataSource")
            .field("api_key", &self.config.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("language", &self.config.language)
            .field("country", &self.config.country)
            .finish()
    }
}

impl NewsDataSource {
    pub fn new(config: Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid NewsData base URL {}: {}", config.base_url, e)))?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait]
impl NewsSource for NewsDataSource {
    fn name(&self) -> &str {
        "newsdata"
    }

    fn is_configured(&self) -> bool {
        self.config.is_valid()
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SourceArticle>> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        debug!("Querying NewsData.io for '{}'", keyword);

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("apikey", api_key),
                ("q", keyword),
                ("language", self.config.language.as_str()),
                ("country", self.config.country.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Collection(format!(
                "NewsData.io HTTP {} for '{}': {}",
                status, keyword, body
            )));
        }

        let body = response.text().await?;
        let reply: NewsDataResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Collection(format!("Malformed NewsData.io reply: {}", e)))?;

        if reply.status != "success" {
            return Err(Error::Collection(format!(
                "NewsData.io returned status '{}' ({}): {}",
                reply.status,
                reply.code.unwrap_or_default(),
                reply.message.unwrap_or_default()
            )));
        }

        let results = reply.results.unwrap_or_default();
        if let Some(total) = reply.total_results {
            debug!("NewsData.io reports {} total results for '{}'", total, keyword);
        }
        if results.is_empty() {
            warn!("No NewsData.io results for '{}'", keyword);
        }
        Ok(results.into_iter().map(SourceArticle::from).collect())
    }
}
