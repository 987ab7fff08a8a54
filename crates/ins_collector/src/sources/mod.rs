use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ins_core::{NewArticle, Result};

pub mod newsdata;

/// A news-search provider queried once per keyword.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// False when credentials are missing; the collector then skips the request.
    fn is_configured(&self) -> bool {
        true
    }

    /// Run one search. A provider-level failure (bad status, malformed body)
    /// is an `Err`; an empty hit list is `Ok(vec![])`.
    async fn search(&self, keyword: &str) -> Result<Vec<SourceArticle>>;
}

/// One search hit before validation. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub country: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl SourceArticle {
    /// A hit is storable only with a non-blank title, description and URL.
    pub fn is_valid(&self) -> bool {
        present(&self.title) && present(&self.description) && present(&self.url)
    }

    pub fn short_title(&self, max: usize) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        if title.chars().count() > max {
            format!("{}...", title.chars().take(max).collect::<String>())
        } else {
            title.to_string()
        }
    }

    /// Convert a valid hit into a storable article; `None` when invalid.
    pub fn into_new_article(self, keyword: &str, fallback_source: &str) -> Option<NewArticle> {
        if !self.is_valid() {
            return None;
        }
        Some(NewArticle {
            url: self.url?.trim().to_string(),
            title: self.title?,
            description: self.description?,
            content: self.content.filter(|c| !c.trim().is_empty()),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            source: self
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| fallback_source.to_string()),
            author: self.author.filter(|a| !a.trim().is_empty()),
            published_at: self.published_at,
            language: self.language.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            keyword: keyword.to_string(),
        })
    }
}
