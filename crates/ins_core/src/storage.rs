use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::paging::{InsightFilter, Page, PageRequest};
use crate::types::{Article, Insight, InsightView, NewArticle, NewInsight, ProcessingStatus};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Store a new article in `PENDING` state. Fails if the URL already exists.
    async fn insert_article(&self, article: &NewArticle) -> Result<Article>;

    async fn get_article(&self, id: i64) -> Result<Option<Article>>;

    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Articles waiting for classification, newest publication first.
    async fn find_pending(&self) -> Result<Vec<Article>>;

    /// Articles whose last classification failed, most recently updated first.
    async fn find_failed(&self) -> Result<Vec<Article>>;

    async fn update_status(&self, id: i64, status: ProcessingStatus) -> Result<()>;

    /// Move every article in `from` to `to`, returning how many moved.
    async fn reset_status(&self, from: ProcessingStatus, to: ProcessingStatus) -> Result<u64>;

    async fn count_articles(&self) -> Result<u64>;

    async fn count_by_status(&self, status: ProcessingStatus) -> Result<u64>;

    /// Delete articles (and their insights) created before `cutoff`.
    async fn delete_articles_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn delete_articles_before_with_status(
        &self,
        cutoff: DateTime<Utc>,
        status: ProcessingStatus,
    ) -> Result<u64>;
}

#[async_trait]
pub trait InsightStorage: Send + Sync {
    /// Store an insight. Fails if the article already has one.
    async fn insert_insight(&self, insight: &NewInsight) -> Result<Insight>;

    async fn find_insight_by_article(&self, article_id: i64) -> Result<Option<Insight>>;

    async fn find_insights(
        &self,
        filter: &InsightFilter,
        page: &PageRequest,
    ) -> Result<Page<InsightView>>;

    /// Insights processed within `[start, end)`, most recent first.
    async fn find_processed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InsightView>>;

    async fn count_insights(&self, filter: &InsightFilter) -> Result<u64>;

    /// Insight counts grouped by AI model name.
    async fn count_by_model(&self) -> Result<Vec<(String, u64)>>;

    async fn delete_insights_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// A backend holding both tables.
#[async_trait]
pub trait Storage: ArticleStorage + InsightStorage {
    fn backend_name(&self) -> &str;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<()>;
}
