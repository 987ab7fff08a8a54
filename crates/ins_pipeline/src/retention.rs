use chrono::{Duration, Utc};
use ins_core::{ProcessingStatus, Result, Storage};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::RetentionConfig;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub old_articles: u64,
    pub failed_articles: u64,
    pub stale_pending: u64,
    pub old_insights: u64,
}

impl SweepReport {
    pub fn total(&self) -> u64 {
        self.old_articles + self.failed_articles + self.stale_pending + self.old_insights
    }
}

/// Article counts by status at the time of a health check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub retrying: u64,
}

impl HealthReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

pub struct RetentionSweeper {
    store: Arc<dyn Storage>,
    config: RetentionConfig,
}

fn cutoff(days: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn Storage>, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    pub async fn cleanup_old_articles(&self, days: i64) -> Result<u64> {
        let removed = self.store.delete_articles_before(cutoff(days)).await?;
        info!("🗑️ Removed {} articles older than {} days", removed, days);
        Ok(removed)
    }

    pub async fn cleanup_failed_articles(&self, days: i64) -> Result<u64> {
        let removed = self
            .store
            .delete_articles_before_with_status(cutoff(days), ProcessingStatus::Failed)
            .await?;
        info!("🗑️ Removed {} failed articles older than {} days", removed, days);
        Ok(removed)
    }

    pub async fn cleanup_stale_pending(&self, days: i64) -> Result<u64> {
        let removed = self
            .store
            .delete_articles_before_with_status(cutoff(days), ProcessingStatus::Pending)
            .await?;
        info!("🗑️ Removed {} articles pending for more than {} days", removed, days);
        Ok(removed)
    }

    pub async fn cleanup_old_insights(&self, days: i64) -> Result<u64> {
        let removed = self.store.delete_insights_before(cutoff(days)).await?;
        info!("🗑️ Removed {} insights older than {} days", removed, days);
        Ok(removed)
    }

    pub async fn run_daily(&self) -> Result<SweepReport> {
        info!("🧹 Starting daily cleanup");
        let report = SweepReport {
            old_articles: self.cleanup_old_articles(self.config.old_article_days).await?,
            failed_articles: self
                .cleanup_failed_articles(self.config.failed_article_days)
                .await?,
            stale_pending: self
                .cleanup_stale_pending(self.config.stale_pending_days)
                .await?,
            old_insights: self.cleanup_old_insights(self.config.old_insight_days).await?,
        };
        info!("✅ Daily cleanup finished, {} rows removed", report.total());
        Ok(report)
    }

    pub async fn run_light(&self) -> Result<SweepReport> {
        let report = SweepReport {
            failed_articles: self
                .cleanup_failed_articles(self.config.light_failed_article_days)
                .await?,
            ..Default::default()
        };
        if report.total() > 0 {
            info!("✅ Light cleanup removed {} failed articles", report.total());
        }
        Ok(report)
    }

    /// Count articles by status and warn when any are `FAILED`.
    pub async fn health_check(&self) -> Result<HealthReport> {
        let report = HealthReport {
            total: self.store.count_articles().await?,
            pending: self.store.count_by_status(ProcessingStatus::Pending).await?,
            processing: self.store.count_by_status(ProcessingStatus::Processing).await?,
            completed: self.store.count_by_status(ProcessingStatus::Completed).await?,
            failed: self.store.count_by_status(ProcessingStatus::Failed).await?,
            retrying: self.store.count_by_status(ProcessingStatus::Retrying).await?,
        };
        if report.has_failures() {
            warn!(
                "⚠️ {} articles are FAILED (total {}, pending {}, completed {})",
                report.failed, report.total, report.pending, report.completed
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ins_core::{ArticleStorage, InsightStorage, NewArticle, NewInsight};
    use ins_storage::InMemoryStorage;

    fn new_article(url: &str) -> NewArticle {
        NewArticle {
            url: url.to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            content: None,
            image_url: None,
            source: "wire".to_string(),
            author: None,
            published_at: None,
            language: "en".to_string(),
            country: "us".to_string(),
            keyword: "ai".to_string(),
        }
    }

    async fn aged_article(
        store: &InMemoryStorage,
        url: &str,
        days_old: i64,
        status: ProcessingStatus,
    ) -> i64 {
        let article = store.insert_article(&new_article(url)).await.unwrap();
        store.update_status(article.id, status).await.unwrap();
        store
            .set_article_created_at(article.id, cutoff(days_old))
            .await
            .unwrap();
        article.id
    }

    #[tokio::test]
    async fn test_daily_sweep() {
        let store = Arc::new(InMemoryStorage::new());
        aged_article(&store, "https://a/old", 40, ProcessingStatus::Completed).await;
        aged_article(&store, "https://a/failed", 10, ProcessingStatus::Failed).await;
        aged_article(&store, "https://a/stale", 5, ProcessingStatus::Pending).await;
        let keep = aged_article(&store, "https://a/fresh", 1, ProcessingStatus::Failed).await;
        let done = aged_article(&store, "https://a/done", 20, ProcessingStatus::Completed).await;

        let insight = store
            .insert_insight(&NewInsight {
                article_id: done,
                is_relevant: true,
                category: None,
                relevance_reason: None,
                suggested_action: None,
                confidence_score: None,
                executive_summary: None,
                extracted_keywords: None,
                ai_model: "static".to_string(),
                processing_time_ms: None,
                processed_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .set_insight_created_at(insight.id, cutoff(70))
            .await
            .unwrap();

        let sweeper = RetentionSweeper::new(store.clone(), RetentionConfig::default());
        let report = sweeper.run_daily().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                old_articles: 1,
                failed_articles: 1,
                stale_pending: 1,
                old_insights: 1,
            }
        );
        assert_eq!(report.total(), 4);
        assert_eq!(store.count_articles().await.unwrap(), 2);
        assert!(store.get_article(keep).await.unwrap().is_some());
        assert!(store.get_article(done).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_light_sweep_only_touches_failed() {
        let store = Arc::new(InMemoryStorage::new());
        aged_article(&store, "https://a/failed", 4, ProcessingStatus::Failed).await;
        aged_article(&store, "https://a/pending", 4, ProcessingStatus::Pending).await;

        let sweeper = RetentionSweeper::new(store.clone(), RetentionConfig::default());
        let report = sweeper.run_light().await.unwrap();
        assert_eq!(report.failed_articles, 1);
        assert_eq!(report.total(), 1);
        assert_eq!(store.count_articles().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_health_check_counts() {
        let store = Arc::new(InMemoryStorage::new());
        aged_article(&store, "https://a/1", 0, ProcessingStatus::Failed).await;
        aged_article(&store, "https://a/2", 0, ProcessingStatus::Pending).await;

        let sweeper = RetentionSweeper::new(store, RetentionConfig::default());
        let report = sweeper.health_check().await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pending, 1);
        assert!(report.has_failures());
    }
}
