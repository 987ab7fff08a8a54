use chrono::{Duration as ChronoDuration, Utc};
use ins_collector::Collector;
use ins_core::{Article, Error, ProcessingStatus, Result, Storage};
use ins_inference::Classifier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;

/// Counters for one full pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub collected: usize,
    pub processed: usize,
    pub retried: usize,
    pub expired: u64,
    pub elapsed_ms: u64,
    /// Set only when an error escaped the run; the counters above are kept.
    pub error: Option<String>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Orchestrator {
    store: Arc<dyn Storage>,
    collector: Collector,
    classifier: Classifier,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Storage>,
        collector: Collector,
        classifier: Classifier,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            collector,
            classifier,
            config,
        }
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Collect, process, retry and expire, strictly in that order.
    pub async fn run(&self) -> PipelineRun {
        info!("🚀 Starting pipeline run");
        let started = Instant::now();
        let mut run = PipelineRun::default();

        if let Err(e) = self.run_phases(&mut run).await {
            error!("❌ Pipeline run aborted: {}", e);
            run.error = Some(e.to_string());
        }
        run.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            "🏁 Pipeline finished in {}ms: {} collected, {} processed, {} retried, {} expired",
            run.elapsed_ms, run.collected, run.processed, run.retried, run.expired
        );
        run
    }

    async fn run_phases(&self, run: &mut PipelineRun) -> Result<()> {
        info!("📡 Phase 1: collecting news");
        run.collected = self.collector.collect_all().await?;

        info!("🤖 Phase 2: processing pending articles");
        run.processed = self.process_pending().await?;

        info!("🔁 Phase 3: retrying failed articles");
        run.retried = self.retry_failed().await?;

        info!("🧹 Phase 4: expiring old articles");
        run.expired = self.expire_old().await?;
        Ok(())
    }

    pub async fn collect_only(&self) -> Result<usize> {
        info!("📡 Running collection only");
        self.collector.collect_all().await
    }

    pub async fn process_only(&self) -> Result<usize> {
        info!("🤖 Running processing only");
        self.process_pending().await
    }

    pub async fn retry_only(&self) -> Result<usize> {
        info!("🔁 Running retry only");
        self.retry_failed().await
    }

    /// Put rows left in flight by an interrupted process back where the
    /// pipeline will pick them up again.
    pub async fn reconcile_stale(&self) -> Result<u64> {
        let pending = self
            .store
            .reset_status(ProcessingStatus::Processing, ProcessingStatus::Pending)
            .await?;
        let failed = self
            .store
            .reset_status(ProcessingStatus::Retrying, ProcessingStatus::Failed)
            .await?;
        if pending + failed > 0 {
            warn!(
                "⚠️ Reset {} interrupted articles to PENDING and {} to FAILED",
                pending, failed
            );
        }
        Ok(pending + failed)
    }

    /// Classify every `PENDING` article. Returns how many reached `COMPLETED`.
    pub async fn process_pending(&self) -> Result<usize> {
        let pending = self.store.find_pending().await?;
        info!("📰 {} pending articles", pending.len());
        let completed = self
            .work_through(pending, ProcessingStatus::Processing)
            .await;
        info!("✅ Processing done: {} completed", completed);
        Ok(completed)
    }

    /// Give every `FAILED` article one more attempt.
    pub async fn retry_failed(&self) -> Result<usize> {
        let failed = self.store.find_failed().await?;
        info!("📰 {} failed articles to retry", failed.len());
        let completed = self.work_through(failed, ProcessingStatus::Retrying).await;
        info!("✅ Retry done: {} completed", completed);
        Ok(completed)
    }

    pub async fn expire_old(&self) -> Result<u64> {
        let cutoff = Utc::now() - ChronoDuration::days(self.config.expire_after_days);
        let expired = self.store.delete_articles_before(cutoff).await?;
        info!(
            "🗑️ Expired {} articles older than {} days",
            expired, self.config.expire_after_days
        );
        Ok(expired)
    }

    async fn work_through(&self, articles: Vec<Article>, in_flight: ProcessingStatus) -> usize {
        let mut completed = 0;
        for (i, article) in articles.into_iter().enumerate() {
            if i > 0 && !self.config.item_delay.is_zero() {
                tokio::time::sleep(self.config.item_delay).await;
            }
            match self.handle_article(&article, in_flight).await {
                Ok(true) => completed += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("❌ Error while handling article {}: {}", article.id, e);
                    if let Err(e) = self
                        .store
                        .update_status(article.id, ProcessingStatus::Failed)
                        .await
                    {
                        error!("❌ Could not mark article {} as failed: {}", article.id, e);
                    }
                }
            }
        }
        completed
    }

    /// Drive one article through `in_flight` to `COMPLETED` or `FAILED`.
    /// An article that already has an insight completes without a model call.
    async fn handle_article(&self, article: &Article, in_flight: ProcessingStatus) -> Result<bool> {
        let mut status = article.status;
        self.advance(article.id, &mut status, in_flight).await?;

        // Left behind by a run that stored the insight but died before the
        // final status write.
        if self.store.find_insight_by_article(article.id).await?.is_some() {
            info!(
                "♻️ Article {} already has an insight, marking it completed",
                article.id
            );
            self.advance(article.id, &mut status, ProcessingStatus::Completed)
                .await?;
            return Ok(true);
        }

        let classification = self.classifier.classify(article).await;
        if classification.is_successful() {
            self.classifier.persist(article, &classification).await?;
            self.advance(article.id, &mut status, ProcessingStatus::Completed)
                .await?;
            Ok(true)
        } else {
            self.advance(article.id, &mut status, ProcessingStatus::Failed)
                .await?;
            Ok(false)
        }
    }

    async fn advance(
        &self,
        article_id: i64,
        current: &mut ProcessingStatus,
        next: ProcessingStatus,
    ) -> Result<()> {
        if !current.can_transition_to(next) {
            return Err(Error::IllegalTransition {
                article_id,
                from: *current,
                to: next,
            });
        }
        self.store.update_status(article_id, next).await?;
        debug!("Article {}: {} -> {}", article_id, current, next);
        *current = next;
        Ok(())
    }
}
