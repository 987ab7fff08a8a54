use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use ins_collector::{Collector, NewsSource, SourceArticle};
use ins_core::{
    Article, ArticleStorage, Category, ConfidenceTier, Error, InferenceModel, Insight,
    InsightFilter, InsightStorage, InsightView, NewArticle, NewInsight, Page, PageRequest,
    ProcessingStatus, Result, Storage,
};
use ins_inference::models::StaticModel;
use ins_inference::Classifier;
use ins_pipeline::{Orchestrator, PipelineConfig};
use ins_storage::{InMemoryStorage, SQLiteStorage};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PORTUGUESE_REPLY: &str = r#"Aqui está a análise:
{"relevante":true,"motivo":"Lançamento de produto de visão computacional",
 "categoria":"PRODUTO","acaoSugerida":"Avaliar parceria técnica",
 "scoreConfianca":0.92,"resumoExecutivo":"Nova câmera inteligente",
 "palavrasChave":"visão computacional, varejo"}"#;

struct FixedSource {
    hits: Vec<SourceArticle>,
}

#[async_trait]
impl NewsSource for FixedSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _keyword: &str) -> Result<Vec<SourceArticle>> {
        Ok(self.hits.clone())
    }
}

/// Plays back replies in order; an `Err` entry simulates a transport failure.
struct ScriptedModel {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScriptedModel")
    }
}

impl ScriptedModel {
    fn new(replies: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl InferenceModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(Error::Inference(e)),
            None => Err(Error::Inference("script exhausted".to_string())),
        }
    }
}

fn hit(url: &str) -> SourceArticle {
    SourceArticle {
        title: Some(format!("Smart camera launch {}", url)),
        description: Some("A retailer deploys computer vision".to_string()),
        url: Some(url.to_string()),
        source: Some("wire".to_string()),
        published_at: Some(Utc::now()),
        language: Some("pt".to_string()),
        country: Some("br".to_string()),
        ..Default::default()
    }
}

fn new_article(url: &str) -> NewArticle {
    hit(url)
        .into_new_article("visao computacional", "wire")
        .unwrap()
}

fn product_insight(article_id: i64) -> NewInsight {
    NewInsight {
        article_id,
        is_relevant: true,
        category: Some(Category::Product),
        relevance_reason: Some("Vision product".to_string()),
        suggested_action: Some("Follow up".to_string()),
        confidence_score: Some(0.9),
        executive_summary: Some("Camera launch".to_string()),
        extracted_keywords: None,
        ai_model: "gemini-1.5-pro".to_string(),
        processing_time_ms: Some(40),
        processed_at: Utc::now(),
    }
}

fn orchestrator(
    store: Arc<dyn Storage>,
    hits: Vec<SourceArticle>,
    model: Arc<dyn InferenceModel>,
) -> Orchestrator {
    let collector = Collector::new(
        store.clone(),
        Arc::new(FixedSource { hits }),
        vec!["visao computacional".to_string()],
        Duration::ZERO,
    );
    let classifier = Classifier::new(model, store.clone());
    Orchestrator::new(
        store,
        collector,
        classifier,
        PipelineConfig {
            item_delay: Duration::ZERO,
            ..Default::default()
        },
    )
}

async fn assert_portuguese_scenario(store: Arc<dyn Storage>) {
    let model = Arc::new(StaticModel::new("gemini-1.5-pro", PORTUGUESE_REPLY));
    let orchestrator = orchestrator(store.clone(), vec![hit("https://news.example/1")], model);

    let run = orchestrator.run().await;
    assert!(run.is_success(), "{:?}", run.error);
    assert_eq!(run.collected, 1);
    assert_eq!(run.processed, 1);
    assert_eq!(run.retried, 0);

    let page = store
        .find_insights(&InsightFilter::default(), &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_elements, 1);
    let view = &page.content[0];
    assert_eq!(view.insight.category, Some(Category::Product));
    assert_eq!(view.confidence_tier, ConfidenceTier::High);
    assert_eq!(view.insight.ai_model, "gemini-1.5-pro");
    assert_eq!(
        view.insight.suggested_action.as_deref(),
        Some("Avaliar parceria técnica")
    );
    assert_eq!(view.article.url, "https://news.example/1");
    assert_eq!(
        store.count_by_status(ProcessingStatus::Completed).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_end_to_end_in_memory() {
    assert_portuguese_scenario(Arc::new(InMemoryStorage::new())).await;
}

#[tokio::test]
async fn test_end_to_end_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SQLiteStorage::new_with_path(&dir.path().join("e2e.db"))
        .await
        .unwrap();
    assert_portuguese_scenario(Arc::new(store)).await;
}

#[tokio::test]
async fn test_second_run_collects_nothing_new() {
    let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let model = Arc::new(StaticModel::new("static", PORTUGUESE_REPLY));
    let orchestrator = orchestrator(
        store.clone(),
        vec![hit("https://news.example/1"), hit("https://news.example/2")],
        model,
    );

    assert_eq!(orchestrator.run().await.collected, 2);
    let second = orchestrator.run().await;
    assert_eq!(second.collected, 0);
    assert_eq!(second.processed, 0);
    assert_eq!(store.count_articles().await.unwrap(), 2);
    assert_eq!(
        store.count_insights(&InsightFilter::default()).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_failure_then_success_on_retry() {
    let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let model = Arc::new(ScriptedModel::new(vec![
        Err("HTTP 503"),
        Ok(PORTUGUESE_REPLY),
    ]));
    let orchestrator = orchestrator(store.clone(), vec![hit("https://news.example/1")], model);

    let run = orchestrator.run().await;
    assert!(run.is_success());
    assert_eq!(run.processed, 0);
    assert_eq!(run.retried, 1);
    assert_eq!(
        store.count_by_status(ProcessingStatus::Completed).await.unwrap(),
        1
    );
    assert_eq!(
        store.count_insights(&InsightFilter::default()).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_every_article_ends_completed_or_failed() {
    let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(PORTUGUESE_REPLY),
        Ok(r#"{"relevant": true}"#),
        Ok("not json"),
        Err("timeout"),
        Ok(r#"{"relevant": false, "category": "PRODUCT", "confidence": 0.3}"#),
    ]));
    let hits = (1..=4)
        .map(|i| hit(&format!("https://news.example/{}", i)))
        .collect();
    let orchestrator = orchestrator(store.clone(), hits, model);

    let run = orchestrator.run().await;
    assert!(run.is_success());
    assert_eq!(run.collected, 4);
    assert_eq!(run.processed, 1);
    // Only the first retry finds a usable reply, the script then runs dry.
    assert_eq!(run.retried, 1);

    let completed = store.count_by_status(ProcessingStatus::Completed).await.unwrap();
    let failed = store.count_by_status(ProcessingStatus::Failed).await.unwrap();
    assert_eq!(completed, 2);
    assert_eq!(failed, 2);
    for status in [
        ProcessingStatus::Pending,
        ProcessingStatus::Processing,
        ProcessingStatus::Retrying,
    ] {
        assert_eq!(store.count_by_status(status).await.unwrap(), 0);
    }

    let irrelevant = store
        .find_insights(
            &InsightFilter {
                relevant: Some(false),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(irrelevant.total_elements, 1);
    assert_eq!(irrelevant.content[0].insight.category, Some(Category::Product));
}

/// In-memory store whose failed-article lookup always errors.
struct BrokenRetryStore {
    inner: InMemoryStorage,
}

#[async_trait]
impl ArticleStorage for BrokenRetryStore {
    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        self.inner.insert_article(article).await
    }
    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        self.inner.get_article(id).await
    }
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        self.inner.exists_by_url(url).await
    }
    async fn find_pending(&self) -> Result<Vec<Article>> {
        self.inner.find_pending().await
    }
    async fn find_failed(&self) -> Result<Vec<Article>> {
        Err(Error::Database("disk I/O error".to_string()))
    }
    async fn update_status(&self, id: i64, status: ProcessingStatus) -> Result<()> {
        self.inner.update_status(id, status).await
    }
    async fn reset_status(&self, from: ProcessingStatus, to: ProcessingStatus) -> Result<u64> {
        self.inner.reset_status(from, to).await
    }
    async fn count_articles(&self) -> Result<u64> {
        self.inner.count_articles().await
    }
    async fn count_by_status(&self, status: ProcessingStatus) -> Result<u64> {
        self.inner.count_by_status(status).await
    }
    async fn delete_articles_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.delete_articles_before(cutoff).await
    }
    async fn delete_articles_before_with_status(
        &self,
        cutoff: DateTime<Utc>,
        status: ProcessingStatus,
    ) -> Result<u64> {
        self.inner
            .delete_articles_before_with_status(cutoff, status)
            .await
    }
}

#[async_trait]
impl InsightStorage for BrokenRetryStore {
    async fn insert_insight(&self, insight: &NewInsight) -> Result<Insight> {
        self.inner.insert_insight(insight).await
    }
    async fn find_insight_by_article(&self, article_id: i64) -> Result<Option<Insight>> {
        self.inner.find_insight_by_article(article_id).await
    }
    async fn find_insights(
        &self,
        filter: &InsightFilter,
        page: &PageRequest,
    ) -> Result<Page<InsightView>> {
        self.inner.find_insights(filter, page).await
    }
    async fn find_processed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InsightView>> {
        self.inner.find_processed_between(start, end).await
    }
    async fn count_insights(&self, filter: &InsightFilter) -> Result<u64> {
        self.inner.count_insights(filter).await
    }
    async fn count_by_model(&self) -> Result<Vec<(String, u64)>> {
        self.inner.count_by_model().await
    }
    async fn delete_insights_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.delete_insights_before(cutoff).await
    }
}

#[async_trait]
impl Storage for BrokenRetryStore {
    fn backend_name(&self) -> &str {
        "broken"
    }
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_escaped_error_keeps_earlier_counts() {
    let store: Arc<dyn Storage> = Arc::new(BrokenRetryStore {
        inner: InMemoryStorage::new(),
    });
    let model = Arc::new(StaticModel::new("static", PORTUGUESE_REPLY));
    let orchestrator = orchestrator(store.clone(), vec![hit("https://news.example/1")], model);

    let run = orchestrator.run().await;
    assert!(!run.is_success());
    assert!(run.error.unwrap().contains("disk I/O error"));
    assert_eq!(run.collected, 1);
    assert_eq!(run.processed, 1);
    assert_eq!(run.retried, 0);
    assert_eq!(run.expired, 0);
}

#[tokio::test]
async fn test_articles_with_stored_insight_complete_without_model_call() {
    let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());

    // Insight written, final status write lost while PROCESSING.
    let interrupted = store
        .insert_article(&new_article("https://news.example/interrupted"))
        .await
        .unwrap();
    store
        .update_status(interrupted.id, ProcessingStatus::Processing)
        .await
        .unwrap();
    store
        .insert_insight(&product_insight(interrupted.id))
        .await
        .unwrap();

    // Insight written, then forced to FAILED.
    let forced = store
        .insert_article(&new_article("https://news.example/forced"))
        .await
        .unwrap();
    store
        .update_status(forced.id, ProcessingStatus::Failed)
        .await
        .unwrap();
    store.insert_insight(&product_insight(forced.id)).await.unwrap();

    // An empty script fails every model call.
    let model = Arc::new(ScriptedModel::new(vec![]));
    let orchestrator = orchestrator(store.clone(), vec![], model);

    assert_eq!(orchestrator.reconcile_stale().await.unwrap(), 1);
    let run = orchestrator.run().await;
    assert!(run.is_success(), "{:?}", run.error);
    assert_eq!(run.processed, 1);
    assert_eq!(run.retried, 1);

    for id in [interrupted.id, forced.id] {
        let article = store.get_article(id).await.unwrap().unwrap();
        assert_eq!(article.status, ProcessingStatus::Completed);
    }
    assert_eq!(
        store.count_insights(&InsightFilter::default()).await.unwrap(),
        2
    );

    let again = orchestrator.run().await;
    assert_eq!(again.processed, 0);
    assert_eq!(again.retried, 0);
    assert_eq!(
        store.count_by_status(ProcessingStatus::Completed).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_run_expires_old_articles_and_their_insights() {
    let memory = Arc::new(InMemoryStorage::new());
    let old = memory
        .insert_article(&new_article("https://news.example/old"))
        .await
        .unwrap();
    memory
        .update_status(old.id, ProcessingStatus::Completed)
        .await
        .unwrap();
    memory.insert_insight(&product_insight(old.id)).await.unwrap();
    memory
        .set_article_created_at(old.id, Utc::now() - ChronoDuration::days(8))
        .await
        .unwrap();

    let store: Arc<dyn Storage> = memory.clone();
    let model = Arc::new(StaticModel::new("static", PORTUGUESE_REPLY));
    let orchestrator = orchestrator(store.clone(), vec![hit("https://news.example/fresh")], model);

    let run = orchestrator.run().await;
    assert!(run.is_success(), "{:?}", run.error);
    assert_eq!(run.collected, 1);
    assert_eq!(run.processed, 1);
    assert_eq!(run.expired, 1);

    assert!(store.get_article(old.id).await.unwrap().is_none());
    assert!(store.find_insight_by_article(old.id).await.unwrap().is_none());
    assert_eq!(store.count_articles().await.unwrap(), 1);
    assert_eq!(
        store.count_insights(&InsightFilter::default()).await.unwrap(),
        1
    );
}
