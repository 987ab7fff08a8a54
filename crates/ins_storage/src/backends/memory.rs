use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ins_core::{
    Article, ArticleRef, ArticleStorage, Error, Insight, InsightFilter, InsightStorage,
    InsightView, NewArticle, NewInsight, Page, PageRequest, ProcessingStatus, Result,
    SortDirection, SortField, Storage,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: BTreeMap<i64, Article>,
    insights: BTreeMap<i64, Insight>,
    next_article_id: i64,
    next_insight_id: i64,
}

impl MemoryStore {
    fn matches(insight: &Insight, filter: &InsightFilter) -> bool {
        filter.category.map_or(true, |c| insight.category == Some(c))
            && filter.relevant.map_or(true, |r| insight.is_relevant == r)
    }

    fn view(&self, insight: &Insight) -> Option<InsightView> {
        self.articles
            .get(&insight.article_id)
            .map(|article| InsightView::new(insight.clone(), ArticleRef::from(article)))
    }

    fn remove_articles<F>(&mut self, predicate: F) -> u64
    where
        F: Fn(&Article) -> bool,
    {
        let doomed: Vec<i64> = self
            .articles
            .values()
            .filter(|a| predicate(a))
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            self.articles.remove(id);
        }
        self.insights.retain(|_, i| !doomed.contains(&i.article_id));
        doomed.len() as u64
    }
}

fn compare(a: &Insight, b: &Insight, field: SortField) -> Ordering {
    let primary = match field {
        SortField::ProcessedAt => a.processed_at.cmp(&b.processed_at),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Id => Ordering::Equal,
        SortField::ConfidenceScore => match (a.confidence_score, b.confidence_score) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary.then(a.id.cmp(&b.id))
}

/// Process-local backend used for tests and throwaway runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides an article's creation time. Used to seed aged fixtures.
    pub async fn set_article_created_at(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        let article = store
            .articles
            .get_mut(&id)
            .ok_or_else(|| Error::Storage(format!("Article {} not found", id)))?;
        article.created_at = at;
        Ok(())
    }

    /// Overrides an insight's creation time. Used to seed aged fixtures.
    pub async fn set_insight_created_at(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        let insight = store
            .insights
            .get_mut(&id)
            .ok_or_else(|| Error::Storage(format!("Insight {} not found", id)))?;
        insight.created_at = at;
        Ok(())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        if store.articles.values().any(|a| a.url == article.url) {
            return Err(Error::Storage(format!(
                "Article with URL {} already exists",
                article.url
            )));
        }
        store.next_article_id += 1;
        let now = Utc::now();
        let stored = Article {
            id: store.next_article_id,
            url: article.url.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone(),
            source: article.source.clone(),
            author: article.author.clone(),
            published_at: article.published_at,
            language: article.language.clone(),
            country: article.country.clone(),
            keyword: article.keyword.clone(),
            status: ProcessingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store.articles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.get(&id).cloned())
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.articles.values().any(|a| a.url == url))
    }

    async fn find_pending(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .values()
            .filter(|a| a.status == ProcessingStatus::Pending)
            .cloned()
            .collect();
        // Newest publication first; undated articles last.
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(a.id.cmp(&b.id)));
        Ok(articles)
    }

    async fn find_failed(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .values()
            .filter(|a| a.status == ProcessingStatus::Failed)
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(articles)
    }

    async fn update_status(&self, id: i64, status: ProcessingStatus) -> Result<()> {
        let mut store = self.store.write().await;
        let article = store
            .articles
            .get_mut(&id)
            .ok_or_else(|| Error::Storage(format!("Article {} not found", id)))?;
        article.status = status;
        article.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_status(&self, from: ProcessingStatus, to: ProcessingStatus) -> Result<u64> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let mut moved = 0;
        for article in store.articles.values_mut().filter(|a| a.status == from) {
            article.status = to;
            article.updated_at = now;
            moved += 1;
        }
        Ok(moved)
    }

    async fn count_articles(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.articles.len() as u64)
    }

    async fn count_by_status(&self, status: ProcessingStatus) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.articles.values().filter(|a| a.status == status).count() as u64)
    }

    async fn delete_articles_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut store = self.store.write().await;
        Ok(store.remove_articles(|a| a.created_at < cutoff))
    }

    async fn delete_articles_before_with_status(
        &self,
        cutoff: DateTime<Utc>,
        status: ProcessingStatus,
    ) -> Result<u64> {
        let mut store = self.store.write().await;
        Ok(store.remove_articles(|a| a.created_at < cutoff && a.status == status))
    }
}

#[async_trait]
impl InsightStorage for InMemoryStorage {
    async fn insert_insight(&self, insight: &NewInsight) -> Result<Insight> {
        let mut store = self.store.write().await;
        if !store.articles.contains_key(&insight.article_id) {
            return Err(Error::Storage(format!(
                "Article {} not found",
                insight.article_id
            )));
        }
        if store.insights.values().any(|i| i.article_id == insight.article_id) {
            return Err(Error::Storage(format!(
                "Article {} already has an insight",
                insight.article_id
            )));
        }
        store.next_insight_id += 1;
        let now = Utc::now();
        let stored = Insight {
            id: store.next_insight_id,
            article_id: insight.article_id,
            is_relevant: insight.is_relevant,
            category: insight.category,
            relevance_reason: insight.relevance_reason.clone(),
            suggested_action: insight.suggested_action.clone(),
            confidence_score: insight.confidence_score,
            executive_summary: insight.executive_summary.clone(),
            extracted_keywords: insight.extracted_keywords.clone(),
            ai_model: insight.ai_model.clone(),
            processing_time_ms: insight.processing_time_ms,
            processed_at: insight.processed_at,
            created_at: now,
            updated_at: now,
        };
        store.insights.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_insight_by_article(&self, article_id: i64) -> Result<Option<Insight>> {
        let store = self.store.read().await;
        Ok(store
            .insights
            .values()
            .find(|i| i.article_id == article_id)
            .cloned())
    }

    async fn find_insights(
        &self,
        filter: &InsightFilter,
        page: &PageRequest,
    ) -> Result<Page<InsightView>> {
        let store = self.store.read().await;
        let mut matching: Vec<&Insight> = store
            .insights
            .values()
            .filter(|i| MemoryStore::matches(i, filter))
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, page.sort.field);
            match page.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        let total = matching.len() as u64;
        let content = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .filter_map(|i| store.view(i))
            .collect();
        Ok(Page::new(content, page, total))
    }

    async fn find_processed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InsightView>> {
        let store = self.store.read().await;
        let mut matching: Vec<&Insight> = store
            .insights
            .values()
            .filter(|i| i.processed_at >= start && i.processed_at < end)
            .collect();
        matching.sort_by(|a, b| compare(b, a, SortField::ProcessedAt));
        Ok(matching.into_iter().filter_map(|i| store.view(i)).collect())
    }

    async fn count_insights(&self, filter: &InsightFilter) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store
            .insights
            .values()
            .filter(|i| MemoryStore::matches(i, filter))
            .count() as u64)
    }

    async fn count_by_model(&self) -> Result<Vec<(String, u64)>> {
        let store = self.store.read().await;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for insight in store.insights.values() {
            *counts.entry(insight.ai_model.clone()).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn delete_insights_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut store = self.store.write().await;
        let before = store.insights.len();
        store.insights.retain(|_, i| i.created_at >= cutoff);
        Ok((before - store.insights.len()) as u64)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
