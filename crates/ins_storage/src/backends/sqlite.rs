use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use ins_core::{
    Article, ArticleRef, ArticleStorage, Category, Error, Insight, InsightFilter, InsightStorage,
    InsightView, NewArticle, NewInsight, Page, PageRequest, ProcessingStatus, Result, Storage,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        content TEXT,
        image_url TEXT,
        source TEXT NOT NULL,
        author TEXT,
        published_at TEXT,
        language TEXT NOT NULL,
        country TEXT NOT NULL,
        keyword TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'PENDING',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_status ON articles (status)",
    "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles (created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS insights (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL UNIQUE REFERENCES articles (id) ON DELETE CASCADE,
        is_relevant INTEGER NOT NULL,
        category TEXT,
        relevance_reason TEXT,
        suggested_action TEXT,
        confidence_score REAL,
        executive_summary TEXT,
        extracted_keywords TEXT,
        ai_model TEXT NOT NULL,
        processing_time_ms INTEGER,
        processed_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_insights_processed_at ON insights (processed_at)",
    "CREATE INDEX IF NOT EXISTS idx_insights_created_at ON insights (created_at)",
    // Add future migrations here
];

const INSIGHT_VIEW_SELECT: &str = r#"
    SELECT i.*, a.title AS article_title, a.source AS article_source, a.url AS article_url
    FROM insights i
    JOIN articles a ON a.id = i.article_id
"#;

/// Fixed-width UTC timestamps so that text comparison follows time order.
fn to_db_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse timestamp {}: {}", value, e)))
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let get = db_error("Failed to read article row");
    let published_at: Option<String> = row.try_get("published_at").map_err(&get)?;
    let status: String = row.try_get("status").map_err(&get)?;
    Ok(Article {
        id: row.try_get("id").map_err(&get)?,
        url: row.try_get("url").map_err(&get)?,
        title: row.try_get("title").map_err(&get)?,
        description: row.try_get("description").map_err(&get)?,
        content: row.try_get("content").map_err(&get)?,
        image_url: row.try_get("image_url").map_err(&get)?,
        source: row.try_get("source").map_err(&get)?,
        author: row.try_get("author").map_err(&get)?,
        published_at: published_at.as_deref().map(from_db_time).transpose()?,
        language: row.try_get("language").map_err(&get)?,
        country: row.try_get("country").map_err(&get)?,
        keyword: row.try_get("keyword").map_err(&get)?,
        status: status.parse()?,
        created_at: from_db_time(&row.try_get::<String, _>("created_at").map_err(&get)?)?,
        updated_at: from_db_time(&row.try_get::<String, _>("updated_at").map_err(&get)?)?,
    })
}

fn insight_from_row(row: &SqliteRow) -> Result<Insight> {
    let get = db_error("Failed to read insight row");
    let category: Option<String> = row.try_get("category").map_err(&get)?;
    Ok(Insight {
        id: row.try_get("id").map_err(&get)?,
        article_id: row.try_get("article_id").map_err(&get)?,
        is_relevant: row.try_get("is_relevant").map_err(&get)?,
        category: category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()
            .map_err(|e| Error::Database(format!("Corrupt insight row: {}", e)))?,
        relevance_reason: row.try_get("relevance_reason").map_err(&get)?,
        suggested_action: row.try_get("suggested_action").map_err(&get)?,
        confidence_score: row.try_get("confidence_score").map_err(&get)?,
        executive_summary: row.try_get("executive_summary").map_err(&get)?,
        extracted_keywords: row.try_get("extracted_keywords").map_err(&get)?,
        ai_model: row.try_get("ai_model").map_err(&get)?,
        processing_time_ms: row.try_get("processing_time_ms").map_err(&get)?,
        processed_at: from_db_time(&row.try_get::<String, _>("processed_at").map_err(&get)?)?,
        created_at: from_db_time(&row.try_get::<String, _>("created_at").map_err(&get)?)?,
        updated_at: from_db_time(&row.try_get::<String, _>("updated_at").map_err(&get)?)?,
    })
}

fn view_from_row(row: &SqliteRow) -> Result<InsightView> {
    let get = db_error("Failed to read insight row");
    let insight = insight_from_row(row)?;
    let article = ArticleRef {
        id: insight.article_id,
        title: row.try_get("article_title").map_err(&get)?,
        source: row.try_get("article_source").map_err(&get)?,
        url: row.try_get("article_url").map_err(&get)?,
    };
    Ok(InsightView::new(insight, article))
}

fn where_clause(filter: &InsightFilter) -> String {
    let mut conditions = Vec::new();
    if filter.category.is_some() {
        conditions.push("i.category = ?");
    }
    if filter.relevant.is_some() {
        conditions.push("i.is_relevant = ?");
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn find_articles_by_status(
        &self,
        status: ProcessingStatus,
        order_by: &str,
    ) -> Result<Vec<Article>> {
        let sql = format!("SELECT * FROM articles WHERE status = ? ORDER BY {}", order_by);
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to load articles by status"))?;
        rows.iter().map(article_from_row).collect()
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn insert_article(&self, article: &NewArticle) -> Result<Article> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (url, title, description, content, image_url, source, author, published_at,
             language, country, keyword, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.description)
        .bind(article.content.as_deref())
        .bind(article.image_url.as_deref())
        .bind(&article.source)
        .bind(article.author.as_deref())
        .bind(article.published_at.as_ref().map(to_db_time))
        .bind(&article.language)
        .bind(&article.country)
        .bind(&article.keyword)
        .bind(ProcessingStatus::Pending.as_str())
        .bind(to_db_time(&now))
        .bind(to_db_time(&now))
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store article"))?;

        Ok(Article {
            id: result.last_insert_rowid(),
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
        })
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to load article"))?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to check article URL"))?;
        Ok(row.is_some())
    }

    async fn find_pending(&self) -> Result<Vec<Article>> {
        self.find_articles_by_status(ProcessingStatus::Pending, "published_at DESC, id ASC")
            .await
    }

    async fn find_failed(&self) -> Result<Vec<Article>> {
        self.find_articles_by_status(ProcessingStatus::Failed, "updated_at DESC, id ASC")
            .await
    }

    async fn update_status(&self, id: i64, status: ProcessingStatus) -> Result<()> {
        let result = sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(to_db_time(&Utc::now()))
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to update article status"))?;
        if result.rows_affected() == 0 {
            return Err(Error::Storage(format!("Article {} not found", id)));
        }
        Ok(())
    }

    async fn reset_status(&self, from: ProcessingStatus, to: ProcessingStatus) -> Result<u64> {
        let result = sqlx::query("UPDATE articles SET status = ?, updated_at = ? WHERE status = ?")
            .bind(to.as_str())
            .bind(to_db_time(&Utc::now()))
            .bind(from.as_str())
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to reset article status"))?;
        Ok(result.rows_affected())
    }

    async fn count_articles(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("Failed to count articles"))?;
        Ok(count as u64)
    }

    async fn count_by_status(&self, status: ProcessingStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("Failed to count articles by status"))?;
        Ok(count as u64)
    }

    async fn delete_articles_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM articles WHERE created_at < ?")
            .bind(to_db_time(&cutoff))
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to delete old articles"))?;
        Ok(result.rows_affected())
    }

    async fn delete_articles_before_with_status(
        &self,
        cutoff: DateTime<Utc>,
        status: ProcessingStatus,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM articles WHERE created_at < ? AND status = ?")
            .bind(to_db_time(&cutoff))
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to delete articles by status"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl InsightStorage for SQLiteStorage {
    async fn insert_insight(&self, insight: &NewInsight) -> Result<Insight> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO insights
            (article_id, is_relevant, category, relevance_reason, suggested_action,
             confidence_score, executive_summary, extracted_keywords, ai_model,
             processing_time_ms, processed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(insight.article_id)
        .bind(insight.is_relevant)
        .bind(insight.category.map(|c| c.as_str()))
        .bind(insight.relevance_reason.as_deref())
        .bind(insight.suggested_action.as_deref())
        .bind(insight.confidence_score)
        .bind(insight.executive_summary.as_deref())
        .bind(insight.extracted_keywords.as_deref())
        .bind(&insight.ai_model)
        .bind(insight.processing_time_ms)
        .bind(to_db_time(&insight.processed_at))
        .bind(to_db_time(&now))
        .bind(to_db_time(&now))
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store insight"))?;

        Ok(Insight {
            id: result.last_insert_rowid(),
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
        })
    }

    async fn find_insight_by_article(&self, article_id: i64) -> Result<Option<Insight>> {
        let row = sqlx::query("SELECT * FROM insights WHERE article_id = ?")
            .bind(article_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to load insight"))?;
        row.as_ref().map(insight_from_row).transpose()
    }

    async fn find_insights(
        &self,
        filter: &InsightFilter,
        page: &PageRequest,
    ) -> Result<Page<InsightView>> {
        let total = self.count_insights(filter).await?;

        let direction = page.sort.direction.keyword();
        let sql = format!(
            "{} {} ORDER BY i.{} {}, i.id {} LIMIT ? OFFSET ?",
            INSIGHT_VIEW_SELECT,
            where_clause(filter),
            page.sort.field.column(),
            direction,
            direction
        );
        let mut query = sqlx::query(&sql);
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        if let Some(relevant) = filter.relevant {
            query = query.bind(relevant);
        }
        let rows = query
            .bind(page.size as i64)
            .bind(page.offset() as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list insights"))?;

        let content = rows.iter().map(view_from_row).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, page, total))
    }

    async fn find_processed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<InsightView>> {
        let sql = format!(
            "{} WHERE i.processed_at >= ? AND i.processed_at < ? ORDER BY i.processed_at DESC, i.id DESC",
            INSIGHT_VIEW_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(to_db_time(&start))
            .bind(to_db_time(&end))
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to load insights for period"))?;
        rows.iter().map(view_from_row).collect()
    }

    async fn count_insights(&self, filter: &InsightFilter) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM insights i {}", where_clause(filter));
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(category) = filter.category {
            query = query.bind(category.as_str());
        }
        if let Some(relevant) = filter.relevant {
            query = query.bind(relevant);
        }
        let count = query
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("Failed to count insights"))?;
        Ok(count as u64)
    }

    async fn count_by_model(&self) -> Result<Vec<(String, u64)>> {
        let rows = sqlx::query(
            "SELECT ai_model, COUNT(*) AS total FROM insights GROUP BY ai_model ORDER BY ai_model",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("Failed to count insights by model"))?;

        let get = db_error("Failed to read model count");
        rows.iter()
            .map(|row| {
                let model: String = row.try_get("ai_model").map_err(&get)?;
                let total: i64 = row.try_get("total").map_err(&get)?;
                Ok((model, total as u64))
            })
            .collect()
    }

    async fn delete_insights_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM insights WHERE created_at < ?")
            .bind(to_db_time(&cutoff))
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to delete old insights"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Storage for SQLiteStorage {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(db_error("Database did not answer"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn new_article(url: &str) -> NewArticle {
        NewArticle {
            url: url.to_string(),
            title: "Test Article".to_string(),
            description: "Test description".to_string(),
            content: Some("Test content".to_string()),
            image_url: None,
            source: "test".to_string(),
            author: Some("Test Author".to_string()),
            published_at: Some(Utc::now()),
            language: "en".to_string(),
            country: "us".to_string(),
            keyword: "computer vision".to_string(),
        }
    }

    fn new_insight(article_id: i64, category: Option<Category>, relevant: bool) -> NewInsight {
        NewInsight {
            article_id,
            is_relevant: relevant,
            category,
            relevance_reason: Some("Because".to_string()),
            suggested_action: Some("Follow up".to_string()),
            confidence_score: Some(0.85),
            executive_summary: Some("Summary".to_string()),
            extracted_keywords: Some("ai, vision".to_string()),
            ai_model: "gemini-1.5-pro".to_string(),
            processing_time_ms: Some(1200),
            processed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();

        let article = storage.insert_article(&new_article("http://example.com")).await.unwrap();
        assert!(storage.exists_by_url("http://example.com").await.unwrap());
        assert!(!storage.exists_by_url("http://example.org").await.unwrap());
        assert!(storage.insert_article(&new_article("http://example.com")).await.is_err());

        let loaded = storage.get_article(article.id).await.unwrap().unwrap();
        assert_eq!(loaded.url, article.url);
        assert_eq!(loaded.author.as_deref(), Some("Test Author"));
        assert_eq!(loaded.status, ProcessingStatus::Pending);

        storage
            .update_status(article.id, ProcessingStatus::Processing)
            .await
            .unwrap();
        storage
            .update_status(article.id, ProcessingStatus::Failed)
            .await
            .unwrap();
        assert_eq!(storage.find_failed().await.unwrap().len(), 1);
        assert_eq!(storage.count_by_status(ProcessingStatus::Failed).await.unwrap(), 1);
        assert!(storage.update_status(9999, ProcessingStatus::Failed).await.is_err());
    }

    #[tokio::test]
    async fn test_sqlite_insights_round_trip() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("insights.db"))
            .await
            .unwrap();

        let first = storage.insert_article(&new_article("http://one")).await.unwrap();
        let second = storage.insert_article(&new_article("http://two")).await.unwrap();
        let stored = storage
            .insert_insight(&new_insight(first.id, Some(Category::Partnership), true))
            .await
            .unwrap();
        storage
            .insert_insight(&new_insight(second.id, Some(Category::Product), false))
            .await
            .unwrap();
        assert!(storage
            .insert_insight(&new_insight(first.id, Some(Category::Product), true))
            .await
            .is_err());

        let loaded = storage.find_insight_by_article(first.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, stored.id);
        assert_eq!(loaded.category, Some(Category::Partnership));
        assert_eq!(loaded.processing_time_ms, Some(1200));

        let page = storage
            .find_insights(&InsightFilter::relevant_only(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].article.url, "http://one");

        let product = storage
            .find_insights(&InsightFilter::by_category(Category::Product), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(product.total_elements, 1);
        assert!(!product.content[0].insight.is_relevant);

        let today = storage
            .find_processed_between(Utc::now() - Duration::hours(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(today.len(), 2);

        let models = storage.count_by_model().await.unwrap();
        assert_eq!(models, vec![("gemini-1.5-pro".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_sqlite_delete_cascades_to_insight() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("cascade.db"))
            .await
            .unwrap();
        let article = storage.insert_article(&new_article("http://gone")).await.unwrap();
        storage
            .insert_insight(&new_insight(article.id, Some(Category::Strategy), true))
            .await
            .unwrap();

        assert_eq!(
            storage
                .delete_articles_before(Utc::now() - Duration::days(1))
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            storage
                .delete_articles_before(Utc::now() + Duration::days(1))
                .await
                .unwrap(),
            1
        );
        assert_eq!(storage.count_insights(&InsightFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_category_is_a_database_error() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("corrupt.db"))
            .await
            .unwrap();
        let article = storage.insert_article(&new_article("http://odd")).await.unwrap();
        storage
            .insert_insight(&new_insight(article.id, Some(Category::Product), true))
            .await
            .unwrap();
        sqlx::query("UPDATE insights SET category = 'GADGETS' WHERE article_id = ?")
            .bind(article.id)
            .execute(&*storage.pool)
            .await
            .unwrap();

        let err = storage.find_insight_by_article(article.id).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)), "{:?}", err);
        let err = storage
            .find_insights(&InsightFilter::default(), &PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)), "{:?}", err);
    }
}
