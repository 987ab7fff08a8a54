use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ins_core::{
    Category, InsightFilter, InsightView, Page, PageRequest, Result, Sort, DEFAULT_PAGE_SIZE,
};
use ins_pipeline::{DailySummary, PipelineRun};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageParams {
    /// Missing values fall back to page 0, size 20, `processedAt,desc`.
    pub fn to_request(&self) -> Result<PageRequest> {
        let sort = match self.sort.as_deref() {
            Some(spec) if !spec.trim().is_empty() => spec.parse::<Sort>()?,
            _ => Sort::default(),
        };
        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        ))
    }
}

/// Query string of the main listing. Paging fields are repeated here rather
/// than flattened because flattened numbers do not survive url decoding.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub relevant: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl ListParams {
    pub fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
        }
    }

    pub fn to_filter(&self) -> Result<InsightFilter> {
        let category = self
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?;
        Ok(InsightFilter {
            category,
            relevant: self.relevant,
        })
    }
}

pub const DEFAULT_TEST_TOPIC: &str = "brasil";

#[derive(Debug, Default, Deserialize)]
pub struct TopicParams {
    pub topic: Option<String>,
}

/// One search hit and the headline the model wrote for it.
#[derive(Debug, Serialize, Deserialize)]
pub struct HeadlineSample {
    pub title: String,
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectResponse {
    pub collected: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub database: DatabaseHealth,
}

pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<InsightView>>> {
    let filter = params.to_filter()?;
    let page = params.paging().to_request()?;
    let insights = state.query.list(&filter, &page).await?;
    info!(
        "🔎 Returning {} insights, page {} of {}",
        insights.content.len(),
        insights.page,
        insights.total_pages
    );
    Ok(Json(insights))
}

pub async fn relevant_insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<InsightView>>> {
    let page = params.to_request()?;
    Ok(Json(state.query.relevant(&page).await?))
}

pub async fn insights_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<InsightView>>> {
    let category: Category = category.parse()?;
    let page = params.to_request()?;
    Ok(Json(state.query.by_category(category, &page).await?))
}

pub async fn daily_summary(State(state): State<Arc<AppState>>) -> ApiResult<Json<DailySummary>> {
    Ok(Json(state.query.today_summary().await?))
}

pub async fn collect(State(state): State<Arc<AppState>>) -> ApiResult<Json<CollectResponse>> {
    info!("📥 Manual collection requested");
    let collected = state.orchestrator.collect_only().await?;
    Ok(Json(CollectResponse { collected }))
}

/// Always answers 200; a run that failed part-way reports it in `error`
/// next to the counts it reached.
pub async fn run_pipeline(State(state): State<Arc<AppState>>) -> Json<PipelineRun> {
    info!("🚀 Manual pipeline run requested");
    Json(state.orchestrator.run().await)
}

/// Search a topic live and ask the model for a headline per hit. Nothing is
/// stored. 404 when the search comes back empty.
pub async fn model_check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopicParams>,
) -> ApiResult<Response> {
    let topic = params
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TEST_TOPIC);
    info!("🧪 Model check requested for '{}'", topic);

    let hits = state.orchestrator.collector().search_only(topic).await?;
    if hits.is_empty() {
        let message = format!("No news found for topic: {}", topic);
        return Ok((StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response());
    }

    let classifier = state.orchestrator.classifier();
    let mut samples = Vec::with_capacity(hits.len());
    for hit in hits {
        let title = hit.title.unwrap_or_default();
        let sample = match classifier.headline(&title).await {
            Ok(headline) => HeadlineSample {
                title,
                headline: Some(headline),
                error: None,
            },
            Err(e) => {
                warn!("⚠️ No headline for '{}': {}", title, e);
                HeadlineSample {
                    title,
                    headline: None,
                    error: Some(e.to_string()),
                }
            }
        };
        samples.push(sample);
    }
    info!("🧪 Model check returned {} headlines", samples.len());
    Ok(Json(samples).into_response())
}

pub async fn system_stats(State(state): State<Arc<AppState>>) -> ApiResult<String> {
    Ok(state.query.system_stats().await?)
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let ping = state.store.ping().await;
    health_response(state.store.backend_name(), ping)
}

fn health_response(backend: &str, ping: Result<()>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match ping {
        Ok(()) => (
            StatusCode::OK,
            "healthy",
            DatabaseHealth {
                status: "ok".to_string(),
                error: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            DatabaseHealth {
                status: "error".to_string(),
                error: Some(e.to_string()),
            },
        ),
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            backend: backend.to_string(),
            database,
        }),
    )
}
