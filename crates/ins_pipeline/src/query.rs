use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use ins_core::{
    Category, InsightFilter, InsightView, Page, PageRequest, Result, Storage,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::stats;

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
pub const TOP_INSIGHTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Compact view of a relevant insight inside the daily summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSummary {
    pub id: i64,
    pub category: Option<String>,
    pub confidence: String,
    pub executive_summary: Option<String>,
    pub suggested_action: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub title: String,
    pub source: String,
    pub url: String,
}

impl From<&InsightView> for InsightSummary {
    fn from(view: &InsightView) -> Self {
        Self {
            id: view.insight.id,
            category: view.insight.category.map(|c| c.label().to_string()),
            confidence: view.confidence_tier.label().to_string(),
            executive_summary: view.insight.executive_summary.clone(),
            suggested_action: view.insight.suggested_action.clone(),
            processed_at: view.insight.processed_at,
            title: view.article.title.clone(),
            source: view.article.source.clone(),
            url: view.article.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub period: Period,
    pub total_insights: u64,
    pub relevant_insights: u64,
    pub relevant_percentage: f64,
    pub high_confidence_insights: u64,
    /// Counts keyed by category label, plus the uncategorized remainder.
    pub categories: BTreeMap<String, u64>,
    pub insights: Vec<InsightSummary>,
}

impl DailySummary {
    pub fn from_insights(period: Period, insights: &[InsightView]) -> Self {
        let total = insights.len() as u64;
        let relevant = insights.iter().filter(|v| v.insight.is_relevant).count() as u64;
        let high_confidence = insights
            .iter()
            .filter(|v| v.insight.has_high_confidence())
            .count() as u64;

        let mut categories: BTreeMap<String, u64> = Category::ALL
            .iter()
            .map(|c| (c.label().to_string(), 0))
            .collect();
        categories.insert(UNCATEGORIZED_LABEL.to_string(), 0);
        for view in insights {
            let label = view
                .insight
                .category
                .map_or(UNCATEGORIZED_LABEL, |c| c.label());
            *categories.entry(label.to_string()).or_default() += 1;
        }

        let relevant_percentage = if total > 0 {
            relevant as f64 * 100.0 / total as f64
        } else {
            0.0
        };

        Self {
            period,
            total_insights: total,
            relevant_insights: relevant,
            relevant_percentage,
            high_confidence_insights: high_confidence,
            categories,
            insights: insights
                .iter()
                .filter(|v| v.insight.is_relevant)
                .take(TOP_INSIGHTS)
                .map(InsightSummary::from)
                .collect(),
        }
    }
}

/// Midnight-to-midnight bounds of a server-local calendar day.
pub fn local_day_bounds(day: NaiveDate) -> Period {
    let to_utc = |date: NaiveDate| {
        let midnight = date.and_time(NaiveTime::MIN);
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    };
    let next = day.succ_opt().unwrap_or(day);
    Period {
        start: to_utc(day),
        end: to_utc(next),
    }
}

pub struct QueryService {
    store: Arc<dyn Storage>,
}

impl QueryService {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &InsightFilter, page: &PageRequest) -> Result<Page<InsightView>> {
        debug!("Listing insights with {:?} {:?}", filter, page);
        self.store.find_insights(filter, page).await
    }

    pub async fn relevant(&self, page: &PageRequest) -> Result<Page<InsightView>> {
        self.list(&InsightFilter::relevant_only(), page).await
    }

    pub async fn by_category(&self, category: Category, page: &PageRequest) -> Result<Page<InsightView>> {
        self.list(&InsightFilter::by_category(category), page).await
    }

    pub async fn daily_summary(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<DailySummary> {
        let insights = self.store.find_processed_between(start, end).await?;
        let summary = DailySummary::from_insights(Period { start, end }, &insights);
        info!(
            "📊 Daily summary {} to {}: {} insights, {} relevant",
            start, end, summary.total_insights, summary.relevant_insights
        );
        Ok(summary)
    }

    /// Summary for the current server-local day.
    pub async fn today_summary(&self) -> Result<DailySummary> {
        let period = local_day_bounds(Local::now().date_naive());
        self.daily_summary(period.start, period.end).await
    }

    pub async fn system_stats(&self) -> Result<String> {
        stats::system_stats(self.store.as_ref()).await
    }
}
