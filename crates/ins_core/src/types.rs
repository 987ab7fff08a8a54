use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};

/// Processing state of a collected article.
///
/// ```text
/// PENDING ──► PROCESSING ──► COMPLETED
///                 │              ▲
///                 ▼              │
///              FAILED ──► RETRYING
///                 ▲          │
///                 └──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 5] = [
        ProcessingStatus::Pending,
        ProcessingStatus::Processing,
        ProcessingStatus::Completed,
        ProcessingStatus::Failed,
        ProcessingStatus::Retrying,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Processing => "PROCESSING",
            ProcessingStatus::Completed => "COMPLETED",
            ProcessingStatus::Failed => "FAILED",
            ProcessingStatus::Retrying => "RETRYING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "⏳ Pending",
            ProcessingStatus::Processing => "🔄 Processing",
            ProcessingStatus::Completed => "✅ Completed",
            ProcessingStatus::Failed => "❌ Failed",
            ProcessingStatus::Retrying => "🔁 Retrying",
        }
    }

    /// An article is "in flight" while a classifier call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ProcessingStatus::Processing | ProcessingStatus::Retrying)
    }

    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Retrying)
                | (Retrying, Completed)
                | (Retrying, Failed)
        )
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessingStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Storage(format!("Unknown processing status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Product,
    Partnership,
    Strategy,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Product, Category::Partnership, Category::Strategy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Product => "PRODUCT",
            Category::Partnership => "PARTNERSHIP",
            Category::Strategy => "STRATEGY",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Product => "🧩 Product",
            Category::Partnership => "🤝 Partnership",
            Category::Strategy => "📈 Strategy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Product => "New products, technologies and market innovations",
            Category::Partnership => "Partnership opportunities and collaborations",
            Category::Strategy => "Strategic moves and market trends",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the canonical tokens and the Portuguese ones older prompts used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PRODUCT" | "PRODUTO" => Ok(Category::Product),
            "PARTNERSHIP" | "PARCERIA" => Ok(Category::Partnership),
            "STRATEGY" | "ESTRATEGIA" | "ESTRATÉGIA" => Ok(Category::Strategy),
            _ => Err(Error::InvalidQuery(format!("Unknown category: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl ConfidenceTier {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            None => ConfidenceTier::NotAvailable,
            Some(s) if s >= HIGH_CONFIDENCE => ConfidenceTier::High,
            Some(s) if s >= MEDIUM_CONFIDENCE => ConfidenceTier::Medium,
            Some(_) => ConfidenceTier::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "High",
            ConfidenceTier::Medium => "Medium",
            ConfidenceTier::Low => "Low",
            ConfidenceTier::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw news item as stored by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: String,
    pub country: String,
    /// The search keyword that produced this hit.
    pub keyword: String,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Title cut to `max` characters for log lines.
    pub fn short_title(&self, max: usize) -> String {
        if self.title.chars().count() > max {
            format!("{}...", self.title.chars().take(max).collect::<String>())
        } else {
            self.title.clone()
        }
    }
}

/// Article fields supplied by the collector; the store assigns id, status and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub source: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub language: String,
    pub country: String,
    pub keyword: String,
}

/// AI classification of exactly one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: i64,
    pub article_id: i64,
    pub is_relevant: bool,
    pub category: Option<Category>,
    pub relevance_reason: Option<String>,
    pub suggested_action: Option<String>,
    pub confidence_score: Option<f64>,
    pub executive_summary: Option<String>,
    pub extracted_keywords: Option<String>,
    pub ai_model: String,
    pub processing_time_ms: Option<i64>,
    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Insight {
    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_score(self.confidence_score)
    }

    pub fn has_high_confidence(&self) -> bool {
        self.confidence_tier() == ConfidenceTier::High
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
    pub article_id: i64,
    pub is_relevant: bool,
    pub category: Option<Category>,
    pub relevance_reason: Option<String>,
    pub suggested_action: Option<String>,
    pub confidence_score: Option<f64>,
    pub executive_summary: Option<String>,
    pub extracted_keywords: Option<String>,
    pub ai_model: String,
    pub processing_time_ms: Option<i64>,
    pub processed_at: DateTime<Utc>,
}

/// The parent-article fields exposed alongside an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub id: i64,
    pub title: String,
    pub source: String,
    pub url: String,
}

impl From<&Article> for ArticleRef {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            source: article.source.clone(),
            url: article.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightView {
    #[serde(flatten)]
    pub insight: Insight,
    pub confidence_tier: ConfidenceTier,
    pub article: ArticleRef,
}

impl InsightView {
    pub fn new(insight: Insight, article: ArticleRef) -> Self {
        Self {
            confidence_tier: insight.confidence_tier(),
            insight,
            article,
        }
    }
}

/// Outcome of one classifier call. Every field is optional because the
/// model reply may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub relevant: Option<bool>,
    pub reason: Option<String>,
    pub category: Option<Category>,
    pub suggested_action: Option<String>,
    pub confidence: Option<f64>,
    pub summary: Option<String>,
    pub keywords: Option<String>,
}

impl AnalysisResult {
    pub const ERROR_ACTION: &'static str = "check AI configuration";

    /// Degraded result used for transport and parse failures.
    pub fn error(message: &str) -> Self {
        Self {
            relevant: Some(false),
            reason: Some(format!("Analysis error: {}", message)),
            category: None,
            suggested_action: Some(Self::ERROR_ACTION.to_string()),
            confidence: Some(0.0),
            summary: Some(format!("Analysis error: {}", message)),
            keywords: Some(String::new()),
        }
    }

    /// A result is usable once the model gave both a relevance verdict and a
    /// category, whatever the verdict was.
    pub fn is_successful(&self) -> bool {
        self.relevant.is_some() && self.category.is_some()
    }

    pub fn is_relevant(&self) -> bool {
        self.relevant == Some(true)
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_score(self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(ConfidenceTier::from_score(Some(0.9)).label(), "High");
        assert_eq!(ConfidenceTier::from_score(Some(0.8)).label(), "High");
        assert_eq!(ConfidenceTier::from_score(Some(0.65)).label(), "Medium");
        assert_eq!(ConfidenceTier::from_score(Some(0.5)).label(), "Medium");
        assert_eq!(ConfidenceTier::from_score(Some(0.2)).label(), "Low");
        assert_eq!(ConfidenceTier::from_score(None).label(), "N/A");
    }

    #[test]
    fn test_confidence_tier_serializes_as_label() {
        let json = serde_json::to_string(&ConfidenceTier::NotAvailable).unwrap();
        assert_eq!(json, "\"N/A\"");
    }

    #[test]
    fn test_category_parsing_accepts_aliases() {
        assert_eq!("PRODUCT".parse::<Category>().unwrap(), Category::Product);
        assert_eq!("produto".parse::<Category>().unwrap(), Category::Product);
        assert_eq!(" Parceria ".parse::<Category>().unwrap(), Category::Partnership);
        assert_eq!("ESTRATÉGIA".parse::<Category>().unwrap(), Category::Strategy);
        assert!("GOSSIP".parse::<Category>().is_err());
    }

    #[test]
    fn test_status_transitions() {
        use ProcessingStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Retrying));
        assert!(Retrying.can_transition_to(Completed));
        assert!(Retrying.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Retrying.can_transition_to(Retrying));
    }

    #[test]
    fn test_status_round_trips_through_token() {
        for status in ProcessingStatus::ALL {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<ProcessingStatus>().is_err());
    }

    #[test]
    fn test_successful_ignores_relevance_value() {
        let result = AnalysisResult {
            relevant: Some(false),
            category: Some(Category::Product),
            ..Default::default()
        };
        assert!(result.is_successful());
        assert!(!result.is_relevant());

        let missing_category = AnalysisResult {
            relevant: Some(true),
            ..Default::default()
        };
        assert!(!missing_category.is_successful());
    }

    #[test]
    fn test_error_result_is_not_successful() {
        let result = AnalysisResult::error("HTTP 500");
        assert!(!result.is_successful());
        assert_eq!(result.relevant, Some(false));
        assert_eq!(result.confidence, Some(0.0));
        assert_eq!(result.suggested_action.as_deref(), Some("check AI configuration"));
        assert!(result.reason.unwrap().contains("HTTP 500"));
    }
}
