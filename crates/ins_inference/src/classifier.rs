use chrono::{DateTime, Utc};
use ins_core::{AnalysisResult, Article, Error, InferenceModel, Insight, NewInsight, Result, Storage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::parse::parse_reply;
use crate::prompt::{build_headline_prompt, build_prompt};

/// The outcome of one classifier call plus when it finished and how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub result: AnalysisResult,
    pub processed_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl Classification {
    pub fn is_successful(&self) -> bool {
        self.result.is_successful()
    }
}

pub struct Classifier {
    model: Arc<dyn InferenceModel>,
    store: Arc<dyn Storage>,
}

impl Classifier {
    pub fn new(model: Arc<dyn InferenceModel>, store: Arc<dyn Storage>) -> Self {
        Self { model, store }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Ask the model for a headline for `title`. Unlike [`Classifier::classify`]
    /// this surfaces every failure as `Err`.
    pub async fn headline(&self, title: &str) -> Result<String> {
        if !self.model.is_configured() {
            return Err(Error::Config(format!(
                "Inference model {} is not configured",
                self.model.name()
            )));
        }
        let reply = self.model.generate(&build_headline_prompt(title)).await?;
        Ok(reply.trim().to_string())
    }

    /// Ask the model about one article. Transport and parse problems come
    /// back as an error result, never as `Err`.
    pub async fn classify(&self, article: &Article) -> Classification {
        let started = Instant::now();
        info!("🤖 Analysing article {} - {}", article.id, article.short_title(50));

        let result = if !self.model.is_configured() {
            error!("❌ Inference model {} is not configured", self.model.name());
            AnalysisResult::error("invalid AI configuration")
        } else {
            match self.model.generate(&build_prompt(article)).await {
                Ok(reply) => parse_reply(&reply),
                Err(e) => {
                    error!("❌ Model call failed for article {}: {}", article.id, e);
                    AnalysisResult::error(&e.to_string())
                }
            }
        };

        if result.is_successful() {
            info!(
                "✨ Article {} analysed - relevant: {}, category: {:?}",
                article.id,
                result.is_relevant(),
                result.category
            );
        } else {
            warn!(
                "⚠️ Incomplete analysis for article {}: {}",
                article.id,
                result.reason.as_deref().unwrap_or("missing relevance or category")
            );
        }

        Classification {
            result,
            processed_at: Utc::now(),
            elapsed: started.elapsed(),
        }
    }

    /// Store the insight for a successful classification.
    pub async fn persist(&self, article: &Article, classification: &Classification) -> Result<Insight> {
        let result = &classification.result;
        if !result.is_successful() {
            return Err(Error::Inference(format!(
                "Refusing to store an unsuccessful analysis for article {}",
                article.id
            )));
        }

        let insight = NewInsight {
            article_id: article.id,
            is_relevant: result.is_relevant(),
            category: result.category,
            relevance_reason: result.reason.clone(),
            suggested_action: result.suggested_action.clone(),
            confidence_score: result.confidence,
            executive_summary: result.summary.clone(),
            extracted_keywords: result.keywords.clone(),
            ai_model: self.model.name().to_string(),
            processing_time_ms: Some(classification.elapsed.as_millis() as i64),
            processed_at: classification.processed_at,
        };
        let saved = self.store.insert_insight(&insight).await?;
        info!(
            "💾 Insight {} stored for article {} ({})",
            saved.id,
            article.id,
            saved.confidence_tier()
        );
        Ok(saved)
    }
}
