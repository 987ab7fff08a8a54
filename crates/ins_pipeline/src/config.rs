use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pause between two classifier calls.
    pub item_delay: Duration,
    /// Articles older than this are expired at the end of a full run.
    pub expire_after_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_secs(2),
            expire_after_days: 7,
        }
    }
}

/// Age thresholds, in days, for the retention sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    pub old_article_days: i64,
    pub failed_article_days: i64,
    pub stale_pending_days: i64,
    pub old_insight_days: i64,
    pub light_failed_article_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            old_article_days: 30,
            failed_article_days: 7,
            stale_pending_days: 3,
            old_insight_days: 60,
            light_failed_article_days: 3,
        }
    }
}

/// Six-field cron expressions (sec min hour dom month dow), evaluated in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub full_pipeline: String,
    pub collect: String,
    pub process: String,
    pub daily_cleanup: String,
    pub light_cleanup: String,
    pub health_check: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            full_pipeline: "0 0 8 * * *".to_string(),
            collect: "0 0 0/6 * * *".to_string(),
            process: "0 0 0/2 * * *".to_string(),
            daily_cleanup: "0 0 3 * * *".to_string(),
            light_cleanup: "0 0 0/12 * * *".to_string(),
            health_check: "0 0 * * * *".to_string(),
        }
    }
}
