use clap::{Args, Parser, Subcommand};
use ins_pipeline::{RetentionConfig, ScheduleConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Durations written as `30s`, `1m30s`, `2h` or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_ms = 0u64;
        let mut number = String::new();
        let mut chars = s.trim().chars().peekable();
        let mut seen = false;

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Missing number before unit '{}' in {:?}", c, s))?;
            let scale = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                'd' => 86_400_000,
                other => return Err(format!("Invalid duration unit: {}", other)),
            };
            total_ms += value * scale;
            number.clear();
            seen = true;
        }

        if !number.is_empty() {
            let secs: u64 = number
                .parse()
                .map_err(|_| format!("Invalid number in duration {:?}", s))?;
            total_ms += secs * 1_000;
            seen = true;
        }

        if !seen {
            return Err("Duration must include a number".to_string());
        }
        Ok(HumanDuration(Duration::from_millis(total_ms)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect tech news, classify it with an LLM and serve the insights")]
pub struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, env = "INSIGHTS_STORAGE", default_value = "sqlite")]
    pub storage: String,

    /// SQLite database file
    #[arg(long, env = "INSIGHTS_DATABASE", default_value = ins_storage::DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    #[arg(long, env = "NEWSDATA_API_KEY", hide_env_values = true)]
    pub newsdata_api_key: Option<String>,

    #[arg(long, env = "NEWSDATA_BASE_URL", default_value = ins_collector::DEFAULT_BASE_URL)]
    pub newsdata_url: String,

    /// Search keywords, comma separated. Empty means the built-in list.
    #[arg(long, env = "INSIGHTS_KEYWORDS", value_delimiter = ',')]
    pub keywords: Vec<String>,

    #[arg(long, env = "INSIGHTS_LANGUAGE", default_value = "pt")]
    pub language: String,

    #[arg(long, env = "INSIGHTS_COUNTRY", default_value = "br")]
    pub country: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = ins_inference::DEFAULT_BASE_URL)]
    pub gemini_url: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = ins_inference::DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Inference backend: gemini or static
    #[arg(long, default_value = "gemini")]
    pub model: String,

    /// Pause between keyword searches (e.g. 1s, 500ms)
    #[arg(long, default_value = "1s")]
    pub keyword_delay: HumanDuration,

    /// Pause between two classifier calls
    #[arg(long, default_value = "2s")]
    pub item_delay: HumanDuration,

    /// Articles older than this many days are expired by a full run
    #[arg(long, env = "INSIGHTS_EXPIRE_AFTER_DAYS", default_value_t = 7)]
    pub expire_after_days: i64,

    #[command(flatten)]
    pub retention: RetentionArgs,

    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Age thresholds, in days, for the retention sweeps.
#[derive(Args, Debug, Clone)]
pub struct RetentionArgs {
    #[arg(long, env = "INSIGHTS_OLD_ARTICLE_DAYS", default_value_t = 30)]
    pub old_article_days: i64,

    #[arg(long, env = "INSIGHTS_FAILED_ARTICLE_DAYS", default_value_t = 7)]
    pub failed_article_days: i64,

    #[arg(long, env = "INSIGHTS_STALE_PENDING_DAYS", default_value_t = 3)]
    pub stale_pending_days: i64,

    #[arg(long, env = "INSIGHTS_OLD_INSIGHT_DAYS", default_value_t = 60)]
    pub old_insight_days: i64,

    /// Failed articles older than this are dropped by the light sweep
    #[arg(long, env = "INSIGHTS_LIGHT_FAILED_ARTICLE_DAYS", default_value_t = 3)]
    pub light_failed_article_days: i64,
}

impl RetentionArgs {
    pub fn to_config(&self) -> RetentionConfig {
        RetentionConfig {
            old_article_days: self.old_article_days,
            failed_article_days: self.failed_article_days,
            stale_pending_days: self.stale_pending_days,
            old_insight_days: self.old_insight_days,
            light_failed_article_days: self.light_failed_article_days,
        }
    }
}

/// Six-field cron expressions (sec min hour dom month dow), UTC.
#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    #[arg(long, env = "INSIGHTS_CRON_FULL_PIPELINE", default_value = "0 0 8 * * *")]
    pub cron_full_pipeline: String,

    #[arg(long, env = "INSIGHTS_CRON_COLLECT", default_value = "0 0 0/6 * * *")]
    pub cron_collect: String,

    #[arg(long, env = "INSIGHTS_CRON_PROCESS", default_value = "0 0 0/2 * * *")]
    pub cron_process: String,

    #[arg(long, env = "INSIGHTS_CRON_DAILY_CLEANUP", default_value = "0 0 3 * * *")]
    pub cron_daily_cleanup: String,

    #[arg(long, env = "INSIGHTS_CRON_LIGHT_CLEANUP", default_value = "0 0 0/12 * * *")]
    pub cron_light_cleanup: String,

    #[arg(long, env = "INSIGHTS_CRON_HEALTH_CHECK", default_value = "0 0 * * * *")]
    pub cron_health_check: String,
}

impl ScheduleArgs {
    pub fn to_config(&self) -> ScheduleConfig {
        ScheduleConfig {
            full_pipeline: self.cron_full_pipeline.clone(),
            collect: self.cron_collect.clone(),
            process: self.cron_process.clone(),
            daily_cleanup: self.cron_daily_cleanup.clone(),
            light_cleanup: self.cron_light_cleanup.clone(),
            health_check: self.cron_health_check.clone(),
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// HTTP API plus the cron scheduler
    Serve {
        #[arg(long, env = "INSIGHTS_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "PORT", default_value_t = 8080)]
        port: u16,
        /// Serve the API without the cron jobs
        #[arg(long)]
        no_scheduler: bool,
    },
    /// One full pipeline run: collect, process, retry, expire
    Run,
    /// Collect only, for every keyword or a single one
    Collect {
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Classify pending articles
    Process,
    /// Retry failed articles
    Retry,
    /// Retention sweep
    Cleanup {
        /// Only drop recently failed articles
        #[arg(long)]
        light: bool,
    },
    /// Store ping plus article counts by status
    Health,
    /// Plain-text statistics report
    Stats,
}
