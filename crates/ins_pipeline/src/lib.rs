pub mod config;
pub mod orchestrator;
pub mod query;
pub mod retention;
pub mod scheduler;
pub mod stats;

pub use config::{PipelineConfig, RetentionConfig, ScheduleConfig};
pub use orchestrator::{Orchestrator, PipelineRun};
pub use query::{DailySummary, InsightSummary, Period, QueryService};
pub use retention::{HealthReport, RetentionSweeper, SweepReport};
pub use scheduler::PipelineScheduler;
pub use stats::system_stats;

pub mod prelude {
    pub use super::{
        Orchestrator, PipelineConfig, PipelineRun, PipelineScheduler, QueryService,
        RetentionConfig, RetentionSweeper, ScheduleConfig,
    };
    pub use ins_core::{Error, Result};
}
