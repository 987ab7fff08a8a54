//! Cron-driven triggers for the pipeline and the retention sweeper.
//!
//! ```text
//! 08:00 daily        full pipeline run
//! every 6h           collection only
//! every 2h           processing only
//! 03:00 daily        daily cleanup
//! every 12h          light cleanup
//! hourly             health check
//! ```
//!
//! Jobs only log their outcome. A failing job never stops the scheduler.

use ins_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::orchestrator::Orchestrator;
use crate::retention::RetentionSweeper;

fn scheduler_error(context: &str) -> impl Fn(tokio_cron_scheduler::JobSchedulerError) -> Error + '_ {
    move |e| Error::Scheduler(format!("{}: {}", context, e))
}

fn cron_job<F, Fut>(name: &'static str, cron: &str, task: F) -> Result<(&'static str, Job)>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let job = Job::new_async(cron, move |_uuid, _lock| {
        info!("⏰ Scheduled job '{}' triggered", name);
        Box::pin(task())
    })
    .map_err(|e| Error::Scheduler(format!("Invalid cron '{}' for {}: {}", cron, name, e)))?;
    Ok((name, job))
}

pub struct PipelineScheduler {
    scheduler: JobScheduler,
    jobs: Vec<&'static str>,
}

impl PipelineScheduler {
    pub async fn new(
        orchestrator: Arc<Orchestrator>,
        sweeper: Arc<RetentionSweeper>,
        schedule: &ScheduleConfig,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(scheduler_error("Failed to create scheduler"))?;

        let mut jobs = Vec::new();

        let o = orchestrator.clone();
        jobs.push(cron_job("full-pipeline", &schedule.full_pipeline, move || {
            let o = o.clone();
            async move {
                let run = o.run().await;
                if let Some(e) = run.error {
                    error!("❌ Scheduled pipeline run failed: {}", e);
                }
            }
        })?);

        let o = orchestrator.clone();
        jobs.push(cron_job("collect", &schedule.collect, move || {
            let o = o.clone();
            async move {
                if let Err(e) = o.collect_only().await {
                    error!("❌ Scheduled collection failed: {}", e);
                }
            }
        })?);

        let o = orchestrator;
        jobs.push(cron_job("process", &schedule.process, move || {
            let o = o.clone();
            async move {
                if let Err(e) = o.process_only().await {
                    error!("❌ Scheduled processing failed: {}", e);
                }
            }
        })?);

        let s = sweeper.clone();
        jobs.push(cron_job("daily-cleanup", &schedule.daily_cleanup, move || {
            let s = s.clone();
            async move {
                if let Err(e) = s.run_daily().await {
                    error!("❌ Daily cleanup failed: {}", e);
                }
            }
        })?);

        let s = sweeper.clone();
        jobs.push(cron_job("light-cleanup", &schedule.light_cleanup, move || {
            let s = s.clone();
            async move {
                if let Err(e) = s.run_light().await {
                    error!("❌ Light cleanup failed: {}", e);
                }
            }
        })?);

        let s = sweeper;
        jobs.push(cron_job("health-check", &schedule.health_check, move || {
            let s = s.clone();
            async move {
                if let Err(e) = s.health_check().await {
                    error!("❌ Health check failed: {}", e);
                }
            }
        })?);

        let mut names = Vec::with_capacity(jobs.len());
        for (name, job) in jobs {
            scheduler
                .add(job)
                .await
                .map_err(scheduler_error("Failed to register job"))?;
            names.push(name);
        }

        Ok(Self {
            scheduler,
            jobs: names,
        })
    }

    pub fn job_names(&self) -> &[&'static str] {
        &self.jobs
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(scheduler_error("Failed to start scheduler"))?;
        info!("⏰ Scheduler started with {} jobs", self.jobs.len());
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(scheduler_error("Failed to stop scheduler"))?;
        info!("⏰ Scheduler stopped");
        Ok(())
    }
}
