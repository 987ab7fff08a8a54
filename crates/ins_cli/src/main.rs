use anyhow::Context;
use clap::Parser;
use ins_collector::Collector;
use ins_core::{InferenceModel, Storage};
use ins_inference::Classifier;
use ins_pipeline::{
    Orchestrator, PipelineConfig, PipelineScheduler, QueryService, RetentionSweeper,
    ScheduleConfig,
};
use ins_web::{create_app, AppState};
use std::sync::Arc;
use tracing::{info, warn};

mod cli;
mod logging;

use cli::{Cli, Commands};

fn collector_config(cli: &Cli) -> ins_collector::Config {
    let mut config = ins_collector::Config {
        api_key: cli.newsdata_api_key.clone(),
        base_url: cli.newsdata_url.clone(),
        language: cli.language.clone(),
        country: cli.country.clone(),
        keyword_delay: cli.keyword_delay.0,
        ..Default::default()
    };
    let keywords: Vec<String> = cli
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        config.keywords = keywords;
    }
    config
}

fn inference_config(cli: &Cli) -> ins_inference::Config {
    ins_inference::Config {
        api_key: cli.gemini_api_key.clone(),
        base_url: cli.gemini_url.clone(),
        model_name: cli.gemini_model.clone(),
        ..Default::default()
    }
}

fn build_orchestrator(cli: &Cli, store: Arc<dyn Storage>) -> anyhow::Result<Orchestrator> {
    let collector_config = collector_config(cli);
    if !collector_config.is_valid() {
        warn!("⚠️ NEWSDATA_API_KEY is missing or a placeholder, collection will be skipped");
    }
    let collector = Collector::from_config(store.clone(), collector_config)?;
    info!(
        "🦗 Collector ready with {} keywords",
        collector.keywords().len()
    );

    let model = ins_inference::create_model(&cli.model, &inference_config(cli))?;
    info!("🧠 Inference model initialized (using {})", model.name());
    let classifier = Classifier::new(model, store.clone());

    let config = PipelineConfig {
        item_delay: cli.item_delay.0,
        expire_after_days: cli.expire_after_days,
    };
    Ok(Orchestrator::new(store, collector, classifier, config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown requested");
}

async fn serve(
    store: Arc<dyn Storage>,
    orchestrator: Arc<Orchestrator>,
    sweeper: Arc<RetentionSweeper>,
    schedule: &ScheduleConfig,
    host: &str,
    port: u16,
    with_scheduler: bool,
) -> anyhow::Result<()> {
    let reset = orchestrator.reconcile_stale().await?;
    if reset > 0 {
        info!("🔁 Reset {} articles left in flight by a previous run", reset);
    }

    let mut scheduler = if with_scheduler {
        let scheduler = PipelineScheduler::new(orchestrator.clone(), sweeper, schedule).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        None
    };

    let app = create_app(AppState::new(store, orchestrator));
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let store = ins_storage::create_storage(&cli.storage, Some(cli.database.as_path())).await?;
    store
        .ping()
        .await
        .with_context(|| format!("Storage backend {} is not answering", cli.storage))?;
    info!("✨ Storage initialized successfully (using {})", store.backend_name());

    let orchestrator = Arc::new(build_orchestrator(&cli, store.clone())?);
    let sweeper = Arc::new(RetentionSweeper::new(
        store.clone(),
        cli.retention.to_config(),
    ));

    match &cli.command {
        Commands::Serve {
            host,
            port,
            no_scheduler,
        } => {
            serve(
                store,
                orchestrator,
                sweeper,
                &cli.schedule.to_config(),
                host,
                *port,
                !no_scheduler,
            )
            .await?
        }
        Commands::Run => {
            let run = orchestrator.run().await;
            println!("{}", serde_json::to_string_pretty(&run)?);
            if let Some(e) = run.error {
                anyhow::bail!("Pipeline run failed: {}", e);
            }
        }
        Commands::Collect { keyword } => {
            let collected = match keyword {
                Some(keyword) => orchestrator.collector().collect_keyword(keyword).await,
                None => orchestrator.collect_only().await?,
            };
            println!("Collected {} new articles", collected);
        }
        Commands::Process => {
            let processed = orchestrator.process_only().await?;
            println!("Processed {} articles", processed);
        }
        Commands::Retry => {
            let retried = orchestrator.retry_only().await?;
            println!("Recovered {} articles on retry", retried);
        }
        Commands::Cleanup { light } => {
            let report = if *light {
                sweeper.run_light().await?
            } else {
                sweeper.run_daily().await?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Health => {
            let report = sweeper.health_check().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stats => {
            let query = QueryService::new(store);
            print!("{}", query.system_stats().await?);
        }
    }

    Ok(())
}
