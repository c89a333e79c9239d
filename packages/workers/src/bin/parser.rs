//! Parse worker
//!
//! Polls `resume_document` for queued uploads, sends each file to the
//! resume parsing service and re-scores the candidate's applications.

use std::sync::Arc;

use affinda::{AffindaOptions, AffindaService};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workers_core::domains::matching::KeywordOverlapScorer;
use workers_core::domains::resumes::{ParsePipeline, ResumeDocumentQueue};
use workers_core::kernel::jobs::{JobWorker, JobWorkerConfig};
use workers_core::kernel::{install_shutdown_handler, AffindaAdapter, SupabaseStorage, WorkerDeps};
use workers_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,workers_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from_env()?;
    let affinda_api_key = config
        .affinda_api_key
        .clone()
        .context("AFFINDA_API_KEY must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let storage = SupabaseStorage::new(&config.supabase_url, config.supabase_service_role_key.clone())?;
    let deps = WorkerDeps::new(pool.clone(), Arc::new(storage));

    let affinda = Arc::new(AffindaService::new(AffindaOptions::new(affinda_api_key)));
    let pipeline = ParsePipeline::new(
        deps,
        Arc::new(AffindaAdapter::new(affinda)),
        Arc::new(KeywordOverlapScorer),
    );

    let worker = JobWorker::new(
        Arc::new(ResumeDocumentQueue::new(pool)),
        Arc::new(pipeline),
        JobWorkerConfig::new(
            "parser",
            config.parser_batch_size,
            config.parser_loop_interval,
        ),
    );

    tracing::info!(
        batch_size = config.parser_batch_size,
        interval_ms = config.parser_loop_interval.as_millis() as u64,
        "Starting parse worker"
    );

    let shutdown = install_shutdown_handler()?;
    worker.run(shutdown).await?;

    tracing::info!("Parse worker stopped");
    Ok(())
}
