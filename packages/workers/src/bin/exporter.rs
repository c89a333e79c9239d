//! Export worker
//!
//! Polls `export_job` for queued exports, renders each posting's
//! applications to CSV and publishes it to object storage.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workers_core::domains::exports::{ExportJobQueue, ExportPipeline};
use workers_core::kernel::jobs::{JobWorker, JobWorkerConfig};
use workers_core::kernel::{install_shutdown_handler, SupabaseStorage, WorkerDeps};
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

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let storage = SupabaseStorage::new(&config.supabase_url, config.supabase_service_role_key.clone())?;
    let deps = WorkerDeps::new(pool.clone(), Arc::new(storage));

    let worker = JobWorker::new(
        Arc::new(ExportJobQueue::new(pool)),
        Arc::new(ExportPipeline::new(deps)),
        JobWorkerConfig::new(
            "exporter",
            config.export_batch_size,
            config.export_loop_interval,
        ),
    );

    tracing::info!(
        batch_size = config.export_batch_size,
        interval_ms = config.export_loop_interval.as_millis() as u64,
        "Starting export worker"
    );

    let shutdown = install_shutdown_handler()?;
    worker.run(shutdown).await?;

    tracing::info!("Export worker stopped");
    Ok(())
}
