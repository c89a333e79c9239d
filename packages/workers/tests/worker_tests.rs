//! Worker loop behaviour against a real Postgres queue.

mod common;

use std::sync::Arc;
use std::time::Duration;

use crate::common::{create_job_posting, TestHarness};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use workers_core::domains::exports::{
    ExportJob, ExportJobQueue, ExportParams, ExportPipeline, ExportStatus,
};
use workers_core::kernel::jobs::{JobWorker, JobWorkerConfig};

fn export_worker(ctx: &TestHarness, name: &str, batch_size: i64) -> JobWorker<ExportJobQueue, ExportPipeline> {
    JobWorker::new(
        Arc::new(ExportJobQueue::new(ctx.db_pool.clone())),
        Arc::new(ExportPipeline::new(ctx.deps())),
        JobWorkerConfig::new(name, batch_size, Duration::from_millis(50)),
    )
}

#[tokio::test]
async fn competing_workers_process_each_job_once() {
    let ctx = TestHarness::new().await.unwrap();
    let posting = create_job_posting(&ctx.db_pool, "Engineer", json!([]), json!([]))
        .await
        .unwrap();
    for _ in 0..5 {
        ExportJob::create(&ExportParams { job_id: posting }, &ctx.db_pool)
            .await
            .unwrap();
    }

    let a = export_worker(&ctx, "exporter-a", 5);
    let b = export_worker(&ctx, "exporter-b", 5);
    let (a_outcome, b_outcome) = tokio::join!(a.poll_once(), b.poll_once());
    let (a_outcome, b_outcome) = (a_outcome.unwrap(), b_outcome.unwrap());

    assert_eq!(a_outcome.claimed + b_outcome.claimed, 5);
    assert_eq!(a_outcome.succeeded + b_outcome.succeeded, 5);
    assert_eq!(ctx.storage.uploads().len(), 5);

    let remaining = ExportJob::find_queued(10, &ctx.db_pool).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn run_drains_queue_until_shutdown() {
    let ctx = TestHarness::new().await.unwrap();
    let posting = create_job_posting(&ctx.db_pool, "Engineer", json!([]), json!([]))
        .await
        .unwrap();
    let first = ExportJob::create(&ExportParams { job_id: posting }, &ctx.db_pool)
        .await
        .unwrap();
    let second = ExportJob::create(&ExportParams { job_id: posting }, &ctx.db_pool)
        .await
        .unwrap();

    let worker = Arc::new(export_worker(&ctx, "exporter", 1));
    let shutdown = CancellationToken::new();
    let handle = {
        let worker = worker.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker.run(shutdown).await })
    };

    let mut drained = false;
    for _ in 0..100 {
        let a = ExportJob::find_by_id(first.id, &ctx.db_pool).await.unwrap();
        let b = ExportJob::find_by_id(second.id, &ctx.db_pool).await.unwrap();
        if a.status == ExportStatus::Completed && b.status == ExportStatus::Completed {
            drained = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(drained, "worker did not complete both jobs");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop after shutdown")
        .unwrap()
        .unwrap();
}
