//! Polling worker that drains one claimable queue.
//!
//! The `JobWorker` is a long-running loop that:
//! - Fetches the oldest queued items via a [`ClaimableQueue`]
//! - Claims each one with the queue's conditional update
//! - Runs the [`Pipeline`] for every claim it wins, one at a time
//! - Records pipeline errors (and panics) as terminal failures
//! - Sleeps for the poll interval and starts over
//!
//! # Architecture
//!
//! ```text
//! JobWorker
//!     │
//!     ├─► fetch_queued(batch_size)          query error → log, sleep, retry
//!     ├─► claim(id)                         lost claim → skip
//!     ├─► Pipeline.execute(item)            writes its own success state
//!     │       └─► Err / panic → mark_failed(id, JobFailure)
//!     └─► sleep(poll_interval) or shutdown
//! ```
//!
//! Any number of workers may run against the same queue in separate
//! processes. The claim is the only coordination between them.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::{ClaimableQueue, JobFailure, Pipeline, QueuedItem};
use crate::config::DEFAULT_LOOP_MS;

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// Name used in logs
    pub name: String,
    /// Maximum number of queued items to look at per iteration. Values below
    /// 1 are treated as 1.
    pub batch_size: i64,
    /// How long to sleep between iterations
    pub poll_interval: Duration,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            name: format!("worker-{}", Uuid::new_v4()),
            batch_size: 1,
            poll_interval: Duration::from_millis(DEFAULT_LOOP_MS),
        }
    }
}

impl JobWorkerConfig {
    /// A batch size below 1 is raised to 1.
    pub fn new(name: impl Into<String>, batch_size: i64, poll_interval: Duration) -> Self {
        Self {
            name: name.into(),
            batch_size: batch_size.max(1),
            poll_interval,
        }
    }
}

/// Tally of one poll iteration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub fetched: usize,
    pub claimed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// A worker that drains a single queue with a single pipeline.
pub struct JobWorker<Q, P> {
    queue: Arc<Q>,
    pipeline: Arc<P>,
    config: JobWorkerConfig,
}

impl<Q, P> JobWorker<Q, P>
where
    Q: ClaimableQueue + 'static,
    P: Pipeline<Q::Item> + 'static,
{
    pub fn new(queue: Arc<Q>, pipeline: Arc<P>, config: JobWorkerConfig) -> Self {
        Self {
            queue,
            pipeline,
            config,
        }
    }

    /// Run one fetch → claim → execute pass.
    ///
    /// Only a failure to fetch candidates is returned as an error. Claim
    /// errors and pipeline failures are handled per item.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let kind = self.queue.kind();
        let items = self
            .queue
            .fetch_queued(self.config.batch_size.max(1))
            .await
            .with_context(|| format!("failed to fetch queued {}", kind))?;

        let mut outcome = PollOutcome {
            fetched: items.len(),
            ..Default::default()
        };

        for item in items {
            let id = item.id();

            match self.queue.claim(id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(kind, job_id = %id, "claim lost, skipping");
                    continue;
                }
                Err(e) => {
                    error!(kind, job_id = %id, error = %e, "failed to claim job");
                    continue;
                }
            }

            outcome.claimed += 1;
            if self.process(&item).await {
                outcome.succeeded += 1;
            } else {
                outcome.failed += 1;
            }
        }

        Ok(outcome)
    }

    /// Execute the pipeline for a claimed item. Returns true on success.
    async fn process(&self, item: &Q::Item) -> bool {
        let kind = self.queue.kind();
        let id = item.id();

        debug!(kind, job_id = %id, "executing job");
        let result = AssertUnwindSafe(self.pipeline.execute(item))
            .catch_unwind()
            .await;

        let failure = match result {
            Ok(Ok(())) => {
                info!(kind, job_id = %id, "job succeeded");
                return true;
            }
            Ok(Err(e)) => {
                warn!(kind, job_id = %id, error = %format!("{:#}", e), "job failed");
                JobFailure::from_error(&e)
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(kind, job_id = %id, panic = ?detail, "job panicked");
                JobFailure::panicked(detail)
            }
        };

        match self.queue.mark_failed(id, &failure).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(kind, job_id = %id, "job no longer in progress, failure not recorded");
            }
            Err(e) => {
                error!(kind, job_id = %id, error = %e, "failed to mark job as failed");
            }
        }

        false
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// Cancellation interrupts both the sleep and an in-flight iteration. An
    /// interrupted item keeps its in-progress status.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker = %self.config.name,
            kind = self.queue.kind(),
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(worker = %self.config.name, "shutdown during iteration, abandoning in-flight work");
                    break;
                }
                result = self.poll_once() => match result {
                    Ok(outcome) if outcome.fetched > 0 => {
                        debug!(
                            worker = %self.config.name,
                            fetched = outcome.fetched,
                            claimed = outcome.claimed,
                            succeeded = outcome.succeeded,
                            failed = outcome.failed,
                            "poll complete"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(worker = %self.config.name, error = %format!("{:#}", e), "loop error");
                    }
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker = %self.config.name, "job worker stopped");
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{InMemoryQueue, MemoryStatus, RecordingPipeline};

    fn worker(
        queue: &Arc<InMemoryQueue>,
        pipeline: &Arc<RecordingPipeline>,
        batch_size: i64,
    ) -> JobWorker<InMemoryQueue, RecordingPipeline> {
        JobWorker::new(
            queue.clone(),
            pipeline.clone(),
            JobWorkerConfig::new("test-worker", batch_size, Duration::from_millis(10)),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = JobWorkerConfig::default();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.poll_interval, Duration::from_millis(15_000));
        assert!(config.name.starts_with("worker-"));
    }

    #[test]
    fn test_config_new_raises_batch_size_to_one() {
        let config = JobWorkerConfig::new("w", -3, Duration::from_millis(10));
        assert_eq!(config.batch_size, 1);
        assert_eq!(JobWorkerConfig::new("w", 0, Duration::from_millis(10)).batch_size, 1);
    }

    #[tokio::test]
    async fn test_non_positive_batch_size_still_fetches_one() {
        let queue = Arc::new(InMemoryQueue::new());
        let first = queue.push("first");
        let second = queue.push("second");
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()));
        let worker = JobWorker::new(
            queue.clone(),
            pipeline.clone(),
            JobWorkerConfig {
                name: "test-worker".to_string(),
                batch_size: -5,
                poll_interval: Duration::from_millis(10),
            },
        );

        let outcome = worker.poll_once().await.unwrap();

        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(pipeline.calls(), vec![first]);
        assert_eq!(queue.status(second), Some(MemoryStatus::Queued));
    }

    #[tokio::test]
    async fn test_poll_once_processes_oldest_first_within_batch() {
        let queue = Arc::new(InMemoryQueue::new());
        let first = queue.push("first");
        let second = queue.push("second");
        let third = queue.push("third");
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()));

        let outcome = worker(&queue, &pipeline, 2).poll_once().await.unwrap();

        assert_eq!(outcome.fetched, 2);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(pipeline.calls(), vec![first, second]);
        assert_eq!(queue.status(third), Some(MemoryStatus::Queued));
        assert_eq!(queue.status(first), Some(MemoryStatus::Completed));
    }

    #[tokio::test]
    async fn test_pipeline_error_marks_failed_with_message() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue.push("bad");
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()).failing_on(id));

        let outcome = worker(&queue, &pipeline, 1).poll_once().await.unwrap();

        assert_eq!(outcome.failed, 1);
        let item = queue.get(id).unwrap();
        assert_eq!(item.status, MemoryStatus::Failed);
        let failure = item.error.unwrap();
        assert!(!failure.message.is_empty());
        assert!(item.result.is_none());
    }

    #[tokio::test]
    async fn test_pipeline_panic_is_contained() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue.push("explodes");
        let ok = queue.push("fine");
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()).panicking_on(id));

        let outcome = worker(&queue, &pipeline, 5).poll_once().await.unwrap();

        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.succeeded, 1);
        let failure = queue.get(id).unwrap().error.unwrap();
        assert_eq!(failure.message, "pipeline panicked");
        assert_eq!(queue.status(ok), Some(MemoryStatus::Completed));
    }

    #[tokio::test]
    async fn test_lost_claim_is_skipped_silently() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue.push("contested");
        queue.steal_on_claim(id);
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()));

        let outcome = worker(&queue, &pipeline, 1).poll_once().await.unwrap();

        assert_eq!(outcome.fetched, 1);
        assert_eq!(outcome.claimed, 0);
        assert!(pipeline.calls().is_empty());
        assert_eq!(queue.status(id), Some(MemoryStatus::InProgress));
    }

    #[tokio::test]
    async fn test_fetch_error_is_returned_from_poll_once() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.fail_next_fetches(1);
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()));

        let err = worker(&queue, &pipeline, 1).poll_once().await.unwrap_err();
        assert!(format!("{:#}", err).contains("failed to fetch queued memory_item"));
    }

    #[tokio::test]
    async fn test_run_survives_fetch_errors_and_stops_on_shutdown() {
        let queue = Arc::new(InMemoryQueue::new());
        queue.fail_next_fetches(2);
        let id = queue.push("eventually");
        let pipeline = Arc::new(RecordingPipeline::new(queue.clone()));
        let worker = Arc::new(worker(&queue, &pipeline, 1));

        let shutdown = CancellationToken::new();
        let handle = {
            let worker = worker.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { worker.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        assert!(queue.fetch_count() >= 3);
        assert_eq!(queue.status(id), Some(MemoryStatus::Completed));
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_single_winner() {
        let queue = Arc::new(InMemoryQueue::new());
        let id = queue.push("race");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move { queue.claim(id).await.unwrap() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
