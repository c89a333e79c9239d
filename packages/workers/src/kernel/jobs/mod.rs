//! Job infrastructure for the queue workers.
//!
//! - [`ClaimableQueue`] - ordered read plus atomic conditional claim
//! - [`Pipeline`] - domain work for one claimed item
//! - [`JobWorker`] - long-running loop that polls, claims, and executes
//!
//! Concrete queues and pipelines live in their domains
//! (`domains::exports`, `domains::resumes`).

mod queue;
mod worker;

pub use queue::{ClaimableQueue, JobFailure, Pipeline, QueuedItem};
pub use worker::{JobWorker, JobWorkerConfig, PollOutcome};
