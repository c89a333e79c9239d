//! Claimable queue abstraction.
//!
//! A queue only has to offer an ordered read of queued items and an atomic
//! conditional claim. Any store that can do "update this row only if its
//! status is still `queued`" can back it: a Postgres table (see
//! `domains::exports::ExportJobQueue`), a key-value store with conditional
//! writes, or the in-memory queue used in tests.

use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An item that can sit in a [`ClaimableQueue`].
pub trait QueuedItem: Send + Sync {
    type Id: Copy + Display + Send + Sync;

    fn id(&self) -> Self::Id;
}

/// Durable failure detail written to a work item's `error_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl JobFailure {
    /// Build a failure from a pipeline error.
    ///
    /// The message is the whole context chain; the cause is the root error
    /// when it differs from the outermost one.
    pub fn from_error(error: &anyhow::Error) -> Self {
        let mut message = format!("{:#}", error);
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }

        let cause = if error.chain().count() > 1 {
            Some(error.root_cause().to_string())
        } else {
            None
        };

        Self { message, cause }
    }

    /// Failure recorded when a pipeline panicked instead of returning.
    pub fn panicked(detail: Option<String>) -> Self {
        Self {
            message: "pipeline panicked".to_string(),
            cause: detail,
        }
    }
}

/// Trait for queues of claimable work items.
#[async_trait]
pub trait ClaimableQueue: Send + Sync {
    type Item: QueuedItem;

    /// Short name used in logs (`export_job`, `resume_document`).
    fn kind(&self) -> &'static str;

    /// Fetch up to `limit` queued items, oldest first.
    async fn fetch_queued(&self, limit: i64) -> Result<Vec<Self::Item>>;

    /// Atomically move an item from queued to in-progress.
    ///
    /// Returns `true` only for the single caller whose conditional update
    /// matched the row. `false` means another worker won, or the item is no
    /// longer queued; it is not an error.
    async fn claim(&self, id: <Self::Item as QueuedItem>::Id) -> Result<bool>;

    /// Move a claimed item to its terminal failed state.
    ///
    /// Returns `false` when the item was no longer in progress.
    async fn mark_failed(
        &self,
        id: <Self::Item as QueuedItem>::Id,
        failure: &JobFailure,
    ) -> Result<bool>;
}

/// Domain work executed for one claimed item.
///
/// Implementations write the success terminal state themselves. Returning an
/// error makes the worker write the failed state.
#[async_trait]
pub trait Pipeline<I>: Send + Sync {
    async fn execute(&self, item: &I) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_failure_from_plain_error_has_no_cause() {
        let failure = JobFailure::from_error(&anyhow!("boom"));
        assert_eq!(failure.message, "boom");
        assert_eq!(failure.cause, None);
    }

    #[test]
    fn test_failure_from_context_chain() {
        let err = Err::<(), _>(anyhow!("connection refused"))
            .context("failed to upload export")
            .unwrap_err();
        let failure = JobFailure::from_error(&err);
        assert_eq!(failure.message, "failed to upload export: connection refused");
        assert_eq!(failure.cause.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_failure_message_is_never_empty() {
        let failure = JobFailure::from_error(&anyhow!(""));
        assert_eq!(failure.message, "unknown error");
    }

    #[test]
    fn test_failure_json_shape() {
        let json = serde_json::to_value(JobFailure::from_error(&anyhow!("boom"))).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "boom" }));
    }
}
