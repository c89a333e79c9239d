use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::ExportJob;
use crate::common::ExportJobId;
use crate::kernel::jobs::{ClaimableQueue, JobFailure};

/// `export_job` table as a claimable queue.
pub struct ExportJobQueue {
    db: PgPool,
}

impl ExportJobQueue {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClaimableQueue for ExportJobQueue {
    type Item = ExportJob;

    fn kind(&self) -> &'static str {
        "export_job"
    }

    async fn fetch_queued(&self, limit: i64) -> Result<Vec<ExportJob>> {
        ExportJob::find_queued(limit, &self.db).await
    }

    async fn claim(&self, id: ExportJobId) -> Result<bool> {
        ExportJob::claim(id, &self.db).await
    }

    async fn mark_failed(&self, id: ExportJobId, failure: &JobFailure) -> Result<bool> {
        ExportJob::mark_failed(id, failure, &self.db).await
    }
}
