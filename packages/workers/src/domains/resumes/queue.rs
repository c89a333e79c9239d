use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::models::ResumeDocument;
use crate::common::ResumeDocumentId;
use crate::kernel::jobs::{ClaimableQueue, JobFailure};

/// `resume_document` table as a claimable queue.
pub struct ResumeDocumentQueue {
    db: PgPool,
}

impl ResumeDocumentQueue {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClaimableQueue for ResumeDocumentQueue {
    type Item = ResumeDocument;

    fn kind(&self) -> &'static str {
        "resume_document"
    }

    async fn fetch_queued(&self, limit: i64) -> Result<Vec<ResumeDocument>> {
        ResumeDocument::find_queued(limit, &self.db).await
    }

    async fn claim(&self, id: ResumeDocumentId) -> Result<bool> {
        ResumeDocument::claim(id, &self.db).await
    }

    async fn mark_failed(&self, id: ResumeDocumentId, failure: &JobFailure) -> Result<bool> {
        ResumeDocument::mark_failed(id, failure, &self.db).await
    }
}
