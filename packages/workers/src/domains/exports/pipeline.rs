//! Export pipeline: applications of one posting → CSV in object storage.
//!
//! ```text
//! ExportJob (running)
//!     ├─► params.job_id
//!     ├─► Application::find_for_export
//!     ├─► render CSV
//!     ├─► storage.upload(exports, exports/job_{id}_{millis}.csv, upsert)
//!     ├─► storage.create_signed_url(.., 24h)
//!     └─► ExportJob::mark_completed({ url, path })
//! ```
//!
//! Any step failing aborts the rest; the worker records the failure.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::models::{ExportFiles, ExportJob};
use super::utils::export_csv::{export_path, render_applications_csv, CONTENT_TYPE};
use crate::domains::applications::Application;
use crate::kernel::jobs::Pipeline;
use crate::kernel::{UploadOptions, WorkerDeps};

pub const EXPORT_BUCKET: &str = "exports";

/// Lifetime of the download link handed back to the requester
pub const EXPORT_URL_TTL_SECS: u64 = 60 * 60 * 24;

pub struct ExportPipeline {
    deps: WorkerDeps,
}

impl ExportPipeline {
    pub fn new(deps: WorkerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Pipeline<ExportJob> for ExportPipeline {
    async fn execute(&self, job: &ExportJob) -> Result<()> {
        let params = job.params()?;

        let rows = Application::find_for_export(params.job_id, &self.deps.db_pool)
            .await
            .context("failed to load applications for export")?;
        debug!(export_job_id = %job.id, posting_id = %params.job_id, rows = rows.len(), "rendering export");

        let body = render_applications_csv(&rows)?;
        let path = export_path(params.job_id, Utc::now());

        self.deps
            .storage
            .upload(
                EXPORT_BUCKET,
                &path,
                body.into_bytes(),
                UploadOptions::new(CONTENT_TYPE).upsert(),
            )
            .await
            .context("failed to upload export")?;

        let url = self
            .deps
            .storage
            .create_signed_url(EXPORT_BUCKET, &path, EXPORT_URL_TTL_SECS)
            .await
            .context("failed to sign export url")?;

        let files = ExportFiles { url, path };
        if !ExportJob::mark_completed(job.id, &files, &self.deps.db_pool).await? {
            bail!("export job {} was no longer running", job.id);
        }

        info!(export_job_id = %job.id, path = %files.path, rows = rows.len(), "export completed");
        Ok(())
    }
}
