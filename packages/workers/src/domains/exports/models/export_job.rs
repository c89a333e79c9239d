use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ExportJobId, JobPostingId};
use crate::kernel::jobs::{JobFailure, QueuedItem};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "export_status", rename_all = "snake_case")]
pub enum ExportStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

impl ExportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportStatus::Completed | ExportStatus::Failed)
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// `params_json` of an export job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportParams {
    pub job_id: JobPostingId,
}

/// `files_json` of a completed export job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFiles {
    pub url: String,
    pub path: String,
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExportJob {
    pub id: ExportJobId,
    pub status: ExportStatus,
    pub params_json: serde_json::Value,
    pub files_json: Option<serde_json::Value>,
    pub error_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueuedItem for ExportJob {
    type Id = ExportJobId;

    fn id(&self) -> ExportJobId {
        self.id
    }
}

impl ExportJob {
    /// Decode `params_json`.
    pub fn params(&self) -> Result<ExportParams> {
        serde_json::from_value(self.params_json.clone())
            .with_context(|| format!("export job {} has invalid params", self.id))
    }

    pub async fn create(params: &ExportParams, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO export_job (params_json)
            VALUES ($1)
            RETURNING *
            "#,
        )
        .bind(serde_json::to_value(params)?)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: ExportJobId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM export_job WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Oldest queued jobs first.
    pub async fn find_queued(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM export_job
            WHERE status = 'queued'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Move a queued job to running. True only for the caller whose update
    /// matched the row.
    pub async fn claim(id: ExportJobId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE export_job
            SET status = 'running',
                started_at = NOW()
            WHERE id = $1 AND status = 'queued'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_completed(id: ExportJobId, files: &ExportFiles, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE export_job
            SET status = 'completed',
                files_json = $2,
                error_json = NULL,
                finished_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(serde_json::to_value(files)?)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_failed(id: ExportJobId, failure: &JobFailure, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE export_job
            SET status = 'failed',
                error_json = $2,
                files_json = NULL,
                finished_at = NOW()
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(id)
        .bind(serde_json::to_value(failure)?)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
