use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::job_posting::JobRequirements;
use crate::common::{ApplicationId, CandidateId, JobPostingId};

/// An application links a candidate to a job posting. Rows are created and
/// owned elsewhere; the workers only read them and overwrite the fit score.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobPostingId,
    pub candidate_id: CandidateId,
    pub stage: String,
    pub fit_score: Option<i32>,
    pub fit_explain_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed column set written to an export file.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationExportRow {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub stage: String,
    pub fit_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// An application joined with the posting fields the scorer needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScorableApplication {
    pub id: ApplicationId,
    pub job_id: JobPostingId,
    pub jd_text: Option<String>,
    pub skills_json: Option<serde_json::Value>,
    pub required_skills_json: Option<serde_json::Value>,
}

impl ScorableApplication {
    pub fn requirements(&self) -> JobRequirements {
        JobRequirements::from_columns(
            self.jd_text.as_deref(),
            self.skills_json.as_ref(),
            self.required_skills_json.as_ref(),
        )
    }
}

// =============================================================================
// Application Queries
// =============================================================================

impl Application {
    pub async fn find_by_id(id: ApplicationId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM application WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// All applications to a posting, in the export projection.
    pub async fn find_for_export(
        job_id: JobPostingId,
        pool: &PgPool,
    ) -> Result<Vec<ApplicationExportRow>> {
        sqlx::query_as::<_, ApplicationExportRow>(
            r#"
            SELECT id, candidate_id, stage, fit_score, created_at
            FROM application
            WHERE job_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Every application of a candidate, with its posting's requirements.
    pub async fn find_scorable_for_candidate(
        candidate_id: CandidateId,
        pool: &PgPool,
    ) -> Result<Vec<ScorableApplication>> {
        sqlx::query_as::<_, ScorableApplication>(
            r#"
            SELECT a.id, a.job_id, j.jd_text, j.skills_json, j.required_skills_json
            FROM application a
            LEFT JOIN job j ON j.id = a.job_id
            WHERE a.candidate_id = $1
            ORDER BY a.created_at ASC, a.id ASC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Overwrite the fit score and its explanation.
    pub async fn update_fit(
        id: ApplicationId,
        fit_score: i32,
        fit_explain: &serde_json::Value,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE application
            SET fit_score = $2,
                fit_explain_json = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(fit_score)
        .bind(fit_explain)
        .execute(pool)
        .await?;

        Ok(())
    }
}
