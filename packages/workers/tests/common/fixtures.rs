//! Test fixtures for creating test data.
//!
//! Postings and applications are owned by the web app, so the crate has no
//! insert methods for them; these fixtures write the rows directly.

use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;
use workers_core::common::{ApplicationId, CandidateId, ExportJobId, JobPostingId};

/// Create a job posting
pub async fn create_job_posting(
    pool: &PgPool,
    jd_text: &str,
    skills: Value,
    required_skills: Value,
) -> Result<JobPostingId> {
    let id = sqlx::query_scalar::<_, JobPostingId>(
        r#"
        INSERT INTO job (title, jd_text, skills_json, required_skills_json)
        VALUES ('Test Posting', $1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(jd_text)
    .bind(skills)
    .bind(required_skills)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Create an application in the given stage
pub async fn create_application(
    pool: &PgPool,
    job_id: JobPostingId,
    candidate_id: CandidateId,
    stage: &str,
) -> Result<ApplicationId> {
    let id = sqlx::query_scalar::<_, ApplicationId>(
        r#"
        INSERT INTO application (job_id, candidate_id, stage)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(candidate_id)
    .bind(stage)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Queue an export job with arbitrary params, including malformed ones
pub async fn create_raw_export_job(pool: &PgPool, params: Value) -> Result<ExportJobId> {
    let id = sqlx::query_scalar::<_, ExportJobId>(
        "INSERT INTO export_job (params_json) VALUES ($1) RETURNING id",
    )
    .bind(params)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
