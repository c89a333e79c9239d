use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CandidateId, ResumeDocumentId};
use crate::kernel::jobs::{JobFailure, QueuedItem};

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "parse_status", rename_all = "snake_case")]
pub enum ParseStatus {
    #[default]
    Queued,
    Processing,
    /// Parse result stored. Terminal for the workers.
    Parsed,
    Failed,
}

impl ParseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParseStatus::Parsed | ParseStatus::Failed)
    }
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResumeDocument {
    pub id: ResumeDocumentId,
    pub candidate_id: Option<CandidateId>,
    /// Object path inside the resumes bucket
    pub file_uri: String,
    pub parse_status: ParseStatus,
    pub parsed_json: Option<serde_json::Value>,
    pub error_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub parsed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueuedItem for ResumeDocument {
    type Id = ResumeDocumentId;

    fn id(&self) -> ResumeDocumentId {
        self.id
    }
}

impl ResumeDocument {
    pub async fn create(
        file_uri: &str,
        candidate_id: Option<CandidateId>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO resume_document (file_uri, candidate_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(file_uri)
        .bind(candidate_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: ResumeDocumentId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM resume_document WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Oldest queued documents first.
    pub async fn find_queued(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM resume_document
            WHERE parse_status = 'queued'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Move a queued document to processing. True only for the caller whose
    /// update matched the row.
    pub async fn claim(id: ResumeDocumentId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_document
            SET parse_status = 'processing',
                started_at = NOW()
            WHERE id = $1 AND parse_status = 'queued'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_parsed(
        id: ResumeDocumentId,
        parsed: &serde_json::Value,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_document
            SET parse_status = 'parsed',
                parsed_json = $2,
                error_json = NULL,
                parsed_at = NOW(),
                finished_at = NOW()
            WHERE id = $1 AND parse_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(parsed)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_failed(
        id: ResumeDocumentId,
        failure: &JobFailure,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_document
            SET parse_status = 'failed',
                error_json = $2,
                parsed_json = NULL,
                finished_at = NOW()
            WHERE id = $1 AND parse_status = 'processing'
            "#,
        )
        .bind(id)
        .bind(serde_json::to_value(failure)?)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ParseStatus::Queued.is_terminal());
        assert!(!ParseStatus::Processing.is_terminal());
        assert!(ParseStatus::Parsed.is_terminal());
        assert!(ParseStatus::Failed.is_terminal());
    }
}
