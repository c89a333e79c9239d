use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::AuditEntryId;

/// Actor recorded for everything the parser worker does
pub const PARSER_ACTOR: &str = "worker/parser";

/// An application's fit score was overwritten
pub const ACTION_SCORE_UPDATE: &str = "score.update";

/// Scoring one application failed; the rest of the document was unaffected
pub const ACTION_SCORE_FAILED: &str = "score.failed";

pub const ENTITY_APPLICATION: &str = "application";

/// Append-only audit log row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub meta: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Fields of an entry about to be written
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub actor: &'a str,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Uuid,
    pub meta: serde_json::Value,
}

impl AuditEntry {
    pub async fn record(entry: NewAuditEntry<'_>, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_log (actor, action, entity_type, entity_id, meta)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(entry.actor)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.meta)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// All entries about one entity, oldest first.
    pub async fn find_for_entity(
        entity_type: &str,
        entity_id: Uuid,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT *
            FROM audit_log
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
