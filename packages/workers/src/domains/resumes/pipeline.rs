//! Parse pipeline: resume file → structured parse result → fit scores.
//!
//! ```text
//! ResumeDocument (processing)
//!     ├─► storage.create_signed_url(resumes, file_uri, 10m)
//!     ├─► parser.parse_url(signed url)
//!     ├─► ResumeDocument::mark_parsed(result)
//!     └─► candidate set?
//!           └─► for each application of the candidate
//!                 ├─► scorer.score(resume text, posting requirements)
//!                 ├─► Application::update_fit
//!                 └─► AuditEntry (score.update)
//! ```
//!
//! Signing, parsing and storing the result are fatal to the document.
//! Scoring happens after the document is `parsed`; a failing application is
//! logged and audited as `score.failed` and the others carry on.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::ResumeDocument;
use super::utils::resume_text;
use crate::common::CandidateId;
use crate::domains::applications::{Application, ScorableApplication};
use crate::domains::audit::{
    AuditEntry, NewAuditEntry, ACTION_SCORE_FAILED, ACTION_SCORE_UPDATE, ENTITY_APPLICATION,
    PARSER_ACTOR,
};
use crate::domains::matching::{FitScore, ScoringInput, ScoringStrategy};
use crate::kernel::jobs::Pipeline;
use crate::kernel::{BaseResumeParser, WorkerDeps};

pub const RESUME_BUCKET: &str = "resumes";

/// Lifetime of the link handed to the parsing service
pub const RESUME_URL_TTL_SECS: u64 = 60 * 10;

/// Outcome of re-scoring a candidate's applications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringReport {
    pub scored: usize,
    pub failed: usize,
}

pub struct ParsePipeline {
    deps: WorkerDeps,
    parser: Arc<dyn BaseResumeParser>,
    scorer: Arc<dyn ScoringStrategy>,
}

impl ParsePipeline {
    pub fn new(
        deps: WorkerDeps,
        parser: Arc<dyn BaseResumeParser>,
        scorer: Arc<dyn ScoringStrategy>,
    ) -> Self {
        Self {
            deps,
            parser,
            scorer,
        }
    }

    /// Score every application of `candidate_id` against `candidate_text`.
    ///
    /// Only a failure to load the applications is returned as an error.
    pub async fn score_candidate(
        &self,
        candidate_id: CandidateId,
        candidate_text: &str,
    ) -> Result<ScoringReport> {
        let applications =
            Application::find_scorable_for_candidate(candidate_id, &self.deps.db_pool)
                .await
                .context("failed to load candidate applications")?;
        debug!(%candidate_id, applications = applications.len(), "scoring applications");

        let mut report = ScoringReport::default();
        for application in &applications {
            match self.score_application(application, candidate_text).await {
                Ok(score) => {
                    debug!(
                        application_id = %application.id,
                        fit_score = score.final_score,
                        "application scored"
                    );
                    report.scored += 1;
                }
                Err(e) => {
                    warn!(application_id = %application.id, error = %format!("{:#}", e), "scoring failed");
                    self.record_scoring_failure(application, &e).await;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn score_application(
        &self,
        application: &ScorableApplication,
        candidate_text: &str,
    ) -> Result<FitScore> {
        let requirements = application.requirements();
        let score = self.scorer.score(&ScoringInput {
            candidate_text,
            job_description: &requirements.description,
            skills: &requirements.skills,
            required_skills: &requirements.required_skills,
        });

        let explanation = serde_json::to_value(&score.explanation)?;

        Application::update_fit(
            application.id,
            score.final_score,
            &explanation,
            &self.deps.db_pool,
        )
        .await
        .context("failed to store fit score")?;

        AuditEntry::record(
            NewAuditEntry {
                actor: PARSER_ACTOR,
                action: ACTION_SCORE_UPDATE,
                entity_type: ENTITY_APPLICATION,
                entity_id: application.id.into_uuid(),
                meta: explanation,
            },
            &self.deps.db_pool,
        )
        .await
        .context("failed to audit fit score")?;

        Ok(score)
    }

    async fn record_scoring_failure(&self, application: &ScorableApplication, error: &anyhow::Error) {
        let entry = NewAuditEntry {
            actor: PARSER_ACTOR,
            action: ACTION_SCORE_FAILED,
            entity_type: ENTITY_APPLICATION,
            entity_id: application.id.into_uuid(),
            meta: json!({ "message": format!("{:#}", error) }),
        };

        if let Err(e) = AuditEntry::record(entry, &self.deps.db_pool).await {
            warn!(application_id = %application.id, error = %e, "failed to audit scoring failure");
        }
    }
}

#[async_trait]
impl Pipeline<ResumeDocument> for ParsePipeline {
    async fn execute(&self, document: &ResumeDocument) -> Result<()> {
        let url = self
            .deps
            .storage
            .create_signed_url(RESUME_BUCKET, &document.file_uri, RESUME_URL_TTL_SECS)
            .await
            .context("failed to sign resume url")?;

        let parsed = self
            .parser
            .parse_url(&url)
            .await
            .context("failed to parse resume")?;

        if !ResumeDocument::mark_parsed(document.id, &parsed, &self.deps.db_pool).await? {
            bail!("resume document {} was no longer processing", document.id);
        }
        info!(resume_document_id = %document.id, "resume parsed");

        let Some(candidate_id) = document.candidate_id else {
            debug!(resume_document_id = %document.id, "no candidate linked, skipping scoring");
            return Ok(());
        };

        let text = resume_text(&parsed);
        match self.score_candidate(candidate_id, &text).await {
            Ok(report) => info!(
                resume_document_id = %document.id,
                %candidate_id,
                scored = report.scored,
                failed = report.failed,
                "candidate scored"
            ),
            Err(e) => warn!(
                resume_document_id = %document.id,
                %candidate_id,
                error = %format!("{:#}", e),
                "candidate scoring skipped"
            ),
        }

        Ok(())
    }
}
