//! Worker dependencies (using traits for testability)
//!
//! `WorkerDeps` is the explicit handle passed to every pipeline. Binaries
//! build it once from `Config`; tests build it from mocks.

use anyhow::Result;
use affinda::AffindaService;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::kernel::{BaseObjectStorage, BaseResumeParser};

// =============================================================================
// AffindaService Adapter (implements BaseResumeParser trait)
// =============================================================================

/// Wrapper around AffindaService that implements BaseResumeParser trait
pub struct AffindaAdapter(pub Arc<AffindaService>);

impl AffindaAdapter {
    pub fn new(service: Arc<AffindaService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseResumeParser for AffindaAdapter {
    async fn parse_url(&self, url: &str) -> Result<serde_json::Value> {
        self.0.parse_resume_url(url).await.map_err(Into::into)
    }
}

// =============================================================================
// WorkerDeps
// =============================================================================

/// Dependencies shared by the pipelines
#[derive(Clone)]
pub struct WorkerDeps {
    pub db_pool: PgPool,
    pub storage: Arc<dyn BaseObjectStorage>,
}

impl WorkerDeps {
    pub fn new(db_pool: PgPool, storage: Arc<dyn BaseObjectStorage>) -> Self {
        Self { db_pool, storage }
    }
}
