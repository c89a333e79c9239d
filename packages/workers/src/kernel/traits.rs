// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Pipelines in domains/ call external services through these traits.
//
// Naming convention: Base* for trait names (e.g., BaseObjectStorage)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Object Storage Trait (Infrastructure - uploads and signed URLs)
// =============================================================================

/// Options for a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Overwrite an existing object at the same path
    pub upsert: bool,
    pub content_type: String,
}

impl UploadOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            upsert: false,
            content_type: content_type.into(),
        }
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }
}

#[async_trait]
pub trait BaseObjectStorage: Send + Sync {
    /// Upload bytes to `bucket` at `path`
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()>;

    /// Create a time-limited URL for an existing object
    async fn create_signed_url(&self, bucket: &str, path: &str, ttl_secs: u64) -> Result<String>;
}

// =============================================================================
// Resume Parser Trait (Infrastructure - third-party document parsing)
// =============================================================================

#[async_trait]
pub trait BaseResumeParser: Send + Sync {
    /// Parse the document behind a fetchable URL (returns the raw parse result)
    async fn parse_url(&self, url: &str) -> Result<serde_json::Value>;
}
