use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{BaseObjectStorage, UploadOptions};

/// Supabase Storage REST client
pub struct SupabaseStorage {
    /// `{SUPABASE_URL}/storage/v1`, without trailing slash
    storage_url: String,
    service_key: String,
    client: reqwest::Client,
}

/// Sign request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

/// Sign response body (the URL is relative to the storage root)
#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    /// Create a new storage client
    pub fn new(supabase_url: &str, service_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            storage_url: format!("{}/storage/v1", supabase_url.trim_end_matches('/')),
            service_key: service_key.into(),
            client,
        })
    }

    fn object_url(&self, prefix: &[&str], bucket: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.storage_url)
            .with_context(|| format!("invalid storage url {}", self.storage_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("storage url cannot be a base: {}", self.storage_url))?
            .pop_if_empty()
            .extend(prefix)
            .push(bucket)
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl BaseObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<()> {
        let url = self.object_url(&["object"], bucket, path)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", options.upsert.to_string())
            .header(CONTENT_TYPE, options.content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}/{}", bucket, path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("storage upload of {}/{} failed ({}): {}", bucket, path, status, body);
        }

        Ok(())
    }

    async fn create_signed_url(&self, bucket: &str, path: &str, ttl_secs: u64) -> Result<String> {
        let url = self.object_url(&["object", "sign"], bucket, path)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&SignRequest {
                expires_in: ttl_secs,
            })
            .send()
            .await
            .with_context(|| format!("Failed to sign {}/{}", bucket, path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("signing {}/{} failed ({}): {}", bucket, path, status, body);
        }

        let signed: SignResponse = response
            .json()
            .await
            .context("Failed to parse signed URL response")?;

        Ok(format!("{}{}", self.storage_url, signed.signed_url))
    }
}
