// https://docs.affinda.com/reference/createresume

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.affinda.com";

#[derive(Debug, thiserror::Error)]
pub enum AffindaError {
    #[error("request to Affinda failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Non-2xx response. The body is kept verbatim so callers can surface it.
    #[error("Affinda error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode Affinda response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct AffindaOptions {
    pub api_key: String,
    pub base_url: String,
}

impl AffindaOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Serialize)]
struct ParseResumeRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Clone)]
pub struct AffindaService {
    options: AffindaOptions,
    client: Client,
}

impl AffindaService {
    pub fn new(options: AffindaOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Submit a fetchable document URL and return the raw parse result.
    pub async fn parse_resume_url(&self, url: &str) -> Result<Value, AffindaError> {
        let endpoint = format!(
            "{base}/v3/resumes",
            base = self.options.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.options.api_key)
            .json(&ParseResumeRequest { url })
            .send()
            .await
            .map_err(AffindaError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AffindaError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(AffindaError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parse_resume_url_posts_url_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/resumes"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({ "url": "https://files.example/cv.pdf" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "professionalSummary": "Rust engineer" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service =
            AffindaService::new(AffindaOptions::new("secret").with_base_url(server.uri()));
        let parsed = service
            .parse_resume_url("https://files.example/cv.pdf")
            .await
            .unwrap();

        assert_eq!(parsed["data"]["professionalSummary"], "Rust engineer");
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/resumes"))
            .respond_with(ResponseTemplate::new(402).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let service =
            AffindaService::new(AffindaOptions::new("secret").with_base_url(server.uri()));
        let err = service
            .parse_resume_url("https://files.example/cv.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, AffindaError::Api { status: 402, .. }));
        assert_eq!(err.to_string(), "Affinda error 402: quota exceeded");
    }

    #[test]
    fn base_url_defaults_to_production() {
        let options = AffindaOptions::new("key");
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
    }
}
