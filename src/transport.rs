//! The remote-call seam between the client and the Gemini REST API.

use crate::enums::{gemini_headers, Endpoint, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::models::{GenerateContentRequest, GenerateContentResponse};
use crate::utils::truncate;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Something that can run a `generateContent` call.
///
/// [`HttpTransport`] talks to Google; tests plug in scripted implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// reqwest-backed transport for the public Gemini REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Creates a transport authenticated with `api_key`.
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key, sent as `x-goog-api-key`
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    /// Returns an error if the key is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .default_headers(gemini_headers(api_key)?)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| Error::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Points the transport at another API root (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        self.base_url = Url::parse(&normalized)
            .map_err(|e| Error::Config(format!("Invalid base URL {base_url}: {e}")))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = Endpoint::GenerateContent.url(&self.base_url, model)?;
        debug!(%model, turns = request.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::from_reqwest)?;

        if !status.is_success() {
            return Err(Error::from_status_and_body(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            Error::MalformedResponse(format!(
                "Failed to parse response: {e}. Content: {}",
                truncate(&text, 200)
            ))
        })?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                prompt_tokens = ?usage.prompt_token_count,
                output_tokens = ?usage.candidates_token_count,
                total_tokens = ?usage.total_token_count,
                "generateContent usage"
            );
        }
        Ok(parsed)
    }
}
