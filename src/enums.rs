//! Enums and constants for Gemini API endpoints, headers, models and safety categories.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

/// Public REST base for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// API endpoints for Google Gemini.
#[derive(Debug, Clone, Copy)]
pub enum Endpoint {
    /// One-shot (and history-carrying chat) generation.
    GenerateContent,
}

impl Endpoint {
    /// Builds the URL for this endpoint and model under `base`.
    pub fn url(&self, base: &Url, model: &str) -> Result<Url> {
        let path = match self {
            Endpoint::GenerateContent => {
                // Accept the SDK's `models/<name>` form as well as a bare name.
                let name = model.strip_prefix("models/").unwrap_or(model);
                format!("models/{}:generateContent", name)
            }
        };
        base.join(&path)
            .map_err(|e| Error::Config(format!("Invalid endpoint URL for model {model}: {e}")))
    }
}

/// Get headers for Gemini REST requests.
pub fn gemini_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let mut key = HeaderValue::from_str(api_key)
        .map_err(|_| Error::Config("API key contains invalid header characters".to_string()))?;
    key.set_sensitive(true);
    headers.insert(HeaderName::from_static("x-goog-api-key"), key);
    Ok(headers)
}

/// Well-known Gemini model configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Model {
    /// Gemini 2.0 Flash
    #[default]
    G2_0Flash,
    /// Gemini 2.0 Flash Lite
    G2_0FlashLite,
    /// Gemini 2.5 Flash
    G2_5Flash,
    /// Gemini 2.5 Pro
    G2_5Pro,
}

impl Model {
    /// Get the model name string.
    pub fn name(&self) -> &'static str {
        match self {
            Model::G2_0Flash => "gemini-2.0-flash",
            Model::G2_0FlashLite => "gemini-2.0-flash-lite",
            Model::G2_5Flash => "gemini-2.5-flash",
            Model::G2_5Pro => "gemini-2.5-pro",
        }
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.name().to_string()
    }
}

/// Content moderation categories the API can block on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
}

impl HarmCategory {
    /// Every category with a configurable default block.
    pub const ALL: [HarmCategory; 5] = [
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
        HarmCategory::Harassment,
        HarmCategory::CivicIntegrity,
    ];
}

/// Blocking threshold applied to a [`HarmCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
}
