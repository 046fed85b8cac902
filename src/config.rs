//! Client configuration: defaults, typed overrides and validation.

use crate::enums::Model;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_RESPONSE_MIME_TYPE: &str = "text/plain";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Generation defaults shared by every call a client makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    /// HTTP request timeout in milliseconds.
    pub timeout: u64,
    /// Attach the Google Search tool to chat sessions.
    pub use_search: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: Model::default().into(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            response_mime_type: DEFAULT_RESPONSE_MIME_TYPE.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            use_search: false,
        }
    }
}

impl ClientConfig {
    /// Defaults with `overrides` applied on top.
    pub fn from_overrides(overrides: &ConfigOverrides) -> Self {
        let mut config = Self::default();
        config.apply(overrides);
        config
    }

    /// Overwrites every field that `overrides` sets.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(top_p) = overrides.top_p {
            self.top_p = top_p;
        }
        if let Some(top_k) = overrides.top_k {
            self.top_k = top_k;
        }
        if let Some(max_output_tokens) = overrides.max_output_tokens {
            self.max_output_tokens = max_output_tokens;
        }
        if let Some(mime) = &overrides.response_mime_type {
            self.response_mime_type = mime.clone();
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(use_search) = overrides.use_search {
            self.use_search = use_search;
        }
    }

    /// A copy of this configuration with `use_search` set as given.
    pub fn with_search(&self, use_search: bool) -> Self {
        Self {
            use_search,
            ..self.clone()
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("Model name cannot be empty".to_string()));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(Error::Config(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(Error::Config(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be positive".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(Error::Config(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        if self.response_mime_type.trim().is_empty() {
            return Err(Error::Config(
                "response_mime_type cannot be empty".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// A partial [`ClientConfig`]: every field that is `Some` replaces the default.
///
/// Presence is explicit, so `temperature(0.0)` really requests a temperature of
/// zero instead of falling back to the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub response_mime_type: Option<String>,
    pub timeout: Option<u64>,
    pub use_search: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses overrides from a loose key/value mapping such as a JSON object.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for unknown keys or mistyped values.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
    }

    /// Combines two override sets; fields set in `other` win.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            model: other.model.or(self.model),
            temperature: other.temperature.or(self.temperature),
            top_p: other.top_p.or(self.top_p),
            top_k: other.top_k.or(self.top_k),
            max_output_tokens: other.max_output_tokens.or(self.max_output_tokens),
            response_mime_type: other.response_mime_type.or(self.response_mime_type),
            timeout: other.timeout.or(self.timeout),
            use_search: other.use_search.or(self.use_search),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn response_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.response_mime_type = Some(mime.into());
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn use_search(mut self, use_search: bool) -> Self {
        self.use_search = Some(use_search);
        self
    }
}
