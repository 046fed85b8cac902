//! Error types for the nook Gemini client.

use thiserror::Error;

/// Main error type for the Gemini client.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client configuration or override.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API key is not present in the environment.
    #[error("{0} environment variable is not set")]
    MissingApiKey(&'static str),

    /// The rate limiter could not grant a token within the wait window.
    #[error("Rate limit timeout exceeded after {0:?}")]
    RateLimitTimeout(std::time::Duration),

    /// The remote service answered with an error status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Network request failed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller passed arguments the API cannot accept.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `send_message` was called before `create_chat`.
    #[error("No chat has been created. Call create_chat() first.")]
    NoActiveChat,

    /// The response did not carry the expected candidate/part structure.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl Error {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Throttling (429), request timeouts (408 or transport level) and server
    /// errors (5xx) are transient. Everything else, including a rate limiter
    /// that could not hand out a token, is reported to the caller as is.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Error::Timeout => true,
            _ => false,
        }
    }

    /// Builds an error from a failed HTTP response.
    ///
    /// Google error bodies look like `{"error": {"code": 429, "message": "..."}}`;
    /// the nested message is used when present, the raw body otherwise.
    pub fn from_status_and_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| crate::utils::truncate(body, 200));

        Error::Api { status, message }
    }

    /// Maps a reqwest failure, separating timeouts from other network errors.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(error)
        }
    }
}

/// Result type alias for Gemini operations.
pub type Result<T> = std::result::Result<T, Error>;
