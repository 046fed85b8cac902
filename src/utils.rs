//! Utility functions for credential loading and log-friendly text.

use crate::config::API_KEY_ENV;
use crate::error::{Error, Result};

/// Reads the Gemini API key from the process environment.
///
/// The key is looked up under [`API_KEY_ENV`] (`GEMINI_API_KEY`). Surrounding
/// whitespace is trimmed; an empty value counts as missing.
///
/// # Errors
/// Returns [`Error::MissingApiKey`] if the variable is unset or blank.
pub fn load_api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::MissingApiKey(API_KEY_ENV)),
    }
}

/// Shortens `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Cuts on a character boundary so multi-byte text (the pipeline handles a lot
/// of Japanese) never panics.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
