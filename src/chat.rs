//! Client-side chat sessions.
//!
//! The REST API is stateless, so a session keeps the conversation itself and
//! replays the full history with every message.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{Content, GenerateContentRequest, GenerationConfig, Tool};

/// Per-session overrides for [`GeminiClient::create_chat`](crate::GeminiClient::create_chat).
///
/// Unset fields fall back to the client's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
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
}

/// A conversation owned by one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    model: String,
    generation_config: GenerationConfig,
    tools: Vec<Tool>,
    history: Vec<Content>,
}

impl ChatSession {
    /// Opens an empty session from `config` with `options` applied on top.
    ///
    /// The search tool is attached when `config.use_search` is set.
    pub fn open(config: &ClientConfig, options: ChatOptions) -> Self {
        let tools = if config.use_search {
            vec![Tool::google_search()]
        } else {
            Vec::new()
        };

        Self {
            model: options.model.unwrap_or_else(|| config.model.clone()),
            generation_config: GenerationConfig {
                temperature: Some(options.temperature.unwrap_or(config.temperature)),
                top_p: Some(options.top_p.unwrap_or(config.top_p)),
                top_k: Some(options.top_k.unwrap_or(config.top_k)),
                max_output_tokens: Some(
                    options.max_output_tokens.unwrap_or(config.max_output_tokens),
                ),
                response_mime_type: None,
                response_modalities: Some(vec!["TEXT".to_string()]),
            },
            tools,
            history: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generation_config(&self) -> &GenerationConfig {
        &self.generation_config
    }

    /// Whether answers may be grounded in Google Search results.
    pub fn has_search(&self) -> bool {
        self.tools.iter().any(|tool| tool.google_search.is_some())
    }

    /// Completed turns, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// The request that sends `message` after the current history.
    pub(crate) fn request_for(&self, message: &str) -> GenerateContentRequest {
        let mut contents = self.history.clone();
        contents.push(Content::user(message));

        GenerateContentRequest {
            contents,
            system_instruction: None,
            generation_config: self.generation_config.clone(),
            safety_settings: Vec::new(),
            tools: self.tools.clone(),
        }
    }

    /// Appends a completed exchange and returns the reply text.
    pub(crate) fn record_exchange(&mut self, message: &str, reply: Content) -> Result<String> {
        let text = reply
            .text()
            .ok_or_else(|| Error::MalformedResponse("Reply carries no text parts".to_string()))?;
        self.history.push(Content::user(message));
        self.history.push(reply);
        Ok(text)
    }
}
