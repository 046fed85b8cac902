//! Rate-limited, retrying Gemini client with one-shot and chat modes.

use crate::chat::{ChatOptions, ChatSession};
use crate::config::{ClientConfig, ConfigOverrides};
use crate::error::{Error, Result};
use crate::models::{
    Content, Contents, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    SafetySetting,
};
use crate::rate_limit::RateLimiter;
use crate::retry::{with_retry, RetryPolicy};
use crate::transport::{HttpTransport, Transport};
use crate::utils::load_api_key;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long a call waits for a rate limit token before giving up.
pub const RATE_LIMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call overrides for [`GeminiClient::generate_content`].
///
/// Unset fields fall back to the client's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub system_instruction: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub response_mime_type: Option<String>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
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
}

/// Client for the Gemini API.
///
/// Every remote call takes a token from the shared [`RateLimiter`] first and
/// is retried on transient failures according to the [`RetryPolicy`].
///
/// Two modes are offered:
/// - [`generate_content`](Self::generate_content): stateless one-shot prompts,
///   usable from many tasks at once through `&self`.
/// - [`create_chat`](Self::create_chat) + [`send_message`](Self::send_message):
///   one conversation per client, which needs `&mut self`.
///
/// # Example
/// ```no_run
/// use nook_gemini::{create_client, ConfigOverrides, GenerateOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = create_client(None, ConfigOverrides::new())?;
///
///     let summary = client
///         .generate_content(
///             "Summarize: Rust 1.80 stabilizes LazyLock.",
///             GenerateOptions::new().system_instruction("Answer in one sentence."),
///         )
///         .await?;
///     println!("{}", summary);
///
///     let answer = client.chat_with_search("What changed since then?", None).await?;
///     println!("{}", answer);
///     Ok(())
/// }
/// ```
pub struct GeminiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    acquire_timeout: Duration,
    chat: Option<ChatSession>,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("chat", &self.chat.as_ref().map(ChatSession::model))
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Creates a client talking to the Gemini REST API.
    ///
    /// Reads the API key from `GEMINI_API_KEY` and shares the process-wide
    /// [`RateLimiter::shared`] limiter.
    ///
    /// # Errors
    /// Returns [`Error::MissingApiKey`] when the key is absent and
    /// [`Error::Config`] when the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let api_key = load_api_key()?;
        let transport = HttpTransport::new(&api_key, config.timeout())?;
        Self::with_transport(config, Arc::new(transport), RateLimiter::shared())
    }

    /// Creates a client over an explicit transport and limiter.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            limiter,
            retry: RetryPolicy::default(),
            acquire_timeout: RATE_LIMIT_TIMEOUT,
            chat: None,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets how long each call may wait for a rate limit token.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// The active chat session, if [`create_chat`](Self::create_chat) was called.
    pub fn chat(&self) -> Option<&ChatSession> {
        self.chat.as_ref()
    }

    /// Generates text from one or more prompts.
    ///
    /// # Arguments
    /// * `contents` - A prompt, or an ordered list of prompts
    /// * `options` - Per-call overrides of the client configuration
    ///
    /// # Returns
    /// The text of the first part of the first candidate.
    ///
    /// # Errors
    /// [`Error::RateLimitTimeout`] when no token was available in time (no
    /// request is sent), [`Error::MalformedResponse`] when the answer has no
    /// text, and the last remote error once retries are exhausted.
    pub async fn generate_content(
        &self,
        contents: impl Into<Contents>,
        options: GenerateOptions,
    ) -> Result<String> {
        let contents = contents.into();
        if contents.prompts().is_empty() {
            return Err(Error::InvalidRequest(
                "contents must hold at least one prompt".to_string(),
            ));
        }

        let (model, request) = self.generate_request(contents, options);
        let (model, request) = (model.as_str(), &request);
        with_retry(&self.retry, Error::is_transient, move || {
            self.generate_once(model, request)
        })
        .await
    }

    /// Starts a new chat session, discarding the current one.
    ///
    /// The session gets the search tool when the configuration has
    /// `use_search` enabled. No request is sent until
    /// [`send_message`](Self::send_message).
    pub fn create_chat(&mut self, options: ChatOptions) {
        let session = ChatSession::open(&self.config, options);
        info!(
            model = session.model(),
            search = session.has_search(),
            "Created chat session"
        );
        self.chat = Some(session);
    }

    /// Sends a message in the current chat session and returns the reply.
    ///
    /// # Errors
    /// [`Error::NoActiveChat`] without a prior [`create_chat`](Self::create_chat);
    /// nothing is sent and no token is taken in that case.
    pub async fn send_message(&mut self, message: &str) -> Result<String> {
        let session = self.chat.as_ref().ok_or(Error::NoActiveChat)?;
        let model = session.model().to_string();
        let request = session.request_for(message);

        let reply = {
            let this: &Self = self;
            let (model, request) = (model.as_str(), &request);
            with_retry(&this.retry, Error::is_transient, move || {
                this.send_once(model, request)
            })
            .await?
        };

        self.chat
            .as_mut()
            .ok_or(Error::NoActiveChat)?
            .record_exchange(message, reply)
    }

    /// Opens a search-grounded chat session and sends `message` through it.
    ///
    /// The client's own configuration is left as it is; the session is built
    /// from a copy with search enabled. A transient failure re-runs the whole
    /// create-and-send sequence. On success the new session replaces the
    /// current one, so follow-ups can go through
    /// [`send_message`](Self::send_message).
    pub async fn chat_with_search(&mut self, message: &str, model: Option<&str>) -> Result<String> {
        let config = self.config.with_search(true);
        let options = ChatOptions {
            model: model.map(str::to_string),
            ..ChatOptions::default()
        };

        let (mut session, reply) = {
            let this: &Self = self;
            let (config, options) = (&config, &options);
            with_retry(&this.retry, Error::is_transient, move || {
                this.search_attempt(config, options, message)
            })
            .await?
        };

        let text = session.record_exchange(message, reply)?;
        self.chat = Some(session);
        Ok(text)
    }

    fn generate_request(
        &self,
        contents: Contents,
        options: GenerateOptions,
    ) -> (String, GenerateContentRequest) {
        let config = &self.config;
        let request = GenerateContentRequest {
            contents: vec![contents.into_user_content()],
            system_instruction: options
                .system_instruction
                .filter(|instruction| !instruction.is_empty())
                .map(Content::instruction),
            generation_config: GenerationConfig {
                temperature: Some(options.temperature.unwrap_or(config.temperature)),
                top_p: Some(options.top_p.unwrap_or(config.top_p)),
                top_k: Some(options.top_k.unwrap_or(config.top_k)),
                max_output_tokens: Some(
                    options.max_output_tokens.unwrap_or(config.max_output_tokens),
                ),
                response_mime_type: Some(
                    options
                        .response_mime_type
                        .unwrap_or_else(|| config.response_mime_type.clone()),
                ),
                response_modalities: None,
            },
            safety_settings: SafetySetting::block_none_all(),
            tools: Vec::new(),
        };
        let model = options.model.unwrap_or_else(|| config.model.clone());
        (model, request)
    }

    async fn generate_once(&self, model: &str, request: &GenerateContentRequest) -> Result<String> {
        self.call(model, request).await?.first_text()
    }

    async fn send_once(&self, model: &str, request: &GenerateContentRequest) -> Result<Content> {
        let response = self.call(model, request).await?;
        response.first_content().cloned()
    }

    async fn search_attempt(
        &self,
        config: &ClientConfig,
        options: &ChatOptions,
        message: &str,
    ) -> Result<(ChatSession, Content)> {
        self.limiter.acquire(self.acquire_timeout).await?;

        let session = ChatSession::open(config, options.clone());
        let request = session.request_for(message);
        let reply = self.send_once(session.model(), &request).await?;
        Ok((session, reply))
    }

    /// Takes a rate limit token, then performs one remote call.
    async fn call(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.limiter.acquire(self.acquire_timeout).await?;
        debug!(%model, "Calling Gemini");
        self.transport.generate_content(model, request).await
    }
}

/// Creates a client from the defaults, `config` and `overrides`, in that order.
///
/// # Arguments
/// * `config` - Optional base overrides, e.g. parsed with [`ConfigOverrides::from_value`]
/// * `overrides` - Field overrides that take precedence over `config`
///
/// # Errors
/// Returns [`Error::MissingApiKey`] when `GEMINI_API_KEY` is not set and
/// [`Error::Config`] when the merged configuration is invalid.
pub fn create_client(
    config: Option<ConfigOverrides>,
    overrides: ConfigOverrides,
) -> Result<GeminiClient> {
    let merged = config.unwrap_or_default().merge(overrides);
    let config = ClientConfig::from_overrides(&merged);
    debug!(
        model = %config.model,
        use_search = config.use_search,
        "Creating Gemini client"
    );
    GeminiClient::new(config)
}
