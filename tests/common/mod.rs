#![allow(dead_code)]

use async_trait::async_trait;
use nook_gemini::{
    ClientConfig, Error, GeminiClient, GenerateContentRequest, GenerateContentResponse,
    RateLimiter, Result, Transport,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Reply = Box<dyn Fn(usize) -> Result<GenerateContentResponse> + Send + Sync>;

/// Transport that answers from a closure of the 1-based call number and
/// records every request it sees.
pub struct ScriptedTransport {
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, GenerateContentRequest)>>,
    reply: Reply,
}

impl ScriptedTransport {
    pub fn new(
        reply: impl Fn(usize) -> Result<GenerateContentResponse> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    /// Always answers with `text`.
    pub fn ok(text: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(GenerateContentResponse::from_text(text)))
    }

    /// Echoes the call number, e.g. `reply 3`.
    pub fn counting() -> Arc<Self> {
        Self::new(|n| Ok(GenerateContentResponse::from_text(format!("reply {n}"))))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> (String, GenerateContentRequest) {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));
        (self.reply)(n)
    }
}

pub fn throttled() -> Error {
    Error::Api {
        status: 429,
        message: "Resource has been exhausted".to_string(),
    }
}

pub fn bad_request() -> Error {
    Error::Api {
        status: 400,
        message: "Invalid argument".to_string(),
    }
}

/// A client over `transport` with its own default limiter.
pub fn client_with(transport: Arc<ScriptedTransport>) -> (GeminiClient, Arc<RateLimiter>) {
    let limiter = Arc::new(RateLimiter::default());
    let client =
        GeminiClient::with_transport(ClientConfig::default(), transport, limiter.clone()).unwrap();
    (client, limiter)
}
