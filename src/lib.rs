//! Rate-limited, retrying async client for the Gemini API.
//!
//! This library is the one path from the nook collectors (papers, Hacker News,
//! Reddit, tech feeds) and the viewer's follow-up chat to Google Gemini. Every
//! remote call goes through a process-wide token bucket (10 requests per
//! minute by default) and is retried with exponential backoff on throttling,
//! server errors and timeouts.
//!
//! # Example
//! ```no_run
//! use nook_gemini::{create_client, ChatOptions, ConfigOverrides};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment
//!     let mut client = create_client(None, ConfigOverrides::new().temperature(0.7))?;
//!
//!     client.create_chat(ChatOptions::default());
//!     let response = client.send_message("Hello! Tell me a joke.").await?;
//!     println!("{}", response);
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod client;
pub mod collector;
pub mod config;
pub mod enums;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod retry;
pub mod transport;
pub mod utils;

// Re-exports for convenience
pub use chat::{ChatOptions, ChatSession};
pub use client::{create_client, GeminiClient, GenerateOptions};
pub use collector::{summarize_all, SourceItem, Summarizable};
pub use config::{ClientConfig, ConfigOverrides};
pub use enums::Model;
pub use error::{Error, Result};
pub use models::{Contents, GenerateContentRequest, GenerateContentResponse};
pub use rate_limit::RateLimiter;
pub use retry::{with_retry, RetryPolicy};
pub use transport::{HttpTransport, Transport};
pub use utils::load_api_key;
