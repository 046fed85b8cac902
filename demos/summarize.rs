//! Example: Summarize a batch of articles concurrently
//!
//! All requests share one rate limiter, so a batch larger than ten items
//! slows down to ten requests per minute instead of getting throttled.

use nook_gemini::collector::DEFAULT_CONCURRENCY;
use nook_gemini::{create_client, summarize_all, ConfigOverrides, SourceItem};

const SYSTEM_INSTRUCTION: &str =
    "You summarize technical articles for engineers. Answer in three bullet points.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = create_client(
        None,
        ConfigOverrides::new().temperature(0.3).max_output_tokens(1024),
    )?;

    let items = vec![
        SourceItem::new(
            "Announcing Rust 1.85.0 and Rust 2024",
            "The Rust team is happy to announce a new version of Rust, 1.85.0, \
             which stabilizes the 2024 edition and async closures.",
        ),
        SourceItem::new(
            "Tokio: a runtime for writing reliable asynchronous applications",
            "Tokio provides a multi-threaded scheduler, an I/O driver and timers \
             for building network services in Rust.",
        ),
        SourceItem::new(
            "Token buckets explained",
            "A token bucket holds up to N tokens and refills at a fixed rate. \
             Each request spends one token and waits when the bucket is empty.",
        ),
    ];

    println!("Summarizing {} items...", items.len());
    let summaries = summarize_all(&client, &items, SYSTEM_INSTRUCTION, DEFAULT_CONCURRENCY).await;

    for (item, summary) in items.iter().zip(summaries) {
        println!("--------------------------------------------------");
        println!("{}", item.title);
        match summary {
            Some(text) => println!("{}", text),
            None => println!("(summary unavailable)"),
        }
    }
    println!("--------------------------------------------------");

    Ok(())
}
