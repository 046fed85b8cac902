//! What collectors hand to the client, and batch summarization over it.

use crate::client::{GeminiClient, GenerateOptions};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Worker count the paper summarizer uses for its batches.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// An item a collector wants summarized.
pub trait Summarizable {
    fn title(&self) -> &str;

    fn body(&self) -> &str;

    /// The prompt sent for this item: title, blank line, body.
    fn prompt(&self) -> String {
        format!("{}\n\n{}", self.title(), self.body())
    }
}

/// A fetched article, post or paper reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub title: String,
    pub body: String,
}

impl SourceItem {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl Summarizable for SourceItem {
    fn title(&self) -> &str {
        &self.title
    }

    fn body(&self) -> &str {
        &self.body
    }
}

/// Summarizes `items` with up to `concurrency` requests in flight.
///
/// Results line up with `items`. An item whose summary fails (after the
/// client's own retries) is logged and comes back as `None`, so one bad item
/// never sinks the rest of the batch. All requests share the client's rate
/// limiter.
pub async fn summarize_all<T: Summarizable>(
    client: &GeminiClient,
    items: &[T],
    system_instruction: &str,
    concurrency: usize,
) -> Vec<Option<String>> {
    let summaries: Vec<Option<String>> = stream::iter(items)
        .map(move |item| async move {
            let options = GenerateOptions::new().system_instruction(system_instruction);
            match client.generate_content(item.prompt(), options).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(title = item.title(), error = %e, "Failed to summarize item, skipping");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let succeeded = summaries.iter().filter(|s| s.is_some()).count();
    info!(total = items.len(), succeeded, "Summarized batch");
    summaries
}
