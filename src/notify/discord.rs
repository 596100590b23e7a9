use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{split_chunks, NotificationSink, DEFAULT_CHUNK_LIMIT};
use crate::error::WatchError;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    chunk_limit: usize,
    pause: Duration,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self::with_client(webhook, Client::new())
    }

    /// Reuse an existing client (connection pool, user agent).
    pub fn with_client(webhook: String, client: Client) -> Self {
        Self {
            webhook,
            client,
            timeout: Duration::from_secs(20),
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            pause: Duration::from_millis(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chunk_limit(mut self, chars: usize) -> Self {
        self.chunk_limit = chars.max(1);
        self
    }

    /// Delay between consecutive chunks, to stay clear of rate limits.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    async fn send_chunk(&self, content: &str) -> Result<(), String> {
        let rsp = self
            .client
            .post(&self.webhook)
            .timeout(self.timeout)
            .json(&DiscordWebhookPayload { content })
            .send()
            .await
            .map_err(|e| format!("Discord webhook request failed: {e}"))?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(format!("Discord webhook HTTP {status}: {body}"));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn post(&self, body: &str) -> Result<usize, WatchError> {
        let chunks = split_chunks(body, self.chunk_limit);
        let total = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pause).await;
            }
            // No retry: the next scheduled run is the retry.
            self.send_chunk(chunk)
                .await
                .map_err(|reason| WatchError::DeliveryFailed {
                    chunk: i + 1,
                    total,
                    reason,
                })?;
            counter!("watch_chunks_sent_total").increment(1);
            tracing::debug!(chunk = i + 1, total, "discord chunk delivered");
        }
        Ok(total)
    }
}

#[derive(Serialize)]
struct DiscordWebhookPayload<'a> {
    content: &'a str,
}
