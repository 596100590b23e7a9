pub mod discord;

use async_trait::async_trait;

use crate::error::WatchError;

pub use discord::DiscordNotifier;

/// Discord rejects messages over 2000 characters; leave room for formatting.
pub const DEFAULT_CHUNK_LIMIT: usize = 1900;

/// Where an assembled message body goes.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `body` (split as needed). Returns the number of chunks sent.
    async fn post(&self, body: &str) -> Result<usize, WatchError>;
}

/// Split into consecutive pieces of at most `limit` characters. Counts
/// `char`s, so a multi-byte emoji is never cut in half.
pub fn split_chunks(body: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut out = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(limit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        out.push(head);
        rest = tail;
    }
    out
}
