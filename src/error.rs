// src/error.rs
use std::path::PathBuf;

/// Fatal run errors. Per-source fetch failures never show up here; fetchers
/// collapse them into an absent result.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("state file {} is corrupt: {source}", .path.display())]
    StateCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state file {} i/o failed: {source}", .path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("delivery of chunk {chunk}/{total} failed: {reason}")]
    DeliveryFailed {
        chunk: usize,
        total: usize,
        reason: String,
    },
}

impl WatchError {
    /// True for the two categories an external scheduler should alert on.
    pub fn is_state_error(&self) -> bool {
        matches!(self, Self::StateCorrupt { .. } | Self::StateIo { .. })
    }
}
