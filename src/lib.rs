// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod categorize;
pub mod config;
pub mod detect;
pub mod error;
pub mod message;
pub mod notify;
pub mod run;
pub mod sources;
pub mod state;

// ---- Re-exports for stable public API ----
pub use crate::categorize::{categorize, Bucket, Buckets};
pub use crate::config::{RuntimeSettings, WatchConfig};
pub use crate::detect::{detect_changes, NotificationLine};
pub use crate::error::WatchError;
pub use crate::notify::{DiscordNotifier, NotificationSink};
pub use crate::run::{run_once, RunReport};
pub use crate::sources::{HttpFetcher, SourceFetcher};
pub use crate::state::{PersistedState, SourceCategory, StateStore};
