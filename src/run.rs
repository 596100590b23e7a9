// src/run.rs
//! One complete run: load → detect → categorize → assemble → post → save.

use metrics::{describe_counter, Unit};
use once_cell::sync::OnceCell;

use crate::categorize::Buckets;
use crate::config::WatchConfig;
use crate::detect::{detect_changes, NotificationLine};
use crate::error::WatchError;
use crate::message::assemble;
use crate::notify::NotificationSink;
use crate::sources::SourceFetcher;
use crate::state::StateStore;

/// One-time metrics registration (so series show up once a recorder exists).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "watch_fetch_absent_total",
            "Sources skipped because the fetch returned nothing."
        );
        describe_counter!(
            "watch_changes_total",
            "Sources whose marker changed since the previous run."
        );
        describe_counter!(
            "watch_chunks_sent_total",
            Unit::Count,
            "Webhook messages delivered."
        );
    });
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub changes: Vec<NotificationLine>,
    /// Assembled body, if there was anything to say.
    pub message: Option<String>,
    pub chunks_sent: usize,
}

impl RunReport {
    /// True when a message went out this run.
    pub fn delivered(&self) -> bool {
        self.chunks_sent > 0
    }
}

/// Execute one run.
///
/// State is saved exactly once at the end, also when delivery failed, so a
/// failed post does not turn into a notification storm on the next run. A
/// corrupt state file aborts before anything is fetched.
pub async fn run_once<F: SourceFetcher + ?Sized>(
    config: &WatchConfig,
    store: &StateStore,
    fetcher: &F,
    sink: Option<&dyn NotificationSink>,
) -> Result<RunReport, WatchError> {
    ensure_metrics_described();

    let mut state = store.load().await?;
    let changes = detect_changes(config, fetcher, &mut state).await;

    let message = assemble(&Buckets::from_lines(&changes));

    let mut chunks_sent = 0;
    let delivery = match (message.as_deref(), sink) {
        (None, _) => {
            tracing::info!("no new updates");
            Ok(())
        }
        (Some(_), None) => {
            tracing::warn!(
                changes = changes.len(),
                "no webhook configured, skipping delivery; state still advances"
            );
            Ok(())
        }
        (Some(body), Some(sink)) => {
            tracing::info!(changes = changes.len(), "sending notifications");
            sink.post(body).await.map(|n| chunks_sent = n)
        }
    };

    if let Err(e) = &delivery {
        tracing::error!(error = %e, "delivery failed, saving state anyway");
    }
    store.save(&state).await?;
    delivery?;

    Ok(RunReport {
        changes,
        message,
        chunks_sent,
    })
}
