//! ai-update-watch — Binary Entrypoint
//! Performs a single check-and-notify run and exits; scheduling is external
//! (cron, CI schedule). Non-zero exit on corrupt state or failed delivery.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ai_update_watch::config::{load_config_default, RuntimeSettings};
use ai_update_watch::{run_once, DiscordNotifier, HttpFetcher, NotificationSink, StateStore};

/// Compact human logs by default; `LOG_FORMAT=json` for machine-readable lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ai_update_watch=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = RuntimeSettings::from_env();
    let config = load_config_default().context("loading watch config")?;
    tracing::debug!(?config, "watch config");

    let fetcher = HttpFetcher::from_settings(&settings).context("building http client")?;
    let store = StateStore::new(&settings.state_path);

    let discord = settings.webhook_url.clone().map(|url| {
        DiscordNotifier::with_client(url, fetcher.client().clone())
            .with_timeout(settings.http_timeout)
    });
    if discord.is_none() {
        tracing::warn!("DISCORD_WEBHOOK_URL is not set; changes will be recorded but not sent");
    }
    let sink = discord.as_ref().map(|d| d as &dyn NotificationSink);

    let report = match run_once(&config, &store, &fetcher, sink).await {
        Ok(r) => r,
        Err(e) => {
            let phase = if e.is_state_error() { "state" } else { "delivery" };
            tracing::error!(phase, error = %e, "run failed");
            return Err(e.into());
        }
    };

    tracing::info!(
        changes = report.changes.len(),
        chunks = report.chunks_sent,
        delivered = report.delivered(),
        "run complete"
    );
    Ok(())
}
