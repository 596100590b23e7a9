//! Change detector: compares freshly fetched markers with the stored ones and
//! emits one notification line per changed source.
//!
//! Fetches for the three categories run concurrently; results are applied in
//! a fixed order (packages, releases, feed) so output is reproducible.

use metrics::counter;

use crate::config::WatchConfig;
use crate::sources::{npm, FeedEntry, ReleaseInfo, SourceFetcher};
use crate::state::{PersistedState, SourceCategory};

/// One changed source, formatted for the chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationLine {
    pub category: SourceCategory,
    /// State key (package id, release label, feed key).
    pub source_id: String,
    /// Extra text the categorizer looks at besides `text`.
    pub source_label: String,
    pub text: String,
}

pub fn format_npm(pkg: &str, version: &str) -> String {
    format!(
        "📦 npm: `{pkg}` → **{version}**\n{}",
        npm::package_page(pkg)
    )
}

pub fn format_release(label: &str, rel: &ReleaseInfo) -> String {
    format!(
        "🏷️ GitHub: `{label}` → **{}** ({})\n{}",
        rel.name, rel.tag, rel.url
    )
}

pub fn format_news(entry: &FeedEntry) -> String {
    format!("📰 News: **{}**\n{}", entry.title, entry.link)
}

/// Fetch every configured source and fold the results into `state`.
///
/// Absent fetches are skipped without touching state. An unchanged marker is
/// a no-op. A changed or never-seen marker overwrites state and yields exactly
/// one line.
pub async fn detect_changes<F: SourceFetcher + ?Sized>(
    config: &WatchConfig,
    fetcher: &F,
    state: &mut PersistedState,
) -> Vec<NotificationLine> {
    let npm_fut = async {
        let mut out = Vec::with_capacity(config.npm_packages.len());
        for pkg in &config.npm_packages {
            out.push(fetcher.npm_latest(pkg).await);
        }
        out
    };
    let gh_fut = async {
        let mut out = Vec::with_capacity(config.github_releases.len());
        for r in &config.github_releases {
            out.push(fetcher.github_latest_release(&r.owner, &r.repo).await);
        }
        out
    };
    let feed_fut = async {
        if config.feed.url.is_empty() {
            tracing::debug!("feed disabled (empty url)");
            return None;
        }
        fetcher.feed_latest(&config.feed.url).await
    };

    let (npm_results, gh_results, feed_result) = tokio::join!(npm_fut, gh_fut, feed_fut);

    let mut lines = Vec::new();

    tracing::info!(count = config.npm_packages.len(), "checking npm packages");
    for (pkg, latest) in config.npm_packages.iter().zip(npm_results) {
        let Some(latest) = latest else {
            absent(SourceCategory::Npm, pkg);
            continue;
        };
        lines.extend(record_change(
            state,
            SourceCategory::Npm,
            pkg,
            &latest,
            pkg,
            || format_npm(pkg, &latest),
        ));
    }

    tracing::info!(count = config.github_releases.len(), "checking github releases");
    for (spec, rel) in config.github_releases.iter().zip(gh_results) {
        let Some(rel) = rel else {
            absent(SourceCategory::Github, &spec.label);
            continue;
        };
        lines.extend(record_change(
            state,
            SourceCategory::Github,
            &spec.label,
            &rel.tag,
            &spec.label,
            || format_release(&spec.label, &rel),
        ));
    }

    tracing::info!(url = %config.feed.url, "checking news feed");
    match feed_result {
        Some(entry) => lines.extend(record_change(
            state,
            SourceCategory::Rss,
            &config.feed.key,
            &entry.id,
            &config.feed.label,
            || format_news(&entry),
        )),
        None if !config.feed.url.is_empty() => absent(SourceCategory::Rss, &config.feed.key),
        None => {}
    }

    lines
}

/// The only place state is mutated: the marker write and the returned line
/// always happen together.
fn record_change(
    state: &mut PersistedState,
    category: SourceCategory,
    id: &str,
    marker: &str,
    source_label: &str,
    render: impl FnOnce() -> String,
) -> Option<NotificationLine> {
    let prev = state.marker(category, id);
    if prev == Some(marker) {
        tracing::debug!(category = category.as_str(), id, marker, "unchanged");
        return None;
    }

    tracing::info!(
        category = category.as_str(),
        id,
        prev = prev.unwrap_or("<none>"),
        new = marker,
        "change detected"
    );
    state.set_marker(category, id, marker);
    counter!("watch_changes_total", "category" => category.as_str()).increment(1);

    Some(NotificationLine {
        category,
        source_id: id.to_string(),
        source_label: source_label.to_string(),
        text: render(),
    })
}

fn absent(category: SourceCategory, id: &str) {
    tracing::warn!(category = category.as_str(), id, "source unavailable, skipping");
    counter!("watch_fetch_absent_total", "category" => category.as_str()).increment(1);
}
