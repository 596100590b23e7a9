// tests/run_once.rs
//! End-to-end runs against a scripted fetcher and a recording sink.

use ai_update_watch::config::{FeedSpec, ReleaseSpec, WatchConfig};
use ai_update_watch::sources::{FeedEntry, ReleaseInfo};
use ai_update_watch::{
    run_once, NotificationSink, PersistedState, SourceCategory, SourceFetcher, StateStore,
    WatchError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

// --- test doubles ---

#[derive(Default)]
struct ScriptedFetcher {
    npm: HashMap<String, String>,
    releases: HashMap<String, ReleaseInfo>,
    feed: Option<FeedEntry>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn npm(mut self, pkg: &str, v: &str) -> Self {
        self.npm.insert(pkg.into(), v.into());
        self
    }
    fn release(mut self, owner_repo: &str, tag: &str, name: &str) -> Self {
        self.releases.insert(
            owner_repo.into(),
            ReleaseInfo {
                tag: tag.into(),
                name: name.into(),
                url: format!("https://github.com/{owner_repo}/releases/tag/{tag}"),
            },
        );
        self
    }
    fn feed(mut self, title: &str, id: &str) -> Self {
        self.feed = Some(FeedEntry {
            title: title.into(),
            link: format!("https://openai.com/index/{id}"),
            id: id.into(),
        });
        self
    }
}

#[async_trait]
impl SourceFetcher for ScriptedFetcher {
    async fn npm_latest(&self, pkg: &str) -> Option<String> {
        self.calls.lock().unwrap().push(format!("npm:{pkg}"));
        self.npm.get(pkg).cloned()
    }
    async fn github_latest_release(&self, owner: &str, repo: &str) -> Option<ReleaseInfo> {
        self.calls.lock().unwrap().push(format!("gh:{owner}/{repo}"));
        self.releases.get(&format!("{owner}/{repo}")).cloned()
    }
    async fn feed_latest(&self, _url: &str) -> Option<FeedEntry> {
        self.calls.lock().unwrap().push("feed".into());
        self.feed.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    bodies: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn post(&self, body: &str) -> Result<usize, WatchError> {
        self.bodies.lock().unwrap().push(body.to_string());
        if self.fail {
            return Err(WatchError::DeliveryFailed {
                chunk: 1,
                total: 1,
                reason: "HTTP 500".into(),
            });
        }
        Ok(1)
    }
}

fn config() -> WatchConfig {
    WatchConfig {
        npm_packages: vec!["@openai/codex".into(), "@anthropic-ai/claude-code".into()],
        github_releases: vec![ReleaseSpec::new("openai", "codex", "openai/codex")],
        feed: FeedSpec::default(),
    }
}

fn store_in(dir: &tempfile::TempDir) -> StateStore {
    StateStore::new(dir.path().join("state.json"))
}

// --- tests ---

#[tokio::test]
async fn first_run_notifies_everything_second_run_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let fetcher = ScriptedFetcher::default()
        .npm("@openai/codex", "0.46.0")
        .npm("@anthropic-ai/claude-code", "2.0.14")
        .release("openai/codex", "rust-v0.46.0", "0.46.0")
        .feed("New model", "guid-1");
    let sink = RecordingSink::default();

    let r1 = run_once(&config(), &store, &fetcher, Some(&sink)).await.unwrap();
    assert_eq!(r1.changes.len(), 4);
    assert!(r1.delivered());

    let r2 = run_once(&config(), &store, &fetcher, Some(&sink)).await.unwrap();
    assert!(r2.changes.is_empty());
    assert!(r2.message.is_none());
    assert!(!r2.delivered());

    let bodies = sink.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1, "second run must not post");

    let body = &bodies[0];
    let openai = body.find("OpenAI Updates").unwrap();
    let anthropic = body.find("Anthropic Updates").unwrap();
    assert!(openai < anthropic);
    assert!(body.starts_with("🚨 **AI Tech Updates**\n\n"));
    // discovery order inside the OpenAI section: package, release, feed
    let p = body.find("`@openai/codex`").unwrap();
    let g = body.find("`openai/codex`").unwrap();
    let n = body.find("📰 News: **New model**").unwrap();
    assert!(openai < p && p < g && g < n && n < anthropic);
}

#[tokio::test]
async fn unchanged_marker_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), r#"{"npm":{"pkgA":"1.0.0"}}"#).unwrap();

    let cfg = WatchConfig {
        npm_packages: vec!["pkgA".into()],
        github_releases: vec![],
        feed: FeedSpec {
            url: String::new(),
            ..FeedSpec::default()
        },
    };
    let fetcher = ScriptedFetcher::default().npm("pkgA", "1.0.0");
    let sink = RecordingSink::default();

    let r = run_once(&cfg, &store, &fetcher, Some(&sink)).await.unwrap();
    assert!(r.changes.is_empty());
    assert!(sink.bodies.lock().unwrap().is_empty());
    assert_eq!(
        store.load().await.unwrap().marker(SourceCategory::Npm, "pkgA"),
        Some("1.0.0")
    );
}

#[tokio::test]
async fn new_release_produces_single_section() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let cfg = WatchConfig {
        npm_packages: vec![],
        github_releases: vec![ReleaseSpec::new("acme", "tool", "label")],
        feed: FeedSpec {
            url: String::new(),
            ..FeedSpec::default()
        },
    };
    let fetcher = ScriptedFetcher::default().release("acme/tool", "v2.0", "Version 2");
    let sink = RecordingSink::default();

    let r = run_once(&cfg, &store, &fetcher, Some(&sink)).await.unwrap();
    assert_eq!(r.changes.len(), 1);
    assert!(r.changes[0].text.contains("**Version 2** (v2.0)"));

    let mut expected = PersistedState::default();
    expected.set_marker(SourceCategory::Github, "label", "v2.0");
    assert_eq!(store.load().await.unwrap(), expected);

    let bodies = sink.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].matches("Updates**").count(), 2); // banner + one section
    assert!(bodies[0].contains("⬜ **Other Updates**"));
}

#[tokio::test]
async fn absent_sources_leave_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        r#"{"npm":{"@openai/codex":"0.1.0"},"github":{},"rss":{"openai_news":"old"}}"#,
    )
    .unwrap();

    // only claude-code answers; everything else is unavailable
    let fetcher = ScriptedFetcher::default().npm("@anthropic-ai/claude-code", "2.0.0");
    let sink = RecordingSink::default();

    let r = run_once(&config(), &store, &fetcher, Some(&sink)).await.unwrap();
    assert_eq!(r.changes.len(), 1);
    assert_eq!(r.changes[0].source_id, "@anthropic-ai/claude-code");

    let st = store.load().await.unwrap();
    assert_eq!(st.marker(SourceCategory::Npm, "@openai/codex"), Some("0.1.0"));
    assert_eq!(st.marker(SourceCategory::Rss, "openai_news"), Some("old"));
    assert_eq!(st.marker(SourceCategory::Github, "openai/codex"), None);

    let calls = fetcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 4, "every source is still attempted: {calls:?}");
}

#[tokio::test]
async fn missing_sink_still_advances_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let fetcher = ScriptedFetcher::default().npm("@openai/codex", "1.0.0");

    let r = run_once(&config(), &store, &fetcher, None).await.unwrap();
    assert_eq!(r.changes.len(), 1);
    assert!(r.message.is_some());
    assert!(!r.delivered());
    assert_eq!(
        store.load().await.unwrap().marker(SourceCategory::Npm, "@openai/codex"),
        Some("1.0.0")
    );
}

#[tokio::test]
async fn delivery_failure_is_fatal_but_state_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let fetcher = ScriptedFetcher::default().feed("Post", "guid-9");
    let sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };

    let err = run_once(&config(), &store, &fetcher, Some(&sink))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::DeliveryFailed { .. }));
    assert_eq!(
        store.load().await.unwrap().marker(SourceCategory::Rss, "openai_news"),
        Some("guid-9")
    );
}

#[tokio::test]
async fn corrupt_state_aborts_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "not json at all").unwrap();
    let fetcher = ScriptedFetcher::default().npm("@openai/codex", "1.0.0");
    let sink = RecordingSink::default();

    let err = run_once(&config(), &store, &fetcher, Some(&sink))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::StateCorrupt { .. }));
    assert!(fetcher.calls.lock().unwrap().is_empty());
    // file is left as-is for a human to look at
    assert_eq!(
        std::fs::read_to_string(store.path()).unwrap(),
        "not json at all"
    );
}
