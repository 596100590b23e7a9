// src/config/watch.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_WATCH_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";

pub const DEFAULT_FEED_URL: &str = "https://openai.com/news/rss.xml";
pub const DEFAULT_FEED_KEY: &str = "openai_news";
pub const DEFAULT_FEED_LABEL: &str = "openai";

/// What to watch. Built once at start and passed into the detector by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchConfig {
    /// npm package ids, checked in this order.
    #[serde(default)]
    pub npm_packages: Vec<String>,
    /// GitHub repositories whose latest release is tracked, in this order.
    #[serde(default)]
    pub github_releases: Vec<ReleaseSpec>,
    #[serde(default)]
    pub feed: FeedSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseSpec {
    pub owner: String,
    pub repo: String,
    /// State key and display label. Empty means `owner/repo`.
    #[serde(default)]
    pub label: String,
}

impl ReleaseSpec {
    pub fn new(owner: &str, repo: &str, label: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSpec {
    pub url: String,
    /// Key under `rss` in the state file.
    #[serde(default = "default_feed_key")]
    pub key: String,
    /// Source label fed to the categorizer together with the line text.
    #[serde(default = "default_feed_label")]
    pub label: String,
}

fn default_feed_key() -> String {
    DEFAULT_FEED_KEY.to_string()
}
fn default_feed_label() -> String {
    DEFAULT_FEED_LABEL.to_string()
}

impl Default for FeedSpec {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            key: default_feed_key(),
            label: default_feed_label(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            npm_packages: vec![
                "@openai/codex".to_string(),
                "@anthropic-ai/claude-code".to_string(),
            ],
            github_releases: vec![ReleaseSpec::new("openai", "codex", "openai/codex")],
            feed: FeedSpec::default(),
        }
    }
}

impl WatchConfig {
    /// Trim entries, drop blanks, fill empty release labels and drop duplicate
    /// state keys (first occurrence wins, so configured order is preserved).
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.npm_packages = self
            .npm_packages
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect();

        let mut seen = HashSet::new();
        self.github_releases = self
            .github_releases
            .into_iter()
            .filter_map(|r| {
                let owner = r.owner.trim().to_string();
                let repo = r.repo.trim().to_string();
                if owner.is_empty() || repo.is_empty() {
                    return None;
                }
                let label = match r.label.trim() {
                    "" => format!("{owner}/{repo}"),
                    l => l.to_string(),
                };
                seen.insert(label.clone())
                    .then_some(ReleaseSpec { owner, repo, label })
            })
            .collect();

        self.feed.url = self.feed.url.trim().to_string();
        if self.feed.key.trim().is_empty() {
            self.feed.key = default_feed_key();
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<WatchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watch config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing watch config {}", path.display()))
}

/// Candidates tried in order when `$WATCH_CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_CANDIDATES: [&str; 2] = ["config/watch.toml", "config/watch.json"];

/// `$WATCH_CONFIG_PATH` must exist if set; otherwise the first existing
/// candidate wins, and with none on disk the built-in source list is used.
pub fn load_config_default() -> Result<WatchConfig> {
    if let Some(p) = std::env::var_os(ENV_WATCH_CONFIG_PATH) {
        let path = PathBuf::from(p);
        if !path.exists() {
            return Err(anyhow!(
                "{ENV_WATCH_CONFIG_PATH}={} does not exist",
                path.display()
            ));
        }
        return load_config_from(&path);
    }

    match DEFAULT_CONFIG_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
    {
        Some(path) => load_config_from(path),
        None => {
            tracing::debug!("no config file found, using built-in sources");
            Ok(WatchConfig::default())
        }
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<WatchConfig> {
    let looks_json = s.trim_start().starts_with('{');
    let cfg = match hint_ext {
        "toml" => toml::from_str::<WatchConfig>(s)?,
        "json" => serde_json::from_str::<WatchConfig>(s)?,
        _ if looks_json => serde_json::from_str::<WatchConfig>(s)?,
        _ => toml::from_str::<WatchConfig>(s)?,
    };
    Ok(cfg.normalized())
}
