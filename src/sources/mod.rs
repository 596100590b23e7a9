// src/sources/mod.rs
//! Source fetchers. Every failure (transport, status, parse) collapses into
//! `None` at this boundary; callers never learn why a source was unavailable.

pub mod feed;
pub mod github;
pub mod npm;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::RuntimeSettings;

pub use feed::FeedEntry;
pub use github::ReleaseInfo;

const USER_AGENT: &str = concat!("ai-update-watch/", env!("CARGO_PKG_VERSION"));

/// Lookups the change detector needs. `None` means "unavailable this run".
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn npm_latest(&self, pkg: &str) -> Option<String>;
    async fn github_latest_release(&self, owner: &str, repo: &str) -> Option<ReleaseInfo>;
    async fn feed_latest(&self, url: &str) -> Option<FeedEntry>;
}

/// Production fetcher: one shared client, bounded per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    npm_registry_url: String,
    github_api_url: String,
    github_token: Option<String>,
}

impl HttpFetcher {
    pub fn from_settings(s: &RuntimeSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(s.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            npm_registry_url: s.npm_registry_url.trim_end_matches('/').to_string(),
            github_api_url: s.github_api_url.trim_end_matches('/').to_string(),
            github_token: s.github_token.clone(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn npm_latest(&self, pkg: &str) -> Option<String> {
        npm::fetch_latest(&self.client, &self.npm_registry_url, pkg).await
    }

    async fn github_latest_release(&self, owner: &str, repo: &str) -> Option<ReleaseInfo> {
        github::fetch_latest_release(
            &self.client,
            &self.github_api_url,
            self.github_token.as_deref(),
            owner,
            repo,
        )
        .await
    }

    async fn feed_latest(&self, url: &str) -> Option<FeedEntry> {
        feed::fetch_latest(&self.client, url).await
    }
}
