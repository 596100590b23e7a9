use reqwest::{header, Client};
use serde::Deserialize;

/// Latest published release of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Marker stored in state.
    pub tag: String,
    /// Release title; the tag when the release has no separate name.
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

pub fn parse_release(body: &str) -> Option<ReleaseInfo> {
    let rel: ReleaseResponse = serde_json::from_str(body).ok()?;
    let tag = rel.tag_name.map(|t| t.trim().to_string()).unwrap_or_default();
    if tag.is_empty() {
        return None;
    }
    let name = rel
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| tag.clone());
    Some(ReleaseInfo {
        tag,
        name,
        url: rel.html_url.unwrap_or_default(),
    })
}

pub async fn fetch_latest_release(
    client: &Client,
    api_base: &str,
    token: Option<&str>,
    owner: &str,
    repo: &str,
) -> Option<ReleaseInfo> {
    let url = format!("{api_base}/repos/{owner}/{repo}/releases/latest");
    let mut req = client
        .get(&url)
        .header(header::ACCEPT, "application/vnd.github+json");
    if let Some(t) = token {
        req = req.bearer_auth(t);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(owner, repo, error = %e, "github: request failed");
            return None;
        }
    };
    let status = resp.status();
    if !status.is_success() {
        // 404 here just means the repo has no published release yet.
        tracing::warn!(owner, repo, %status, "github: non-success status");
        return None;
    }
    let body = match resp.text().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(owner, repo, error = %e, "github: reading body failed");
            return None;
        }
    };
    let rel = parse_release(&body);
    if rel.is_none() {
        tracing::warn!(owner, repo, "github: release without tag_name");
    }
    rel
}
