use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
}

/// `{base}/{pkg}` with the id pushed as a single path segment, so a scoped id
/// like `@openai/codex` becomes `@openai%2Fcodex`.
pub fn registry_url(base: &str, pkg: &str) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(pkg);
    Some(url)
}

/// Human-facing package page, used in the notification's link line.
pub fn package_page(pkg: &str) -> String {
    format!("https://www.npmjs.com/package/{pkg}")
}

/// `dist-tags.latest` from a registry document; blank counts as absent.
pub fn parse_latest(body: &str) -> Option<String> {
    let doc: Packument = serde_json::from_str(body).ok()?;
    doc.dist_tags
        .get("latest")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn fetch_latest(client: &Client, base: &str, pkg: &str) -> Option<String> {
    let Some(url) = registry_url(base, pkg) else {
        tracing::warn!(pkg, base, "npm: cannot build registry url");
        return None;
    };

    let resp = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(pkg, error = %e, "npm: request failed");
            return None;
        }
    };
    let status = resp.status();
    if !status.is_success() {
        tracing::warn!(pkg, %status, "npm: non-success status");
        return None;
    }
    let body = match resp.text().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(pkg, error = %e, "npm: reading body failed");
            return None;
        }
    };

    let latest = parse_latest(&body);
    if latest.is_none() {
        tracing::warn!(pkg, "npm: no dist-tags.latest in response");
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_ids_are_encoded_as_one_segment() {
        let u = registry_url("https://registry.npmjs.org", "@openai/codex").unwrap();
        assert_eq!(u.as_str(), "https://registry.npmjs.org/@openai%2Fcodex");

        let u = registry_url("http://127.0.0.1:4873/", "left-pad").unwrap();
        assert_eq!(u.as_str(), "http://127.0.0.1:4873/left-pad");
    }

    #[test]
    fn latest_tag_is_extracted() {
        let body = r#"{"name":"@openai/codex","dist-tags":{"latest":"0.46.0","next":"0.47.0-alpha.1"}}"#;
        assert_eq!(parse_latest(body).as_deref(), Some("0.46.0"));
    }

    #[test]
    fn malformed_or_missing_tag_is_absent() {
        assert_eq!(parse_latest("<html>502</html>"), None);
        assert_eq!(parse_latest(r#"{"name":"x"}"#), None);
        assert_eq!(parse_latest(r#"{"dist-tags":{"next":"1.0.0"}}"#), None);
        assert_eq!(parse_latest(r#"{"dist-tags":{"latest":"  "}}"#), None);
    }
}
