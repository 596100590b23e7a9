// src/config/runtime.rs
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
pub const ENV_STATE_PATH: &str = "STATE_PATH";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_NPM_REGISTRY_URL: &str = "NPM_REGISTRY_URL";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";

pub const DEFAULT_STATE_PATH: &str = "state.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub webhook_url: Option<String>,
    pub state_path: PathBuf,
    pub http_timeout: Duration,
    pub github_token: Option<String>,
    pub npm_registry_url: String,
    pub github_api_url: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            github_token: None,
            npm_registry_url: DEFAULT_NPM_REGISTRY_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            webhook_url: non_empty_var(ENV_WEBHOOK_URL),
            state_path: non_empty_var(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            http_timeout: std::env::var(ENV_HTTP_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            github_token: non_empty_var(ENV_GITHUB_TOKEN),
            npm_registry_url: non_empty_var(ENV_NPM_REGISTRY_URL)
                .unwrap_or(defaults.npm_registry_url),
            github_api_url: non_empty_var(ENV_GITHUB_API_URL)
                .unwrap_or(defaults.github_api_url),
        }
    }
}

// Blank values count as unset (a `.env` line like `DISCORD_WEBHOOK_URL=`).
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
