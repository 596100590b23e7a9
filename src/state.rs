//! state.rs — last-seen markers per source, persisted as one JSON document.
//!
//! Layout on disk:
//! ```json
//! { "npm": { "@openai/codex": "0.5.0" }, "github": { "openai/codex": "v0.5.0" }, "rss": { "openai_news": "..." } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::WatchError;

/// Top-level mapping a source's marker lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    Npm,
    Github,
    Rss,
}

impl SourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Github => "github",
            Self::Rss => "rss",
        }
    }
}

/// Markers are opaque; they are only ever compared for equality.
/// A missing key means "never seen".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedState {
    #[serde(default)]
    pub npm: BTreeMap<String, String>,
    #[serde(default)]
    pub github: BTreeMap<String, String>,
    #[serde(default)]
    pub rss: BTreeMap<String, String>,
}

impl PersistedState {
    pub fn marker(&self, category: SourceCategory, id: &str) -> Option<&str> {
        self.map(category).get(id).map(String::as_str)
    }

    pub fn set_marker(&mut self, category: SourceCategory, id: &str, marker: &str) {
        self.map_mut(category)
            .insert(id.to_string(), marker.to_string());
    }

    fn map(&self, category: SourceCategory) -> &BTreeMap<String, String> {
        match category {
            SourceCategory::Npm => &self.npm,
            SourceCategory::Github => &self.github,
            SourceCategory::Rss => &self.rss,
        }
    }

    fn map_mut(&mut self, category: SourceCategory) -> &mut BTreeMap<String, String> {
        match category {
            SourceCategory::Npm => &mut self.npm,
            SourceCategory::Github => &mut self.github,
            SourceCategory::Rss => &mut self.rss,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file → empty skeleton. A file that exists but does not parse is
    /// `StateCorrupt`; it is never silently reset, or every source would
    /// re-notify on the next run.
    pub async fn load(&self) -> Result<PersistedState, WatchError> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).map_err(|source| WatchError::StateCorrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no state file yet, starting empty");
                Ok(PersistedState::default())
            }
            Err(source) => Err(WatchError::StateIo {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Write-then-rename so a crash mid-write leaves the previous file intact.
    pub async fn save(&self, state: &PersistedState) -> Result<(), WatchError> {
        let io_err = |source: std::io::Error| WatchError::StateIo {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(io_err)?;
        }

        let mut bytes = serde_json::to_vec_pretty(state).map_err(|e| WatchError::StateIo {
            path: self.path.clone(),
            source: e.into(),
        })?;
        bytes.push(b'\n');

        let tmp = self.tmp_path();
        let mut f = fs::File::create(&tmp).await.map_err(io_err)?;
        f.write_all(&bytes).await.map_err(io_err)?;
        f.sync_all().await.map_err(io_err)?;
        drop(f);

        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
