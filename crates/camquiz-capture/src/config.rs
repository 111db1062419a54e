//! Configuration loading and resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dedup::DEFAULT_WINDOW;
use crate::error::{CaptureError, CaptureResult};
use crate::filter::DEFAULT_URL_PATTERN;

/// Environment variable overriding the capture database path.
pub const DB_ENV: &str = "CAMQUIZ_DB";

/// Tunables for the capture side. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Regex a request URL must match to be captured.
    pub url_pattern: String,
    /// Window in which repeated requests for one URL collapse.
    pub dedup_window_ms: u64,
    pub fetch_timeout_ms: u64,
    pub db_path: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            dedup_window_ms: DEFAULT_WINDOW.as_millis() as u64,
            fetch_timeout_ms: 15_000,
            db_path: None,
        }
    }
}

impl CaptureConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> CaptureResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CaptureError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> CaptureResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

/// Resolve the capture database path.
///
/// Order: explicit path, `CAMQUIZ_DB`, `./.camquiz/captures.db` if it
/// exists, then `~/.camquiz/captures.db`.
pub fn resolve_db_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(env_path) = std::env::var(DB_ENV) {
        return PathBuf::from(env_path);
    }

    let cwd_db = PathBuf::from(".camquiz/captures.db");
    if cwd_db.exists() {
        return cwd_db;
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".camquiz")
        .join("captures.db")
}
