//! Sync configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_STORAGE_DIR: &str = ".pgn-viewer";

#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Directory backing the shared key-value area
    pub storage_dir: PathBuf,

    /// How often a subscription re-reads the viewer state key
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let storage_dir = env::var("VIEWER_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_DIR));

        // tokio::time::interval panics on a zero period.
        let poll_ms = env::var("VIEWER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            storage_dir,
            poll_interval: Duration::from_millis(poll_ms),
        }
    }
}
