use chess_core::PgnError;
use thiserror::Error;
use viewer_sync::SyncError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Pgn(#[from] PgnError),

    #[error("No game at index {index} ({available} loaded)")]
    NoSuchGame { index: usize, available: usize },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Shared storage error: {0}")]
    Sync(#[from] SyncError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    Unknown(String),
}
