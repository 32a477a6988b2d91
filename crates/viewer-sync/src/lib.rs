//! Cross-surface replication of the viewer's current position.
//!
//! The primary viewer writes a [`ViewerState`] snapshot into a shared
//! key-value area; secondary surfaces follow it through a [`Subscription`].

pub mod config;
pub mod error;
pub mod replicator;
pub mod state;
pub mod storage;
pub mod store;

pub use config::SyncConfig;
pub use error::SyncError;
pub use replicator::Subscription;
pub use state::{
    MoveSquares, Orientation, StateUpdate, StoredPgnData, ViewerState, PGN_DATA_KEY,
    VIEWER_STATE_KEY,
};
pub use storage::{ChangeFeed, FileArea, MemoryArea, SharedArea, StorageEvent};
pub use store::StateStore;
