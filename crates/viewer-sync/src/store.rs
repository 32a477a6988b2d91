//! Reading and writing the persisted viewer snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::replicator::{self, Subscription};
use crate::state::{StateUpdate, StoredPgnData, ViewerState, PGN_DATA_KEY, VIEWER_STATE_KEY};
use crate::storage::SharedArea;

const BUS_CAPACITY: usize = 64;

/// Persists the current [`ViewerState`] and source text in a [`SharedArea`].
///
/// Clones share the in-process broadcast, so listeners in the writer's own
/// context hear writes that the area's notifications would not report.
#[derive(Clone)]
pub struct StateStore {
    area: Arc<dyn SharedArea>,
    bus: broadcast::Sender<StateUpdate>,
}

impl StateStore {
    pub fn new(area: Arc<dyn SharedArea>) -> Self {
        let (bus, _) = broadcast::channel(BUS_CAPACITY);
        Self { area, bus }
    }

    pub fn area(&self) -> &Arc<dyn SharedArea> {
        &self.area
    }

    pub(crate) fn bus_receiver(&self) -> broadcast::Receiver<StateUpdate> {
        self.bus.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn broadcast_listeners(&self) -> usize {
        self.bus.receiver_count()
    }

    pub fn save_pgn(&self, raw: &str) -> Result<(), SyncError> {
        let data = StoredPgnData {
            raw: raw.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.area.set(PGN_DATA_KEY, &serde_json::to_string(&data)?)?;
        info!(bytes = raw.len(), "Stored PGN source");
        Ok(())
    }

    /// Raw source text of the last load, if any and readable.
    pub fn load_pgn(&self) -> Option<String> {
        self.read_json::<StoredPgnData>(PGN_DATA_KEY).map(|data| data.raw)
    }

    /// Persist `state`, then broadcast it in-process.
    pub fn save_viewer_state(&self, state: &ViewerState) -> Result<(), SyncError> {
        self.area
            .set(VIEWER_STATE_KEY, &serde_json::to_string(state)?)?;
        debug!(
            game = state.game_index,
            move_index = state.move_index,
            "Saved viewer state"
        );
        let _ = self.bus.send(StateUpdate::Changed(state.clone()));
        Ok(())
    }

    pub fn load_viewer_state(&self) -> Option<ViewerState> {
        self.read_json(VIEWER_STATE_KEY)
    }

    /// Remove both the source text and the viewer state.
    pub fn clear(&self) -> Result<(), SyncError> {
        self.area.remove(PGN_DATA_KEY)?;
        self.area.remove(VIEWER_STATE_KEY)?;
        let _ = self.bus.send(StateUpdate::Cleared);
        info!("Cleared stored session");
        Ok(())
    }

    /// Follow the viewer state key. Must be called within a Tokio runtime.
    pub fn subscribe(&self, poll_interval: Duration) -> Subscription {
        replicator::subscribe(self, poll_interval)
    }

    /// Read and decode `key`; any failure reads as "no state".
    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.area.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read shared area");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Ignoring undecodable stored value");
                None
            }
        }
    }
}
