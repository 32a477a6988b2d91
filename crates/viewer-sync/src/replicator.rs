//! Delivers viewer state changes to a secondary surface.
//!
//! Three paths feed one subscription: foreign-context storage notifications,
//! the writer's in-process broadcast, and a fixed-interval poll of the stored
//! value. Notifications are not reliable (other processes never send them and
//! rapid writes may coalesce), so the poll is the backstop. Delivery is
//! at-least-once; receivers must treat a repeated identical state as a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::state::{StateUpdate, ViewerState, VIEWER_STATE_KEY};
use crate::storage::{ChangeFeed, SharedArea, StorageEvent};
use crate::store::StateStore;

/// A live subscription. Owns the poll timer and both listeners; dropping it
/// (or calling [`Subscription::unsubscribe`]) releases all three.
pub struct Subscription {
    updates: mpsc::UnboundedReceiver<StateUpdate>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Wait for the next update.
    pub async fn next(&mut self) -> Option<StateUpdate> {
        self.updates.recv().await
    }

    /// An update that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<StateUpdate> {
        self.updates.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn subscribe(store: &StateStore, poll_interval: Duration) -> Subscription {
    let (tx, updates) = mpsc::unbounded_channel();
    let replicator = Replicator {
        area: Arc::clone(store.area()),
        seen: Seen::Unknown,
        tx,
    };
    let task = tokio::spawn(replicator.run(store.area().watch(), store.bus_receiver(), poll_interval));
    Subscription { updates, task }
}

/// Last stored value this subscription has processed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Unknown,
    Absent,
    Value(String),
}

struct Replicator {
    area: Arc<dyn SharedArea>,
    seen: Seen,
    tx: mpsc::UnboundedSender<StateUpdate>,
}

impl Replicator {
    async fn run(
        mut self,
        mut feed: ChangeFeed,
        mut bus: broadcast::Receiver<StateUpdate>,
        poll_interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut feed_open = true;
        let mut bus_open = true;

        while !self.tx.is_closed() {
            tokio::select! {
                _ = ticker.tick() => self.poll(),
                event = feed.recv(), if feed_open => match event {
                    Some(event) => self.on_storage_event(event),
                    None => feed_open = false,
                },
                update = bus.recv(), if bus_open => match update {
                    Ok(update) => self.on_broadcast(update),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "State broadcast lagged"),
                    Err(RecvError::Closed) => bus_open = false,
                },
            }
        }
    }

    fn poll(&mut self) {
        let current = match self.area.get(VIEWER_STATE_KEY) {
            Ok(current) => current,
            Err(e) => {
                warn!(error = %e, "Polling viewer state failed");
                return;
            }
        };

        match current {
            Some(raw) if !matches!(&self.seen, Seen::Value(prev) if *prev == raw) => {
                debug!("Polling detected viewer state change");
                self.accept_raw(raw);
            }
            None if self.seen != Seen::Absent => {
                debug!("Polling detected cleared viewer state");
                self.seen = Seen::Absent;
                self.deliver(StateUpdate::Cleared);
            }
            _ => {}
        }
    }

    fn on_storage_event(&mut self, event: StorageEvent) {
        if event.key != VIEWER_STATE_KEY {
            return;
        }
        match event.new_value {
            Some(raw) => self.accept_raw(raw),
            None => {
                self.seen = Seen::Absent;
                self.deliver(StateUpdate::Cleared);
            }
        }
    }

    fn on_broadcast(&mut self, update: StateUpdate) {
        self.seen = match &update {
            StateUpdate::Changed(state) => match serde_json::to_string(state) {
                Ok(raw) => Seen::Value(raw),
                Err(_) => Seen::Unknown,
            },
            StateUpdate::Cleared => Seen::Absent,
        };
        self.deliver(update);
    }

    /// Record `raw` as processed and deliver it if it decodes.
    fn accept_raw(&mut self, raw: String) {
        let decoded = serde_json::from_str::<ViewerState>(&raw);
        self.seen = Seen::Value(raw);
        match decoded {
            Ok(state) => self.deliver(StateUpdate::Changed(state)),
            Err(e) => debug!(error = %e, "Ignoring undecodable viewer state"),
        }
    }

    fn deliver(&self, update: StateUpdate) {
        let _ = self.tx.send(update);
    }
}
