//! Read-only surface that mirrors the primary viewer.

use std::time::Duration;

use chess_core::display::format_move_number;
use chess_core::STANDARD_START_FEN;
use tracing::{debug, info};
use viewer_sync::{StateStore, StateUpdate, Subscription, ViewerState};

use crate::view::{highlight, BoardView};

pub struct Presenter {
    state: Option<ViewerState>,
    subscription: Subscription,
    show_move_info: bool,
}

impl Presenter {
    /// Read the current snapshot and start following changes.
    /// Must be called within a Tokio runtime.
    pub fn activate(store: &StateStore, poll_interval: Duration) -> Self {
        let state = store.load_viewer_state();
        info!(synced = state.is_some(), "Presenter activated");
        Self {
            state,
            subscription: store.subscribe(poll_interval),
            show_move_info: false,
        }
    }

    pub fn state(&self) -> Option<&ViewerState> {
        self.state.as_ref()
    }

    /// Whether a primary viewer has published anything yet.
    pub fn is_synced(&self) -> bool {
        self.state.is_some()
    }

    pub fn fen(&self) -> &str {
        self.state
            .as_ref()
            .map(|s| s.fen.as_str())
            .unwrap_or(STANDARD_START_FEN)
    }

    pub fn set_show_move_info(&mut self, show: bool) {
        self.show_move_info = show;
    }

    /// `"12... Nf3"` style caption for the last move, when enabled.
    pub fn move_caption(&self) -> Option<String> {
        if !self.show_move_info {
            return None;
        }
        let state = self.state.as_ref()?;
        let san = state.last_move.as_deref()?;
        Some(format!(
            "{} {san}",
            format_move_number(state.move_number, state.is_white_move)
        ))
    }

    /// Apply one update. Returns whether anything visible changed.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        match update {
            StateUpdate::Changed(state) => {
                if self.state.as_ref() == Some(&state) {
                    return false;
                }
                debug!(game = state.game_index, move_index = state.move_index, "Presenter updated");
                self.state = Some(state);
                true
            }
            StateUpdate::Cleared => {
                if self.state.is_none() {
                    return false;
                }
                debug!("Presenter waiting for a new session");
                self.state = None;
                true
            }
        }
    }

    /// Wait until an update actually changes the display. Returns `false` if
    /// the subscription ended.
    pub async fn wait_for_change(&mut self) -> bool {
        while let Some(update) = self.subscription.next().await {
            if self.apply(update) {
                return true;
            }
        }
        false
    }

    /// Apply every update already delivered. Returns whether any changed the display.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Some(update) = self.subscription.try_next() {
            changed |= self.apply(update);
        }
        changed
    }

    pub fn board_view(&self) -> BoardView {
        BoardView {
            fen: self.fen().to_string(),
            orientation: self
                .state
                .as_ref()
                .and_then(|s| s.board_orientation)
                .unwrap_or_default(),
            highlighted_squares: highlight(
                self.state.as_ref().and_then(|s| s.last_move_squares.as_ref()),
            ),
            interactive: false,
        }
    }

    /// Stop following the viewer.
    pub fn deactivate(self) {
        self.subscription.unsubscribe();
    }
}
