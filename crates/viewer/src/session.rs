//! The primary, interactive viewer.
//!
//! Holds the loaded games and the current selection, and writes a
//! [`ViewerState`] snapshot after every change so secondary surfaces follow.

use chess_core::{parse_multiple_pgn, MoveNode, ParsedGame, STANDARD_START_FEN};
use tracing::{debug, info, warn};
use viewer_sync::{MoveSquares, Orientation, StateStore, ViewerState};

use crate::error::SessionError;
use crate::view::{highlight, BoardView};

pub struct ViewerSession {
    store: StateStore,
    games: Vec<ParsedGame>,
    selected: usize,
    /// `-1` is the position before the first move.
    move_index: i32,
    orientation: Orientation,
}

impl ViewerSession {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            games: Vec::new(),
            selected: 0,
            move_index: -1,
            orientation: Orientation::White,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn games(&self) -> &[ParsedGame] {
        &self.games
    }

    pub fn current_game(&self) -> Option<&ParsedGame> {
        self.games.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn move_index(&self) -> i32 {
        self.move_index
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Parse `raw`, replace the loaded games and persist the source text.
    ///
    /// On failure the previous session is left untouched.
    pub fn load_pgn(&mut self, raw: &str) -> Result<usize, SessionError> {
        let games = parse_multiple_pgn(raw)?;
        self.store.save_pgn(raw)?;
        self.install(games);
        info!(games = self.games.len(), "Loaded PGN");
        self.sync()?;
        Ok(self.games.len())
    }

    /// Reload whatever source text a previous session stored. Returns the
    /// number of games restored; zero if nothing usable was stored.
    pub fn restore(&mut self) -> Result<usize, SessionError> {
        let Some(raw) = self.store.load_pgn() else {
            debug!("No stored PGN to restore");
            return Ok(0);
        };
        match parse_multiple_pgn(&raw) {
            Ok(games) => {
                self.install(games);
                info!(games = self.games.len(), "Restored stored PGN");
                self.sync()?;
                Ok(self.games.len())
            }
            Err(e) => {
                warn!(error = %e, "Stored PGN no longer parses");
                Ok(0)
            }
        }
    }

    /// Switch to game `index` (zero-based) at its initial position.
    pub fn select_game(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.games.len() {
            return Err(SessionError::NoSuchGame {
                index,
                available: self.games.len(),
            });
        }
        self.commit(|s| {
            s.selected = index;
            s.move_index = -1;
        })
    }

    /// Jump to `move_index`, clamped to the current game.
    pub fn go_to(&mut self, move_index: i32) -> Result<(), SessionError> {
        let target = move_index.clamp(-1, self.last_index());
        if target == self.move_index {
            return Ok(());
        }
        self.commit(|s| s.move_index = target)
    }

    pub fn first(&mut self) -> Result<(), SessionError> {
        self.go_to(-1)
    }

    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.go_to(self.move_index - 1)
    }

    pub fn next(&mut self) -> Result<(), SessionError> {
        self.go_to(self.move_index + 1)
    }

    pub fn last(&mut self) -> Result<(), SessionError> {
        self.go_to(self.last_index())
    }

    pub fn can_go_previous(&self) -> bool {
        self.move_index > -1
    }

    pub fn can_go_next(&self) -> bool {
        self.move_index < self.last_index()
    }

    pub fn flip_board(&mut self) -> Result<(), SessionError> {
        self.commit(|s| s.orientation = s.orientation.flipped())
    }

    /// Drop all games and erase the stored session.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        self.games.clear();
        self.selected = 0;
        self.move_index = -1;
        Ok(())
    }

    pub fn current_move(&self) -> Option<&MoveNode> {
        let game = self.current_game()?;
        usize::try_from(self.move_index)
            .ok()
            .and_then(|i| game.moves.get(i))
    }

    pub fn current_fen(&self) -> &str {
        self.current_game()
            .map(|g| g.fen_at(self.move_index))
            .unwrap_or(STANDARD_START_FEN)
    }

    pub fn viewer_state(&self) -> ViewerState {
        let current = self.current_move();
        ViewerState {
            game_index: self.selected,
            move_index: self.move_index,
            fen: self.current_fen().to_string(),
            last_move: current.map(|m| m.san.clone()),
            last_move_squares: current.map(|m| MoveSquares {
                from: m.from.clone(),
                to: m.to.clone(),
            }),
            move_number: current.map(|m| m.move_number).unwrap_or(0),
            is_white_move: current.map(|m| m.is_white).unwrap_or(true),
            board_orientation: Some(self.orientation),
        }
    }

    pub fn board_view(&self) -> BoardView {
        let state = self.viewer_state();
        BoardView {
            fen: state.fen,
            orientation: self.orientation,
            highlighted_squares: highlight(state.last_move_squares.as_ref()),
            interactive: true,
        }
    }

    fn install(&mut self, games: Vec<ParsedGame>) {
        self.games = games;
        self.selected = 0;
        self.move_index = -1;
    }

    fn last_index(&self) -> i32 {
        self.current_game()
            .map(|g| g.moves.len() as i32 - 1)
            .unwrap_or(-1)
    }

    /// Apply a navigation change and publish it. If the write fails the
    /// change is undone, so the session never runs ahead of the stored state.
    fn commit(&mut self, change: impl FnOnce(&mut Self)) -> Result<(), SessionError> {
        let before = (self.selected, self.move_index, self.orientation);
        change(self);
        if let Err(e) = self.sync() {
            (self.selected, self.move_index, self.orientation) = before;
            return Err(e);
        }
        Ok(())
    }

    /// Nothing is written while no games are loaded, so a cleared session
    /// stays cleared for observers.
    fn sync(&self) -> Result<(), SessionError> {
        if self.games.is_empty() {
            return Ok(());
        }
        self.store.save_viewer_state(&self.viewer_state())?;
        Ok(())
    }
}
