//! Wire types stored in the shared area.

use serde::{Deserialize, Serialize};

/// Key holding the raw source text of the loaded PGN.
pub const PGN_DATA_KEY: &str = "pgn-data";
/// Key holding the current [`ViewerState`] snapshot.
pub const VIEWER_STATE_KEY: &str = "viewer-state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    White,
    Black,
}

impl Orientation {
    pub fn flipped(self) -> Self {
        match self {
            Orientation::White => Orientation::Black,
            Orientation::Black => Orientation::White,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSquares {
    pub from: String,
    pub to: String,
}

/// Snapshot of what the primary viewer is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub game_index: usize,
    /// `-1` is the position before the first move.
    pub move_index: i32,
    pub fen: String,
    pub last_move: Option<String>,
    #[serde(default)]
    pub last_move_squares: Option<MoveSquares>,
    pub move_number: u32,
    pub is_white_move: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_orientation: Option<Orientation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPgnData {
    pub raw: String,
    /// Epoch milliseconds of the load.
    pub timestamp: i64,
}

/// What a subscriber is told about the viewer state key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    Changed(ViewerState),
    Cleared,
}
