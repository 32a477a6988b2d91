use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Tag name → value. Later duplicates overwrite earlier ones.
pub type Headers = HashMap<String, String>;

/// One ply of the mainline together with the position it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveNode {
    pub san: String,
    pub fen: String,
    pub move_number: u32,
    pub is_white: bool,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Reserved for nested alternatives; the mainline is all we keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<Vec<Vec<MoveNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nag: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGame {
    pub headers: Headers,
    pub moves: Vec<MoveNode>,
    pub initial_fen: String,
}

/// A white/black row of a move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePair<'a> {
    pub move_number: u32,
    pub white_index: usize,
    pub white: Option<&'a MoveNode>,
    pub black: Option<&'a MoveNode>,
}

impl ParsedGame {
    /// A game that only describes a position (puzzle-style FEN entries).
    pub fn position_only(headers: Headers, initial_fen: String) -> Self {
        Self {
            headers,
            moves: Vec::new(),
            initial_fen,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Position after `move_index`; `-1` (or anything out of range) is the initial position.
    pub fn fen_at(&self, move_index: i32) -> &str {
        usize::try_from(move_index)
            .ok()
            .and_then(|i| self.moves.get(i))
            .map(|m| m.fen.as_str())
            .unwrap_or(&self.initial_fen)
    }

    pub fn move_pairs(&self) -> Vec<MovePair<'_>> {
        self.moves
            .chunks(2)
            .enumerate()
            .map(|(row, pair)| {
                let white_index = row * 2;
                MovePair {
                    move_number: pair
                        .first()
                        .map(|m| m.move_number)
                        .unwrap_or(row as u32 + 1),
                    white_index,
                    white: pair.first(),
                    black: pair.get(1),
                }
            })
            .collect()
    }
}
