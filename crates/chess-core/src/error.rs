//! Error types for ingestion and the rules engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Illegal move {san}: {reason}")]
    IllegalMove { san: String, reason: String },

    #[error("No game found in movetext")]
    NoGame,

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PgnError {
    #[error("No valid games found ({segments} segment(s) examined)")]
    NoGames { segments: usize },
}
