//! PGN ingestion for the lesson viewer: splitting multi-game text, parsing
//! games into per-ply positions and attaching annotations.

pub mod comments;
pub mod display;
pub mod error;
pub mod game_data;
pub mod pgn;
pub mod rules;
pub mod split;

pub use error::{PgnError, RulesError};
pub use game_data::{Headers, MoveNode, ParsedGame, STANDARD_START_FEN};
pub use pgn::{parse_multiple_pgn, GameParser, ParseOutcome, ParseStage};
pub use rules::{RulesEngine, ShakmatyEngine};
