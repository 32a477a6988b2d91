#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use viewer_sync::{MemoryArea, StateStore};

pub const OPENING: &str = "[Event \"A\"]\n[White \"X\"]\n[Black \"Y\"]\n\n1. e4 e5 2. Nf3 *";

pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

/// A lesson file: annotated game, a puzzle position, and a game whose
/// headers are separated by blank lines.
pub const LESSON: &str = r#"Lesson notes that are not part of any game.

[Event "Lesson 1"]
[White "Teacher"]
[Black "Student"]
[Result "1-0"]

1. e4 {Best by test} e5 2. Nf3 $1 Nc6 (2... d6 3. d4) 3. Bb5 a6 1-0

[Event "Puzzle"]
[SetUp "1"]
[FEN "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1"]

*

[Event "Spaced"]

[White "Gamma"]

[Black "Delta"]

1. d4 d5 2. c4 *
"#;

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Fresh directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pgn-viewer-{name}-{}", unique_suffix()))
}

/// A primary and a secondary store over one in-memory area, each in its own context.
pub fn memory_pair() -> (StateStore, StateStore) {
    let area = MemoryArea::new();
    let secondary = area.context();
    (
        StateStore::new(Arc::new(area)),
        StateStore::new(Arc::new(secondary)),
    )
}
