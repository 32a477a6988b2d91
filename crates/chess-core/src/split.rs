//! Segment raw multi-game PGN text into one text block per game.
//!
//! Games are located by their mandatory leading `[Event ...]` tag rather than
//! by blank lines: lesson files routinely put blank lines between header tags.

use regex::Regex;
use std::sync::LazyLock;

static GAME_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[Event\s").expect("valid regex"));

/// Normalize line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split `raw` into non-empty per-game segments.
///
/// Without any `[Event` tag the whole input is one segment. Text before the
/// first `[Event` tag is not a game and is dropped.
pub fn split_games(raw: &str) -> Vec<String> {
    let text = normalize_line_endings(raw);
    let text = text.trim();

    let starts: Vec<usize> = GAME_START_RE.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return if text.is_empty() {
            Vec::new()
        } else {
            vec![text.to_string()]
        };
    }

    if starts[0] > 0 && !text[..starts[0]].trim().is_empty() {
        tracing::debug!(bytes = starts[0], "Dropping text before first Event tag");
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
