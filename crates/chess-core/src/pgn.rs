//! PGN parsing for lesson-style game records.
//!
//! A game is parsed in stages: the raw text first, then a sanitized
//! mainline-only rendition, then (for games with a usable FEN tag) a
//! position-only game. Failures never escape a single game.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::comments::{CommentAssociator, PositionalAssociator};
use crate::error::{PgnError, RulesError};
use crate::game_data::{Headers, MoveNode, ParsedGame, STANDARD_START_FEN};
use crate::rules::{RulesEngine, ShakmatyEngine};
use crate::split::split_games;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[(\w+)\s+"((?:[^"\\]|\\.)*)"\]"#).expect("valid regex")
});
static BRACE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}?").expect("valid regex"));
static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";[^\n]*").expect("valid regex"));
static NAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").expect("valid regex"));
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[!?]+").expect("valid regex"));

/// Extract `[Name "Value"]` tags. Later duplicates overwrite earlier ones.
pub fn extract_headers(pgn: &str) -> Headers {
    let mut headers = Headers::new();
    for cap in HEADER_RE.captures_iter(pgn) {
        headers.insert(cap[1].to_string(), unescape_tag_value(&cap[2]));
    }
    headers
}

fn unescape_tag_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The tag lines of a game, one per line, as they appear in the source.
pub fn header_block(pgn: &str) -> String {
    HEADER_RE
        .find_iter(pgn)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Movetext with all header tags removed.
pub fn strip_headers(pgn: &str) -> String {
    HEADER_RE.replace_all(pgn, "").trim().to_string()
}

/// Reduce movetext to its bare mainline: no comments, variations, NAGs or
/// move-quality suffixes, whitespace collapsed.
pub fn sanitize_movetext(movetext: &str) -> String {
    let text = BRACE_COMMENT_RE.replace_all(movetext, " ");
    let text = LINE_COMMENT_RE.replace_all(&text, " ");
    let text = strip_variations(&text);
    let text = NAG_RE.replace_all(&text, " ");
    let text = SUFFIX_RE.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop parenthesized text at any depth. Stray `)` are ignored.
fn strip_variations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                out.push(' ');
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(' ');
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Where a game currently is in the parse fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Raw,
    Sanitized,
    PositionOnly,
    Unparseable,
}

impl ParseStage {
    /// Stage to try after the current one failed.
    pub fn next(self, has_fen: bool) -> Self {
        match self {
            ParseStage::Raw => ParseStage::Sanitized,
            ParseStage::Sanitized if has_fen => ParseStage::PositionOnly,
            ParseStage::Sanitized | ParseStage::PositionOnly | ParseStage::Unparseable => {
                ParseStage::Unparseable
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Full(ParsedGame),
    PositionOnly(ParsedGame),
    Unparseable(String),
}

impl ParseOutcome {
    pub fn into_game(self) -> Option<ParsedGame> {
        match self {
            ParseOutcome::Full(game) | ParseOutcome::PositionOnly(game) => Some(game),
            ParseOutcome::Unparseable(_) => None,
        }
    }
}

/// Parses game text through a [`RulesEngine`] and attaches comments.
pub struct GameParser<E = ShakmatyEngine, C = PositionalAssociator> {
    engine: E,
    associator: C,
}

impl Default for GameParser {
    fn default() -> Self {
        Self::new(ShakmatyEngine::new(), PositionalAssociator)
    }
}

impl<E: RulesEngine, C: CommentAssociator> GameParser<E, C> {
    pub fn new(engine: E, associator: C) -> Self {
        Self { engine, associator }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Parse one game's text.
    pub fn parse(&mut self, pgn: &str) -> ParseOutcome {
        let headers = extract_headers(pgn);
        let fen_header = headers.get("FEN").cloned();
        let initial_fen = fen_header
            .clone()
            .unwrap_or_else(|| STANDARD_START_FEN.to_string());

        let sanitized = sanitize_movetext(&strip_headers(pgn));
        if sanitized.is_empty() {
            return ParseOutcome::PositionOnly(ParsedGame::position_only(headers, initial_fen));
        }

        let has_fen = fen_header.is_some() && self.engine.load_position(&initial_fen).is_ok();
        let mut stage = ParseStage::Raw;
        let mut last_error: Option<RulesError> = None;

        loop {
            let input = match stage {
                ParseStage::Raw => pgn.to_string(),
                ParseStage::Sanitized => {
                    let tags = header_block(pgn);
                    if tags.is_empty() {
                        sanitized.clone()
                    } else {
                        format!("{tags}\n\n{sanitized}")
                    }
                }
                ParseStage::PositionOnly => {
                    debug!(fen = %initial_fen, "Movetext unreadable, keeping position only");
                    return ParseOutcome::PositionOnly(ParsedGame::position_only(
                        headers,
                        initial_fen,
                    ));
                }
                ParseStage::Unparseable => {
                    let reason = last_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown parse failure".to_string());
                    return ParseOutcome::Unparseable(reason);
                }
            };

            match self.attempt(&initial_fen, &input) {
                Ok(moves) => {
                    return ParseOutcome::Full(ParsedGame {
                        headers,
                        moves,
                        initial_fen,
                    })
                }
                Err(e) => {
                    debug!(?stage, error = %e, "Parse attempt failed");
                    last_error = Some(e);
                    stage = stage.next(has_fen);
                }
            }
        }
    }

    /// Load `input` through the engine, then rebuild every position by
    /// replaying the reported SAN from `initial_fen`.
    fn attempt(&mut self, initial_fen: &str, input: &str) -> Result<Vec<MoveNode>, RulesError> {
        self.engine.load_position(initial_fen)?;
        let plies = self.engine.apply_moves(input)?;
        let rendered = self.engine.render_pgn();

        self.engine.load_position(initial_fen)?;
        let mut moves = Vec::with_capacity(plies.len());
        for (ply_index, ply) in plies.into_iter().enumerate() {
            self.engine.play_san(&ply.san)?;
            moves.push(MoveNode {
                san: ply.san,
                fen: self.engine.current_position(),
                move_number: (ply_index / 2) as u32 + 1,
                is_white: ply_index % 2 == 0,
                from: ply.from,
                to: ply.to,
                comment: None,
                variations: None,
                nag: (!ply.nags.is_empty()).then_some(ply.nags),
            });
        }

        Ok(self.associator.associate(&rendered, moves))
    }

    /// Parse every game in `raw`, skipping the ones that cannot be read.
    pub fn parse_multiple(&mut self, raw: &str) -> Result<Vec<ParsedGame>, PgnError> {
        let segments = split_games(raw);
        let mut games = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            match self.parse(segment) {
                ParseOutcome::Full(game) | ParseOutcome::PositionOnly(game) => games.push(game),
                ParseOutcome::Unparseable(reason) => {
                    warn!(segment = index, %reason, "Skipping unparseable game");
                }
            }
        }

        if games.is_empty() {
            return Err(PgnError::NoGames {
                segments: segments.len(),
            });
        }
        info!(games = games.len(), segments = segments.len(), "Parsed PGN");
        Ok(games)
    }
}

/// Parse multi-game PGN text with the default engine.
pub fn parse_multiple_pgn(raw: &str) -> Result<Vec<ParsedGame>, PgnError> {
    GameParser::default().parse_multiple(raw)
}
