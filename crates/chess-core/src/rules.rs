//! Rules engine seam: move legality, replay and canonical PGN rendering.
//!
//! The parser only talks to [`RulesEngine`]; [`ShakmatyEngine`] is the
//! production implementation backed by shakmaty and pgn-reader.

use std::fmt::Write as _;
use std::io::Cursor;
use std::ops::ControlFlow;

use pgn_reader::{Nag, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Position,
};

use crate::error::RulesError;

/// One ply as reported by the engine's move history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyRecord {
    pub san: String,
    pub from: String,
    pub to: String,
    pub nags: Vec<u8>,
}

pub trait RulesEngine {
    /// Reset to `fen` and forget any recorded moves.
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError>;

    /// Non-strict PGN load. Starts from the text's FEN tag if it has one,
    /// otherwise from the last loaded position.
    fn apply_moves(&mut self, text: &str) -> Result<Vec<PlyRecord>, RulesError>;

    /// Play a single SAN move on the current position.
    fn play_san(&mut self, san: &str) -> Result<PlyRecord, RulesError>;

    fn current_position(&self) -> String;

    /// Canonical PGN of the recorded game, comments included.
    fn render_pgn(&self) -> String;
}

#[derive(Debug, Clone)]
struct RecordedPly {
    ply: PlyRecord,
    comment: Option<String>,
}

#[derive(Debug, Clone)]
struct GameRecord {
    headers: Vec<(String, String)>,
    start: Chess,
    leading_comment: Option<String>,
    plies: Vec<RecordedPly>,
}

impl GameRecord {
    fn new(headers: Vec<(String, String)>, start: Chess) -> Self {
        Self {
            headers,
            start,
            leading_comment: None,
            plies: Vec::new(),
        }
    }

    fn attach_comment(&mut self, text: String) {
        let slot = match self.plies.last_mut() {
            Some(last) => &mut last.comment,
            None => &mut self.leading_comment,
        };
        match slot {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&text);
            }
            None => *slot = Some(text),
        }
    }

    fn result(&self) -> &str {
        self.headers
            .iter()
            .rev()
            .find(|(name, _)| name == "Result")
            .map(|(_, value)| value.as_str())
            .unwrap_or("*")
    }
}

/// Rules engine backed by shakmaty positions and the pgn-reader tokenizer.
#[derive(Debug, Clone)]
pub struct ShakmatyEngine {
    base: Chess,
    pos: Chess,
    record: GameRecord,
}

impl Default for ShakmatyEngine {
    fn default() -> Self {
        Self {
            base: Chess::default(),
            pos: Chess::default(),
            record: GameRecord::new(Vec::new(), Chess::default()),
        }
    }
}

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RulesEngine for ShakmatyEngine {
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError> {
        let pos = position_from_fen(fen)?;
        self.base = pos.clone();
        self.record = GameRecord::new(Vec::new(), pos.clone());
        self.pos = pos;
        Ok(())
    }

    fn apply_moves(&mut self, text: &str) -> Result<Vec<PlyRecord>, RulesError> {
        let mut collector = MovetextCollector::new(self.base.clone());
        let mut reader = Reader::new(Cursor::new(text.as_bytes()));

        if reader.read_game(&mut collector)?.is_none() {
            return Err(RulesError::NoGame);
        }
        if let Some(err) = collector.error {
            return Err(err);
        }
        let end = collector.finished.ok_or(RulesError::NoGame)?;

        let plies = collector
            .record
            .plies
            .iter()
            .map(|p| p.ply.clone())
            .collect();
        self.pos = end;
        self.record = collector.record;
        Ok(plies)
    }

    fn play_san(&mut self, san: &str) -> Result<PlyRecord, RulesError> {
        let parsed: SanPlus = san.trim().parse().map_err(|e| RulesError::IllegalMove {
            san: san.to_string(),
            reason: format!("{e}"),
        })?;
        let ply = play_on(&mut self.pos, &parsed.san)?;
        self.record.plies.push(RecordedPly {
            ply: ply.clone(),
            comment: None,
        });
        Ok(ply)
    }

    fn current_position(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    fn render_pgn(&self) -> String {
        let record = &self.record;
        let mut out = String::new();

        for (name, value) in &record.headers {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "[{name} \"{escaped}\"]");
        }
        if !record.headers.is_empty() {
            out.push('\n');
        }

        let mut tokens: Vec<String> = Vec::new();
        if let Some(comment) = &record.leading_comment {
            tokens.push(format!("{{{comment}}}"));
        }

        let mut turn = record.start.turn();
        let mut number = record.start.fullmoves().get();
        for (i, recorded) in record.plies.iter().enumerate() {
            if turn == Color::White {
                tokens.push(format!("{number}."));
            } else if i == 0 {
                tokens.push(format!("{number}..."));
            }
            tokens.push(recorded.ply.san.clone());
            tokens.extend(recorded.ply.nags.iter().map(|nag| format!("${nag}")));
            if let Some(comment) = &recorded.comment {
                tokens.push(format!("{{{comment}}}"));
            }
            if turn == Color::Black {
                number += 1;
            }
            turn = !turn;
        }
        tokens.push(record.result().to_string());

        out.push_str(&tokens.join(" "));
        out
    }
}

/// Parse a FEN into a standard-chess position.
pub fn position_from_fen(fen: &str) -> Result<Chess, RulesError> {
    let invalid = |reason: String| RulesError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Resolve `san` against `pos`, play it, and report it canonically.
fn play_on(pos: &mut Chess, san: &San) -> Result<PlyRecord, RulesError> {
    let mv = san.to_move(&*pos).map_err(|e| RulesError::IllegalMove {
        san: san.to_string(),
        reason: format!("{e}"),
    })?;
    let canonical = San::from_move(&*pos, mv.clone()).to_string();

    // Castling is reported king square to king square (e1 -> g1).
    let (from, to) = match mv.clone().to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => (from.to_string(), to.to_string()),
        other => {
            return Err(RulesError::IllegalMove {
                san: canonical,
                reason: format!("unsupported move kind {other}"),
            })
        }
    };

    pos.play_unchecked(mv);
    let suffix = if pos.is_checkmate() {
        "#"
    } else if pos.is_check() {
        "+"
    } else {
        ""
    };

    Ok(PlyRecord {
        san: format!("{canonical}{suffix}"),
        from,
        to,
        nags: Vec::new(),
    })
}

/// Visitor that walks the mainline of one game, skipping variations.
struct MovetextCollector {
    base: Chess,
    record: GameRecord,
    error: Option<RulesError>,
    finished: Option<Chess>,
}

impl MovetextCollector {
    fn new(base: Chess) -> Self {
        Self {
            record: GameRecord::new(Vec::new(), base.clone()),
            base,
            error: None,
            finished: None,
        }
    }
}

impl Visitor for MovetextCollector {
    type Tags = Vec<(String, String)>;
    type Movetext = Chess;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(Vec::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        tags.push((
            String::from_utf8_lossy(name).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let fen_tag = tags
            .iter()
            .rev()
            .find(|(name, _)| name == "FEN")
            .map(|(_, value)| value.clone());

        let start = match fen_tag {
            Some(fen) => match position_from_fen(&fen) {
                Ok(pos) => pos,
                Err(e) => {
                    self.error = Some(e);
                    return ControlFlow::Break(());
                }
            },
            None => self.base.clone(),
        };

        self.record = GameRecord::new(tags, start.clone());
        ControlFlow::Continue(start)
    }

    fn san(&mut self, pos: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        match play_on(pos, &san_plus.san) {
            Ok(ply) => {
                self.record.plies.push(RecordedPly { ply, comment: None });
                ControlFlow::Continue(())
            }
            Err(e) => {
                self.error = Some(e);
                ControlFlow::Break(())
            }
        }
    }

    fn nag(&mut self, _pos: &mut Self::Movetext, nag: Nag) -> ControlFlow<Self::Output> {
        if let Some(last) = self.record.plies.last_mut() {
            last.ply.nags.push(nag.0);
        }
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        _pos: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if !text.is_empty() {
            self.record.attach_comment(text);
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _pos: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, pos: Self::Movetext) -> Self::Output {
        self.finished = Some(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_data::STANDARD_START_FEN;

    #[test]
    fn test_apply_moves_reports_squares() {
        let mut engine = ShakmatyEngine::new();
        let plies = engine.apply_moves("1. e4 e5 2. Nf3 *").unwrap();
        let sans: Vec<&str> = plies.iter().map(|p| p.san.as_str()).collect();
        assert_eq!(sans, ["e4", "e5", "Nf3"]);
        assert_eq!((plies[0].from.as_str(), plies[0].to.as_str()), ("e2", "e4"));
        assert_eq!((plies[2].from.as_str(), plies[2].to.as_str()), ("g1", "f3"));
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let mut engine = ShakmatyEngine::new();
        let plies = engine
            .apply_moves("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *")
            .unwrap();
        let castle = plies.last().unwrap();
        assert_eq!(castle.san, "O-O");
        assert_eq!((castle.from.as_str(), castle.to.as_str()), ("e1", "g1"));
    }

    #[test]
    fn test_check_and_mate_suffixes() {
        let mut engine = ShakmatyEngine::new();
        let plies = engine.apply_moves("1. f3 e5 2. g4 Qh4 0-1").unwrap();
        assert_eq!(plies.last().unwrap().san, "Qh4#");
    }

    #[test]
    fn test_illegal_move_is_an_error() {
        let mut engine = ShakmatyEngine::new();
        let err = engine.apply_moves("1. e4 e5 2. Ke3 *").unwrap_err();
        assert!(matches!(err, RulesError::IllegalMove { .. }));
    }

    #[test]
    fn test_fen_tag_sets_start_position() {
        let mut engine = ShakmatyEngine::new();
        let text = "[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 *";
        let plies = engine.apply_moves(text).unwrap();
        assert_eq!(plies.len(), 1);
        assert_eq!(engine.current_position(), "4k3/8/8/8/4P3/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn test_fen_tag_name_is_case_sensitive() {
        let mut engine = ShakmatyEngine::new();
        let text = "[Fen \"4k3/8/8/8/8/8/8/R3K3 w - - 0 1\"]\n\n1. Ra8# 1-0";
        assert!(matches!(
            engine.apply_moves(text),
            Err(RulesError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_variations_are_skipped_and_comments_rendered() {
        let mut engine = ShakmatyEngine::new();
        let plies = engine
            .apply_moves("1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 $1 *")
            .unwrap();
        assert_eq!(plies.len(), 3);
        assert_eq!(plies[2].nags, vec![1]);
        assert_eq!(engine.render_pgn(), "1. e4 {best by test} e5 2. Nf3 $1 *");
    }

    #[test]
    fn test_render_black_to_move_start() {
        let mut engine = ShakmatyEngine::new();
        let text = "[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\"]\n[Result \"*\"]\n\n1... e5 2. Nf3 *";
        engine.apply_moves(text).unwrap();
        let rendered = engine.render_pgn();
        assert!(rendered.ends_with("1... e5 2. Nf3 *"), "{rendered}");
        assert!(rendered.starts_with("[FEN \"rnbqkbnr"));
    }

    #[test]
    fn test_load_then_play_replays_positions() {
        let mut engine = ShakmatyEngine::new();
        engine.load_position(STANDARD_START_FEN).unwrap();
        engine.play_san("e4").unwrap();
        assert_eq!(
            engine.current_position(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert!(engine.play_san("e4").is_err());
    }

    #[test]
    fn test_invalid_fen_rejected() {
        let mut engine = ShakmatyEngine::new();
        let err = engine.load_position("not a fen").unwrap_err();
        assert!(matches!(err, RulesError::InvalidFen { .. }));
    }
}
