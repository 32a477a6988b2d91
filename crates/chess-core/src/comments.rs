//! Attach annotation text to the move it follows.
//!
//! [`PositionalAssociator`] works on the engine's rendered PGN by counting
//! move-shaped tokens. It is heuristic: a comment before the first move has no
//! move to attach to and is dropped, and a comment adjacent to stripped
//! variation text may land on the wrong move.

use regex::Regex;
use std::sync::LazyLock;

use crate::game_data::MoveNode;

static MOVE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[KQRBNP]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O(?:-O)?[+#]?)$")
        .expect("valid regex")
});

pub trait CommentAssociator {
    /// Return `moves` with `comment` filled in from `rendered_pgn`.
    fn associate(&self, rendered_pgn: &str, moves: Vec<MoveNode>) -> Vec<MoveNode>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalAssociator;

impl CommentAssociator for PositionalAssociator {
    fn associate(&self, rendered_pgn: &str, mut moves: Vec<MoveNode>) -> Vec<MoveNode> {
        let mut counted = 0usize;
        let mut skip_until = 0usize;

        for (offset, token) in tokens_with_offsets(rendered_pgn) {
            if offset < skip_until {
                continue;
            }

            let Some(brace) = token.find('{') else {
                if is_move_token(token) {
                    counted += 1;
                }
                continue;
            };

            if is_move_token(&token[..brace]) {
                counted += 1;
            }

            let open = offset + brace;
            let Some(close) = rendered_pgn[open..].find('}').map(|rel| open + rel) else {
                tracing::debug!(offset = open, "Unterminated comment in rendered PGN");
                break;
            };
            skip_until = close + 1;

            let text = rendered_pgn[open + 1..close].trim();
            if text.is_empty() || counted == 0 {
                continue;
            }
            if let Some(node) = moves.get_mut(counted - 1) {
                node.comment = Some(text.to_string());
            }
        }

        moves
    }
}

pub fn is_move_token(token: &str) -> bool {
    MOVE_TOKEN_RE.is_match(token)
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &text[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }
    tokens
}
