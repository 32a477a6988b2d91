//! What the board widget is asked to draw.

use serde::Serialize;
use viewer_sync::{MoveSquares, Orientation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub fen: String,
    pub orientation: Orientation,
    pub highlighted_squares: Vec<String>,
    /// Only the primary viewer accepts input.
    pub interactive: bool,
}

pub(crate) fn highlight(squares: Option<&MoveSquares>) -> Vec<String> {
    squares
        .map(|s| vec![s.from.clone(), s.to.clone()])
        .unwrap_or_default()
}
