//! Labels shown by the viewer surfaces.

use crate::game_data::ParsedGame;

/// Human-readable name for a game selector entry. `index` is zero-based.
pub fn game_display_name(game: &ParsedGame, index: usize) -> String {
    let white = game.header("White").unwrap_or("Unknown");
    let black = game.header("Black").unwrap_or("Unknown");
    let event = game.header("Event").filter(|e| *e != "?");
    let result = game.header("Result").unwrap_or("*");

    if white != "Unknown" || black != "Unknown" {
        let mut name = format!("{white} vs {black}");
        if !result.is_empty() && result != "*" {
            name.push_str(&format!(" ({result})"));
        }
        if let Some(event) = event {
            name.push_str(&format!(" - {event}"));
        }
        return name;
    }

    if let Some(event) = event {
        return match game.header("Date") {
            Some(date) if !date.is_empty() => format!("{event} ({date})"),
            _ => event.to_string(),
        };
    }

    format!("Game {}", index + 1)
}

/// `12.` for white, `12...` for black.
pub fn format_move_number(move_number: u32, is_white: bool) -> String {
    if is_white {
        format!("{move_number}.")
    } else {
        format!("{move_number}...")
    }
}
