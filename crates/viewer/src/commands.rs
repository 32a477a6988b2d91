//! Line-oriented command loop driving a [`ViewerSession`].
//!
//! A failed command is reported and the loop keeps going; only the input
//! stream ending (or `quit`) stops it.

use std::str::FromStr;

use chess_core::display::{format_move_number, game_display_name};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use crate::error::{CommandError, SessionError};
use crate::session::ViewerSession;

pub const HELP: &str = "\
Commands:
  n | next        next move
  p | prev        previous move
  f | first       initial position
  l | last        final position
  m <index>       jump to move index (-1 = initial position)
  g <number>      select game (1-based)
  games           list loaded games
  load <file>     load a PGN file
  flip            flip the board
  clear           forget the loaded games
  q | quit        exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    First,
    Last,
    GoTo(i32),
    /// Zero-based game index.
    SelectGame(usize),
    ListGames,
    Load(String),
    Flip,
    Clear,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let argument = parts.next();

        match command {
            "n" | "next" => Ok(Command::Next),
            "p" | "prev" => Ok(Command::Previous),
            "f" | "first" => Ok(Command::First),
            "l" | "last" => Ok(Command::Last),
            "flip" => Ok(Command::Flip),
            "clear" => Ok(Command::Clear),
            "games" => Ok(Command::ListGames),
            "q" | "quit" => Ok(Command::Quit),
            "m" => argument
                .and_then(|a| a.parse().ok())
                .map(Command::GoTo)
                .ok_or(CommandError::Usage("m <index>")),
            "g" => match argument.and_then(|a| a.parse::<usize>().ok()) {
                Some(number) if number > 0 => Ok(Command::SelectGame(number - 1)),
                _ => Err(CommandError::Usage("g <number>")),
            },
            "load" => argument
                .map(|path| Command::Load(path.to_string()))
                .ok_or(CommandError::Usage("load <file>")),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Read `path` and load it into the session.
pub async fn load_file(session: &mut ViewerSession, path: &str) -> Result<usize, SessionError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SessionError::Read {
            path: path.to_string(),
            source,
        })?;
    session.load_pgn(&raw)
}

/// Run one command. `ListGames` and `Quit` are handled by the caller.
pub async fn execute(session: &mut ViewerSession, command: &Command) -> Result<(), SessionError> {
    match command {
        Command::Next => session.next(),
        Command::Previous => session.previous(),
        Command::First => session.first(),
        Command::Last => session.last(),
        Command::GoTo(index) => session.go_to(*index),
        Command::SelectGame(index) => session.select_game(*index),
        Command::Flip => session.flip_board(),
        Command::Clear => session.clear(),
        Command::Load(path) => {
            let count = load_file(session, path).await?;
            println!("Loaded {count} game(s) from {path}");
            Ok(())
        }
        Command::ListGames | Command::Quit => Ok(()),
    }
}

/// Read commands from `input` until it ends or a quit command arrives.
pub async fn run<R>(session: &mut ViewerSession, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::ListGames => list_games(session),
            command => match execute(session, &command).await {
                Ok(()) => print_position(session),
                Err(e) => {
                    warn!(?command, error = %e, "Command failed");
                    eprintln!("{e}");
                }
            },
        }
    }
    Ok(())
}

pub fn list_games(session: &ViewerSession) {
    if session.games().is_empty() {
        println!("No games loaded");
        return;
    }
    for (index, game) in session.games().iter().enumerate() {
        let marker = if index == session.selected_index() { '*' } else { ' ' };
        println!("{marker} {:>3}  {}", index + 1, game_display_name(game, index));
    }
}

pub fn print_position(session: &ViewerSession) {
    let view = session.board_view();
    let caption = match session.current_move() {
        Some(m) => format!("{} {}", format_move_number(m.move_number, m.is_white), m.san),
        None => "start".to_string(),
    };
    println!("[{:?}] {caption}  {}", view.orientation, view.fen);
    if let Some(comment) = session.current_move().and_then(|m| m.comment.as_deref()) {
        println!("  {{{comment}}}");
    }
}
