/// Tests for the primary viewer session over durable storage.
mod common;

use std::sync::Arc;

use chess_core::STANDARD_START_FEN;
use common::{scratch_dir, AFTER_E5, LESSON, OPENING};
use pgn_viewer::{SessionError, ViewerSession};
use viewer_sync::{FileArea, Orientation, StateStore};

fn file_session(dir: &std::path::Path) -> ViewerSession {
    ViewerSession::new(StateStore::new(Arc::new(FileArea::open(dir).unwrap())))
}

#[test]
fn test_session_survives_restart() {
    let dir = scratch_dir("restart");
    {
        let mut session = file_session(&dir);
        session.load_pgn(LESSON).unwrap();
        session.select_game(2).unwrap();
        session.last().unwrap();
    }

    let mut restarted = file_session(&dir);
    assert_eq!(restarted.restore().unwrap(), 3);
    assert_eq!(restarted.selected_index(), 0);
    assert_eq!(restarted.move_index(), -1);
    assert_eq!(restarted.games()[2].header("White"), Some("Gamma"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_game_switch_is_published() {
    let dir = scratch_dir("switch");
    let mut session = file_session(&dir);
    session.load_pgn(LESSON).unwrap();
    session.select_game(1).unwrap();

    let state = session.store().load_viewer_state().unwrap();
    assert_eq!(state.game_index, 1);
    assert_eq!(state.move_index, -1);
    assert_eq!(state.fen, "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1");

    // A position-only game has nowhere to go.
    session.next().unwrap();
    assert_eq!(session.move_index(), -1);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_bad_file_keeps_current_game() {
    let dir = scratch_dir("bad");
    let mut session = file_session(&dir);
    session.load_pgn(OPENING).unwrap();
    session.go_to(1).unwrap();

    let err = session.load_pgn("[Event \"Broken\"]\n\n1. e5 *").unwrap_err();
    assert!(matches!(err, SessionError::Pgn(_)));
    assert_eq!(session.current_fen(), AFTER_E5);
    assert_eq!(session.store().load_viewer_state().unwrap().fen, AFTER_E5);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_orientation_survives_new_load() {
    let dir = scratch_dir("flip");
    let mut session = file_session(&dir);
    session.load_pgn(OPENING).unwrap();
    session.flip_board().unwrap();
    session.load_pgn(LESSON).unwrap();

    let state = session.store().load_viewer_state().unwrap();
    assert_eq!(state.board_orientation, Some(Orientation::Black));
    assert_eq!(state.fen, STANDARD_START_FEN);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_stored_state_wire_names() {
    let dir = scratch_dir("wire");
    let mut session = file_session(&dir);
    session.load_pgn(OPENING).unwrap();
    session.next().unwrap();

    let raw = std::fs::read_to_string(dir.join("viewer-state.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["gameIndex"], 0);
    assert_eq!(json["moveIndex"], 0);
    assert_eq!(json["lastMove"], "e4");
    assert_eq!(json["lastMoveSquares"]["from"], "e2");
    assert_eq!(json["moveNumber"], 1);
    assert_eq!(json["isWhiteMove"], true);
    assert_eq!(json["boardOrientation"], "white");

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("pgn-data.json")).unwrap())
            .unwrap();
    assert_eq!(stored["raw"], OPENING);
    assert!(stored["timestamp"].as_i64().unwrap() > 0);

    let _ = std::fs::remove_dir_all(dir);
}
