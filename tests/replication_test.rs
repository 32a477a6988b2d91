/// Tests for following the primary viewer from a secondary surface, both
/// within one process (notifications) and across separately opened storage
/// handles (polling only).
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{memory_pair, scratch_dir, AFTER_E4, AFTER_NF3, OPENING};
use pgn_viewer::{Presenter, ViewerSession};
use tokio::time::{sleep, timeout, Instant};
use viewer_sync::{
    FileArea, SharedArea, StateStore, StateUpdate, PGN_DATA_KEY, VIEWER_STATE_KEY,
};

const POLL: Duration = Duration::from_millis(50);

/// Wait until the presenter shows `fen`, or fail after `limit`.
async fn await_fen(presenter: &mut Presenter, fen: &str, limit: Duration) {
    let deadline = Instant::now() + limit;
    while presenter.fen() != fen {
        assert!(Instant::now() < deadline, "presenter still at {}", presenter.fen());
        let _ = timeout(Duration::from_millis(20), presenter.wait_for_change()).await;
    }
}

#[tokio::test]
async fn test_presenter_follows_navigation() {
    let (primary, secondary) = memory_pair();
    let mut session = ViewerSession::new(primary);
    let mut presenter = Presenter::activate(&secondary, POLL);
    assert!(!presenter.is_synced());

    session.load_pgn(OPENING).unwrap();
    session.next().unwrap();
    await_fen(&mut presenter, AFTER_E4, Duration::from_secs(2)).await;

    session.last().unwrap();
    await_fen(&mut presenter, AFTER_NF3, Duration::from_secs(2)).await;
    assert_eq!(presenter.state().unwrap().last_move.as_deref(), Some("Nf3"));
    assert_eq!(presenter.board_view().highlighted_squares, vec!["g1", "f3"]);
}

#[tokio::test]
async fn test_separate_handles_sync_by_polling() {
    let dir = scratch_dir("poll");
    let viewer_store = StateStore::new(Arc::new(FileArea::open(&dir).unwrap()));
    let presenter_store = StateStore::new(Arc::new(FileArea::open(&dir).unwrap()));

    let mut presenter = Presenter::activate(&presenter_store, POLL);
    let mut session = ViewerSession::new(viewer_store);
    session.load_pgn(OPENING).unwrap();
    session.go_to(2).unwrap();

    // No notification crosses the two handles; the poll must pick it up
    // within a few intervals.
    let started = Instant::now();
    await_fen(&mut presenter, AFTER_NF3, Duration::from_secs(2)).await;
    assert!(started.elapsed() < POLL * 10);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_clear_is_observed_and_removes_both_keys() {
    let (primary, secondary) = memory_pair();
    let mut session = ViewerSession::new(primary);
    session.load_pgn(OPENING).unwrap();

    let mut presenter = Presenter::activate(&secondary, POLL);
    assert!(presenter.is_synced());

    session.clear().unwrap();
    assert_eq!(secondary.area().get(PGN_DATA_KEY).unwrap(), None);
    assert_eq!(secondary.area().get(VIEWER_STATE_KEY).unwrap(), None);

    let cleared = timeout(Duration::from_secs(2), async {
        while presenter.is_synced() {
            presenter.wait_for_change().await;
        }
    })
    .await;
    assert!(cleared.is_ok(), "presenter never saw the clear");
}

#[tokio::test]
async fn test_clear_across_handles_is_seen_by_polling() {
    let dir = scratch_dir("clear");
    let viewer_store = StateStore::new(Arc::new(FileArea::open(&dir).unwrap()));
    let observer = StateStore::new(Arc::new(FileArea::open(&dir).unwrap()));

    let mut session = ViewerSession::new(viewer_store);
    session.load_pgn(OPENING).unwrap();

    let mut sub = observer.subscribe(POLL);
    session.clear().unwrap();

    let update = timeout(Duration::from_secs(2), async {
        loop {
            match sub.next().await {
                Some(StateUpdate::Changed(_)) => continue,
                other => return other,
            }
        }
    })
    .await;
    assert_eq!(update.unwrap(), Some(StateUpdate::Cleared));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_unsubscribed_presenter_stops_listening() {
    let (primary, secondary) = memory_pair();
    let presenter = Presenter::activate(&secondary, POLL);
    presenter.deactivate();

    let mut session = ViewerSession::new(primary);
    session.load_pgn(OPENING).unwrap();
    // Nothing left to deliver to; writing must still succeed.
    sleep(POLL * 2).await;
    session.next().unwrap();
    assert_eq!(secondary.load_viewer_state().unwrap().fen, AFTER_E4);
}
