use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use pgn_viewer::{commands, Presenter, SessionError, ViewerSession};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use viewer_sync::{FileArea, StateStore, SyncConfig};

const USAGE: &str = "Usage: pgn-viewer view [file.pgn] | pgn-viewer present [--show-move]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = SyncConfig::from_env();
    let args: Vec<String> = env::args().collect();

    let area = FileArea::open(&config.storage_dir).with_context(|| {
        format!("Failed to open storage at {}", config.storage_dir.display())
    })?;
    tracing::info!(dir = %area.dir().display(), "Using shared storage");
    let store = StateStore::new(Arc::new(area));

    match args.get(1).map(String::as_str) {
        Some("view") => run_viewer(store, args.get(2).map(String::as_str)).await,
        Some("present") => {
            let show_move = args.iter().skip(2).any(|a| a == "--show-move");
            run_presenter(store, &config, show_move).await
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}

async fn run_viewer(store: StateStore, path: Option<&str>) -> Result<()> {
    let mut session = ViewerSession::new(store);

    match path {
        Some(path) => match commands::load_file(&mut session, path).await {
            Ok(count) => println!("Loaded {count} game(s) from {path}"),
            // A file with no readable games is reported; the session stays empty.
            Err(SessionError::Pgn(e)) => eprintln!("No valid games found in the PGN file ({e})"),
            Err(e) => return Err(e).context("Failed to open the initial PGN"),
        },
        None => {
            let restored = session.restore()?;
            if restored > 0 {
                tracing::info!("Restored {} game(s) from the previous session", restored);
            }
        }
    }

    println!("{}", commands::HELP);
    commands::print_position(&session);

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        result = commands::run(&mut session, stdin) => result?,
    }
    Ok(())
}

async fn run_presenter(store: StateStore, config: &SyncConfig, show_move: bool) -> Result<()> {
    let mut presenter = Presenter::activate(&store, config.poll_interval);
    presenter.set_show_move_info(show_move);
    print_presented(&presenter);

    loop {
        let changed = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = presenter.wait_for_change() => changed,
        };
        if !changed {
            tracing::warn!("Subscription ended");
            break;
        }
        print_presented(&presenter);
    }

    presenter.deactivate();
    Ok(())
}

fn print_presented(presenter: &Presenter) {
    if !presenter.is_synced() {
        println!("Waiting for the viewer to load a game...");
        return;
    }
    let view = presenter.board_view();
    match presenter.move_caption() {
        Some(caption) => println!("[{:?}] {caption}  {}", view.orientation, view.fen),
        None => println!("[{:?}] {}", view.orientation, view.fen),
    }
}
