//! Viewer surfaces: the interactive [`ViewerSession`] that owns the loaded
//! games, and the read-only [`Presenter`] that mirrors it.

pub mod commands;
pub mod error;
pub mod presenter;
pub mod session;
pub mod view;

#[cfg(test)]
mod testing;

pub use commands::Command;
pub use error::{CommandError, SessionError};
pub use presenter::Presenter;
pub use session::ViewerSession;
pub use view::BoardView;
