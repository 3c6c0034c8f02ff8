//! Shared error types for the services crate.

use thiserror::Error;

use gefen_core::model::{GameMode, SettingsError};
use storage::sqlite::SqliteInitError;

/// Errors emitted while starting or driving a game session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no content available for session")]
    Empty,
    #[error("not enough content: need {needed}, have {available}")]
    InsufficientContent { needed: usize, available: usize },
    #[error("invalid challenge: {0}")]
    InvalidChallenge(String),
    #[error("{0} cannot be started this way")]
    WrongMode(GameMode),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Errors emitted while building the narrator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NarrationError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("invalid fallback endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Errors emitted while bootstrapping the game loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Narration(#[from] NarrationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
