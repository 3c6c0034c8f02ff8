#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod narration;
pub mod progress_service;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;

pub use gefen_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, NarrationError, SessionError};
pub use narration::{Narrator, PlaybackInbox};
pub use progress_service::{ProgressService, unlocked_count};
pub use sessions::{ActiveSession, ContentLibrary, GameLoopService, TourStep};
