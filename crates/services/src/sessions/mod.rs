//! Timed game sessions and the loop that drives them.

mod assembly;
mod challenge;
mod hooks;
mod matching;
pub mod plan;
mod tour;
mod workflow;

pub use assembly::{AssemblySession, Cell, PlaceOutcome, Piece};
pub use challenge::{ChallengeSession, OptionSlot, OptionState, ResponseOutcome};
pub use hooks::{
    AssemblyHooks, ChallengeHooks, MatchHooks, NoHooks, Presented, SessionContext, Silent,
    SoundEffects,
};
pub use matching::{CardVariant, Face, FlipOutcome, MatchCard, MatchSession};
pub use tour::LearningTour;
pub use workflow::{ActiveSession, ContentLibrary, GameLoopService, TourStep};
