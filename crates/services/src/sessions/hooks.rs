//! Callbacks a rendering layer implements to follow a session.
//!
//! Every method has an empty default so a front end only overrides what it
//! draws. Hooks are notified synchronously from inside session operations
//! and must not call back into the session.

use std::rc::Rc;

use gefen_core::model::{BestReport, Challenge, ItemId, Phrasebook, ResultTier};

use crate::narration::Narrator;

use super::assembly::{Cell, Piece};
use super::challenge::OptionSlot;
use super::matching::MatchCard;

/// What a question looks like the moment it is presented.
#[derive(Debug, Clone, Copy)]
pub struct Presented<'a> {
    pub index: usize,
    pub total: usize,
    pub challenge: &'a Challenge,
    pub options: &'a [OptionSlot],
}

pub trait ChallengeHooks {
    fn on_present(&mut self, _presented: &Presented<'_>) {}

    /// `reveal` names the answer when this wrong response used up the last try.
    fn on_response_result(&mut self, _candidate: &ItemId, _correct: bool, _reveal: Option<&ItemId>) {}

    fn on_option_disabled(&mut self, _candidate: &ItemId) {}

    fn on_reveal(&mut self, _answer: &ItemId) {}

    fn on_hint(&mut self, _hint: &str) {}

    fn on_star_earned(&mut self, _index: usize) {}

    /// `current` is the 1-based number of the question on screen.
    fn on_progress(&mut self, _current: usize, _total: usize) {}

    fn on_finalize(&mut self, _score: u32, _total: u32, _tier: ResultTier) {}
}

pub trait MatchHooks {
    fn on_board(&mut self, _cards: &[MatchCard]) {}
    fn on_flip(&mut self, _index: usize, _card: &MatchCard) {}
    fn on_pair_resolved(&mut self, _first: usize, _second: usize, _matched: bool) {}
    fn on_moves(&mut self, _moves: u32) {}
    fn on_tick(&mut self, _elapsed_secs: u64) {}
    fn on_finalize(&mut self, _report: &BestReport) {}
}

pub trait AssemblyHooks {
    fn on_board(&mut self, _pieces: &[Piece], _cells: &[Cell]) {}
    fn on_select(&mut self, _piece: Option<usize>) {}
    fn on_placed(&mut self, _piece: usize, _cell: usize) {}
    /// The transient wrong mark on `piece` was set or cleared.
    fn on_wrong_mark(&mut self, _piece: usize, _marked: bool) {}
    fn on_moves(&mut self, _moves: u32) {}
    fn on_tick(&mut self, _elapsed_secs: u64) {}
    fn on_finalize(&mut self, _report: &BestReport) {}
}

/// Hooks for a session nobody watches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl ChallengeHooks for NoHooks {}
impl MatchHooks for NoHooks {}
impl AssemblyHooks for NoHooks {}

/// Short feedback sounds. Fire and forget.
pub trait SoundEffects {
    fn correct(&self) {}
    fn wrong(&self) {}
    fn flip(&self) {}
    fn matched(&self) {}
    fn celebrate(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SoundEffects for Silent {}

/// Collaborators every session speaks and plays sounds through.
#[derive(Clone)]
pub struct SessionContext {
    pub narrator: Narrator,
    pub effects: Rc<dyn SoundEffects>,
    pub phrases: Rc<Phrasebook>,
}

impl SessionContext {
    #[must_use]
    pub fn new(narrator: Narrator) -> Self {
        Self {
            narrator,
            effects: Rc::new(Silent),
            phrases: Rc::new(Phrasebook::default()),
        }
    }

    #[must_use]
    pub fn with_effects(mut self, effects: Rc<dyn SoundEffects>) -> Self {
        self.effects = effects;
        self
    }

    #[must_use]
    pub fn with_phrases(mut self, phrases: Rc<Phrasebook>) -> Self {
        self.phrases = phrases;
        self
    }
}
