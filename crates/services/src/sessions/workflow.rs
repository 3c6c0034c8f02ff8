use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use gefen_core::model::{
    Catalog, Challenge, ChallengeSettings, GameMode, GameSettings, ItemId, MatchSettings,
    MatchStyle, Phrasebook,
};

use crate::Clock;
use crate::error::SessionError;
use crate::narration::Narrator;
use crate::progress_service::{ProgressService, unlocked_count};

use super::assembly::{AssemblySession, PlaceOutcome};
use super::challenge::{ChallengeSession, ResponseOutcome};
use super::hooks::{AssemblyHooks, ChallengeHooks, MatchHooks, SessionContext, SoundEffects};
use super::matching::{FlipOutcome, MatchSession};
use super::plan::{pick_questions, plan_odd_rounds};
use super::tour::LearningTour;

/// Brands open this many entries before the viewed count takes over.
const BRANDS_INITIAL_UNLOCKED: usize = 6;

/// The catalogs the game modes draw from.
#[derive(Debug, Clone)]
pub struct ContentLibrary {
    vehicles: Catalog,
    brands: Option<Catalog>,
    parts: Option<Catalog>,
}

impl ContentLibrary {
    #[must_use]
    pub fn new(vehicles: Catalog) -> Self {
        Self {
            vehicles,
            brands: None,
            parts: None,
        }
    }

    #[must_use]
    pub fn with_brands(mut self, brands: Catalog) -> Self {
        self.brands = Some(brands);
        self
    }

    #[must_use]
    pub fn with_parts(mut self, parts: Catalog) -> Self {
        self.parts = Some(parts);
        self
    }

    /// The catalog `mode` plays with.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when that catalog was never supplied.
    pub fn catalog_for(&self, mode: GameMode) -> Result<&Catalog, SessionError> {
        let catalog = match mode {
            GameMode::Brands | GameMode::BrandsQuiz => self.brands.as_ref(),
            GameMode::Parts | GameMode::PartsQuiz | GameMode::PartsMatching => self.parts.as_ref(),
            _ => Some(&self.vehicles),
        };
        catalog.ok_or(SessionError::Empty)
    }
}

/// Whatever is on screen right now.
pub enum ActiveSession {
    Challenge(ChallengeSession),
    Match(MatchSession),
    Assembly(AssemblySession),
    Tour(LearningTour),
}

impl ActiveSession {
    #[must_use]
    pub fn mode(&self) -> GameMode {
        match self {
            Self::Challenge(s) => s.mode(),
            Self::Match(s) => s.mode(),
            Self::Assembly(s) => s.mode(),
            Self::Tour(t) => t.mode(),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        match self {
            Self::Challenge(s) => s.is_finished(),
            Self::Match(s) => s.is_finished(),
            Self::Assembly(s) => s.is_finished(),
            Self::Tour(_) => false,
        }
    }

    /// True while input is latched waiting for a scheduled step.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Challenge(s) => s.is_transitioning(),
            Self::Match(s) => s.is_checking(),
            Self::Assembly(s) => s.is_transitioning(),
            Self::Tour(_) => false,
        }
    }

    fn poll(&mut self, now: DateTime<Utc>) {
        match self {
            Self::Challenge(s) => s.poll(now),
            Self::Match(s) => s.poll(now),
            Self::Assembly(s) => s.poll(now),
            Self::Tour(_) => {}
        }
    }

    fn next_due(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Challenge(s) => s.next_due(),
            Self::Match(s) => s.next_due(),
            Self::Assembly(s) => s.next_due(),
            Self::Tour(_) => None,
        }
    }

    fn cleanup(&mut self) {
        match self {
            Self::Challenge(s) => s.cleanup(),
            Self::Match(s) => s.cleanup(),
            Self::Assembly(s) => s.cleanup(),
            Self::Tour(_) => {}
        }
    }
}

/// Tour navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourStep {
    Show,
    Next,
    Prev,
}

/// Owns the active session, feeds it time and input, and persists what it reports.
///
/// One session is active at a time; starting another leaves the current one
/// first.
pub struct GameLoopService {
    clock: Clock,
    ctx: SessionContext,
    progress: ProgressService,
    library: ContentLibrary,
    settings: GameSettings,
    rng: StdRng,
    active: Option<ActiveSession>,
}

impl GameLoopService {
    /// # Errors
    ///
    /// Returns `SessionError::Settings` if `settings` do not validate.
    pub fn new(
        clock: Clock,
        narrator: Narrator,
        progress: ProgressService,
        library: ContentLibrary,
        settings: GameSettings,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            clock,
            ctx: SessionContext::new(narrator),
            progress,
            library,
            settings: settings.validate()?,
            rng: StdRng::from_os_rng(),
            active: None,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: Rc<dyn SoundEffects>) -> Self {
        self.ctx = self.ctx.with_effects(effects);
        self
    }

    #[must_use]
    pub fn with_phrases(mut self, phrases: Rc<Phrasebook>) -> Self {
        self.ctx = self.ctx.with_phrases(phrases);
        self
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn narrator(&self) -> &Narrator {
        &self.ctx.narrator
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Start a question game: `Quiz`, `BrandsQuiz`, `PartsQuiz`, `SoundQuiz` or `OddOneOut`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` for any other mode, or whatever the
    /// session rejects about the planned content.
    pub async fn start_challenge(
        &mut self,
        mode: GameMode,
        hooks: Box<dyn ChallengeHooks>,
    ) -> Result<(), SessionError> {
        let settings = self.challenge_settings(mode)?;
        self.leave().await;

        let catalog = self.library.catalog_for(mode)?;
        let phrases = Rc::clone(&self.ctx.phrases);
        let count = settings.question_count;
        let challenges: Vec<Challenge> = match mode {
            GameMode::OddOneOut => plan_odd_rounds(catalog, count, &mut self.rng)
                .into_iter()
                .map(|round| Challenge::odd_one_out(round, catalog, &phrases))
                .collect(),
            GameMode::SoundQuiz => pick_questions(catalog.items(), count, &mut self.rng)
                .into_iter()
                .map(|item| Challenge::listen(item, &phrases))
                .collect(),
            _ => pick_questions(catalog.items(), count, &mut self.rng)
                .into_iter()
                .map(|item| Challenge::identify(item, &phrases))
                .collect(),
        };

        let session = ChallengeSession::start(
            mode,
            challenges,
            catalog.items().to_vec(),
            settings,
            self.ctx.clone(),
            hooks,
            StdRng::from_rng(&mut self.rng),
            self.clock.now(),
        )?;
        self.active = Some(ActiveSession::Challenge(session));
        Ok(())
    }

    /// Start a memory board: `Matching` or `PartsMatching`, with `pairs`
    /// pairs or the configured default.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` for any other mode,
    /// `SessionError::Settings` for zero pairs and
    /// `SessionError::InsufficientContent` when the catalog is too small.
    pub async fn start_matching(
        &mut self,
        mode: GameMode,
        style: MatchStyle,
        pairs: Option<u32>,
        hooks: Box<dyn MatchHooks>,
    ) -> Result<(), SessionError> {
        if !matches!(mode, GameMode::Matching | GameMode::PartsMatching) {
            return Err(SessionError::WrongMode(mode));
        }
        let mut settings: MatchSettings = self.settings.matching.clone().with_style(style);
        if let Some(pairs) = pairs {
            settings = settings.with_pairs(pairs);
        }
        let settings = settings.validate()?;
        self.leave().await;

        let catalog = self.library.catalog_for(mode)?;
        let pairs = usize::try_from(settings.pairs).unwrap_or(usize::MAX);
        let items = pick_questions(catalog.items(), pairs, &mut self.rng);
        let session = MatchSession::start(
            mode,
            items,
            settings,
            self.ctx.clone(),
            hooks,
            &mut self.rng,
            self.clock.now(),
        )?;
        self.active = Some(ActiveSession::Match(session));
        Ok(())
    }

    /// Start a puzzle of `subject`, or of a random vehicle, cut into a
    /// `(rows, cols)` grid or the configured default.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Settings` for an empty grid and
    /// `SessionError::Empty` when there is nothing to assemble.
    pub async fn start_puzzle(
        &mut self,
        subject: Option<&ItemId>,
        grid: Option<(u32, u32)>,
        hooks: Box<dyn AssemblyHooks>,
    ) -> Result<(), SessionError> {
        let mut settings = self.settings.assembly.clone();
        if let Some((rows, cols)) = grid {
            settings = settings.with_grid(rows, cols);
        }
        let settings = settings.validate()?;
        self.leave().await;

        let catalog = self.library.catalog_for(GameMode::Puzzle)?;
        let item = match subject {
            Some(id) => catalog.item(id),
            None => catalog.items().choose(&mut self.rng),
        }
        .cloned()
        .ok_or(SessionError::Empty)?;

        let session = AssemblySession::start(
            item,
            settings,
            self.ctx.clone(),
            hooks,
            &mut self.rng,
            self.clock.now(),
        )?;
        self.active = Some(ActiveSession::Assembly(session));
        Ok(())
    }

    /// Open a browse tour: `Learning`, `Brands` or `Parts`, and show its first entry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongMode` for any other mode.
    pub async fn open_tour(&mut self, mode: GameMode) -> Result<(), SessionError> {
        if !matches!(mode, GameMode::Learning | GameMode::Brands | GameMode::Parts) {
            return Err(SessionError::WrongMode(mode));
        }
        self.leave().await;

        let catalog = self.library.catalog_for(mode)?.clone();
        let viewed = self.progress.viewed(mode).await;
        let mut tour = LearningTour::new(
            mode,
            catalog,
            viewed,
            self.ctx.narrator.clone(),
            self.settings.tour_pause(),
        )?;
        if mode == GameMode::Brands {
            let total = tour.catalog_len();
            tour.set_visible(unlocked_count(
                tour.viewed().len(),
                BRANDS_INITIAL_UNLOCKED,
                total,
            ));
        }
        log::info!("{mode} tour opened at {} entries", tour.len());
        self.active = Some(ActiveSession::Tour(tour));
        self.tour_step(TourStep::Show).await;
        Ok(())
    }

    /// Move the open tour. Returns `None` when no tour is open, otherwise
    /// whether the entry now shown was seen for the first time.
    pub async fn tour_step(&mut self, step: TourStep) -> Option<bool> {
        let Some(ActiveSession::Tour(tour)) = self.active.as_mut() else {
            return None;
        };
        let first_view = match step {
            TourStep::Show => tour.show(),
            TourStep::Next => tour.next(),
            TourStep::Prev => tour.prev(),
        };
        if first_view {
            let mode = tour.mode();
            let viewed = tour.viewed().to_vec();
            if mode == GameMode::Brands {
                let total = tour.catalog_len();
                tour.set_visible(unlocked_count(viewed.len(), BRANDS_INITIAL_UNLOCKED, total));
            }
            self.progress.save_viewed(mode, &viewed).await;
        }
        Some(first_view)
    }

    /// Answer the open question. `None` when no question game is active.
    pub fn respond(&mut self, candidate: &ItemId) -> Option<ResponseOutcome> {
        let now = self.clock.now();
        match self.active.as_mut() {
            Some(ActiveSession::Challenge(s)) => Some(s.submit_response(candidate, now)),
            _ => None,
        }
    }

    pub fn replay_prompt(&mut self) {
        if let Some(ActiveSession::Challenge(s)) = self.active.as_mut() {
            s.replay_prompt();
        }
    }

    pub fn flip(&mut self, index: usize) -> Option<FlipOutcome> {
        let now = self.clock.now();
        match self.active.as_mut() {
            Some(ActiveSession::Match(s)) => Some(s.flip(index, now)),
            _ => None,
        }
    }

    pub fn select(&mut self, piece: usize) -> Option<bool> {
        match self.active.as_mut() {
            Some(ActiveSession::Assembly(s)) => Some(s.select(piece)),
            _ => None,
        }
    }

    pub fn place(&mut self, cell: usize) -> Option<PlaceOutcome> {
        let now = self.clock.now();
        match self.active.as_mut() {
            Some(ActiveSession::Assembly(s)) => Some(s.place(cell, now)),
            _ => None,
        }
    }

    /// Run everything due by the clock's current time and persist any result.
    pub async fn tick(&mut self) {
        let now = self.clock.now();
        if let Some(active) = self.active.as_mut() {
            active.poll(now);
        }
        self.ctx.narrator.poll(now);
        self.flush_reports().await;
    }

    /// Move a fixed clock forward by `delta`, then [`tick`](Self::tick).
    pub async fn advance(&mut self, delta: Duration) {
        self.clock.advance(delta);
        self.tick().await;
    }

    /// Earliest moment anything is scheduled to happen.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        let session = self.active.as_ref().and_then(ActiveSession::next_due);
        let narration = self.ctx.narrator.next_due();
        match (session, narration) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Close the active session: persist its result, cancel its timers and
    /// silence narration. Safe to call with nothing active.
    pub async fn leave(&mut self) {
        self.flush_reports().await;
        if let Some(mut active) = self.active.take() {
            active.cleanup();
            log::info!("left {}", active.mode());
        }
        self.ctx.narrator.stop();
    }

    /// Leave whatever is open, wipe stored progress and say so. Returns how
    /// many records were removed.
    pub async fn reset_progress(&mut self) -> u64 {
        self.leave().await;
        let removed = self.progress.reset_all().await;
        self.ctx.narrator.speak(&self.ctx.phrases.progress_reset);
        removed
    }

    async fn flush_reports(&mut self) {
        match self.active.as_mut() {
            Some(ActiveSession::Challenge(s)) => {
                if let Some(report) = s.take_report() {
                    self.progress.record_score(&report).await;
                }
            }
            Some(ActiveSession::Match(s)) => {
                if let Some(report) = s.take_report() {
                    self.progress.record_best(&report).await;
                }
            }
            Some(ActiveSession::Assembly(s)) => {
                if let Some(report) = s.take_report() {
                    self.progress.record_best(&report).await;
                }
            }
            Some(ActiveSession::Tour(_)) | None => {}
        }
    }

    fn challenge_settings(&self, mode: GameMode) -> Result<ChallengeSettings, SessionError> {
        match mode {
            GameMode::Quiz | GameMode::BrandsQuiz | GameMode::PartsQuiz => {
                Ok(self.settings.quiz.clone())
            }
            GameMode::SoundQuiz => Ok(self.settings.sound_quiz.clone()),
            GameMode::OddOneOut => Ok(self.settings.odd_one_out.clone()),
            other => Err(SessionError::WrongMode(other)),
        }
    }
}
