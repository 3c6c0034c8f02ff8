use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use gefen_core::model::{BestReport, ContentItem, GameMode, MatchSettings, MatchStyle};
use gefen_core::time::elapsed_secs;
use gefen_core::{TimeoutRegistry, TimerHandle};

use crate::error::SessionError;
use super::hooks::{MatchHooks, SessionContext};

/// How a card presents its item once face up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardVariant {
    Image,
    Text,
    Thumbnail,
    /// Speaks the name a moment after it is flipped.
    Audio,
}

impl CardVariant {
    fn companion(style: MatchStyle) -> Self {
        match style {
            MatchStyle::Classic => CardVariant::Text,
            MatchStyle::Images => CardVariant::Thumbnail,
            MatchStyle::Audio => CardVariant::Audio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Down,
    Up,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCard {
    pub item: ContentItem,
    pub variant: CardVariant,
    pub face: Face,
}

impl MatchCard {
    /// Two cards pair up when they show the same item in different ways.
    #[must_use]
    pub fn pairs_with(&self, other: &MatchCard) -> bool {
        self.item.id() == other.item.id() && self.variant != other.variant
    }
}

/// What happened to one flip request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Ignored,
    /// First card of a pair is up.
    Flipped,
    /// Second card is up; the pair resolves after a short delay.
    Resolving { matched: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchStep {
    Resolve { first: usize, second: usize, matched: bool },
    SpeakName { index: usize },
    Tick,
}

/// Pair-matching board.
///
/// At most two cards are face up and unresolved at once; while a pair is
/// being checked every flip is dropped.
pub struct MatchSession {
    mode: GameMode,
    settings: MatchSettings,
    cards: Vec<MatchCard>,
    flipped: Vec<usize>,
    checking: bool,
    matched_pairs: u32,
    total_pairs: u32,
    moves: u32,
    started_at: DateTime<Utc>,
    tick: Option<TimerHandle>,
    timers: TimeoutRegistry<MatchStep>,
    ctx: SessionContext,
    hooks: Box<dyn MatchHooks>,
    report: Option<BestReport>,
    finished: bool,
}

impl MatchSession {
    /// Deal a board of `settings.pairs` pairs from the first items given.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientContent` when fewer distinct items
    /// than pairs are supplied.
    pub fn start<R: Rng + ?Sized>(
        mode: GameMode,
        items: Vec<ContentItem>,
        settings: MatchSettings,
        ctx: SessionContext,
        hooks: Box<dyn MatchHooks>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let settings = settings.validate()?;
        let pairs = usize::try_from(settings.pairs).unwrap_or(usize::MAX);

        let mut seen = HashSet::new();
        let items: Vec<ContentItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .take(pairs)
            .collect();
        if items.len() < pairs {
            return Err(SessionError::InsufficientContent {
                needed: pairs,
                available: items.len(),
            });
        }

        let companion = CardVariant::companion(settings.style);
        let mut cards: Vec<MatchCard> = items
            .into_iter()
            .flat_map(|item| {
                [
                    MatchCard {
                        item: item.clone(),
                        variant: CardVariant::Image,
                        face: Face::Down,
                    },
                    MatchCard {
                        item,
                        variant: companion,
                        face: Face::Down,
                    },
                ]
            })
            .collect();
        cards.shuffle(rng);

        let mut timers = TimeoutRegistry::new();
        let tick = timers.schedule(MatchStep::Tick, settings.tick(), now);

        let mut session = Self {
            mode,
            total_pairs: settings.pairs,
            settings,
            cards,
            flipped: Vec::with_capacity(2),
            checking: false,
            matched_pairs: 0,
            moves: 0,
            started_at: now,
            tick: Some(tick),
            timers,
            ctx,
            hooks,
            report: None,
            finished: false,
        };
        log::info!("{mode} started with {pairs} pairs");
        session.hooks.on_board(&session.cards);
        Ok(session)
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn cards(&self) -> &[MatchCard] {
        &self.cards
    }

    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    #[must_use]
    pub fn total_pairs(&self) -> u32 {
        self.total_pairs
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.checking
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        elapsed_secs(self.started_at, now)
    }

    /// The completion record, handed out exactly once.
    pub fn take_report(&mut self) -> Option<BestReport> {
        self.report.take()
    }

    /// Turn card `index` face up.
    pub fn flip(&mut self, index: usize, now: DateTime<Utc>) -> FlipOutcome {
        if self.finished || self.checking || self.flipped.len() >= 2 {
            return FlipOutcome::Ignored;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return FlipOutcome::Ignored;
        };
        if card.face != Face::Down {
            return FlipOutcome::Ignored;
        }

        card.face = Face::Up;
        self.ctx.effects.flip();
        if card.variant == CardVariant::Audio {
            self.timers.schedule(
                MatchStep::SpeakName { index },
                self.settings.audio_card_delay(),
                now,
            );
        }
        self.hooks.on_flip(index, &self.cards[index]);
        self.flipped.push(index);

        let [first, second] = self.flipped[..] else {
            return FlipOutcome::Flipped;
        };
        self.moves += 1;
        self.hooks.on_moves(self.moves);
        self.checking = true;

        let matched = self.cards[first].pairs_with(&self.cards[second]);
        let delay = if matched {
            self.settings.match_delay()
        } else {
            self.settings.mismatch_delay()
        };
        self.timers.schedule(
            MatchStep::Resolve {
                first,
                second,
                matched,
            },
            delay,
            now,
        );
        FlipOutcome::Resolving { matched }
    }

    /// Run every scheduled step that is due.
    pub fn poll(&mut self, now: DateTime<Utc>) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.run(fired.action, fired.at);
        }
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.timers.next_due()
    }

    /// Stop the clock and cancel pending steps. Unresolved cards turn back down.
    pub fn cleanup(&mut self) {
        self.timers.cancel_all();
        self.tick = None;
        for index in self.flipped.drain(..) {
            if let Some(card) = self.cards.get_mut(index) {
                if card.face == Face::Up {
                    card.face = Face::Down;
                }
            }
        }
        self.checking = false;
    }

    fn run(&mut self, step: MatchStep, at: DateTime<Utc>) {
        match step {
            MatchStep::SpeakName { index } => {
                if let Some(card) = self.cards.get(index) {
                    self.ctx.narrator.speak(card.item.display_name());
                }
            }
            MatchStep::Resolve {
                first,
                second,
                matched,
            } => self.resolve(first, second, matched, at),
            MatchStep::Tick => {
                if self.finished {
                    return;
                }
                self.hooks.on_tick(elapsed_secs(self.started_at, at));
                self.tick = Some(self.timers.schedule(MatchStep::Tick, self.settings.tick(), at));
            }
        }
    }

    fn resolve(&mut self, first: usize, second: usize, matched: bool, at: DateTime<Utc>) {
        let face = if matched { Face::Matched } else { Face::Down };
        for index in [first, second] {
            self.cards[index].face = face;
        }
        self.flipped.clear();
        self.checking = false;
        self.hooks.on_pair_resolved(first, second, matched);

        if matched {
            self.matched_pairs += 1;
            self.ctx.effects.matched();
            self.ctx.narrator.speak(self.cards[first].item.display_name());
            if self.matched_pairs == self.total_pairs {
                self.finalize(at);
            }
        }
    }

    fn finalize(&mut self, at: DateTime<Utc>) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(tick) = self.tick.take() {
            self.timers.cancel(tick);
        }

        let report = BestReport {
            mode: self.mode,
            size: self.total_pairs,
            moves: self.moves,
            elapsed_secs: elapsed_secs(self.started_at, at),
        };
        log::info!(
            "{} finished: {} pairs in {} moves, {}s",
            self.mode,
            report.size,
            report.moves,
            report.elapsed_secs
        );
        self.hooks.on_finalize(&report);
        self.ctx.narrator.speak(&self.ctx.phrases.matching_done);
        self.ctx.effects.celebrate();
        self.report = Some(report);
    }
}
