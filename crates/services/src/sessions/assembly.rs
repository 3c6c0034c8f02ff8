use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use gefen_core::model::{AssemblySettings, BestReport, ContentItem, GameMode};
use gefen_core::time::elapsed_secs;
use gefen_core::{TimeoutRegistry, TimerHandle};

use crate::error::SessionError;
use super::hooks::{AssemblyHooks, SessionContext};

/// One puzzle piece in the tray. `row`/`col` is where it belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub row: u32,
    pub col: u32,
    pub placed: bool,
    /// Transient mark after a wrong placement.
    pub wrong: bool,
}

/// One target cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub filled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    Ignored,
    Correct,
    Wrong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblyStep {
    Announce,
    Settle,
    ClearWrong { piece: usize },
    Tick,
}

/// Picture puzzle: select a piece from the tray, then drop it on a cell.
pub struct AssemblySession {
    mode: GameMode,
    subject: ContentItem,
    settings: AssemblySettings,
    pieces: Vec<Piece>,
    cells: Vec<Cell>,
    selected: Option<usize>,
    placed: usize,
    moves: u32,
    transitioning: bool,
    started_at: DateTime<Utc>,
    tick: Option<TimerHandle>,
    /// Pending wrong-mark clear per piece.
    wrong_clears: Vec<Option<TimerHandle>>,
    timers: TimeoutRegistry<AssemblyStep>,
    ctx: SessionContext,
    hooks: Box<dyn AssemblyHooks>,
    report: Option<BestReport>,
    finished: bool,
}

impl AssemblySession {
    /// Cut `subject` into a `rows x cols` board and shuffle the tray.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Settings` for an empty grid.
    pub fn start<R: Rng + ?Sized>(
        subject: ContentItem,
        settings: AssemblySettings,
        ctx: SessionContext,
        hooks: Box<dyn AssemblyHooks>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let settings = settings.validate()?;
        let cells: Vec<Cell> = (0..settings.rows)
            .flat_map(|row| {
                (0..settings.cols).map(move |col| Cell {
                    row,
                    col,
                    filled: false,
                })
            })
            .collect();
        let mut pieces: Vec<Piece> = cells
            .iter()
            .map(|cell| Piece {
                row: cell.row,
                col: cell.col,
                placed: false,
                wrong: false,
            })
            .collect();
        pieces.shuffle(rng);

        let mut timers = TimeoutRegistry::new();
        timers.schedule(AssemblyStep::Announce, settings.intro_delay(), now);
        let tick = timers.schedule(AssemblyStep::Tick, settings.tick(), now);

        let mut session = Self {
            mode: GameMode::Puzzle,
            subject,
            settings,
            wrong_clears: vec![None; pieces.len()],
            pieces,
            cells,
            selected: None,
            placed: 0,
            moves: 0,
            transitioning: false,
            started_at: now,
            tick: Some(tick),
            timers,
            ctx,
            hooks,
            report: None,
            finished: false,
        };
        log::info!(
            "puzzle of {} started with {} pieces",
            session.subject.id(),
            session.pieces.len()
        );
        session.hooks.on_board(&session.pieces, &session.cells);
        Ok(session)
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn subject(&self) -> &ContentItem {
        &self.subject
    }

    #[must_use]
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.placed
    }

    #[must_use]
    pub fn total_pieces(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
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

    /// Select tray piece `index`; selecting the selected piece deselects it.
    ///
    /// Returns false when the request was dropped.
    pub fn select(&mut self, index: usize) -> bool {
        if self.finished || self.transitioning {
            return false;
        }
        if self.pieces.get(index).is_none_or(|p| p.placed) {
            return false;
        }
        if self.selected == Some(index) {
            self.selected = None;
        } else {
            self.selected = Some(index);
            self.ctx.effects.flip();
        }
        self.hooks.on_select(self.selected);
        true
    }

    /// Drop the selected piece on board cell `cell`.
    pub fn place(&mut self, cell: usize, now: DateTime<Utc>) -> PlaceOutcome {
        if self.finished || self.transitioning {
            return PlaceOutcome::Ignored;
        }
        let Some(piece) = self.selected else {
            return PlaceOutcome::Ignored;
        };
        let Some(target) = self.cells.get(cell).copied() else {
            return PlaceOutcome::Ignored;
        };
        if target.filled {
            return PlaceOutcome::Ignored;
        }

        self.moves += 1;
        self.hooks.on_moves(self.moves);
        self.selected = None;

        let belongs = {
            let p = &self.pieces[piece];
            p.row == target.row && p.col == target.col
        };
        if belongs {
            self.transitioning = true;
            self.cells[cell].filled = true;
            self.pieces[piece].placed = true;
            self.pieces[piece].wrong = false;
            self.placed += 1;
            self.ctx.effects.correct();
            self.hooks.on_placed(piece, cell);

            let total = self.pieces.len();
            if is_milestone(self.placed, total) {
                let line = self.ctx.phrases.progress(self.placed, total);
                self.ctx.narrator.speak(&line);
            }
            self.timers
                .schedule(AssemblyStep::Settle, self.settings.settle_delay(), now);
            PlaceOutcome::Correct
        } else {
            self.pieces[piece].wrong = true;
            self.ctx.effects.wrong();
            self.hooks.on_wrong_mark(piece, true);
            self.hooks.on_select(None);
            if let Some(pending) = self.wrong_clears[piece].take() {
                self.timers.cancel(pending);
            }
            self.wrong_clears[piece] = Some(self.timers.schedule(
                AssemblyStep::ClearWrong { piece },
                self.settings.wrong_mark(),
                now,
            ));
            PlaceOutcome::Wrong
        }
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

    /// Stop the clock, cancel pending steps and release the latch. Idempotent.
    pub fn cleanup(&mut self) {
        self.timers.cancel_all();
        self.tick = None;
        self.wrong_clears.fill(None);
        self.transitioning = false;
    }

    fn run(&mut self, step: AssemblyStep, at: DateTime<Utc>) {
        match step {
            AssemblyStep::Announce => {
                let line = self.ctx.phrases.puzzle_intro(self.subject.display_name());
                self.ctx.narrator.speak(&line);
            }
            AssemblyStep::Settle => {
                self.transitioning = false;
                if self.placed == self.pieces.len() {
                    self.finalize(at);
                }
            }
            AssemblyStep::ClearWrong { piece } => {
                if let Some(slot) = self.wrong_clears.get_mut(piece) {
                    *slot = None;
                }
                if let Some(p) = self.pieces.get_mut(piece) {
                    if p.wrong {
                        p.wrong = false;
                        self.hooks.on_wrong_mark(piece, false);
                    }
                }
            }
            AssemblyStep::Tick => {
                if self.finished {
                    return;
                }
                self.hooks.on_tick(elapsed_secs(self.started_at, at));
                self.tick = Some(
                    self.timers
                        .schedule(AssemblyStep::Tick, self.settings.tick(), at),
                );
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
            size: u32::try_from(self.pieces.len()).unwrap_or(u32::MAX),
            moves: self.moves,
            elapsed_secs: elapsed_secs(self.started_at, at),
        };
        log::info!(
            "puzzle finished: {} pieces in {} moves, {}s",
            report.size,
            report.moves,
            report.elapsed_secs
        );
        self.hooks.on_finalize(&report);

        let mut lines = vec![
            self.ctx.phrases.puzzle_done.clone(),
            self.subject.display_name().to_owned(),
        ];
        lines.extend(self.subject.fun_fact().map(str::to_owned));
        self.ctx
            .narrator
            .speak_sequence(lines, Some(self.settings.completion_pause()));
        self.ctx.effects.celebrate();
        self.report = Some(report);
    }
}

/// Quarter, half and three-quarter marks, by exact integer ratio.
fn is_milestone(placed: usize, total: usize) -> bool {
    (1..4).any(|k| placed * 4 == total * k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, RecordedEvent, vehicle_catalog};
    use chrono::Duration;
    use gefen_core::model::Phrasebook;
    use gefen_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ms(v: i64) -> Duration {
        Duration::milliseconds(v)
    }

    fn start(h: &Harness, settings: AssemblySettings) -> AssemblySession {
        let subject = vehicle_catalog().items()[0].clone();
        let mut rng = StdRng::seed_from_u64(8);
        AssemblySession::start(subject, settings, h.ctx(), h.assembly_hooks(), &mut rng, fixed_now())
            .unwrap()
    }

    fn home_of(session: &AssemblySession, piece: usize) -> usize {
        let p = session.pieces()[piece];
        session
            .cells()
            .iter()
            .position(|c| c.row == p.row && c.col == p.col)
            .unwrap()
    }

    fn wrong_cell(session: &AssemblySession, piece: usize) -> usize {
        let home = home_of(session, piece);
        (0..session.cells().len())
            .find(|&c| c != home && !session.cells()[c].filled)
            .unwrap()
    }

    #[test]
    fn milestones_use_exact_ratio() {
        assert!(is_milestone(1, 4));
        assert!(is_milestone(2, 4));
        assert!(is_milestone(3, 4));
        assert!(!is_milestone(4, 4));
        assert!(is_milestone(3, 6) && !is_milestone(2, 6));
        assert!(!is_milestone(1, 3));
    }

    #[test]
    fn intro_is_spoken_after_delay() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        let now = fixed_now();
        session.poll(now + ms(299));
        assert!(h.spoken().texts().is_empty());
        session.poll(now + ms(300));
        let expected = Phrasebook::default().puzzle_intro(session.subject().display_name());
        assert_eq!(h.spoken().texts(), vec![expected]);
    }

    #[test]
    fn wrong_place_counts_a_move_and_clears_mark() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        let now = fixed_now();
        assert!(session.select(0));
        let cell = wrong_cell(&session, 0);
        assert_eq!(session.place(cell, now), PlaceOutcome::Wrong);
        assert_eq!(session.moves(), 1);
        assert_eq!(session.placed_count(), 0);
        assert!(session.pieces()[0].wrong);
        assert_eq!(session.selected(), None);

        session.poll(now + ms(500));
        assert!(!session.pieces()[0].wrong);
        assert!(session.select(0));
    }

    #[test]
    fn repeated_wrong_place_restarts_the_mark() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        let now = fixed_now();
        let cell = wrong_cell(&session, 0);
        session.select(0);
        assert_eq!(session.place(cell, now), PlaceOutcome::Wrong);
        session.select(0);
        assert_eq!(session.place(cell, now + ms(300)), PlaceOutcome::Wrong);

        session.poll(now + ms(500));
        assert!(session.pieces()[0].wrong);
        session.poll(now + ms(799));
        assert!(session.pieces()[0].wrong);
        session.poll(now + ms(800));
        assert!(!session.pieces()[0].wrong);
        let clears = h
            .events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::WrongMark(0, false)))
            .count();
        assert_eq!(clears, 1);
    }

    #[test]
    fn selecting_twice_deselects() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        assert!(session.select(1));
        assert!(session.select(1));
        assert_eq!(session.selected(), None);
        assert_eq!(session.place(0, fixed_now()), PlaceOutcome::Ignored);
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn input_is_latched_while_settling() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        let now = fixed_now();
        session.select(0);
        let home = home_of(&session, 0);
        assert_eq!(session.place(home, now), PlaceOutcome::Correct);
        assert!(!session.select(1));
        session.poll(now + ms(400));
        assert!(session.select(1));
        // placed piece cannot be picked again
        assert!(!session.select(0));
    }

    #[test]
    fn full_board_finalizes_once_with_milestones() {
        let h = Harness::new();
        let mut session = start(&h, AssemblySettings::default());
        let mut now = fixed_now() + ms(1_000);
        session.poll(now);
        for piece in 0..4 {
            assert!(session.select(piece));
            let home = home_of(&session, piece);
            assert_eq!(session.place(home, now), PlaceOutcome::Correct);
            now += ms(400);
            session.poll(now);
        }
        assert_eq!(session.placed_count(), 4);
        assert!(session.is_finished());
        let report = session.take_report().unwrap();
        assert_eq!((report.size, report.moves), (4, 4));
        assert!(session.take_report().is_none());

        let phrases = Phrasebook::default();
        let texts = h.spoken().texts();
        for k in 1..=3 {
            assert!(texts.contains(&phrases.progress(k, 4)));
        }
        assert!(!texts.contains(&phrases.progress(4, 4)));
        assert_eq!(texts.last().unwrap(), &phrases.puzzle_done);
        let finals = h
            .events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::BestFinalize(_)))
            .count();
        assert_eq!(finals, 1);
    }

    #[test]
    fn cleanup_stops_pending_finalize() {
        let h = Harness::new();
        let settings = AssemblySettings::default().with_grid(1, 1);
        let mut session = start(&h, settings);
        let now = fixed_now();
        session.select(0);
        assert_eq!(session.place(0, now), PlaceOutcome::Correct);
        session.cleanup();
        session.poll(now + ms(10_000));
        assert!(!session.is_finished());
        assert!(!session.is_transitioning());
    }
}
