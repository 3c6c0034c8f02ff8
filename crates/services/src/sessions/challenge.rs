use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use gefen_core::TimeoutRegistry;
use gefen_core::model::{Challenge, ChallengeSettings, ContentItem, GameMode, ItemId, ScoreReport};

use crate::error::SessionError;
use super::hooks::{ChallengeHooks, Presented, SessionContext};
use super::plan::DistractorPicker;

/// State of one option on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Open,
    /// Just picked and wrong; becomes `Disabled` after the disable delay.
    Wrong,
    Disabled,
    Correct,
    /// The answer, shown after the tries ran out.
    Revealed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSlot {
    pub item: ContentItem,
    pub state: OptionState,
}

/// What happened to one submitted response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Dropped: transitioning, finished, unknown option or already resolved.
    Ignored,
    Correct { first_try: bool },
    Wrong { attempts: u32, revealing: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChallengeStep {
    Prompt { index: usize },
    Disable { index: usize, option: ItemId, attempt: u32 },
    Advance { index: usize },
}

/// One run of a gated-response mode: picture quiz, listening quiz or
/// odd-one-out.
///
/// Every question can be scored at most once and only when answered right
/// on the first try. While a question is transitioning (settling after a
/// correct answer, or out of tries) all further responses are dropped.
pub struct ChallengeSession {
    mode: GameMode,
    settings: ChallengeSettings,
    challenges: Vec<Challenge>,
    picker: DistractorPicker,
    rng: StdRng,
    current: usize,
    score: u32,
    wrong_attempts: u32,
    transitioning: bool,
    stars: Vec<bool>,
    options: Vec<OptionSlot>,
    timers: TimeoutRegistry<ChallengeStep>,
    ctx: SessionContext,
    hooks: Box<dyn ChallengeHooks>,
    report: Option<ScoreReport>,
    finished: bool,
}

impl ChallengeSession {
    /// Start a run and present the first question.
    ///
    /// `pool` is where distractors are drawn from for challenges without a
    /// fixed line-up.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when there are no challenges,
    /// `SessionError::InsufficientContent` when the pool cannot fill a
    /// question's options, and `SessionError::InvalidChallenge` for a fixed
    /// line-up that misses its answer or repeats an option.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        mode: GameMode,
        challenges: Vec<Challenge>,
        pool: Vec<ContentItem>,
        settings: ChallengeSettings,
        ctx: SessionContext,
        hooks: Box<dyn ChallengeHooks>,
        rng: StdRng,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let settings = settings.validate()?;
        if challenges.is_empty() {
            return Err(SessionError::Empty);
        }

        let picker = DistractorPicker::new(pool, settings.distractors);
        for (index, challenge) in challenges.iter().enumerate() {
            check_challenge(challenge, index, &settings, &picker)?;
        }

        let total = challenges.len();
        let mut session = Self {
            mode,
            settings,
            challenges,
            picker,
            rng,
            current: 0,
            score: 0,
            wrong_attempts: 0,
            transitioning: false,
            stars: vec![false; total],
            options: Vec::new(),
            timers: TimeoutRegistry::new(),
            ctx,
            hooks,
            report: None,
            finished: false,
        };
        log::info!("{mode} started with {total} questions");
        session.present(now);
        Ok(session)
    }

    #[must_use]
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.challenges.len()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn wrong_attempts(&self) -> u32 {
        self.wrong_attempts
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
    pub fn stars(&self) -> &[bool] {
        &self.stars
    }

    #[must_use]
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.challenges.get(self.current)
    }

    #[must_use]
    pub fn options(&self) -> &[OptionSlot] {
        &self.options
    }

    /// The final score, handed out exactly once after the run ends.
    pub fn take_report(&mut self) -> Option<ScoreReport> {
        self.report.take()
    }

    /// Evaluate the player's pick for the current question.
    pub fn submit_response(&mut self, candidate: &ItemId, now: DateTime<Utc>) -> ResponseOutcome {
        if self.finished || self.transitioning {
            log::debug!("response {candidate} dropped while transitioning");
            return ResponseOutcome::Ignored;
        }
        let Some(slot) = self.options.iter().position(|o| o.item.id() == candidate) else {
            return ResponseOutcome::Ignored;
        };
        if self.options[slot].state != OptionState::Open {
            return ResponseOutcome::Ignored;
        }
        let Some(challenge) = self.challenges.get(self.current) else {
            return ResponseOutcome::Ignored;
        };

        if challenge.answer_id() == candidate {
            self.transitioning = true;
            self.options[slot].state = OptionState::Correct;
            self.ctx.effects.correct();

            let first_try = self.wrong_attempts == 0;
            if first_try {
                self.score += 1;
                self.stars[self.current] = true;
                self.hooks.on_star_earned(self.current);
            }
            self.hooks.on_response_result(candidate, true, None);
            self.ctx
                .narrator
                .narrate(challenge.praise(), self.settings.narration_pause());
            self.timers.schedule(
                ChallengeStep::Advance {
                    index: self.current,
                },
                self.settings.settle_delay(),
                now,
            );
            ResponseOutcome::Correct { first_try }
        } else {
            self.options[slot].state = OptionState::Wrong;
            self.wrong_attempts += 1;
            self.ctx.effects.wrong();

            // Out of tries: block input now, the reveal follows the disable.
            let revealing = self.wrong_attempts >= self.settings.reveal_threshold;
            if revealing {
                self.transitioning = true;
            }
            let answer = challenge.answer_id().clone();
            self.hooks
                .on_response_result(candidate, false, revealing.then_some(&answer));
            self.ctx.narrator.speak(&self.ctx.phrases.try_again);
            self.timers.schedule(
                ChallengeStep::Disable {
                    index: self.current,
                    option: candidate.clone(),
                    attempt: self.wrong_attempts,
                },
                self.settings.disable_delay(),
                now,
            );
            ResponseOutcome::Wrong {
                attempts: self.wrong_attempts,
                revealing,
            }
        }
    }

    /// Speak the current prompt again. Ignored while transitioning.
    pub fn replay_prompt(&mut self) {
        if self.finished || self.transitioning {
            return;
        }
        if let Some(challenge) = self.challenges.get(self.current) {
            let prompt = challenge
                .prompt()
                .unwrap_or_else(|| challenge.answer().audio_prompt());
            self.ctx.narrator.speak(prompt);
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

    /// Cancel all pending steps and release the transition latch. Idempotent.
    pub fn cleanup(&mut self) {
        let dropped = self.timers.cancel_all();
        if dropped > 0 {
            log::debug!("{} cleanup dropped {dropped} pending steps", self.mode);
        }
        self.transitioning = false;
    }

    fn run(&mut self, step: ChallengeStep, at: DateTime<Utc>) {
        match step {
            ChallengeStep::Prompt { index } => {
                if index == self.current && !self.finished {
                    if let Some(prompt) = self.challenges[index].prompt() {
                        self.ctx.narrator.speak(prompt);
                    }
                }
            }
            ChallengeStep::Disable {
                index,
                option,
                attempt,
            } => {
                if index != self.current || self.finished {
                    return;
                }
                self.disable_option(&option);
                if attempt == self.settings.reveal_threshold {
                    self.reveal(index, at);
                } else if self.settings.hint_threshold == Some(attempt) {
                    if let Some(hint) = self.challenges[index].hint() {
                        self.hooks.on_hint(hint);
                    }
                }
            }
            ChallengeStep::Advance { index } => {
                if index != self.current || self.finished {
                    return;
                }
                self.current += 1;
                self.present(at);
            }
        }
    }

    fn disable_option(&mut self, option: &ItemId) {
        if let Some(slot) = self.options.iter_mut().find(|o| o.item.id() == option) {
            if slot.state == OptionState::Wrong {
                slot.state = OptionState::Disabled;
                self.hooks.on_option_disabled(option);
            }
        }
    }

    fn reveal(&mut self, index: usize, at: DateTime<Utc>) {
        let challenge = &self.challenges[index];
        if let Some(slot) = self
            .options
            .iter_mut()
            .find(|o| o.item.id() == challenge.answer_id())
        {
            slot.state = OptionState::Revealed;
        }
        self.hooks.on_reveal(challenge.answer_id());
        self.ctx
            .narrator
            .narrate(challenge.reveal(), self.settings.narration_pause());
        self.timers.schedule(
            ChallengeStep::Advance { index },
            self.settings.reveal_delay(),
            at,
        );
    }

    fn present(&mut self, now: DateTime<Utc>) {
        if self.current >= self.challenges.len() {
            self.finalize();
            return;
        }
        let index = self.current;
        self.wrong_attempts = 0;
        self.transitioning = false;
        self.options = self.line_up(index);

        let challenge = &self.challenges[index];
        let total = self.challenges.len();
        self.hooks.on_progress(index + 1, total);
        self.hooks.on_present(&Presented {
            index,
            total,
            challenge,
            options: &self.options,
        });

        if challenge.prompt().is_some() {
            match self.settings.prompt_delay() {
                Some(delay) => {
                    self.timers
                        .schedule(ChallengeStep::Prompt { index }, delay, now);
                }
                None => self.run(ChallengeStep::Prompt { index }, now),
            }
        }
    }

    fn line_up(&mut self, index: usize) -> Vec<OptionSlot> {
        let challenge = &self.challenges[index];
        let mut items = match challenge.fixed_options() {
            Some(fixed) => fixed.to_vec(),
            None => {
                let wanted = self.settings.options.count_for(index).saturating_sub(1);
                let mut drawn =
                    self.picker
                        .draw(challenge.answer(), wanted, index, &mut self.rng);
                drawn.push(challenge.answer().clone());
                drawn
            }
        };
        items.shuffle(&mut self.rng);
        items
            .into_iter()
            .map(|item| OptionSlot {
                item,
                state: OptionState::Open,
            })
            .collect()
    }

    fn finalize(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.transitioning = false;

        let total = u32::try_from(self.challenges.len()).unwrap_or(u32::MAX);
        let report = match ScoreReport::new(self.mode, self.score, total) {
            Ok(report) => report,
            Err(err) => {
                log::error!("{} produced an impossible score: {err}", self.mode);
                return;
            }
        };
        log::info!("{} finished: {}/{}", self.mode, report.score, report.total);

        self.hooks.on_finalize(report.score, report.total, report.tier());
        let line = self.ctx.phrases.finish_line(self.mode, report.is_perfect());
        self.ctx.narrator.speak(&line);
        if report.is_perfect() {
            self.ctx.effects.celebrate();
        }
        self.report = Some(report);
    }
}

fn check_challenge(
    challenge: &Challenge,
    index: usize,
    settings: &ChallengeSettings,
    picker: &DistractorPicker,
) -> Result<(), SessionError> {
    match challenge.fixed_options() {
        Some(fixed) => {
            let mut ids = HashSet::new();
            if !fixed.iter().all(|o| ids.insert(o.id())) {
                return Err(SessionError::InvalidChallenge(format!(
                    "question {index} repeats an option"
                )));
            }
            if !ids.contains(challenge.answer_id()) {
                return Err(SessionError::InvalidChallenge(format!(
                    "question {index} does not offer its answer"
                )));
            }
            if fixed.len() < 2 {
                return Err(SessionError::InsufficientContent {
                    needed: 2,
                    available: fixed.len(),
                });
            }
        }
        None => {
            let needed = settings.options.count_for(index).saturating_sub(1);
            let available = picker.available_for(challenge.answer());
            if available < needed {
                return Err(SessionError::InsufficientContent { needed, available });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, RecordedEvent, vehicle_catalog};
    use chrono::Duration;
    use gefen_core::model::{Catalog, Phrasebook, ResultTier};
    use gefen_core::time::fixed_now;
    use rand::SeedableRng;

    fn ms(v: i64) -> Duration {
        Duration::milliseconds(v)
    }

    fn identify_all(catalog: &Catalog, count: usize) -> Vec<Challenge> {
        let phrases = Phrasebook::default();
        catalog
            .items()
            .iter()
            .take(count)
            .cloned()
            .map(|item| Challenge::identify(item, &phrases))
            .collect()
    }

    fn start_quiz(h: &Harness, count: usize) -> ChallengeSession {
        let catalog = vehicle_catalog();
        ChallengeSession::start(
            GameMode::Quiz,
            identify_all(&catalog, count),
            catalog.items().to_vec(),
            ChallengeSettings::quiz(),
            h.ctx(),
            h.challenge_hooks(),
            StdRng::seed_from_u64(5),
            fixed_now(),
        )
        .unwrap()
    }

    fn answer(session: &ChallengeSession) -> ItemId {
        session.current_challenge().unwrap().answer_id().clone()
    }

    fn wrong(session: &ChallengeSession) -> ItemId {
        let answer = answer(session);
        session
            .options()
            .iter()
            .find(|o| o.item.id() != &answer && o.state == OptionState::Open)
            .map(|o| o.item.id().clone())
            .unwrap()
    }

    #[test]
    fn empty_challenge_list_is_rejected() {
        let h = Harness::new();
        let err = ChallengeSession::start(
            GameMode::Quiz,
            Vec::new(),
            vehicle_catalog().items().to_vec(),
            ChallengeSettings::quiz(),
            h.ctx(),
            h.challenge_hooks(),
            StdRng::seed_from_u64(0),
            fixed_now(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn small_pool_is_rejected_up_front() {
        let h = Harness::new();
        let catalog = vehicle_catalog();
        let err = ChallengeSession::start(
            GameMode::Quiz,
            identify_all(&catalog, 1),
            catalog.items()[..2].to_vec(),
            ChallengeSettings::quiz(),
            h.ctx(),
            h.challenge_hooks(),
            StdRng::seed_from_u64(0),
            fixed_now(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            SessionError::InsufficientContent {
                needed: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn option_count_follows_schedule() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 6);
        let now = fixed_now();
        for expected in [3, 3, 3, 3, 3, 4] {
            assert_eq!(session.options().len(), expected);
            let answer = answer(&session);
            assert!(session.options().iter().any(|o| o.item.id() == &answer));
            session.submit_response(&answer, now);
            session.cleanup();
            session.run(
                ChallengeStep::Advance {
                    index: session.current_index(),
                },
                now,
            );
        }
        assert!(session.is_finished());
    }

    #[test]
    fn first_try_correct_scores_once_and_advances_after_settle() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 2);
        let now = fixed_now();
        let answer = answer(&session);

        let outcome = session.submit_response(&answer, now);
        assert_eq!(outcome, ResponseOutcome::Correct { first_try: true });
        assert_eq!(session.score(), 1);
        assert_eq!(session.stars(), [true, false]);

        // duplicate taps during the settle window are dropped
        assert_eq!(session.submit_response(&answer, now), ResponseOutcome::Ignored);
        assert_eq!(session.score(), 1);

        session.poll(now + ms(1_499));
        assert_eq!(session.current_index(), 0);
        session.poll(now + ms(1_500));
        assert_eq!(session.current_index(), 1);
        assert!(!session.is_transitioning());
        assert!(h.spoken().texts()[0].starts_with(&Phrasebook::default().praise));
    }

    #[test]
    fn correct_after_wrong_does_not_score() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 1);
        let now = fixed_now();
        let wrong = wrong(&session);
        let answer = answer(&session);

        assert_eq!(
            session.submit_response(&wrong, now),
            ResponseOutcome::Wrong {
                attempts: 1,
                revealing: false
            }
        );
        assert_eq!(
            session.submit_response(&answer, now + ms(100)),
            ResponseOutcome::Correct { first_try: false }
        );
        assert_eq!(session.score(), 0);
        session.poll(now + ms(5_000));
        assert!(session.is_finished());
        let report = session.take_report().unwrap();
        assert_eq!((report.score, report.total), (0, 1));
        assert_eq!(report.tier(), ResultTier::KeepTrying);
        assert!(session.take_report().is_none());
    }

    #[test]
    fn two_wrong_reveal_once_then_advance_once() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 3);
        let now = fixed_now();
        let first = wrong(&session);
        session.submit_response(&first, now);
        let second = wrong(&session);
        let outcome = session.submit_response(&second, now + ms(100));
        assert_eq!(
            outcome,
            ResponseOutcome::Wrong {
                attempts: 2,
                revealing: true
            }
        );
        assert!(session.is_transitioning());

        // third tap is blocked by the latch
        let answer = answer(&session);
        assert_eq!(session.submit_response(&answer, now + ms(150)), ResponseOutcome::Ignored);

        session.poll(now + ms(600));
        assert!(h.events().iter().all(|e| !matches!(e, RecordedEvent::Reveal(_))));
        session.poll(now + ms(700));
        let reveals = h
            .events()
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Reveal(_)))
            .count();
        assert_eq!(reveals, 1);

        session.poll(now + ms(2_699));
        assert_eq!(session.current_index(), 0);
        session.poll(now + ms(2_700));
        assert_eq!(session.current_index(), 1);
        session.poll(now + ms(60_000));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn reveal_on_last_question_reports_once() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 2);
        let now = fixed_now();

        let first = answer(&session);
        session.submit_response(&first, now);
        session.poll(now + ms(1_500));
        assert_eq!(session.current_index(), 1);

        let a = wrong(&session);
        session.submit_response(&a, now + ms(2_000));
        let b = wrong(&session);
        assert_eq!(
            session.submit_response(&b, now + ms(2_100)),
            ResponseOutcome::Wrong {
                attempts: 2,
                revealing: true
            }
        );
        session.poll(now + ms(4_699));
        assert!(!session.is_finished());
        session.poll(now + ms(4_700));
        assert!(session.is_finished());
        assert_eq!(session.current_index(), 2);

        let report = session.take_report().unwrap();
        assert_eq!((report.score, report.total), (1, 2));
        assert!(session.take_report().is_none());
        session.poll(now + ms(60_000));
        let finals: Vec<_> = h
            .events()
            .into_iter()
            .filter(|e| matches!(e, RecordedEvent::Finalize(..)))
            .collect();
        assert_eq!(finals, vec![RecordedEvent::Finalize(1, 2, ResultTier::Good)]);
        assert!(!h.sounds().contains(&"celebrate"));
    }

    #[test]
    fn other_tap_during_settle_changes_nothing() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 2);
        let now = fixed_now();
        let answer = answer(&session);
        let other = wrong(&session);
        session.submit_response(&answer, now);

        let states: Vec<OptionState> = session.options().iter().map(|o| o.state).collect();
        let pending = session.timers.len();
        let due = session.next_due();

        assert_eq!(session.submit_response(&other, now + ms(200)), ResponseOutcome::Ignored);
        assert_eq!(session.score(), 1);
        assert_eq!(session.wrong_attempts(), 0);
        let after: Vec<OptionState> = session.options().iter().map(|o| o.state).collect();
        assert_eq!(after, states);
        assert_eq!(session.timers.len(), pending);
        assert_eq!(session.next_due(), due);

        session.poll(now + ms(1_500));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn resolved_option_ignores_repeat_taps() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 1);
        let now = fixed_now();
        let wrong = wrong(&session);
        session.submit_response(&wrong, now);
        assert_eq!(session.submit_response(&wrong, now + ms(10)), ResponseOutcome::Ignored);
        session.poll(now + ms(600));
        assert_eq!(session.submit_response(&wrong, now + ms(700)), ResponseOutcome::Ignored);
        assert_eq!(session.wrong_attempts(), 1);
        let state = session
            .options()
            .iter()
            .find(|o| o.item.id() == &wrong)
            .unwrap()
            .state;
        assert_eq!(state, OptionState::Disabled);
    }

    #[test]
    fn cleanup_cancels_pending_advance() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 2);
        let now = fixed_now();
        let answer = answer(&session);
        session.submit_response(&answer, now);
        session.cleanup();
        session.cleanup();
        session.poll(now + ms(60_000));
        assert_eq!(session.current_index(), 0);
        assert!(!session.is_transitioning());
    }

    #[test]
    fn perfect_run_celebrates_and_reports() {
        let h = Harness::new();
        let mut session = start_quiz(&h, 3);
        let mut now = fixed_now();
        while !session.is_finished() {
            let answer = answer(&session);
            session.submit_response(&answer, now);
            now += ms(1_500);
            session.poll(now);
        }
        let report = session.take_report().unwrap();
        assert!(report.is_perfect());
        assert!(h.sounds().contains(&"celebrate"));
        assert!(h.events().contains(&RecordedEvent::Finalize(3, 3, ResultTier::Perfect)));
        let last = h.spoken().texts().pop().unwrap();
        assert_eq!(last, Phrasebook::default().finish_line(GameMode::Quiz, true));
    }

    #[test]
    fn odd_one_out_hints_then_reveals_on_third_wrong() {
        let h = Harness::new();
        let catalog = vehicle_catalog();
        let phrases = Phrasebook::default();
        let mut rng = StdRng::seed_from_u64(2);
        let rounds = super::super::plan::plan_odd_rounds(&catalog, 2, &mut rng);
        let challenges = rounds
            .into_iter()
            .map(|r| Challenge::odd_one_out(r, &catalog, &phrases))
            .collect();
        let mut session = ChallengeSession::start(
            GameMode::OddOneOut,
            challenges,
            Vec::new(),
            ChallengeSettings::odd_one_out(),
            h.ctx(),
            h.challenge_hooks(),
            rng,
            fixed_now(),
        )
        .unwrap();
        let now = fixed_now();
        assert_eq!(session.options().len(), 4);

        session.poll(now + ms(300));
        assert_eq!(h.spoken().texts(), vec![phrases.who_doesnt_belong.clone()]);

        let a = wrong(&session);
        session.submit_response(&a, now + ms(1_000));
        let b = wrong(&session);
        session.submit_response(&b, now + ms(2_000));
        session.poll(now + ms(2_600));
        assert!(h.events().iter().any(|e| matches!(e, RecordedEvent::Hint(_))));

        let c = wrong(&session);
        assert_eq!(
            session.submit_response(&c, now + ms(3_000)),
            ResponseOutcome::Wrong {
                attempts: 3,
                revealing: true
            }
        );
        session.poll(now + ms(3_600));
        assert!(h.events().iter().any(|e| matches!(e, RecordedEvent::Reveal(_))));
        session.poll(now + ms(7_599));
        assert_eq!(session.current_index(), 0);
        session.poll(now + ms(7_600));
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn replay_prompt_is_ignored_while_transitioning() {
        let h = Harness::new();
        let catalog = vehicle_catalog();
        let phrases = Phrasebook::default();
        let challenges = catalog
            .items()
            .iter()
            .take(2)
            .cloned()
            .map(|item| Challenge::listen(item, &phrases))
            .collect();
        let mut session = ChallengeSession::start(
            GameMode::SoundQuiz,
            challenges,
            catalog.items().to_vec(),
            ChallengeSettings::sound_quiz(),
            h.ctx(),
            h.challenge_hooks(),
            StdRng::seed_from_u64(9),
            fixed_now(),
        )
        .unwrap();
        let now = fixed_now();
        session.poll(now + ms(400));
        let prompt = session.current_challenge().unwrap().prompt().unwrap().to_owned();
        assert_eq!(h.spoken().texts(), vec![prompt.clone()]);

        session.replay_prompt();
        assert_eq!(h.spoken().texts().len(), 2);

        let answer = answer(&session);
        session.submit_response(&answer, now + ms(500));
        let spoken = h.spoken().texts().len();
        session.replay_prompt();
        assert_eq!(h.spoken().texts().len(), spoken);
    }
}
