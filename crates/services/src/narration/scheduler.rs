use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use gefen_core::TimeoutRegistry;
use gefen_core::model::NarrationSettings;

use super::backend::{
    BackendKind, BackendStep, PlaybackInbox, PlaybackOutcome, PlaybackTicket, VoiceBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NarrationStep {
    NextSegment { generation: u64 },
    ResumeBackend { ticket: PlaybackTicket },
}

#[derive(Debug)]
struct ActiveSequence {
    generation: u64,
    segments: Vec<String>,
    next: usize,
    pause: Duration,
    playing: Option<PlaybackTicket>,
}

/// Plays one utterance or an ordered sequence, one segment at a time.
///
/// Every `speak`/`speak_sequence` first stops whatever was playing, so a new
/// request always pre-empts. Pauses between segments live in the scheduler's
/// own registry and die with `stop`.
pub struct NarrationScheduler {
    backend: Box<dyn VoiceBackend>,
    default_pause: Duration,
    generation: u64,
    active: Option<ActiveSequence>,
    timers: TimeoutRegistry<NarrationStep>,
    inbox: PlaybackInbox,
}

impl NarrationScheduler {
    /// `inbox` must be the one the backend's platform adapter reports into.
    #[must_use]
    pub fn new(
        backend: Box<dyn VoiceBackend>,
        settings: &NarrationSettings,
        inbox: PlaybackInbox,
    ) -> Self {
        Self {
            backend,
            default_pause: settings.default_pause(),
            generation: 0,
            active: None,
            timers: TimeoutRegistry::new(),
            inbox,
        }
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// True from the start of a sequence until its last segment ends or it is stopped.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn inbox(&self) -> &PlaybackInbox {
        &self.inbox
    }

    /// Speak one utterance. Blank text is ignored and does not interrupt.
    pub fn speak(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.stop();
        self.begin(vec![text.to_owned()], self.default_pause);
    }

    /// Speak `segments` in order with `pause` (or the default pause) between them.
    ///
    /// An empty list is ignored. Blank segments are skipped.
    pub fn speak_sequence<I, S>(&mut self, segments: I, pause: Option<Duration>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return;
        }
        self.stop();
        let segments: Vec<String> = segments
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if segments.is_empty() {
            return;
        }
        self.begin(segments, pause.unwrap_or(self.default_pause));
    }

    /// Cancel pending segments and silence the backend. Idempotent.
    pub fn stop(&mut self) {
        self.active = None;
        self.timers.cancel_all();
        self.backend.silence();
    }

    /// Route a completion reported by the platform.
    ///
    /// Completions for anything but the segment playing right now are stale
    /// and ignored.
    pub fn playback_finished(
        &mut self,
        ticket: PlaybackTicket,
        outcome: PlaybackOutcome,
        now: DateTime<Utc>,
    ) {
        let playing = self.active.as_ref().and_then(|seq| seq.playing);
        if playing != Some(ticket) {
            log::debug!("ignoring stale playback completion {ticket}");
            return;
        }

        match self.backend.playback_ended(ticket, outcome) {
            BackendStep::ResumeAfter(gap) => {
                self.timers
                    .schedule(NarrationStep::ResumeBackend { ticket }, gap, now);
            }
            BackendStep::Done => {
                let Some(seq) = self.active.as_mut() else {
                    return;
                };
                seq.playing = None;
                if seq.next >= seq.segments.len() {
                    self.active = None;
                } else {
                    let step = NarrationStep::NextSegment {
                        generation: seq.generation,
                    };
                    let pause = seq.pause;
                    self.timers.schedule(step, pause, now);
                }
            }
        }
    }

    /// Drain reported completions and run every pause that has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) {
        loop {
            let events = self.inbox.drain();
            let mut progressed = !events.is_empty();
            for (ticket, outcome) in events {
                self.playback_finished(ticket, outcome, now);
            }
            while let Some(fired) = self.timers.pop_due(now) {
                progressed = true;
                self.dispatch(fired.action);
            }
            if !progressed {
                break;
            }
        }
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.timers.next_due()
    }

    fn dispatch(&mut self, step: NarrationStep) {
        match step {
            NarrationStep::NextSegment { generation } => {
                let current = self
                    .active
                    .as_ref()
                    .is_some_and(|seq| seq.generation == generation && seq.playing.is_none());
                if current {
                    self.play_next();
                }
            }
            NarrationStep::ResumeBackend { ticket } => {
                let playing = self.active.as_ref().and_then(|seq| seq.playing);
                if playing == Some(ticket) {
                    self.backend.resume(ticket);
                }
            }
        }
    }

    fn begin(&mut self, segments: Vec<String>, pause: Duration) {
        self.generation += 1;
        self.active = Some(ActiveSequence {
            generation: self.generation,
            segments,
            next: 0,
            pause,
            playing: None,
        });
        self.play_next();
    }

    fn play_next(&mut self) {
        let Some(seq) = self.active.as_mut() else {
            return;
        };
        let Some(text) = seq.segments.get(seq.next) else {
            self.active = None;
            return;
        };
        let ticket = PlaybackTicket::new(seq.generation, seq.next);
        seq.playing = Some(ticket);
        seq.next += 1;
        self.backend.play(text, ticket);
    }
}

impl fmt::Debug for NarrationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrationScheduler")
            .field("backend", &self.backend.kind())
            .field("generation", &self.generation)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Shared handle to the one narration scheduler of the shell.
///
/// Sessions, tours and the game loop all speak through clones of this.
#[derive(Clone, Debug)]
pub struct Narrator {
    inner: Rc<RefCell<NarrationScheduler>>,
}

impl Narrator {
    #[must_use]
    pub fn new(scheduler: NarrationScheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(scheduler)),
        }
    }

    pub fn speak(&self, text: &str) {
        self.inner.borrow_mut().speak(text);
    }

    pub fn speak_sequence<I, S>(&self, segments: I, pause: Option<Duration>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.borrow_mut().speak_sequence(segments, pause);
    }

    /// Speak a single line directly, several with `pause` between them.
    pub fn narrate(&self, segments: &[String], pause: Duration) {
        match segments {
            [] => {}
            [only] => self.speak(only),
            _ => self.speak_sequence(segments.iter().cloned(), Some(pause)),
        }
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().stop();
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.borrow().is_speaking()
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.inner.borrow().backend_kind()
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.backend_kind() == BackendKind::RemoteFallback
    }

    #[must_use]
    pub fn inbox(&self) -> PlaybackInbox {
        self.inner.borrow().inbox().clone()
    }

    pub fn playback_finished(
        &self,
        ticket: PlaybackTicket,
        outcome: PlaybackOutcome,
        now: DateTime<Utc>,
    ) {
        self.inner
            .borrow_mut()
            .playback_finished(ticket, outcome, now);
    }

    pub fn poll(&self, now: DateTime<Utc>) {
        self.inner.borrow_mut().poll(now);
    }

    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.inner.borrow().next_due()
    }
}
