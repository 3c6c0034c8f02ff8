use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use chrono::Duration;

/// Identifies one playback request.
///
/// `generation` changes every time the scheduler starts a new sequence, so a
/// completion that arrives after a `stop` carries a stale generation and is
/// dropped instead of advancing whatever plays now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackTicket {
    generation: u64,
    segment: usize,
}

impl PlaybackTicket {
    pub(crate) fn new(generation: u64, segment: usize) -> Self {
        Self {
            generation,
            segment,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn segment(&self) -> usize {
        self.segment
    }
}

impl fmt::Display for PlaybackTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.generation, self.segment)
    }
}

/// How a playback request ended. Failures count as done for sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    RemoteFallback,
}

/// What a backend needs after one of its playbacks ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStep {
    /// The segment is fully spoken.
    Done,
    /// More audio is queued for this segment; call `resume` after the gap.
    ResumeAfter(Duration),
}

/// A way of turning text into speech.
///
/// Backends only start playback. Completion is reported asynchronously by
/// the platform through a [`PlaybackInbox`] and routed back by the scheduler.
pub trait VoiceBackend {
    fn kind(&self) -> BackendKind;

    /// Start speaking `text`. Any previous playback has already been silenced.
    fn play(&mut self, text: &str, ticket: PlaybackTicket);

    /// A playback started for `ticket` has ended.
    fn playback_ended(&mut self, ticket: PlaybackTicket, outcome: PlaybackOutcome) -> BackendStep;

    /// Continue a segment after a [`BackendStep::ResumeAfter`] gap.
    fn resume(&mut self, ticket: PlaybackTicket);

    /// Stop any active playback and forget queued audio.
    fn silence(&mut self);
}

/// Queue through which platform adapters report playback completion.
///
/// Adapters hold a clone and push from their own callbacks; the scheduler
/// drains it on every poll. Pushing never touches the scheduler, so an
/// adapter may report completion from inside `play` without re-entering it.
#[derive(Clone, Default)]
pub struct PlaybackInbox {
    events: Rc<RefCell<VecDeque<(PlaybackTicket, PlaybackOutcome)>>>,
}

impl PlaybackInbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, ticket: PlaybackTicket, outcome: PlaybackOutcome) {
        self.events.borrow_mut().push_back((ticket, outcome));
    }

    pub(crate) fn drain(&self) -> Vec<(PlaybackTicket, PlaybackOutcome)> {
        self.events.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl fmt::Debug for PlaybackInbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackInbox")
            .field("pending", &self.events.borrow().len())
            .finish()
    }
}
