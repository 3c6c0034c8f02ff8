//! Recording doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use gefen_core::model::{BestReport, Catalog, Category, ContentItem, ItemId, ResultTier};

use crate::narration::{
    BackendKind, BackendStep, NarrationScheduler, Narrator, PlaybackInbox, PlaybackOutcome,
    PlaybackTicket, VoiceBackend,
};
use crate::sessions::{
    AssemblyHooks, ChallengeHooks, MatchHooks, SessionContext, SoundEffects,
};

#[derive(Default)]
struct SpokenLog {
    played: Vec<(String, PlaybackTicket)>,
    cancels: usize,
}

/// Everything a [`RecordingVoice`] was asked to say.
#[derive(Clone, Default)]
pub(crate) struct Spoken(Rc<RefCell<SpokenLog>>);

impl Spoken {
    pub(crate) fn texts(&self) -> Vec<String> {
        self.0.borrow().played.iter().map(|(t, _)| t.clone()).collect()
    }

    pub(crate) fn last_ticket(&self) -> Option<PlaybackTicket> {
        self.0.borrow().played.last().map(|(_, t)| *t)
    }

    pub(crate) fn cancels(&self) -> usize {
        self.0.borrow().cancels
    }

    pub(crate) fn finish_current(&self, narrator: &Narrator, now: DateTime<Utc>) {
        if let Some(ticket) = self.last_ticket() {
            narrator.playback_finished(ticket, PlaybackOutcome::Finished, now);
        }
    }

    pub(crate) fn fail_current(&self, narrator: &Narrator, now: DateTime<Utc>) {
        if let Some(ticket) = self.last_ticket() {
            narrator.playback_finished(ticket, PlaybackOutcome::Failed, now);
        }
    }
}

struct RecordingVoice(Spoken);

impl VoiceBackend for RecordingVoice {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn play(&mut self, text: &str, ticket: PlaybackTicket) {
        self.0.0.borrow_mut().played.push((text.to_owned(), ticket));
    }

    fn playback_ended(&mut self, _ticket: PlaybackTicket, _outcome: PlaybackOutcome) -> BackendStep {
        BackendStep::Done
    }

    fn resume(&mut self, _ticket: PlaybackTicket) {}

    fn silence(&mut self) {
        self.0.0.borrow_mut().cancels += 1;
    }
}

pub(crate) fn recording_narrator() -> (Narrator, Spoken) {
    let spoken = Spoken::default();
    let scheduler = NarrationScheduler::new(
        Box::new(RecordingVoice(spoken.clone())),
        &gefen_core::model::NarrationSettings::default(),
        PlaybackInbox::new(),
    );
    (Narrator::new(scheduler), spoken)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RecordedEvent {
    Present(usize),
    Response(ItemId, bool),
    Disabled(ItemId),
    Reveal(ItemId),
    Hint(String),
    Star(usize),
    Progress(usize, usize),
    Finalize(u32, u32, ResultTier),
    Flip(usize),
    PairResolved(usize, usize, bool),
    Moves(u32),
    Tick(u64),
    Placed(usize, usize),
    WrongMark(usize, bool),
    BestFinalize(BestReport),
}

type EventLog = Rc<RefCell<Vec<RecordedEvent>>>;

struct Recorder(EventLog);

impl Recorder {
    fn push(&self, event: RecordedEvent) {
        self.0.borrow_mut().push(event);
    }
}

impl ChallengeHooks for Recorder {
    fn on_present(&mut self, presented: &crate::sessions::Presented<'_>) {
        self.push(RecordedEvent::Present(presented.index));
    }

    fn on_response_result(&mut self, candidate: &ItemId, correct: bool, _reveal: Option<&ItemId>) {
        self.push(RecordedEvent::Response(candidate.clone(), correct));
    }

    fn on_option_disabled(&mut self, candidate: &ItemId) {
        self.push(RecordedEvent::Disabled(candidate.clone()));
    }

    fn on_reveal(&mut self, answer: &ItemId) {
        self.push(RecordedEvent::Reveal(answer.clone()));
    }

    fn on_hint(&mut self, hint: &str) {
        self.push(RecordedEvent::Hint(hint.to_owned()));
    }

    fn on_star_earned(&mut self, index: usize) {
        self.push(RecordedEvent::Star(index));
    }

    fn on_progress(&mut self, current: usize, total: usize) {
        self.push(RecordedEvent::Progress(current, total));
    }

    fn on_finalize(&mut self, score: u32, total: u32, tier: ResultTier) {
        self.push(RecordedEvent::Finalize(score, total, tier));
    }
}

impl MatchHooks for Recorder {
    fn on_flip(&mut self, index: usize, _card: &crate::sessions::MatchCard) {
        self.push(RecordedEvent::Flip(index));
    }

    fn on_pair_resolved(&mut self, first: usize, second: usize, matched: bool) {
        self.push(RecordedEvent::PairResolved(first, second, matched));
    }

    fn on_moves(&mut self, moves: u32) {
        self.push(RecordedEvent::Moves(moves));
    }

    fn on_tick(&mut self, elapsed_secs: u64) {
        self.push(RecordedEvent::Tick(elapsed_secs));
    }

    fn on_finalize(&mut self, report: &BestReport) {
        self.push(RecordedEvent::BestFinalize(*report));
    }
}

impl AssemblyHooks for Recorder {
    fn on_placed(&mut self, piece: usize, cell: usize) {
        self.push(RecordedEvent::Placed(piece, cell));
    }

    fn on_wrong_mark(&mut self, piece: usize, marked: bool) {
        self.push(RecordedEvent::WrongMark(piece, marked));
    }

    fn on_moves(&mut self, moves: u32) {
        self.push(RecordedEvent::Moves(moves));
    }

    fn on_tick(&mut self, elapsed_secs: u64) {
        self.push(RecordedEvent::Tick(elapsed_secs));
    }

    fn on_finalize(&mut self, report: &BestReport) {
        self.push(RecordedEvent::BestFinalize(*report));
    }
}

#[derive(Default)]
struct RecordingEffects(RefCell<Vec<&'static str>>);

impl SoundEffects for RecordingEffects {
    fn correct(&self) {
        self.0.borrow_mut().push("correct");
    }

    fn wrong(&self) {
        self.0.borrow_mut().push("wrong");
    }

    fn flip(&self) {
        self.0.borrow_mut().push("flip");
    }

    fn matched(&self) {
        self.0.borrow_mut().push("matched");
    }

    fn celebrate(&self) {
        self.0.borrow_mut().push("celebrate");
    }
}

/// One narrator, one sound log and one event log behind every context it hands out.
pub(crate) struct Harness {
    narrator: Narrator,
    spoken: Spoken,
    effects: Rc<RecordingEffects>,
    events: EventLog,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let (narrator, spoken) = recording_narrator();
        Self {
            narrator,
            spoken,
            effects: Rc::default(),
            events: Rc::default(),
        }
    }

    pub(crate) fn ctx(&self) -> SessionContext {
        SessionContext::new(self.narrator.clone()).with_effects(self.effects.clone())
    }

    pub(crate) fn narrator(&self) -> Narrator {
        self.narrator.clone()
    }

    pub(crate) fn spoken(&self) -> Spoken {
        self.spoken.clone()
    }

    pub(crate) fn sounds(&self) -> Vec<&'static str> {
        self.effects.0.borrow().clone()
    }

    pub(crate) fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    pub(crate) fn challenge_hooks(&self) -> Box<dyn ChallengeHooks> {
        Box::new(Recorder(self.events.clone()))
    }

    pub(crate) fn match_hooks(&self) -> Box<dyn MatchHooks> {
        Box::new(Recorder(self.events.clone()))
    }

    pub(crate) fn assembly_hooks(&self) -> Box<dyn AssemblyHooks> {
        Box::new(Recorder(self.events.clone()))
    }
}

/// Twelve vehicles in four categories of three.
pub(crate) fn vehicle_catalog() -> Catalog {
    let item = |id: &str, name: &str, category: &str, fact: &str| {
        ContentItem::new(id, name)
            .map(|i| i.with_category(category).with_fun_fact(fact))
    };
    let items = [
        item("bus", "Bus", "public", "A bus can carry fifty people."),
        item("train", "Train", "public", "Trains run on rails."),
        item("tram", "Tram", "public", "Trams share the road with cars."),
        item("ambulance", "Ambulance", "emergency", "Ambulances take people to hospital."),
        item("fire_truck", "Fire truck", "emergency", "Fire trucks carry long ladders."),
        item("police_car", "Police car", "emergency", "Police cars have sirens."),
        item("truck", "Truck", "commercial", "Trucks move goods between cities."),
        item("tractor", "Tractor", "commercial", "Tractors work in the fields."),
        item("crane", "Crane", "commercial", "Cranes lift heavy loads."),
        item("car", "Car", "private", "Most cars have four wheels."),
        item("motorcycle", "Motorcycle", "private", "Motorcycles have two wheels."),
        item("bicycle", "Bicycle", "private", "Bicycles need no fuel."),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .unwrap();
    let categories = vec![
        Category::new("public", "Public transport"),
        Category::new("emergency", "Emergency"),
        Category::new("commercial", "Work vehicles"),
        Category::new("private", "Private"),
    ];
    Catalog::new(items, categories).unwrap()
}
