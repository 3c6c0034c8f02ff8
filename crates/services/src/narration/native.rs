use gefen_core::model::NarrationSettings;

use super::backend::{BackendKind, BackendStep, PlaybackOutcome, PlaybackTicket, VoiceBackend};
use super::discovery::VoiceInfo;

/// One request to the platform speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceInfo,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
}

/// Platform speech engine.
///
/// Implementations report the end of every `speak` through the
/// [`PlaybackInbox`](super::PlaybackInbox) they were built with.
pub trait SpeechSynth {
    fn speak(&mut self, utterance: Utterance, ticket: PlaybackTicket);
    fn cancel(&mut self);
}

/// Speaks through a platform voice found at startup.
pub struct NativeVoice {
    synth: Box<dyn SpeechSynth>,
    voice: VoiceInfo,
    /// Target tag, whatever spelling the platform reports for `voice`.
    lang: String,
    rate: f32,
    pitch: f32,
}

impl NativeVoice {
    #[must_use]
    pub fn new(synth: Box<dyn SpeechSynth>, voice: VoiceInfo, settings: &NarrationSettings) -> Self {
        Self {
            synth,
            voice,
            lang: settings.language_tag(),
            rate: settings.rate,
            pitch: settings.pitch,
        }
    }

    #[must_use]
    pub fn voice(&self) -> &VoiceInfo {
        &self.voice
    }
}

impl VoiceBackend for NativeVoice {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn play(&mut self, text: &str, ticket: PlaybackTicket) {
        // Some engines ignore a new utterance while one is still queued.
        self.synth.cancel();
        self.synth.speak(
            Utterance {
                text: text.to_owned(),
                voice: self.voice.clone(),
                lang: self.lang.clone(),
                rate: self.rate,
                pitch: self.pitch,
            },
            ticket,
        );
    }

    fn playback_ended(&mut self, _ticket: PlaybackTicket, _outcome: PlaybackOutcome) -> BackendStep {
        BackendStep::Done
    }

    fn resume(&mut self, _ticket: PlaybackTicket) {}

    fn silence(&mut self) {
        self.synth.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log(Rc<RefCell<Vec<String>>>);

    impl SpeechSynth for Log {
        fn speak(&mut self, utterance: Utterance, ticket: PlaybackTicket) {
            self.0.borrow_mut().push(format!(
                "speak {} {} {} {}",
                utterance.text, utterance.lang, utterance.rate, ticket
            ));
        }

        fn cancel(&mut self) {
            self.0.borrow_mut().push("cancel".into());
        }
    }

    #[test]
    fn utterance_uses_voice_language_and_rate() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let voice = VoiceInfo::new("Carmit", "he-IL");
        let mut native = NativeVoice::new(
            Box::new(Log(Rc::clone(&log))),
            voice,
            &NarrationSettings::default(),
        );
        native.play("שלום", PlaybackTicket::new(3, 0));
        assert_eq!(
            *log.borrow(),
            vec!["cancel".to_owned(), "speak שלום he-IL 0.75 3#0".to_owned()]
        );
        assert_eq!(
            native.playback_ended(PlaybackTicket::new(3, 0), PlaybackOutcome::Finished),
            BackendStep::Done
        );
    }

    #[test]
    fn utterance_carries_target_tag_not_platform_spelling() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut native = NativeVoice::new(
            Box::new(Log(Rc::clone(&log))),
            VoiceInfo::new("Asaf", "he_IL"),
            &NarrationSettings::default(),
        );
        native.play("רכבת", PlaybackTicket::new(1, 0));
        assert_eq!(log.borrow()[1], "speak רכבת he-IL 0.75 1#0");
        assert_eq!(native.voice().lang, "he_IL");
    }
}
