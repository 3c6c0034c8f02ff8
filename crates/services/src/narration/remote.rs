use std::collections::VecDeque;

use chrono::Duration;
use url::Url;
use url::form_urlencoded;

use gefen_core::model::NarrationSettings;

use super::backend::{BackendKind, BackendStep, PlaybackOutcome, PlaybackTicket, VoiceBackend};

/// Plays an audio resource fetched from a URL.
///
/// Implementations report the end (or failure) of every `play` through the
/// [`PlaybackInbox`](super::PlaybackInbox) they were built with.
pub trait AudioOutput {
    fn play(&mut self, url: &Url, rate: f32, ticket: PlaybackTicket);
    fn stop(&mut self);
}

/// Length of `text` once form-encoded into a query string.
#[must_use]
pub fn encoded_len(text: &str) -> usize {
    form_urlencoded::byte_serialize(text.as_bytes())
        .map(str::len)
        .sum()
}

/// Split `text` at spaces into chunks whose encoded length stays within `budget`.
///
/// A single word longer than the budget becomes its own chunk.
#[must_use]
pub fn chunk_text(text: &str, budget: usize) -> Vec<String> {
    if encoded_len(text) <= budget {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if encoded_len(&candidate) > budget && !current.is_empty() {
            chunks.push(std::mem::replace(&mut current, word.to_owned()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Speaks by fetching synthesized audio from a remote endpoint.
///
/// Long text is cut into URL-sized chunks played back to back with a short
/// gap; the segment counts as done once the last chunk ends.
pub struct RemoteFallback {
    output: Box<dyn AudioOutput>,
    endpoint: Url,
    language: String,
    rate: f32,
    budget: usize,
    gap: Duration,
    queue: VecDeque<String>,
    current: Option<PlaybackTicket>,
}

impl RemoteFallback {
    /// # Errors
    ///
    /// Returns `url::ParseError` if the configured endpoint is not a URL.
    pub fn new(
        output: Box<dyn AudioOutput>,
        settings: &NarrationSettings,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            output,
            endpoint: Url::parse(&settings.fallback_endpoint)?,
            language: settings.fallback_language.clone(),
            rate: settings.rate,
            budget: settings.chunk_budget,
            gap: settings.chunk_gap(),
            queue: VecDeque::new(),
            current: None,
        })
    }

    /// Request URL for one chunk of text.
    #[must_use]
    pub fn request_url(&self, chunk: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("tl", &self.language)
            .append_pair("client", "tw-ob")
            .append_pair("q", chunk);
        url
    }

    fn play_next(&mut self, ticket: PlaybackTicket) {
        if let Some(chunk) = self.queue.pop_front() {
            let url = self.request_url(&chunk);
            self.output.play(&url, self.rate, ticket);
        }
    }
}

impl VoiceBackend for RemoteFallback {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteFallback
    }

    fn play(&mut self, text: &str, ticket: PlaybackTicket) {
        self.queue = chunk_text(text, self.budget).into();
        self.current = Some(ticket);
        self.play_next(ticket);
    }

    fn playback_ended(&mut self, ticket: PlaybackTicket, outcome: PlaybackOutcome) -> BackendStep {
        if self.current != Some(ticket) {
            return BackendStep::Done;
        }
        if outcome == PlaybackOutcome::Failed {
            log::debug!("fallback chunk failed for {ticket}, moving on");
        }
        if self.queue.is_empty() {
            self.current = None;
            BackendStep::Done
        } else {
            BackendStep::ResumeAfter(self.gap)
        }
    }

    fn resume(&mut self, ticket: PlaybackTicket) {
        if self.current == Some(ticket) {
            self.play_next(ticket);
        }
    }

    fn silence(&mut self) {
        self.queue.clear();
        self.current = None;
        self.output.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl AudioOutput for Recorder {
        fn play(&mut self, url: &Url, _rate: f32, _ticket: PlaybackTicket) {
            self.0.borrow_mut().push(url.to_string());
        }

        fn stop(&mut self) {
            self.0.borrow_mut().push("stop".into());
        }
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_text("שלום עולם", 180), vec!["שלום עולם".to_owned()]);
    }

    #[test]
    fn long_text_splits_at_words_within_budget() {
        let text = "אוטובוס ".repeat(20);
        let text = text.trim_end();
        let chunks = chunk_text(text, 180);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| encoded_len(c) <= 180));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn oversized_word_stands_alone() {
        let long = "a".repeat(30);
        let chunks = chunk_text(&format!("hi {long} yo"), 10);
        assert_eq!(chunks, vec!["hi".to_owned(), long, "yo".to_owned()]);
    }

    #[test]
    fn request_url_carries_language_and_text() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let fallback = RemoteFallback::new(
            Box::new(Recorder(Rc::clone(&log))),
            &NarrationSettings::default(),
        )
        .unwrap();
        let url = fallback.request_url("a b");
        assert_eq!(
            url.as_str(),
            "https://translate.google.com/translate_tts?ie=UTF-8&tl=iw&client=tw-ob&q=a+b"
        );
    }

    #[test]
    fn chunks_play_with_gap_until_done() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let settings = NarrationSettings {
            chunk_budget: 4,
            ..NarrationSettings::default()
        };
        let mut fallback =
            RemoteFallback::new(Box::new(Recorder(Rc::clone(&log))), &settings).unwrap();
        let ticket = PlaybackTicket::new(1, 0);

        fallback.play("ab cd", ticket);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(
            fallback.playback_ended(ticket, PlaybackOutcome::Finished),
            BackendStep::ResumeAfter(Duration::milliseconds(200))
        );
        fallback.resume(ticket);
        assert_eq!(log.borrow().len(), 2);
        assert!(log.borrow()[1].ends_with("q=cd"));
        assert_eq!(
            fallback.playback_ended(ticket, PlaybackOutcome::Failed),
            BackendStep::Done
        );
    }

    #[test]
    fn silence_forgets_queued_chunks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let settings = NarrationSettings {
            chunk_budget: 4,
            ..NarrationSettings::default()
        };
        let mut fallback =
            RemoteFallback::new(Box::new(Recorder(Rc::clone(&log))), &settings).unwrap();
        let ticket = PlaybackTicket::new(1, 0);
        fallback.play("ab cd", ticket);
        fallback.silence();
        fallback.resume(ticket);
        assert_eq!(log.borrow().last().map(String::as_str), Some("stop"));
        assert_eq!(
            fallback.playback_ended(ticket, PlaybackOutcome::Finished),
            BackendStep::Done
        );
    }
}
