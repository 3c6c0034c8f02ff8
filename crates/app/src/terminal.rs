//! Terminal stand-ins for the platform: speech prints, sounds print, and
//! hooks render the board as text.

use gefen_core::model::{BestReport, ItemId, ResultTier};
use gefen_core::time::format_elapsed;
use services::narration::{
    AudioOutput, PlaybackInbox, PlaybackOutcome, PlaybackTicket, SpeechSynth, Utterance,
    VoiceCatalog, VoiceInfo,
};
use services::sessions::{
    AssemblyHooks, Cell, ChallengeHooks, MatchCard, MatchHooks, Piece, Presented, SoundEffects,
};
use url::Url;

/// "Speaks" by printing, and finishes each line immediately.
pub struct PrintedSpeech {
    inbox: PlaybackInbox,
}

impl PrintedSpeech {
    pub fn new(inbox: PlaybackInbox) -> Self {
        Self { inbox }
    }
}

impl SpeechSynth for PrintedSpeech {
    fn speak(&mut self, utterance: Utterance, ticket: PlaybackTicket) {
        println!("🗣  {}", utterance.text);
        self.inbox.push(ticket, PlaybackOutcome::Finished);
    }

    fn cancel(&mut self) {}
}

/// Prints the fallback request instead of fetching it.
pub struct PrintedAudio {
    inbox: PlaybackInbox,
}

impl PrintedAudio {
    pub fn new(inbox: PlaybackInbox) -> Self {
        Self { inbox }
    }
}

impl AudioOutput for PrintedAudio {
    fn play(&mut self, url: &Url, rate: f32, ticket: PlaybackTicket) {
        log::debug!("fallback audio at {rate}x: {url}");
        let text = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        println!("🔈 {text}");
        self.inbox.push(ticket, PlaybackOutcome::Finished);
    }

    fn stop(&mut self) {}
}

/// One voice in the configured language, or none at all with `--no-voice`.
pub struct TerminalVoices {
    lang: Option<String>,
}

impl TerminalVoices {
    pub fn new(lang: Option<String>) -> Self {
        Self { lang }
    }
}

impl VoiceCatalog for TerminalVoices {
    fn is_supported(&self) -> bool {
        self.lang.is_some()
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.lang
            .iter()
            .map(|lang| VoiceInfo::new("terminal", lang.clone()))
            .collect()
    }
}

pub struct PrintedEffects;

impl SoundEffects for PrintedEffects {
    fn correct(&self) {
        println!("✅");
    }

    fn wrong(&self) {
        println!("❌");
    }

    fn matched(&self) {
        println!("✨");
    }

    fn celebrate(&self) {
        println!("🎉🎉🎉");
    }
}

pub struct ChallengePrinter;

impl ChallengeHooks for ChallengePrinter {
    fn on_present(&mut self, presented: &Presented<'_>) {
        println!();
        println!("question {} of {}", presented.index + 1, presented.total);
        match presented.challenge.prompt() {
            Some(prompt) => println!("  listen: {prompt}"),
            None => println!("  [picture: {}]", presented.challenge.answer_id()),
        }
        for (n, option) in presented.options.iter().enumerate() {
            println!("  {}) {}", n + 1, option.item.display_name());
        }
    }

    fn on_reveal(&mut self, answer: &ItemId) {
        println!("the answer was {answer}");
    }

    fn on_hint(&mut self, hint: &str) {
        println!("hint: {hint}");
    }

    fn on_star_earned(&mut self, _index: usize) {
        println!("⭐");
    }

    fn on_finalize(&mut self, score: u32, total: u32, tier: ResultTier) {
        println!("score {score}/{total} ({tier:?})");
    }
}

pub struct MatchPrinter;

impl MatchPrinter {
    fn face(card: &MatchCard) -> String {
        match card.face {
            services::sessions::Face::Down => "??".to_owned(),
            _ => card.item.display_name().to_owned(),
        }
    }
}

impl MatchHooks for MatchPrinter {
    fn on_board(&mut self, cards: &[MatchCard]) {
        println!();
        for (n, card) in cards.iter().enumerate() {
            println!("  {}) {}", n + 1, Self::face(card));
        }
    }

    fn on_flip(&mut self, index: usize, card: &MatchCard) {
        println!("  card {} is {} ({:?})", index + 1, card.item.display_name(), card.variant);
    }

    fn on_pair_resolved(&mut self, first: usize, second: usize, matched: bool) {
        if !matched {
            println!("  cards {} and {} turn back", first + 1, second + 1);
        }
    }

    fn on_finalize(&mut self, report: &BestReport) {
        println!(
            "board cleared in {} moves, {}",
            report.moves,
            format_elapsed(report.elapsed_secs)
        );
    }
}

pub struct AssemblyPrinter;

impl AssemblyHooks for AssemblyPrinter {
    fn on_board(&mut self, pieces: &[Piece], cells: &[Cell]) {
        println!();
        let tray: Vec<String> = pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.placed)
            .map(|(n, p)| format!("{}:[{},{}]", n + 1, p.row, p.col))
            .collect();
        println!("  tray  {}", tray.join(" "));
        let board: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(n, c)| {
                let mark = if c.filled { "■" } else { "□" };
                format!("{}:{mark}", n + 1)
            })
            .collect();
        println!("  board {}", board.join(" "));
    }

    fn on_wrong_mark(&mut self, piece: usize, marked: bool) {
        if marked {
            println!("  piece {} does not go there", piece + 1);
        }
    }

    fn on_finalize(&mut self, report: &BestReport) {
        println!(
            "puzzle done in {} moves, {}",
            report.moves,
            format_elapsed(report.elapsed_secs)
        );
    }
}
