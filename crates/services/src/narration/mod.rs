//! Spoken narration: one scheduler, two interchangeable voices, one voice lookup.

mod backend;
mod native;
mod discovery;
mod remote;
mod scheduler;

pub use backend::{
    BackendKind, BackendStep, PlaybackInbox, PlaybackOutcome, PlaybackTicket, VoiceBackend,
};
pub use native::{NativeVoice, SpeechSynth, Utterance};
pub use discovery::{DiscoveryOutcome, VoiceCatalog, VoiceInfo, find_voice, discover_voice};
pub use remote::{AudioOutput, RemoteFallback, chunk_text, encoded_len};
pub use scheduler::{NarrationScheduler, Narrator};

use gefen_core::model::NarrationSettings;

use crate::error::NarrationError;

/// Build the narrator for whichever backend discovery committed to.
///
/// Both platform adapters must report completions into `inbox`.
///
/// # Errors
///
/// Returns `NarrationError` if the settings are invalid.
pub fn narrator_for(
    outcome: DiscoveryOutcome,
    synth: Box<dyn SpeechSynth>,
    audio: Box<dyn AudioOutput>,
    settings: &NarrationSettings,
    inbox: PlaybackInbox,
) -> Result<Narrator, NarrationError> {
    let settings = settings.clone().validate()?;
    let backend: Box<dyn VoiceBackend> = match outcome {
        DiscoveryOutcome::Native(voice) => Box::new(NativeVoice::new(synth, voice, &settings)),
        DiscoveryOutcome::Fallback => Box::new(RemoteFallback::new(audio, &settings)?),
    };
    Ok(Narrator::new(NarrationScheduler::new(backend, &settings, inbox)))
}
