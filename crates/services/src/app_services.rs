use storage::repository::Storage;

use gefen_core::model::GameSettings;

use crate::Clock;
use crate::error::AppServicesError;
use crate::narration::{
    AudioOutput, Narrator, PlaybackInbox, SpeechSynth, VoiceCatalog, narrator_for, discover_voice,
};
use crate::progress_service::ProgressService;
use crate::sessions::{ContentLibrary, GameLoopService};

/// Wires storage, progress and settings, then hands out a narrator and a game loop.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    settings: GameSettings,
    progress: ProgressService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the settings are invalid or storage
    /// initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: GameSettings,
    ) -> Result<Self, AppServicesError> {
        let settings = settings.validate()?;
        let storage = Storage::sqlite(db_url).await?;
        log::info!("progress stored in {db_url}");
        Ok(Self::from_storage(storage, clock, settings))
    }

    /// Build services that forget progress on exit.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the settings are invalid.
    pub fn in_memory(clock: Clock, settings: GameSettings) -> Result<Self, AppServicesError> {
        let settings = settings.validate()?;
        Ok(Self::from_storage(Storage::in_memory(), clock, settings))
    }

    fn from_storage(storage: Storage, clock: Clock, settings: GameSettings) -> Self {
        Self {
            clock,
            settings,
            progress: ProgressService::new(clock, storage.progress),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn progress(&self) -> ProgressService {
        self.progress.clone()
    }

    /// Look through the platform voices once and build the narrator for the result.
    ///
    /// Both adapters must report playback completion into `inbox`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Narration` if the narration settings are
    /// invalid.
    pub async fn narrator(
        &self,
        voices: &dyn VoiceCatalog,
        synth: Box<dyn SpeechSynth>,
        audio: Box<dyn AudioOutput>,
        inbox: PlaybackInbox,
    ) -> Result<Narrator, AppServicesError> {
        let outcome = discover_voice(voices, &self.settings.narration, &self.settings.discovery).await;
        Ok(narrator_for(
            outcome,
            synth,
            audio,
            &self.settings.narration,
            inbox,
        )?)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Session` if the game loop rejects the settings.
    pub fn game_loop(
        &self,
        narrator: Narrator,
        library: ContentLibrary,
    ) -> Result<GameLoopService, AppServicesError> {
        Ok(GameLoopService::new(
            self.clock,
            narrator,
            self.progress.clone(),
            library,
            self.settings.clone(),
        )?)
    }
}
