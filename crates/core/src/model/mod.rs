mod challenge;
mod content;
mod ids;
mod mode;
mod phrases;
mod records;
mod settings;

pub use challenge::{Challenge, OddRound};
pub use content::{Catalog, Category, ContentError, ContentItem};
pub use ids::{CategoryId, ItemId};
pub use mode::GameMode;
pub use phrases::Phrasebook;
pub use records::{BestRecord, BestReport, RecordError, ResultTier, ScoreRecord, ScoreReport};
pub use settings::{
    AssemblySettings, ChallengeSettings, DistractorPolicy, GameSettings, MatchSettings, MatchStyle,
    NarrationSettings, OptionsSchedule, DiscoverySettings, SettingsError,
};
