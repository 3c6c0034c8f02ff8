use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("a challenge needs at least 2 options, got {0}")]
    TooFewOptions(u32),

    #[error("reveal threshold must be > 0")]
    InvalidRevealThreshold,

    #[error("hint threshold ({hint}) must be below the reveal threshold ({reveal})")]
    InvalidHintThreshold { hint: u32, reveal: u32 },

    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("pair count must be > 0")]
    InvalidPairCount,

    #[error("grid must be at least 1x1, got {rows}x{cols}")]
    InvalidGrid { rows: u32, cols: u32 },

    #[error("{0} must be > 0")]
    ZeroDuration(&'static str),

    #[error("voice language cannot be empty")]
    EmptyLanguage,

    #[error("invalid fallback endpoint")]
    InvalidEndpoint,

    #[error("chunk budget must be > 0")]
    InvalidChunkBudget,
}

fn ms(value: u64) -> Duration {
    Duration::milliseconds(i64::try_from(value).unwrap_or(i64::MAX))
}

fn non_zero(value: u64, name: &'static str) -> Result<(), SettingsError> {
    if value == 0 {
        Err(SettingsError::ZeroDuration(name))
    } else {
        Ok(())
    }
}

//
// ─── CHALLENGE POLICIES ────────────────────────────────────────────────────────
//

/// How many options question `index` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionsSchedule {
    Fixed { count: u32 },
    /// `initial` options before `from_index`, `later` from there on.
    Step {
        initial: u32,
        later: u32,
        from_index: usize,
    },
}

impl OptionsSchedule {
    #[must_use]
    pub fn count_for(&self, index: usize) -> usize {
        let count = match *self {
            OptionsSchedule::Fixed { count } => count,
            OptionsSchedule::Step {
                initial,
                later,
                from_index,
            } => {
                if index < from_index {
                    initial
                } else {
                    later
                }
            }
        };
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let counts = match *self {
            OptionsSchedule::Fixed { count } => [count, count],
            OptionsSchedule::Step { initial, later, .. } => [initial, later],
        };
        match counts.into_iter().find(|&c| c < 2) {
            Some(bad) => Err(SettingsError::TooFewOptions(bad)),
            None => Ok(()),
        }
    }
}

/// Ordering of the distractor pool.
///
/// Both the same-category and the other-category pools are shuffled; before
/// `same_category_from` the other-category pool is drawn from first, from that
/// question index on the same-category pool comes first, which makes later
/// questions harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistractorPolicy {
    pub same_category_from: Option<usize>,
}

impl Default for DistractorPolicy {
    fn default() -> Self {
        Self {
            same_category_from: Some(7),
        }
    }
}

impl DistractorPolicy {
    #[must_use]
    pub fn prefers_same_category(&self, index: usize) -> bool {
        self.same_category_from.is_some_and(|from| index >= from)
    }
}

/// Tuning of one gated-response game mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeSettings {
    pub options: OptionsSchedule,
    pub distractors: DistractorPolicy,
    pub question_count: usize,
    /// Wrong attempts on one question after which the answer is revealed.
    pub reveal_threshold: u32,
    /// Wrong attempts after which a hint is shown, if the mode has hints.
    pub hint_threshold: Option<u32>,
    /// Delay before the per-question prompt is narrated, if the mode narrates one.
    pub prompt_delay_ms: Option<u64>,
    pub disable_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub reveal_delay_ms: u64,
    pub narration_pause_ms: u64,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self::quiz()
    }
}

impl ChallengeSettings {
    /// Picture quiz: 3 options for the first five questions, 4 after.
    #[must_use]
    pub fn quiz() -> Self {
        Self {
            options: OptionsSchedule::Step {
                initial: 3,
                later: 4,
                from_index: 5,
            },
            distractors: DistractorPolicy::default(),
            question_count: 10,
            reveal_threshold: 2,
            hint_threshold: None,
            prompt_delay_ms: None,
            disable_delay_ms: 600,
            settle_delay_ms: 1_500,
            reveal_delay_ms: 2_000,
            narration_pause_ms: 700,
        }
    }

    /// Listening quiz: like the picture quiz, but the name is spoken first.
    #[must_use]
    pub fn sound_quiz() -> Self {
        Self {
            prompt_delay_ms: Some(400),
            ..Self::quiz()
        }
    }

    /// "Who doesn't belong": no reading, so one more try and longer narration.
    #[must_use]
    pub fn odd_one_out() -> Self {
        Self {
            options: OptionsSchedule::Fixed { count: 4 },
            distractors: DistractorPolicy {
                same_category_from: None,
            },
            question_count: 8,
            reveal_threshold: 3,
            hint_threshold: Some(2),
            prompt_delay_ms: Some(300),
            disable_delay_ms: 600,
            settle_delay_ms: 4_500,
            reveal_delay_ms: 4_000,
            narration_pause_ms: 700,
        }
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for impossible thresholds, option counts or delays.
    pub fn validate(self) -> Result<Self, SettingsError> {
        self.options.validate()?;
        if self.reveal_threshold == 0 {
            return Err(SettingsError::InvalidRevealThreshold);
        }
        if let Some(hint) = self.hint_threshold {
            if hint == 0 || hint >= self.reveal_threshold {
                return Err(SettingsError::InvalidHintThreshold {
                    hint,
                    reveal: self.reveal_threshold,
                });
            }
        }
        if self.question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        non_zero(self.settle_delay_ms, "settle delay")?;
        non_zero(self.reveal_delay_ms, "reveal delay")?;
        Ok(self)
    }

    #[must_use]
    pub fn prompt_delay(&self) -> Option<Duration> {
        self.prompt_delay_ms.map(ms)
    }

    #[must_use]
    pub fn disable_delay(&self) -> Duration {
        ms(self.disable_delay_ms)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        ms(self.settle_delay_ms)
    }

    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        ms(self.reveal_delay_ms)
    }

    #[must_use]
    pub fn narration_pause(&self) -> Duration {
        ms(self.narration_pause_ms)
    }
}

//
// ─── MATCHING ──────────────────────────────────────────────────────────────────
//

/// What the companion card of each pair shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStyle {
    /// Photo + written name.
    #[default]
    Classic,
    /// Photo + small thumbnail; no reading required.
    Images,
    /// Photo + spoken name; no reading required.
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub pairs: u32,
    pub style: MatchStyle,
    pub match_delay_ms: u64,
    pub mismatch_delay_ms: u64,
    pub audio_card_delay_ms: u64,
    pub tick_ms: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            pairs: 4,
            style: MatchStyle::Classic,
            match_delay_ms: 300,
            mismatch_delay_ms: 1_000,
            audio_card_delay_ms: 300,
            tick_ms: 1_000,
        }
    }
}

impl MatchSettings {
    #[must_use]
    pub fn with_pairs(mut self, pairs: u32) -> Self {
        self.pairs = pairs;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: MatchStyle) -> Self {
        self.style = style;
        self
    }

    /// # Errors
    ///
    /// Returns `SettingsError` if there are no pairs or the tick is zero.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.pairs == 0 {
            return Err(SettingsError::InvalidPairCount);
        }
        non_zero(self.tick_ms, "tick interval")?;
        Ok(self)
    }

    #[must_use]
    pub fn match_delay(&self) -> Duration {
        ms(self.match_delay_ms)
    }

    #[must_use]
    pub fn mismatch_delay(&self) -> Duration {
        ms(self.mismatch_delay_ms)
    }

    #[must_use]
    pub fn audio_card_delay(&self) -> Duration {
        ms(self.audio_card_delay_ms)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        ms(self.tick_ms)
    }
}

//
// ─── ASSEMBLY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    pub rows: u32,
    pub cols: u32,
    pub intro_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub wrong_mark_ms: u64,
    pub completion_pause_ms: u64,
    pub tick_ms: u64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            intro_delay_ms: 300,
            settle_delay_ms: 400,
            wrong_mark_ms: 500,
            completion_pause_ms: 800,
            tick_ms: 1_000,
        }
    }
}

impl AssemblySettings {
    #[must_use]
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// # Errors
    ///
    /// Returns `SettingsError` for an empty grid or a zero tick.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SettingsError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        non_zero(self.tick_ms, "tick interval")?;
        Ok(self)
    }

    #[must_use]
    pub fn total_pieces(&self) -> usize {
        usize::try_from(self.rows.saturating_mul(self.cols)).unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn intro_delay(&self) -> Duration {
        ms(self.intro_delay_ms)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        ms(self.settle_delay_ms)
    }

    #[must_use]
    pub fn wrong_mark(&self) -> Duration {
        ms(self.wrong_mark_ms)
    }

    #[must_use]
    pub fn completion_pause(&self) -> Duration {
        ms(self.completion_pause_ms)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        ms(self.tick_ms)
    }
}

//
// ─── NARRATION ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Primary language subtag the voice must speak, e.g. `he`.
    pub language: String,
    /// Preferred region subtag, e.g. `IL`.
    pub region: String,
    pub rate: f32,
    pub pitch: f32,
    pub default_pause_ms: u64,
    /// Maximum URL-encoded length of one fallback request.
    pub chunk_budget: usize,
    pub chunk_gap_ms: u64,
    pub fallback_endpoint: String,
    /// Language code the fallback endpoint expects (`iw` for Hebrew).
    pub fallback_language: String,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            language: "he".into(),
            region: "IL".into(),
            rate: 0.75,
            pitch: 1.05,
            default_pause_ms: 800,
            chunk_budget: 180,
            chunk_gap_ms: 200,
            fallback_endpoint: "https://translate.google.com/translate_tts".into(),
            fallback_language: "iw".into(),
        }
    }
}

impl NarrationSettings {
    /// Validate the settings and parse the fallback endpoint.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for an empty language, bad endpoint or zero budget.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.language.trim().is_empty() {
            return Err(SettingsError::EmptyLanguage);
        }
        if Url::parse(&self.fallback_endpoint).is_err() {
            return Err(SettingsError::InvalidEndpoint);
        }
        if self.chunk_budget == 0 {
            return Err(SettingsError::InvalidChunkBudget);
        }
        Ok(self)
    }

    /// BCP-47 style tag, e.g. `he-IL`.
    #[must_use]
    pub fn language_tag(&self) -> String {
        if self.region.is_empty() {
            self.language.clone()
        } else {
            format!("{}-{}", self.language, self.region)
        }
    }

    #[must_use]
    pub fn default_pause(&self) -> Duration {
        ms(self.default_pause_ms)
    }

    #[must_use]
    pub fn chunk_gap(&self) -> Duration {
        ms(self.chunk_gap_ms)
    }
}

/// Bounds of the one-time local voice discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub timeout_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            max_attempts: 15,
            timeout_ms: 4_000,
        }
    }
}

impl DiscoverySettings {
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Everything a deployment can tune, loadable from one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub quiz: ChallengeSettings,
    pub sound_quiz: ChallengeSettings,
    pub odd_one_out: ChallengeSettings,
    pub matching: MatchSettings,
    pub assembly: AssemblySettings,
    pub narration: NarrationSettings,
    pub discovery: DiscoverySettings,
    /// Pause between the name and the fun fact on a first visit in a tour.
    pub tour_pause_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            quiz: ChallengeSettings::quiz(),
            sound_quiz: ChallengeSettings::sound_quiz(),
            odd_one_out: ChallengeSettings::odd_one_out(),
            matching: MatchSettings::default(),
            assembly: AssemblySettings::default(),
            narration: NarrationSettings::default(),
            discovery: DiscoverySettings::default(),
            tour_pause_ms: 1_000,
        }
    }
}

impl GameSettings {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first `SettingsError` found.
    pub fn validate(self) -> Result<Self, SettingsError> {
        Ok(Self {
            quiz: self.quiz.validate()?,
            sound_quiz: self.sound_quiz.validate()?,
            odd_one_out: self.odd_one_out.validate()?,
            matching: self.matching.validate()?,
            assembly: self.assembly.validate()?,
            narration: self.narration.validate()?,
            discovery: self.discovery,
            tour_pause_ms: self.tour_pause_ms,
        })
    }

    #[must_use]
    pub fn tour_pause(&self) -> Duration {
        ms(self.tour_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_schedule_switches_at_index() {
        let quiz = ChallengeSettings::quiz();
        assert_eq!(quiz.options.count_for(0), 3);
        assert_eq!(quiz.options.count_for(4), 3);
        assert_eq!(quiz.options.count_for(5), 4);
    }

    #[test]
    fn presets_validate() {
        assert!(ChallengeSettings::quiz().validate().is_ok());
        assert!(ChallengeSettings::sound_quiz().validate().is_ok());
        assert!(ChallengeSettings::odd_one_out().validate().is_ok());
        assert!(MatchSettings::default().validate().is_ok());
        assert!(AssemblySettings::default().validate().is_ok());
        assert!(NarrationSettings::default().validate().is_ok());
    }

    #[test]
    fn hint_threshold_must_precede_reveal() {
        let settings = ChallengeSettings {
            hint_threshold: Some(3),
            ..ChallengeSettings::odd_one_out()
        };
        assert_eq!(
            settings.validate().unwrap_err(),
            SettingsError::InvalidHintThreshold { hint: 3, reveal: 3 }
        );
    }

    #[test]
    fn single_option_schedule_is_rejected() {
        let settings = ChallengeSettings {
            options: OptionsSchedule::Fixed { count: 1 },
            ..ChallengeSettings::quiz()
        };
        assert_eq!(settings.validate().unwrap_err(), SettingsError::TooFewOptions(1));
    }

    #[test]
    fn distractor_policy_flips_at_index() {
        let policy = DistractorPolicy::default();
        assert!(!policy.prefers_same_category(6));
        assert!(policy.prefers_same_category(7));
        assert!(!DistractorPolicy { same_category_from: None }.prefers_same_category(100));
    }

    #[test]
    fn settings_deserialize_with_partial_overrides() {
        let json = r#"{"reveal_threshold":3,"options":{"kind":"fixed","count":3}}"#;
        let settings: ChallengeSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.reveal_threshold, 3);
        assert_eq!(settings.options, OptionsSchedule::Fixed { count: 3 });
        assert_eq!(settings.settle_delay_ms, 1_500);
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let settings = NarrationSettings {
            fallback_endpoint: "not a url".into(),
            ..NarrationSettings::default()
        };
        assert_eq!(settings.validate().unwrap_err(), SettingsError::InvalidEndpoint);
        assert_eq!(NarrationSettings::default().language_tag(), "he-IL");
    }

    #[test]
    fn game_settings_keep_per_mode_presets() {
        let settings: GameSettings =
            serde_json::from_str(r#"{"matching":{"pairs":6}}"#).unwrap();
        let settings = settings.validate().unwrap();
        assert_eq!(settings.matching.pairs, 6);
        assert_eq!(settings.odd_one_out.reveal_threshold, 3);
        assert_eq!(settings.sound_quiz.prompt_delay_ms, Some(400));
    }
}
