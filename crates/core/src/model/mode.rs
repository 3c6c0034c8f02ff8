use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every screen of the game shell that keeps progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Quiz,
    SoundQuiz,
    OddOneOut,
    BrandsQuiz,
    PartsQuiz,
    Matching,
    PartsMatching,
    Puzzle,
    Learning,
    Brands,
    Parts,
}

impl GameMode {
    pub const ALL: [GameMode; 11] = [
        GameMode::Quiz,
        GameMode::SoundQuiz,
        GameMode::OddOneOut,
        GameMode::BrandsQuiz,
        GameMode::PartsQuiz,
        GameMode::Matching,
        GameMode::PartsMatching,
        GameMode::Puzzle,
        GameMode::Learning,
        GameMode::Brands,
        GameMode::Parts,
    ];

    /// Stable name used in storage keys and on the command line.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            GameMode::Quiz => "quiz",
            GameMode::SoundQuiz => "sound_quiz",
            GameMode::OddOneOut => "odd",
            GameMode::BrandsQuiz => "brands_quiz",
            GameMode::PartsQuiz => "car_parts_quiz",
            GameMode::Matching => "matching",
            GameMode::PartsMatching => "car_parts_matching",
            GameMode::Puzzle => "puzzle",
            GameMode::Learning => "learning",
            GameMode::Brands => "brands",
            GameMode::Parts => "car_parts",
        }
    }

    /// True for modes whose completion is a `(score, total)` pair.
    #[must_use]
    pub fn is_scored(self) -> bool {
        matches!(
            self,
            GameMode::Quiz
                | GameMode::SoundQuiz
                | GameMode::OddOneOut
                | GameMode::BrandsQuiz
                | GameMode::PartsQuiz
        )
    }

    /// True for modes whose completion is a best-of-moves record.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            GameMode::Matching | GameMode::PartsMatching | GameMode::Puzzle
        )
    }

    #[must_use]
    pub fn best_score_key(self) -> String {
        format!("{}_best", self.key())
    }

    #[must_use]
    pub fn best_moves_key(self, size: u32) -> String {
        format!("{}{size}", self.best_moves_prefix())
    }

    /// Shared start of every `best_moves_key` of this mode.
    #[must_use]
    pub fn best_moves_prefix(self) -> String {
        format!("{}_best_", self.key())
    }

    #[must_use]
    pub fn viewed_key(self) -> String {
        format!("{}_viewed", self.key())
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.key() == s)
            .ok_or_else(|| format!("unknown game mode: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_str() {
        for mode in GameMode::ALL {
            assert_eq!(mode.key().parse::<GameMode>().unwrap(), mode);
        }
        assert!("racing".parse::<GameMode>().is_err());
    }

    #[test]
    fn storage_keys_follow_mode_names() {
        assert_eq!(GameMode::OddOneOut.best_score_key(), "odd_best");
        assert_eq!(GameMode::Matching.best_moves_key(6), "matching_best_6");
        assert!(
            GameMode::PartsMatching
                .best_moves_key(4)
                .starts_with(&GameMode::PartsMatching.best_moves_prefix())
        );
        assert_eq!(GameMode::Parts.viewed_key(), "car_parts_viewed");
    }
}
