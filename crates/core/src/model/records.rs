use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::mode::GameMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("score {score} exceeds total {total}")]
    ScoreAboveTotal { score: u32, total: u32 },
}

/// Persisted best score of a scored mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u32,
    pub total: u32,
}

/// Persisted best-of-moves record of a timed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestRecord {
    pub moves: u32,
    /// Elapsed seconds when the record was set.
    pub time: u64,
}

/// Produced exactly once by a scored session when it reaches its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReport {
    pub mode: GameMode,
    pub score: u32,
    pub total: u32,
}

impl ScoreReport {
    /// # Errors
    ///
    /// Returns `RecordError::ScoreAboveTotal` if `score > total`.
    pub fn new(mode: GameMode, score: u32, total: u32) -> Result<Self, RecordError> {
        if score > total {
            return Err(RecordError::ScoreAboveTotal { score, total });
        }
        Ok(Self { mode, score, total })
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.score == self.total
    }

    #[must_use]
    pub fn tier(&self) -> ResultTier {
        ResultTier::for_score(self.score, self.total)
    }
}

/// Produced exactly once by a timed session (matching, assembly) on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestReport {
    pub mode: GameMode,
    /// Board size the record is keyed by: pair count or piece count.
    pub size: u32,
    pub moves: u32,
    pub elapsed_secs: u64,
}

/// Coarse grading shown on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultTier {
    Perfect,
    Excellent,
    Good,
    KeepTrying,
}

impl ResultTier {
    /// Perfect on a full score, then 70% and 40% cut-offs.
    #[must_use]
    pub fn for_score(score: u32, total: u32) -> Self {
        let score = u64::from(score);
        let total = u64::from(total);
        if score == total {
            ResultTier::Perfect
        } else if score * 10 >= total * 7 {
            ResultTier::Excellent
        } else if score * 10 >= total * 4 {
            ResultTier::Good
        } else {
            ResultTier::KeepTrying
        }
    }
}
