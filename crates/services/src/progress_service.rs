use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use gefen_core::model::{BestRecord, BestReport, GameMode, ItemId, ScoreRecord, ScoreReport};
use storage::repository::ProgressRepository;

use crate::Clock;

/// Every key this service writes starts with this.
pub const KEY_PREFIX: &str = "gefen_game_";

const QUIZ_TOTAL_STARS: &str = "quiz_total_stars";

/// How many entries of a gated catalog are open: `initial` until that many
/// were viewed, then always two more than viewed, capped at `total`.
#[must_use]
pub fn unlocked_count(viewed: usize, initial: usize, total: usize) -> usize {
    if viewed < initial {
        initial.min(total)
    } else {
        total.min(viewed + 2)
    }
}

/// Best scores, best-of-moves records and viewed lists.
///
/// Progress is a nice-to-have: a failing backend is logged and treated as
/// empty, never surfaced to the game.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    /// Keep `report` if it beats the stored best; quiz runs also add their
    /// score to the star total.
    pub async fn record_score(&self, report: &ScoreReport) {
        let key = report.mode.best_score_key();
        let best: ScoreRecord = self.read(&key).await.unwrap_or_default();
        if report.score > best.score {
            let record = ScoreRecord {
                score: report.score,
                total: report.total,
            };
            self.write(&key, &record).await;
        }

        if report.mode == GameMode::Quiz {
            let stars: u32 = self.read(QUIZ_TOTAL_STARS).await.unwrap_or(0);
            self.write(QUIZ_TOTAL_STARS, &stars.saturating_add(report.score))
                .await;
        }
    }

    /// Keep `report` if there is no record for its size yet or it took fewer moves.
    pub async fn record_best(&self, report: &BestReport) {
        let key = report.mode.best_moves_key(report.size);
        let best: Option<BestRecord> = self.read(&key).await;
        if best.is_none_or(|b| report.moves < b.moves) {
            let record = BestRecord {
                moves: report.moves,
                time: report.elapsed_secs,
            };
            self.write(&key, &record).await;
        }
    }

    pub async fn best_score(&self, mode: GameMode) -> ScoreRecord {
        self.read(&mode.best_score_key()).await.unwrap_or_default()
    }

    pub async fn best_moves(&self, mode: GameMode, size: u32) -> Option<BestRecord> {
        self.read(&mode.best_moves_key(size)).await
    }

    /// Every stored best-of-moves record of `mode`, smallest size first.
    pub async fn best_moves_by_size(&self, mode: GameMode) -> Vec<(u32, BestRecord)> {
        let prefix = format!("{KEY_PREFIX}{}", mode.best_moves_prefix());
        let keys = match self.repo.keys(&prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                log::warn!("listing {prefix} failed: {err}");
                return Vec::new();
            }
        };
        let mut sizes: Vec<u32> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix)?.parse().ok())
            .collect();
        sizes.sort_unstable();

        let mut records = Vec::with_capacity(sizes.len());
        for size in sizes {
            if let Some(best) = self.best_moves(mode, size).await {
                records.push((size, best));
            }
        }
        records
    }

    pub async fn total_stars(&self) -> u32 {
        self.read(QUIZ_TOTAL_STARS).await.unwrap_or(0)
    }

    pub async fn viewed(&self, mode: GameMode) -> Vec<ItemId> {
        self.read(&mode.viewed_key()).await.unwrap_or_default()
    }

    pub async fn save_viewed(&self, mode: GameMode, viewed: &[ItemId]) {
        self.write(&mode.viewed_key(), &viewed).await;
    }

    /// Append `id` to the mode's viewed list. Returns `false` if it was already there.
    pub async fn mark_viewed(&self, mode: GameMode, id: &ItemId) -> bool {
        let mut viewed = self.viewed(mode).await;
        if viewed.contains(id) {
            return false;
        }
        viewed.push(id.clone());
        self.save_viewed(mode, &viewed).await;
        true
    }

    /// Delete every key owned by the game. Returns how many were removed.
    pub async fn reset_all(&self) -> u64 {
        match self.repo.remove_prefix(KEY_PREFIX).await {
            Ok(removed) => {
                log::info!("progress reset, {removed} keys removed");
                removed
            }
            Err(err) => {
                log::warn!("progress reset failed: {err}");
                0
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full = format!("{KEY_PREFIX}{key}");
        let entry = match self.repo.get(&full).await {
            Ok(entry) => entry?,
            Err(err) => {
                log::warn!("reading {full} failed: {err}");
                return None;
            }
        };
        match serde_json::from_str(&entry.value) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("ignoring malformed {full}: {err}");
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let full = format!("{KEY_PREFIX}{key}");
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("encoding {full} failed: {err}");
                return;
            }
        };
        if let Err(err) = self.repo.put(&full, &json, self.clock.now()).await {
            log::warn!("writing {full} failed: {err}");
        }
    }
}
