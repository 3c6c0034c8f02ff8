use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::HashSet;

use gefen_core::model::{Catalog, ContentItem, DistractorPolicy, OddRound};

/// Pick up to `count` items in random order.
pub fn pick_questions<R: Rng + ?Sized>(
    items: &[ContentItem],
    count: usize,
    rng: &mut R,
) -> Vec<ContentItem> {
    let mut picked = items.to_vec();
    picked.shuffle(rng);
    picked.truncate(count);
    picked
}

/// Draws wrong options for a question from a fixed pool.
#[derive(Debug, Clone)]
pub struct DistractorPicker {
    pool: Vec<ContentItem>,
    policy: DistractorPolicy,
}

impl DistractorPicker {
    #[must_use]
    pub fn new(pool: Vec<ContentItem>, policy: DistractorPolicy) -> Self {
        Self { pool, policy }
    }

    /// How many pool items could stand in as a wrong option for `answer`.
    #[must_use]
    pub fn available_for(&self, answer: &ContentItem) -> usize {
        self.pool.iter().filter(|p| p.id() != answer.id()).count()
    }

    /// Draw `count` distractors for question `index`.
    ///
    /// Items sharing the answer's category and the rest are shuffled
    /// separately; the policy decides which group is drawn from first.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        answer: &ContentItem,
        count: usize,
        index: usize,
        rng: &mut R,
    ) -> Vec<ContentItem> {
        let (mut same, mut other): (Vec<_>, Vec<_>) = self
            .pool
            .iter()
            .filter(|p| p.id() != answer.id())
            .cloned()
            .partition(|p| answer.category().is_some() && p.category() == answer.category());
        same.shuffle(rng);
        other.shuffle(rng);

        let ordered = if self.policy.prefers_same_category(index) {
            same.into_iter().chain(other)
        } else {
            other.into_iter().chain(same)
        };
        ordered.take(count).collect()
    }
}

/// Build up to `count` distinct odd-one-out rounds from a categorized catalog.
///
/// Every category with at least three items can be the main group, paired
/// with every other non-empty category as the odd one. Candidate pairings are
/// shuffled and at most twice `count` are tried; a round whose exact item
/// combination was already drawn is skipped, so fewer rounds may come back.
pub fn plan_odd_rounds<R: Rng + ?Sized>(
    catalog: &Catalog,
    count: usize,
    rng: &mut R,
) -> Vec<OddRound> {
    let mut pairings = Vec::new();
    for main in catalog.categories() {
        let same: Vec<&ContentItem> = catalog.items_in(&main.id).collect();
        if same.len() < 3 {
            continue;
        }
        for odd in catalog.categories() {
            if odd.id == main.id {
                continue;
            }
            let odd_items: Vec<&ContentItem> = catalog.items_in(&odd.id).collect();
            if odd_items.is_empty() {
                continue;
            }
            pairings.push((main, same.clone(), odd, odd_items));
        }
    }
    pairings.shuffle(rng);
    pairings.truncate(count.saturating_mul(2));

    let mut seen = HashSet::new();
    let mut rounds = Vec::with_capacity(count);
    for (main, same, odd, odd_items) in pairings {
        if rounds.len() >= count {
            break;
        }
        let picked: Vec<ContentItem> = same
            .choose_multiple(rng, 3)
            .map(|item| (*item).clone())
            .collect();
        let Some(odd_item) = odd_items.choose(rng) else {
            continue;
        };

        let mut ids: Vec<&str> = picked.iter().map(|i| i.id().as_str()).collect();
        ids.sort_unstable();
        let key = format!("{}|{}", ids.join(","), odd_item.id());
        if !seen.insert(key) {
            continue;
        }

        rounds.push(OddRound {
            main_category: main.id.clone(),
            odd_category: odd.id.clone(),
            same: picked,
            odd: (*odd_item).clone(),
        });
    }
    rounds
}
