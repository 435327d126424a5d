use enumset::EnumSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreResult;
use crate::patterns::{GamePhase, MoveCategory, Outcome, PatternKey, PatternRecord, PriorityConfig};

mod history;
pub use history::*;

mod memory;
pub use memory::*;

mod shared;
pub use shared::*;

#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::*;

/// Recency-weighted statistics for one key, produced by the decay re-weighter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedAggregate {
    pub key: PatternKey,
    pub win_rate: f64,
    pub average_score: f64,
}

/// One pattern occurrence of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub key: PatternKey,
    pub outcome: Outcome,
    pub score: f64,
}

impl Observation {
    #[inline]
    pub const fn new(key: PatternKey, outcome: Outcome, score: f64) -> Self {
        Self { key, outcome, score }
    }
}

/// Persistent table of pattern statistics plus the bounded per-key history log.
///
/// Writes take `&mut self`: a store has a single writer at a time. Use
/// `SharedPatternStore` to share one store between threads.
pub trait PatternStore {
    fn priority_config(&self) -> &PriorityConfig;

    /// Start logging a new game. Later `upsert` calls are attributed to the returned index.
    fn begin_game(&mut self) -> StoreResult<u64>;

    /// Count one occurrence of `key` ending in `outcome` with terminal score `score`.
    fn upsert(&mut self, key: PatternKey, outcome: Outcome, score: f64) -> StoreResult<PatternRecord>;

    /// `None` means the key has never been observed.
    fn get(&self, key: &PatternKey) -> StoreResult<Option<PatternRecord>>;

    /// Highest-priority records matching `filter`, best first.
    fn top(&self, n: usize, filter: &PatternFilter) -> StoreResult<Vec<PatternRecord>>;

    /// Keys that have at least one history entry.
    fn keys_with_history(&self) -> StoreResult<Vec<PatternKey>>;

    /// History entries of `key`, most recent first.
    fn history(&self, key: &PatternKey) -> StoreResult<Vec<HistoryEntry>>;

    /// Overwrite the derived statistics of several keys in one batch.
    fn apply_weighted(&mut self, updates: &[WeightedAggregate]) -> StoreResult<()>;

    /// Log a whole game as one unit: `begin_game` followed by one `upsert`
    /// per observation. Returns the game index. On error no part of the game
    /// is kept by backends whose writes can fail.
    fn record_moves(&mut self, observations: &[Observation]) -> StoreResult<u64> {
        let game_index = self.begin_game()?;
        for o in observations {
            self.upsert(o.key, o.outcome, o.score)?;
        }
        Ok(game_index)
    }

    /// Replace the derived statistics of every key with history by what
    /// `weigh` computes from that history. Reads and the final batch write
    /// happen as one unit. Returns the number of keys updated.
    fn reweight(
        &mut self,
        weigh: &dyn Fn(PatternKey, &[HistoryEntry]) -> Option<WeightedAggregate>,
    ) -> StoreResult<usize> {
        let mut updates = Vec::new();
        for key in self.keys_with_history()? {
            let history = self.history(&key)?;
            if let Some(update) = weigh(key, &history) {
                updates.push(update);
            }
        }
        self.apply_weighted(&updates)?;
        Ok(updates.len())
    }

    /// Number of distinct keys observed.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Like `get`, but never fails: absent keys and read failures both yield
    /// the never-observed sentinel so move ordering can proceed degraded.
    fn lookup(&self, key: &PatternKey) -> PatternRecord {
        match self.get(key) {
            Ok(Some(record)) => record,
            Ok(None) => PatternRecord::never_observed(*key),
            Err(e) => {
                warn!(key = ?key, error = %e, "pattern store read failed, using neutral priority");
                PatternRecord::never_observed(*key)
            }
        }
    }
}

/// Selection criteria for `PatternStore::top`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFilter {
    pub categories: EnumSet<MoveCategory>,
    pub phases: EnumSet<GamePhase>,
    pub unit_type: Option<u8>,
    pub min_times_seen: u64,
}

impl Default for PatternFilter {
    fn default() -> Self {
        Self {
            categories: EnumSet::all(),
            phases: EnumSet::all(),
            unit_type: None,
            min_times_seen: 0,
        }
    }
}

impl PatternFilter {
    pub fn categories(self, categories: EnumSet<MoveCategory>) -> Self {
        Self { categories, ..self }
    }

    pub fn phases(self, phases: EnumSet<GamePhase>) -> Self {
        Self { phases, ..self }
    }

    pub fn unit_type(self, unit_type: u8) -> Self {
        Self {
            unit_type: Some(unit_type),
            ..self
        }
    }

    pub fn min_times_seen(self, min_times_seen: u64) -> Self {
        Self { min_times_seen, ..self }
    }

    pub fn matches(&self, record: &PatternRecord) -> bool {
        let key = &record.key;
        self.categories.contains(key.category)
            && self.phases.contains(key.phase)
            && self.unit_type.map_or(true, |u| u == key.unit_type)
            && record.times_seen >= self.min_times_seen
    }
}

/// Ordering used by every `top` implementation: priority, then sample size, then key.
pub(crate) fn rank_records(records: &mut [PatternRecord]) {
    records.sort_by(|a, b| {
        b.priority
            .total_cmp(&a.priority)
            .then(b.times_seen.cmp(&a.times_seen))
            .then(a.key.cmp(&b.key))
    });
}
