use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::patterns::{Outcome, PatternKey, PatternRecord, PriorityConfig};

use super::*;

/// In-process pattern store. Optionally persisted as a JSON snapshot.
#[derive(Debug, Clone)]
pub struct MemoryPatternStore {
    config: PriorityConfig,
    history_capacity: usize,
    games: u64,
    records: FxHashMap<PatternKey, PatternRecord>,
    history: FxHashMap<PatternKey, HistoryRing>,
}

impl Default for MemoryPatternStore {
    fn default() -> Self {
        Self::new(PriorityConfig::DEFAULT, DEFAULT_HISTORY_CAPACITY)
    }
}

/// Serialized form of a `MemoryPatternStore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub config: PriorityConfig,
    pub history_capacity: usize,
    pub games: u64,
    pub records: Vec<PatternRecord>,
    pub history: Vec<(PatternKey, HistoryRing)>,
}

impl MemoryPatternStore {
    pub fn new(config: PriorityConfig, history_capacity: usize) -> Self {
        Self {
            config,
            history_capacity,
            games: 0,
            records: Default::default(),
            history: Default::default(),
        }
    }

    #[inline]
    pub fn games_recorded(&self) -> u64 {
        self.games
    }

    pub fn to_snapshot(&self) -> MemorySnapshot {
        let mut records: Vec<_> = self.records.values().copied().collect();
        records.sort_by_key(|r| r.key);
        let mut history: Vec<_> = self.history.iter().map(|(k, h)| (*k, h.clone())).collect();
        history.sort_by_key(|(k, _)| *k);
        MemorySnapshot {
            config: self.config,
            history_capacity: self.history_capacity,
            games: self.games,
            records,
            history,
        }
    }

    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        Self {
            config: snapshot.config,
            history_capacity: snapshot.history_capacity,
            games: snapshot.games,
            records: snapshot.records.into_iter().map(|r| (r.key, r)).collect(),
            history: snapshot.history.into_iter().collect(),
        }
    }

    pub fn save_json(&self, path: &Path) -> StoreResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &self.to_snapshot())?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> StoreResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: MemorySnapshot = serde_json::from_reader(reader)?;
        Ok(Self::from_snapshot(snapshot))
    }
}

impl PatternStore for MemoryPatternStore {
    #[inline]
    fn priority_config(&self) -> &PriorityConfig {
        &self.config
    }

    fn begin_game(&mut self) -> StoreResult<u64> {
        self.games += 1;
        Ok(self.games)
    }

    fn upsert(&mut self, key: PatternKey, outcome: Outcome, score: f64) -> StoreResult<PatternRecord> {
        let record = self
            .records
            .entry(key)
            .or_insert_with(|| PatternRecord::never_observed(key));
        record.observe(outcome, score, &self.config);
        let capacity = self.history_capacity;
        self.history
            .entry(key)
            .or_insert_with(|| HistoryRing::new(capacity))
            .push(HistoryEntry {
                game_index: self.games,
                outcome,
                score,
            });
        Ok(*record)
    }

    #[inline]
    fn get(&self, key: &PatternKey) -> StoreResult<Option<PatternRecord>> {
        Ok(self.records.get(key).copied())
    }

    fn top(&self, n: usize, filter: &PatternFilter) -> StoreResult<Vec<PatternRecord>> {
        let mut records: Vec<_> = self.records.values().filter(|r| filter.matches(r)).copied().collect();
        rank_records(&mut records);
        records.truncate(n);
        Ok(records)
    }

    fn keys_with_history(&self) -> StoreResult<Vec<PatternKey>> {
        let mut keys: Vec<_> = self
            .history
            .iter()
            .filter(|(_, h)| !h.is_empty())
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn history(&self, key: &PatternKey) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self
            .history
            .get(key)
            .map(|h| h.iter_recent().copied().collect())
            .unwrap_or_default())
    }

    fn apply_weighted(&mut self, updates: &[WeightedAggregate]) -> StoreResult<()> {
        for update in updates {
            if let Some(record) = self.records.get_mut(&update.key) {
                record.apply_weighted(update.win_rate, update.average_score, &self.config);
            }
        }
        Ok(())
    }

    #[inline]
    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{GamePhase, MoveCategory};

    const KEY: PatternKey = PatternKey::new(1, MoveCategory::Advance, 0, GamePhase::Middlegame);

    #[test]
    fn get_is_none_before_first_upsert() {
        let store = MemoryPatternStore::default();
        assert!(store.get(&KEY).unwrap().is_none());
        assert_eq!(PatternRecord::never_observed(KEY), store.lookup(&KEY));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn upsert_logs_history_under_current_game() {
        let mut store = MemoryPatternStore::default();
        store.begin_game().unwrap();
        store.upsert(KEY, Outcome::Win, 10.0).unwrap();
        let g2 = store.begin_game().unwrap();
        let record = store.upsert(KEY, Outcome::Loss, -20.0).unwrap();
        assert_eq!(2, record.times_seen);
        let history = store.history(&KEY).unwrap();
        assert_eq!(2, history.len());
        assert_eq!(g2, history[0].game_index);
        assert_eq!(Outcome::Loss, history[0].outcome);
        assert_eq!(vec![KEY], store.keys_with_history().unwrap());
    }

    #[test]
    fn history_is_bounded_but_counters_are_not() {
        let mut store = MemoryPatternStore::new(PriorityConfig::DEFAULT, 4);
        for _ in 0..10 {
            store.begin_game().unwrap();
            store.upsert(KEY, Outcome::Draw, 0.0).unwrap();
        }
        assert_eq!(4, store.history(&KEY).unwrap().len());
        assert_eq!(10, store.get(&KEY).unwrap().unwrap().times_seen);
    }

    #[test]
    fn json_snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        let mut store = MemoryPatternStore::default();
        store.begin_game().unwrap();
        store.upsert(KEY, Outcome::Win, 42.5).unwrap();
        store.save_json(&path).unwrap();
        let loaded = MemoryPatternStore::load_json(&path).unwrap();
        assert_eq!(store.get(&KEY).unwrap(), loaded.get(&KEY).unwrap());
        assert_eq!(store.history(&KEY).unwrap(), loaded.history(&KEY).unwrap());
        assert_eq!(1, loaded.games_recorded());
    }

    #[test]
    fn load_json_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MemoryPatternStore::load_json(&dir.path().join("missing.json")).is_err());
    }
}
