use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::patterns::{Outcome, PatternKey, PatternRecord, PriorityConfig};

use super::*;

/// A pattern store shared between threads.
///
/// Every write takes the write lock for its whole duration, so concurrent
/// writes from different clones never interleave. `record_moves` and
/// `reweight` hold it across the whole game or recompute.
/// Reads take the read lock and may run concurrently.
#[derive(Debug)]
pub struct SharedPatternStore<S> {
    inner: Arc<RwLock<S>>,
    config: PriorityConfig,
}

impl<S> Clone for SharedPatternStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config,
        }
    }
}

impl<S: PatternStore> SharedPatternStore<S> {
    pub fn new(store: S) -> Self {
        let config = *store.priority_config();
        Self {
            inner: Arc::new(RwLock::new(store)),
            config,
        }
    }

    pub fn read(&self) -> StoreResult<RwLockReadGuard<'_, S>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    pub fn write(&self) -> StoreResult<RwLockWriteGuard<'_, S>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl<S: PatternStore> PatternStore for SharedPatternStore<S> {
    #[inline]
    fn priority_config(&self) -> &PriorityConfig {
        &self.config
    }

    fn begin_game(&mut self) -> StoreResult<u64> {
        self.write()?.begin_game()
    }

    fn upsert(&mut self, key: PatternKey, outcome: Outcome, score: f64) -> StoreResult<PatternRecord> {
        self.write()?.upsert(key, outcome, score)
    }

    fn get(&self, key: &PatternKey) -> StoreResult<Option<PatternRecord>> {
        self.read()?.get(key)
    }

    fn top(&self, n: usize, filter: &PatternFilter) -> StoreResult<Vec<PatternRecord>> {
        self.read()?.top(n, filter)
    }

    fn keys_with_history(&self) -> StoreResult<Vec<PatternKey>> {
        self.read()?.keys_with_history()
    }

    fn history(&self, key: &PatternKey) -> StoreResult<Vec<HistoryEntry>> {
        self.read()?.history(key)
    }

    fn apply_weighted(&mut self, updates: &[WeightedAggregate]) -> StoreResult<()> {
        self.write()?.apply_weighted(updates)
    }

    fn record_moves(&mut self, observations: &[Observation]) -> StoreResult<u64> {
        self.write()?.record_moves(observations)
    }

    fn reweight(
        &mut self,
        weigh: &dyn Fn(PatternKey, &[HistoryEntry]) -> Option<WeightedAggregate>,
    ) -> StoreResult<usize> {
        self.write()?.reweight(weigh)
    }

    fn len(&self) -> StoreResult<usize> {
        self.read()?.len()
    }
}
