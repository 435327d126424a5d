use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::patterns::Outcome;

/// Default number of history entries retained per pattern key.
///
/// With any decay rate below 0.97 the weight of the oldest retained entry is
/// under 1e-3 of the newest.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// One observation of a key in one game. Never mutated once logged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub game_index: u64,
    pub outcome: Outcome,
    pub score: f64,
}

/// Fixed-capacity append-only log; the oldest entry is evicted when full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries from most recent to oldest.
    pub fn iter_recent(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter().rev()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(game_index: u64) -> HistoryEntry {
        HistoryEntry {
            game_index,
            outcome: Outcome::Draw,
            score: game_index as f64,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut ring = HistoryRing::new(3);
        for i in 1..=5 {
            ring.push(entry(i));
        }
        assert_eq!(3, ring.len());
        let games: Vec<_> = ring.iter_recent().map(|e| e.game_index).collect();
        assert_eq!(vec![5, 4, 3], games);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut ring = HistoryRing::new(0);
        ring.push(entry(1));
        ring.push(entry(2));
        assert_eq!(1, ring.capacity());
        assert_eq!(Some(2), ring.iter_recent().next().map(|e| e.game_index));
    }
}
