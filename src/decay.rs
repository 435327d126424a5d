//! Recency-weighted re-estimation of pattern statistics.
//!
//! The i-th most recent history entry of a key gets weight `decay_rate^i`
//! (the newest has weight 1). Aggregates are computed from the history log
//! alone, so recomputing twice with the same rate yields identical records.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::patterns::{Outcome, PatternKey};
use crate::store::{HistoryEntry, PatternStore, WeightedAggregate};

pub fn validate_decay_rate(decay_rate: f64) -> EngineResult<()> {
    if decay_rate > 0.0 && decay_rate < 1.0 {
        Ok(())
    } else {
        Err(EngineError::Config(format!(
            "decay rate must be in (0, 1), got {decay_rate}"
        )))
    }
}

/// Weighted win rate and average score over `history` (most recent first).
/// `None` for an empty history.
pub fn weighted_aggregate(key: PatternKey, history: &[HistoryEntry], decay_rate: f64) -> Option<WeightedAggregate> {
    if history.is_empty() {
        return None;
    }
    let mut weight = 1.0;
    let mut total_weight = 0.0;
    let mut win_weight = 0.0;
    let mut score_sum = 0.0;
    for entry in history {
        total_weight += weight;
        if entry.outcome == Outcome::Win {
            win_weight += weight;
        }
        score_sum += weight * entry.score;
        weight *= decay_rate;
    }
    Some(WeightedAggregate {
        key,
        win_rate: win_weight / total_weight,
        average_score: score_sum / total_weight,
    })
}

/// Recompute every key with history and write the results back in one batch.
/// Returns the number of keys updated.
pub fn recompute<S: PatternStore + ?Sized>(store: &mut S, decay_rate: f64) -> EngineResult<usize> {
    validate_decay_rate(decay_rate)?;
    let updated = store.reweight(&|key, history| weighted_aggregate(key, history, decay_rate))?;
    info!(keys = updated, decay_rate, "recomputed pattern priorities");
    Ok(updated)
}
