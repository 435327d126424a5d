use serde::{Deserialize, Serialize};

use crate::game_tree_search::PlayerId;

use super::PatternKey;

/// Result of a game from one side's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Outcome for `side` given the winner of a finished game (`None` is a draw).
    #[inline]
    pub fn from_winner(winner: Option<PlayerId>, side: PlayerId) -> Self {
        match winner {
            Some(w) if w == side => Outcome::Win,
            Some(_) => Outcome::Loss,
            None => Outcome::Draw,
        }
    }
}

/// Priority on the centred scale assigned to a never-observed pattern.
pub const NEUTRAL_PRIORITY: f64 = 0.0;

/// Constants of the priority formula.
///
/// ```text
/// confidence  = min(1, times_seen / saturation)
/// performance = (1 - score_weight) * win_rate + score_weight * squash(average_score)
/// priority    = confidence * (2 * performance - 1)          in [-1, 1]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Observation count at which confidence reaches 1.
    pub saturation: f64,
    /// Share of `performance` taken from the squashed average score.
    pub score_weight: f64,
    /// Score magnitude mapped to `tanh(1)` by the squash.
    pub score_scale: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PriorityConfig {
    pub const DEFAULT: Self = Self {
        saturation: 20.0,
        score_weight: 0.25,
        score_scale: 1000.0,
    };

    pub fn validate(&self) -> Result<(), String> {
        if !(self.saturation.is_finite() && self.saturation > 0.0) {
            return Err(format!("saturation must be positive, got {}", self.saturation));
        }
        if !(0.0..=1.0).contains(&self.score_weight) {
            return Err(format!("score_weight must be in [0, 1], got {}", self.score_weight));
        }
        if !(self.score_scale.is_finite() && self.score_scale > 0.0) {
            return Err(format!("score_scale must be positive, got {}", self.score_scale));
        }
        Ok(())
    }

    #[inline]
    pub fn confidence(&self, times_seen: u64) -> f64 {
        (times_seen as f64 / self.saturation).min(1.0)
    }

    /// Maps a differential score onto `(0, 1)`, 0.5 at zero.
    #[inline]
    pub fn squash_score(&self, score: f64) -> f64 {
        0.5 + 0.5 * (score / self.score_scale).tanh()
    }

    #[inline]
    pub fn performance(&self, win_rate: f64, average_score: f64) -> f64 {
        (1.0 - self.score_weight) * win_rate + self.score_weight * self.squash_score(average_score)
    }

    #[inline]
    pub fn priority(&self, confidence: f64, win_rate: f64, average_score: f64) -> f64 {
        confidence * (2.0 * self.performance(win_rate, average_score) - 1.0)
    }
}

#[inline]
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Accumulated outcome statistics for one pattern key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub key: PatternKey,
    pub times_seen: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub cumulative_score: f64,
    pub average_score: f64,
    pub confidence: f64,
    pub win_rate: f64,
    pub priority: f64,
}

impl PatternRecord {
    /// Sentinel for a key with no observations.
    pub const fn never_observed(key: PatternKey) -> Self {
        Self {
            key,
            times_seen: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            cumulative_score: 0.0,
            average_score: 0.0,
            confidence: 0.0,
            win_rate: 0.0,
            priority: NEUTRAL_PRIORITY,
        }
    }

    #[inline]
    pub fn is_observed(&self) -> bool {
        self.times_seen > 0
    }

    /// Count one more occurrence ending in `outcome` with terminal score `score`.
    pub fn observe(&mut self, outcome: Outcome, score: f64, config: &PriorityConfig) {
        self.times_seen += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.cumulative_score += score;
        self.refresh(config);
    }

    /// Recompute the derived fields from the raw counters.
    pub fn refresh(&mut self, config: &PriorityConfig) {
        let decided = (self.wins + self.losses + self.draws) as f64;
        self.win_rate = ratio(self.wins as f64, decided);
        self.average_score = ratio(self.cumulative_score, self.times_seen as f64);
        self.confidence = config.confidence(self.times_seen);
        self.priority = config.priority(self.confidence, self.win_rate, self.average_score);
    }

    /// Replace the derived fields with recency-weighted aggregates.
    /// Raw counters are left untouched. The next `observe` on this record
    /// refreshes it from the raw counters again, so between recomputes the
    /// keys observed since the last one rank on unweighted statistics while
    /// the rest keep their weighted ones.
    pub fn apply_weighted(&mut self, win_rate: f64, average_score: f64, config: &PriorityConfig) {
        self.win_rate = win_rate;
        self.average_score = average_score;
        self.confidence = config.confidence(self.times_seen);
        self.priority = config.priority(self.confidence, win_rate, average_score);
    }
}
