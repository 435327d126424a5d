use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::game_tree_search::{Game, PlayerId};
use crate::patterns::PatternKey;
use crate::scorer::DifferentialScorer;
use crate::store::PatternStore;

/// Upper bound on the exploration weight `gamma`.
pub const MAX_EXPLORATION: f64 = 0.1;

/// Blend of learned priority, immediate heuristic and exploration noise:
///
/// ```text
/// blended = alpha * normalize(priority) + beta * normalize(heuristic) + gamma * U[0, 1)
/// ```
///
/// Blended scores lie in `[0, 1]`, so the default `filter_threshold` of 0 keeps
/// every move: learned pruning is off until a positive threshold is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritizerConfig {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Heuristic score magnitude mapped to `tanh(1)` by the normalization.
    pub heuristic_scale: f64,
    /// Moves blending below this value are not searched, unless forced.
    pub filter_threshold: f64,
    /// The best-ranked moves always searched regardless of the threshold.
    pub min_candidates: usize,
    /// Seed for the exploration noise; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for PrioritizerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.3,
            gamma: 0.1,
            heuristic_scale: 100.0,
            filter_threshold: 0.0,
            min_candidates: 1,
            seed: None,
        }
    }
}

impl PrioritizerConfig {
    pub fn validate(&self) -> Result<(), String> {
        let weights = [self.alpha, self.beta, self.gamma];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(format!("blend weights must be non-negative, got {weights:?}"));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("blend weights must sum to 1, got {sum}"));
        }
        if self.gamma > MAX_EXPLORATION + 1e-12 {
            return Err(format!("gamma must not exceed {MAX_EXPLORATION}, got {}", self.gamma));
        }
        if !(self.heuristic_scale.is_finite() && self.heuristic_scale > 0.0) {
            return Err(format!("heuristic_scale must be positive, got {}", self.heuristic_scale));
        }
        if self.min_candidates == 0 {
            return Err("min_candidates must be at least 1".to_string());
        }
        Ok(())
    }
}

/// A legal move with its successor state and ranking data.
#[derive(Debug, Clone)]
pub struct RankedMove<G: Game> {
    pub action: G::Action,
    pub state: G,
    pub key: PatternKey,
    /// Learned priority of `key`, centred scale.
    pub priority: f64,
    /// Score of the successor from the mover's point of view.
    pub heuristic: f64,
    pub blended: f64,
    /// Must be searched regardless of priority.
    pub forced: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub pruned: u64,
    /// Moves below the threshold kept because they were forced.
    pub forced_kept: u64,
}

pub struct MovePrioritizer {
    config: PrioritizerConfig,
    rng: SmallRng,
}

impl MovePrioritizer {
    pub fn new(config: PrioritizerConfig) -> EngineResult<Self> {
        config.validate().map_err(EngineError::Config)?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    #[inline]
    pub fn config(&self) -> &PrioritizerConfig {
        &self.config
    }

    /// Centred priority in `[-1, 1]` onto `[0, 1]`; the neutral priority maps to 0.5.
    #[inline]
    pub fn normalize_priority(priority: f64) -> f64 {
        (0.5 * (priority + 1.0)).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn normalize_heuristic(&self, heuristic: f64) -> f64 {
        0.5 + 0.5 * (heuristic / self.config.heuristic_scale).tanh()
    }

    #[inline]
    pub fn blend(&self, priority: f64, heuristic: f64, noise: f64) -> f64 {
        let PrioritizerConfig { alpha, beta, gamma, .. } = self.config;
        alpha * Self::normalize_priority(priority) + beta * self.normalize_heuristic(heuristic) + gamma * noise
    }

    /// Classify, look up and score every move; forced moves first, then by blended score.
    pub fn rank<G, S, I>(
        &mut self,
        state: &G,
        side: PlayerId,
        actions: I,
        store: &S,
        scorer: &DifferentialScorer,
    ) -> EngineResult<Vec<RankedMove<G>>>
    where
        G: Game,
        S: PatternStore + ?Sized,
        I: IntoIterator<Item = G::Action>,
    {
        let mut ranked = Vec::new();
        for action in actions {
            let next = state.apply(action).map_err(|e| EngineError::Rules(e.to_string()))?;
            let key = G::classify(state, &next, action, side);
            G::KEY_SPACE
                .validate(&key)
                .map_err(|reason| EngineError::InvalidPatternKey { key, reason })?;
            let priority = store.lookup(&key).priority;
            let heuristic = scorer.score(&next, side);
            let forced = state.is_decisive(action) || (next.is_terminal() && next.winner() == Some(side));
            let noise = if self.config.gamma > 0.0 {
                self.rng.gen::<f64>()
            } else {
                0.0
            };
            let blended = self.blend(priority, heuristic, noise);
            ranked.push(RankedMove {
                action,
                state: next,
                key,
                priority,
                heuristic,
                blended,
                forced,
            });
        }
        ranked.sort_by(|a, b| b.forced.cmp(&a.forced).then(b.blended.total_cmp(&a.blended)));
        Ok(ranked)
    }

    /// Drop moves below the threshold. Forced moves and the first
    /// `min_candidates` entries of `ranked` always survive.
    pub fn filter<G: Game>(&self, ranked: Vec<RankedMove<G>>) -> (Vec<RankedMove<G>>, FilterStats) {
        let mut stats = FilterStats::default();
        let threshold = self.config.filter_threshold;
        let min_candidates = self.config.min_candidates;
        let kept = ranked
            .into_iter()
            .enumerate()
            .filter_map(|(i, m)| {
                if m.blended >= threshold || i < min_candidates {
                    Some(m)
                } else if m.forced {
                    stats.forced_kept += 1;
                    Some(m)
                } else {
                    stats.pruned += 1;
                    None
                }
            })
            .collect();
        (kept, stats)
    }
}
