use serde::{Deserialize, Serialize};

use crate::game_tree_search::{Game, PlayerId};
use crate::patterns::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Feature weights. When empty, `Game::FEATURE_WEIGHTS` is used.
    pub weights: Vec<f64>,
    /// Added to a won position.
    pub win_constant: f64,
    /// Subtracted from a lost position.
    pub loss_constant: f64,
    /// Speed bonus for a win on turn 0; decays as `scale / (1 + turns)`.
    pub speed_bonus_scale: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            win_constant: 10_000.0,
            loss_constant: 10_000.0,
            speed_bonus_scale: 1_000.0,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("win_constant", self.win_constant),
            ("loss_constant", self.loss_constant),
            ("speed_bonus_scale", self.speed_bonus_scale),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(format!("{name} must be positive, got {v}"));
            }
        }
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite()) {
            return Err(format!("feature weights must be finite, got {w}"));
        }
        Ok(())
    }

    /// Largest advantage differential magnitude for which every loss scores
    /// below every draw and every draw below every win.
    pub fn plausible_advantage_bound(&self) -> f64 {
        0.5 * self.win_constant.min(self.loss_constant)
    }
}

/// Turns a position into a signed advantage for one side.
#[derive(Debug, Clone, Default)]
pub struct DifferentialScorer {
    config: ScorerConfig,
}

impl DifferentialScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    #[inline]
    fn weight<G: Game>(&self, index: usize) -> f64 {
        let weights = if self.config.weights.is_empty() {
            G::FEATURE_WEIGHTS
        } else {
            &self.config.weights[..]
        };
        weights.get(index).copied().unwrap_or(1.0)
    }

    /// Weighted sum of `side`'s features.
    pub fn advantage<G: Game>(&self, state: &G, side: PlayerId) -> f64 {
        state
            .feature_vector(side)
            .iter()
            .enumerate()
            .map(|(i, x)| self.weight::<G>(i) * x)
            .sum()
    }

    #[inline]
    pub fn differential<G: Game>(&self, state: &G, side: PlayerId) -> f64 {
        self.advantage(state, side) - self.advantage(state, side.opposite())
    }

    #[inline]
    pub fn speed_bonus(&self, turns: u32) -> f64 {
        self.config.speed_bonus_scale / (1.0 + turns as f64)
    }

    /// Apply the terminal rule to a differential.
    pub fn terminal_score(&self, differential: f64, turns: u32, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Win => differential + self.speed_bonus(turns) + self.config.win_constant,
            Outcome::Loss => differential - self.config.loss_constant,
            Outcome::Draw => differential,
        }
    }

    /// Score `state` from `side`'s point of view. Terminal states take the
    /// win/loss/draw rule; everything else is the plain differential.
    pub fn score<G: Game>(&self, state: &G, side: PlayerId) -> f64 {
        let differential = self.differential(state, side);
        if state.is_terminal() {
            let outcome = Outcome::from_winner(state.winner(), side);
            self.terminal_score(differential, state.turn_number(), outcome)
        } else {
            differential
        }
    }
}
