use std::ops::Add;

mod by_player;
pub use by_player::*;

mod game_trait;
pub use game_trait::*;

use serde::{Deserialize, Serialize};

use crate::{data_structures::LinkedList, error::EngineResult, linked_list};

/// Principal Variation: the sequence of moves the search considers best play for both sides.
#[allow(type_alias_bounds)]
pub type PV<G: Game> = LinkedList<G::Action>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCounter {
    /// Number of states visited through game state advancements.
    pub states_visited: u64,
    /// Number of times a board position was scored (zero depth or terminal).
    pub evals: u64,
    /// Number of times the alpha-beta cutoff condition has been reached.
    pub beta_prunes: u64,
    /// Number of candidate moves dropped by the learned priority threshold.
    pub priority_prunes: u64,
    /// Number of moves kept only because they were forced (decisive or immediately winning).
    pub forced_searches: u64,
}

impl SearchCounter {
    pub const ZERO: SearchCounter = SearchCounter {
        states_visited: 0,
        evals: 0,
        beta_prunes: 0,
        priority_prunes: 0,
        forced_searches: 0,
    };

    #[inline]
    pub fn add_in_place(&mut self, c: &SearchCounter) {
        self.states_visited += c.states_visited;
        self.evals += c.evals;
        self.beta_prunes += c.beta_prunes;
        self.priority_prunes += c.priority_prunes;
        self.forced_searches += c.forced_searches;
    }

    pub fn summary(&self, dt_ns: u128) -> String {
        let dt_ms: f64 = 1e-6 * (dt_ns as f64);
        let rate: f64 = 1e3 * (self.states_visited as f64) / (dt_ns.max(1) as f64);
        format!(
            "dt={dt_ms:.2}ms rate={rate:.4} Mstates/s pruned={}+{}",
            self.beta_prunes, self.priority_prunes
        )
    }
}

impl Add for SearchCounter {
    type Output = SearchCounter;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        let mut a = self;
        a.add_in_place(&rhs);
        a
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult<G: Game> {
    /// Principal Variation
    pub pv: PV<G>,
    /// Evaluation of the root from the searching side's point of view.
    pub eval: f64,
    pub counter: SearchCounter,
}

impl<G: Game> Default for SearchResult<G> {
    fn default() -> Self {
        SearchResult::new(linked_list![], f64::NEG_INFINITY, Default::default())
    }
}

impl<G: Game> SearchResult<G> {
    #[inline]
    pub(crate) fn new(pv: PV<G>, eval: f64, counter: SearchCounter) -> Self {
        SearchResult { pv, eval, counter }
    }

    /// The move to play, if the search found one.
    #[inline]
    pub fn best_move(&self) -> Option<G::Action> {
        self.pv.head()
    }
}

pub trait GameTreeSearch<G: Game> {
    fn search(&mut self, position: &G, maximize_player: PlayerId) -> EngineResult<SearchResult<G>>;
}
