use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{EngineError, EngineResult};
use crate::game_tree_search::*;
use crate::prioritizer::MovePrioritizer;
use crate::scorer::DifferentialScorer;
use crate::store::PatternStore;
use crate::{cons, linked_list};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched below the root.
    pub depth: u8,
    /// Log every search with its counters and principal variation.
    pub debug: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { depth: 4, debug: false }
    }
}

impl SearchConfig {
    pub fn new(depth: u8, debug: bool) -> Self {
        Self { depth, debug }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.depth == 0 {
            return Err("search depth must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Copy, Clone)]
struct SearchState {
    pub maximize_player: PlayerId,
    pub depth: u8,
    /// (alpha, beta), both from the maximizing player's point of view.
    pub ab: (f64, f64),
}

/// Depth-bounded alpha-beta minimax whose candidate moves are ordered and
/// filtered by learned pattern priority.
///
/// Borrows its collaborators for the duration of one or more searches; the
/// store is only read.
pub struct PrioritizedMinimax<'a, S: PatternStore + ?Sized> {
    pub config: SearchConfig,
    store: &'a S,
    scorer: &'a DifferentialScorer,
    prioritizer: &'a mut MovePrioritizer,
}

impl<'a, S: PatternStore + ?Sized> PrioritizedMinimax<'a, S> {
    pub fn new(
        config: SearchConfig,
        store: &'a S,
        scorer: &'a DifferentialScorer,
        prioritizer: &'a mut MovePrioritizer,
    ) -> Self {
        Self {
            config,
            store,
            scorer,
            prioritizer,
        }
    }

    #[inline]
    fn eval_position<G: Game>(&self, game: &G, maximize_player: PlayerId) -> SearchResult<G> {
        let eval = self.scorer.score(game, maximize_player);
        let counter = SearchCounter {
            evals: 1,
            ..SearchCounter::ZERO
        };
        SearchResult::new(linked_list![], eval, counter)
    }

    fn minimax<G: Game>(&mut self, game: &G, ss: SearchState) -> EngineResult<SearchResult<G>> {
        let SearchState {
            maximize_player,
            depth,
            ab,
        } = ss;

        if game.is_terminal() || depth == 0 {
            return Ok(self.eval_position(game, maximize_player));
        }

        let turn = game.turn_number();
        let Some(to_move) = game.to_move() else {
            return Err(EngineError::NoSideToMove { turn });
        };
        let actions: Vec<G::Action> = game.legal_moves(to_move).into_iter().collect();
        if actions.is_empty() {
            return Err(EngineError::NoLegalMoves { side: to_move, turn });
        }

        let ranked = self
            .prioritizer
            .rank(game, to_move, actions, self.store, self.scorer)?;
        let (candidates, stats) = self.prioritizer.filter(ranked);

        let mut counter = SearchCounter {
            priority_prunes: stats.pruned,
            forced_searches: stats.forced_kept,
            ..SearchCounter::ZERO
        };
        let maximizing = to_move == maximize_player;
        let (mut alpha, mut beta) = ab;
        let mut best: Option<(f64, PV<G>)> = None;

        for candidate in candidates {
            counter.states_visited += 1;
            let res = self.minimax(
                &candidate.state,
                SearchState {
                    depth: depth - 1,
                    ab: (alpha, beta),
                    ..ss
                },
            )?;
            counter.add_in_place(&res.counter);
            trace!(depth, action = ?candidate.action, eval = res.eval, blended = candidate.blended);

            let improves = match &best {
                None => true,
                Some((eval, _)) if maximizing => res.eval > *eval,
                Some((eval, _)) => res.eval < *eval,
            };
            if improves {
                best = Some((res.eval, cons!(candidate.action, res.pv)));
            }

            if let Some((eval, _)) = &best {
                if maximizing {
                    alpha = alpha.max(*eval);
                } else {
                    beta = beta.min(*eval);
                }
            }
            if alpha >= beta {
                counter.beta_prunes += 1;
                break;
            }
        }

        // The filter always keeps at least one candidate.
        let Some((eval, pv)) = best else {
            return Err(EngineError::NoLegalMoves { side: to_move, turn });
        };
        Ok(SearchResult::new(pv, eval, counter))
    }
}

impl<'a, G: Game, S: PatternStore + ?Sized> GameTreeSearch<G> for PrioritizedMinimax<'a, S> {
    fn search(&mut self, position: &G, maximize_player: PlayerId) -> EngineResult<SearchResult<G>> {
        self.config.validate().map_err(EngineError::Config)?;
        let t0 = Instant::now();
        let res = self.minimax(
            position,
            SearchState {
                maximize_player,
                depth: self.config.depth,
                ab: (f64::NEG_INFINITY, f64::INFINITY),
            },
        )?;
        if self.config.debug {
            let dt_ns = t0.elapsed().as_nanos();
            debug!(
                player = %maximize_player,
                depth = self.config.depth,
                eval = res.eval,
                pv = ?res.pv.to_vec(),
                counter = ?res.counter,
                "{}",
                res.counter.summary(dt_ns)
            );
        }
        Ok(res)
    }
}
