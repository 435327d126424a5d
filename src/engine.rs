use std::marker::PhantomData;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decay;
use crate::error::{EngineError, EngineResult};
use crate::game_tree_search::{Game, GameTreeSearch, PlayerId, SearchResult};
use crate::learning::{self, GameRecord, GameRecorder, LearningSummary};
use crate::minimax::{PrioritizedMinimax, SearchConfig};
use crate::patterns::{PatternRecord, PriorityConfig};
use crate::prioritizer::{MovePrioritizer, PrioritizerConfig};
use crate::scorer::{DifferentialScorer, ScorerConfig};
use crate::store::{MemoryPatternStore, PatternFilter, PatternStore, DEFAULT_HISTORY_CAPACITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub priority: PriorityConfig,
    pub scorer: ScorerConfig,
    pub prioritizer: PrioritizerConfig,
    pub search: SearchConfig,
    /// Self-play games stop (and are learned as draws) after this many moves.
    pub max_game_moves: u32,
    /// History entries kept per pattern key for recency weighting.
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            priority: PriorityConfig::DEFAULT,
            scorer: ScorerConfig::default(),
            prioritizer: PrioritizerConfig::default(),
            search: SearchConfig::default(),
            max_game_moves: 500,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.priority
            .validate()
            .and_then(|_| self.scorer.validate())
            .and_then(|_| self.prioritizer.validate())
            .and_then(|_| self.search.validate())
            .map_err(EngineError::Config)?;
        if self.max_game_moves == 0 {
            return Err(EngineError::Config("max_game_moves must be at least 1".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(EngineError::Config("history_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn memory_store(&self) -> MemoryPatternStore {
        MemoryPatternStore::new(self.priority, self.history_capacity)
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite_store(&self, path: &Path) -> EngineResult<crate::store::SqlitePatternStore> {
        Ok(crate::store::SqlitePatternStore::open(
            path,
            self.priority,
            self.history_capacity,
        )?)
    }
}

/// Move selection and learning for one game type over one pattern store.
pub struct PatternEngine<G: Game, S: PatternStore> {
    config: EngineConfig,
    store: S,
    scorer: DifferentialScorer,
    prioritizer: MovePrioritizer,
    _phantom: PhantomData<fn() -> G>,
}

impl<G: Game, S: PatternStore> PatternEngine<G, S> {
    pub fn new(config: EngineConfig, store: S) -> EngineResult<Self> {
        config.validate()?;
        if *store.priority_config() != config.priority {
            warn!(
                store = ?store.priority_config(),
                engine = ?config.priority,
                "store priority config differs from engine config, the store's is used"
            );
        }
        let scorer = DifferentialScorer::new(config.scorer.clone());
        let prioritizer = MovePrioritizer::new(config.prioritizer.clone())?;
        Ok(Self {
            config,
            store,
            scorer,
            prioritizer,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    #[inline]
    pub fn scorer(&self) -> &DifferentialScorer {
        &self.scorer
    }

    /// Full search result for `side` to move at `state`.
    pub fn search_position(&mut self, state: &G, side: PlayerId, depth: u8) -> EngineResult<SearchResult<G>> {
        let turn = state.turn_number();
        if state.is_terminal() {
            return Err(EngineError::GameOver { turn });
        }
        if state.to_move() != Some(side) {
            return Err(EngineError::NotToMove { side, turn });
        }
        let config = SearchConfig {
            depth,
            ..self.config.search
        };
        PrioritizedMinimax::new(config, &self.store, &self.scorer, &mut self.prioritizer).search(state, side)
    }

    pub fn choose_move(&mut self, state: &G, side: PlayerId, depth: u8) -> EngineResult<G::Action> {
        let res = self.search_position(state, side, depth)?;
        res.best_move().ok_or(EngineError::NoLegalMoves {
            side,
            turn: state.turn_number(),
        })
    }

    /// Learn from a finished game. Every key is checked against the game's
    /// key space before anything is written.
    pub fn record_game(&mut self, record: &GameRecord) -> EngineResult<LearningSummary> {
        record.validate_keys(&G::KEY_SPACE)?;
        learning::record_game(&mut self.store, record)
    }

    pub fn recompute_priorities(&mut self, decay_rate: f64) -> EngineResult<usize> {
        decay::recompute(&mut self.store, decay_rate)
    }

    pub fn inspect_top_patterns(&self, n: usize) -> EngineResult<Vec<PatternRecord>> {
        self.inspect_top_patterns_filtered(n, &PatternFilter::default())
    }

    pub fn inspect_top_patterns_filtered(&self, n: usize, filter: &PatternFilter) -> EngineResult<Vec<PatternRecord>> {
        Ok(self.store.top(n, filter)?)
    }

    /// Play one game with the engine choosing for both sides. Games reaching
    /// `max_game_moves` are returned as aborted.
    pub fn play_self_play_game(&mut self, initial: &G, depth: u8) -> EngineResult<GameRecord> {
        let mut state = initial.clone();
        let mut recorder = GameRecorder::new();
        let mut moves = 0u32;
        while !state.is_terminal() && moves < self.config.max_game_moves {
            let turn = state.turn_number();
            let side = state.to_move().ok_or(EngineError::NoSideToMove { turn })?;
            let action = self.choose_move(&state, side, depth)?;
            let next = state.apply(action).map_err(|e| EngineError::Rules(e.to_string()))?;
            recorder.observe(&state, &next, action, side)?;
            state = next;
            moves += 1;
        }
        let record = recorder.finish(&state, &self.scorer);
        debug!(moves, result = ?record.result, final_score = ?record.final_score, "self-play game finished");
        Ok(record)
    }
}
