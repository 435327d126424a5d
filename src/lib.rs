#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![doc = include_str!("../README.md")]

/// Module containing collection datatypes used by this crate.
pub mod data_structures;

/// Error types shared by the search core and the pattern stores.
pub mod error;

/// The collaborator contract every game implements, plus search result types.
pub mod game_tree_search;

/// Pattern keys, pattern records and the priority formula.
pub mod patterns;

/// Persistent pattern statistics.
pub mod store;

/// Differential scoring of positions.
pub mod scorer;

/// Learned move ordering and filtering.
pub mod prioritizer;

/// Implementation for prioritized minimax search
pub mod minimax;

/// Recency-weighted re-estimation of pattern priorities.
pub mod decay;

/// Post-game statistics updates.
pub mod learning;

/// Entry points used by training wrappers.
pub mod engine;

/// Re-exports the `smallvec` crate
pub use smallvec;

/// Re-exports the `rand` create
pub use rand;

/// Re-exports the `enum_map` crate
pub use enum_map;

/// Re-exports the `enumset` crate
pub use enumset;

pub mod prelude {
    pub use crate::engine::{EngineConfig, PatternEngine};
    pub use crate::error::{EngineError, StoreError};
    pub use crate::game_tree_search::{ByPlayer, FeatureVector, Game, GameTreeSearch, PlayerId, SearchResult};
    pub use crate::learning::{GameRecord, GameRecorder, GameResult, LearningSummary, MoveRecord};
    pub use crate::minimax::{PrioritizedMinimax, SearchConfig};
    pub use crate::patterns::{GamePhase, KeySpace, MoveCategory, Outcome, PatternKey, PatternRecord, PriorityConfig};
    pub use crate::prioritizer::{MovePrioritizer, PrioritizerConfig, RankedMove};
    pub use crate::scorer::{DifferentialScorer, ScorerConfig};
    #[cfg(feature = "sqlite")]
    pub use crate::store::SqlitePatternStore;
    pub use crate::store::{MemoryPatternStore, PatternFilter, PatternStore, SharedPatternStore};
}

#[cfg(test)]
mod tests;
