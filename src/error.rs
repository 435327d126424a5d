use thiserror::Error;

use crate::game_tree_search::PlayerId;
use crate::patterns::PatternKey;

/// Failures of the backing pattern store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt row for {what}: {detail}")]
    Corrupt { what: &'static str, detail: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced to callers of the engine entry points.
///
/// Everything except `Store` and `Config` indicates a broken game collaborator
/// and aborts the current search or game.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no legal moves for {side} at non-terminal state (turn {turn})")]
    NoLegalMoves { side: PlayerId, turn: u32 },
    #[error("non-terminal state has no side to move (turn {turn})")]
    NoSideToMove { turn: u32 },
    #[error("position is terminal (turn {turn}), there is no move to choose")]
    GameOver { turn: u32 },
    #[error("{side} is not the side to move (turn {turn})")]
    NotToMove { side: PlayerId, turn: u32 },
    #[error("pattern key {key:?} is outside the declared key space: {reason}")]
    InvalidPatternKey { key: PatternKey, reason: String },
    #[error("game rules rejected a move: {0}")]
    Rules(String),
    #[error("pattern store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

pub type StoreResult<T> = Result<T, StoreError>;
