use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::game_tree_search::{ByPlayer, Game, PlayerId};
use crate::patterns::{KeySpace, Outcome, PatternKey};
use crate::scorer::DifferentialScorer;
use crate::store::{Observation, PatternStore};

/// One move of a finished game: the pattern it exercised and who played it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    pub key: PatternKey,
    pub side: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Winner(PlayerId),
    Draw,
    /// Stopped by the move-count safety limit. Learned as a draw.
    Aborted,
}

impl GameResult {
    pub fn outcome_for(self, side: PlayerId) -> Outcome {
        match self {
            GameResult::Winner(winner) => Outcome::from_winner(Some(winner), side),
            GameResult::Draw | GameResult::Aborted => Outcome::Draw,
        }
    }

    /// Result of a game that stopped at `state`; a non-terminal state means the game was aborted.
    pub fn from_final_state<G: Game>(state: &G) -> Self {
        if !state.is_terminal() {
            return GameResult::Aborted;
        }
        match state.winner() {
            Some(winner) => GameResult::Winner(winner),
            None => GameResult::Draw,
        }
    }
}

/// Everything the learning loop needs to know about a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub moves: Vec<MoveRecord>,
    pub result: GameResult,
    /// Final differential score from each side's own point of view.
    pub final_score: ByPlayer<f64>,
    pub turns: u32,
}

impl GameRecord {
    pub fn validate_keys(&self, key_space: &KeySpace) -> EngineResult<()> {
        for m in &self.moves {
            key_space
                .validate(&m.key)
                .map_err(|reason| EngineError::InvalidPatternKey { key: m.key, reason })?;
        }
        Ok(())
    }
}

/// Collects the pattern keys of a game as it is played.
#[derive(Debug, Clone, Default)]
pub struct GameRecorder {
    moves: Vec<MoveRecord>,
}

impl GameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, key: PatternKey, side: PlayerId) {
        self.moves.push(MoveRecord { key, side });
    }

    /// Classify and record the transition `before -> after` made by `side`.
    pub fn observe<G: Game>(
        &mut self,
        before: &G,
        after: &G,
        action: G::Action,
        side: PlayerId,
    ) -> EngineResult<PatternKey> {
        let key = G::classify(before, after, action, side);
        G::KEY_SPACE
            .validate(&key)
            .map_err(|reason| EngineError::InvalidPatternKey { key, reason })?;
        self.push(key, side);
        Ok(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Close the record at `final_state`, scoring it for both sides.
    pub fn finish<G: Game>(self, final_state: &G, scorer: &DifferentialScorer) -> GameRecord {
        GameRecord {
            moves: self.moves,
            result: GameResult::from_final_state(final_state),
            final_score: ByPlayer::from_fn(|side| scorer.score(final_state, side)),
            turns: final_state.turn_number(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningSummary {
    /// Index the store assigned to this game in its history log.
    pub game_index: u64,
    pub updates: usize,
    pub result: GameResult,
}

/// Count every recorded move once against its key, with the outcome and
/// final score seen from the side that played it. The game is written as one
/// unit through `PatternStore::record_moves`.
pub fn record_game<S: PatternStore + ?Sized>(store: &mut S, record: &GameRecord) -> EngineResult<LearningSummary> {
    let observations: Vec<_> = record
        .moves
        .iter()
        .map(|m| Observation::new(m.key, record.result.outcome_for(m.side), record.final_score[m.side]))
        .collect();
    let game_index = store.record_moves(&observations)?;
    debug!(
        game_index,
        moves = record.moves.len(),
        result = ?record.result,
        turns = record.turns,
        "recorded game"
    );
    Ok(LearningSummary {
        game_index,
        updates: record.moves.len(),
        result: record.result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{GamePhase, MoveCategory};
    use crate::store::MemoryPatternStore;

    const A: PatternKey = PatternKey::new(0, MoveCategory::Advance, 1, GamePhase::Opening);
    const B: PatternKey = PatternKey::new(1, MoveCategory::Capture, 0, GamePhase::Endgame);

    fn record(moves: Vec<MoveRecord>, result: GameResult) -> GameRecord {
        GameRecord {
            moves,
            result,
            final_score: ByPlayer::new(120.0, -120.0),
            turns: 10,
        }
    }

    #[test]
    fn outcome_is_per_side() {
        let result = GameResult::Winner(PlayerId::PlayerSecond);
        assert_eq!(Outcome::Loss, result.outcome_for(PlayerId::PlayerFirst));
        assert_eq!(Outcome::Win, result.outcome_for(PlayerId::PlayerSecond));
        assert_eq!(Outcome::Draw, GameResult::Aborted.outcome_for(PlayerId::PlayerFirst));
    }

    #[test]
    fn repeated_key_is_counted_per_occurrence() {
        let mut store = MemoryPatternStore::default();
        let moves = vec![
            MoveRecord {
                key: A,
                side: PlayerId::PlayerFirst,
            },
            MoveRecord {
                key: B,
                side: PlayerId::PlayerSecond,
            },
            MoveRecord {
                key: A,
                side: PlayerId::PlayerFirst,
            },
        ];
        let summary = record_game(&mut store, &record(moves, GameResult::Winner(PlayerId::PlayerFirst))).unwrap();
        assert_eq!(3, summary.updates);
        assert_eq!(1, summary.game_index);

        let a = store.get(&A).unwrap().unwrap();
        assert_eq!((2, 2, 0), (a.times_seen, a.wins, a.losses));
        assert_eq!(120.0, a.average_score);
        let b = store.get(&B).unwrap().unwrap();
        assert_eq!((1, 0, 1), (b.times_seen, b.wins, b.losses));
        assert_eq!(-120.0, b.average_score);
    }

    #[test]
    fn aborted_games_are_learned_as_draws() {
        let mut store = MemoryPatternStore::default();
        let moves = vec![MoveRecord {
            key: A,
            side: PlayerId::PlayerSecond,
        }];
        record_game(&mut store, &record(moves, GameResult::Aborted)).unwrap();
        let a = store.get(&A).unwrap().unwrap();
        assert_eq!((1, 1), (a.times_seen, a.draws));
    }

    #[test]
    fn validate_keys_rejects_out_of_space_keys() {
        let space = KeySpace::new(1, 2);
        let moves = vec![MoveRecord {
            key: B,
            side: PlayerId::PlayerFirst,
        }];
        assert!(record(moves, GameResult::Draw).validate_keys(&space).is_err());
    }
}
