use crate::prelude::*;

use pebbles::Pebbles;



pub mod prop_tests;

/// Noise-free prioritizer so searches are reproducible.
pub fn quiet_config() -> EngineConfig {
    EngineConfig {
        prioritizer: PrioritizerConfig {
            alpha: 0.7,
            beta: 0.3,
            gamma: 0.0,
            seed: Some(7),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn memory_engine(config: EngineConfig) -> PatternEngine<Pebbles, MemoryPatternStore> {
    let store = config.memory_store();
    PatternEngine::new(config, store).unwrap()
}

/// A one-move game record in which `side` played `key`.
pub fn single_move_record(key: PatternKey, side: PlayerId, result: GameResult, score: f64) -> GameRecord {
    GameRecord {
        moves: vec![MoveRecord { key, side }],
        result,
        final_score: ByPlayer::from_fn(|p| if p == side { score } else { -score }),
        turns: 1,
    }
}
