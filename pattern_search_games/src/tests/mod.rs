use proptest::prelude::*;

use pattern_search::prelude::*;


pub fn quiet_engine<G: Game>() -> PatternEngine<G, MemoryPatternStore> {
    let config = EngineConfig {
        prioritizer: PrioritizerConfig {
            alpha: 0.7,
            beta: 0.3,
            gamma: 0.0,
            seed: Some(11),
            ..Default::default()
        },
        ..Default::default()
    };
    let store = config.memory_store();
    PatternEngine::new(config, store).unwrap()
}

/// Play `picks` as indices into the legal move list until the game ends.
pub fn playout<G: Game>(initial: G, picks: &[usize]) -> Vec<(G, G::Action, G)> {
    let mut state = initial;
    let mut steps = Vec::new();
    for &pick in picks {
        let Some(side) = state.to_move() else { break };
        let moves: Vec<G::Action> = state.legal_moves(side).into_iter().collect();
        let action = moves[pick % moves.len()];
        let next = state.apply(action).unwrap();
        steps.push((state, action, next.clone()));
        state = next;
    }
    steps
}

pub fn arb_picks(max_len: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..64usize, 0..max_len)
}
