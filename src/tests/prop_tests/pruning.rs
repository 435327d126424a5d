use super::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn immediate_win_is_never_filtered(
        initial in 4..30u8,
        remaining in 1..=3u8,
        threshold in 0.0..1.0f64,
        penalty_games in 0..30usize,
        depth in 1..4u8,
        seed in any::<u64>(),
    ) {
        let config = EngineConfig {
            prioritizer: PrioritizerConfig {
                filter_threshold: threshold,
                seed: Some(seed),
                ..PrioritizerConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut engine: PatternEngine<Pebbles, _> = PatternEngine::new(config.clone(), config.memory_store()).unwrap();
        let winning_key = Pebbles::key_for(initial, remaining, remaining);
        for _ in 0..penalty_games {
            let record = GameRecord {
                moves: vec![MoveRecord { key: winning_key, side: PlayerId::PlayerFirst }],
                result: GameResult::Winner(PlayerId::PlayerSecond),
                final_score: ByPlayer::new(-9000.0, 9000.0),
                turns: 1,
            };
            engine.record_game(&record).unwrap();
        }
        let state = Pebbles { remaining, ..Pebbles::new(initial) };
        let action = engine.choose_move(&state, PlayerId::PlayerFirst, depth).unwrap();
        prop_assert_eq!(remaining, action);
    }

    #[test]
    fn filtering_never_leaves_a_node_without_candidates(
        gs in arb_reachable_pebbles(),
        threshold in 0.0..1.5f64,
        depth in 1..4u8,
    ) {
        prop_assume!(!gs.is_terminal());
        let config = EngineConfig {
            prioritizer: PrioritizerConfig {
                filter_threshold: threshold,
                seed: Some(1),
                ..PrioritizerConfig::default()
            },
            ..EngineConfig::default()
        };
        let mut engine: PatternEngine<Pebbles, _> = PatternEngine::new(config.clone(), config.memory_store()).unwrap();
        let side = gs.to_move().unwrap();
        let res = engine.search_position(&gs, side, depth).unwrap();
        let action = res.best_move().unwrap();
        prop_assert!(gs.legal_moves(side).contains(&action));
    }
}
