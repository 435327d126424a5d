use crate::decay;
use crate::patterns::NEUTRAL_PRIORITY;

use super::*;

const KEYS: [PatternKey; 4] = [
    PatternKey::new(0, MoveCategory::Quiet, 0, GamePhase::Opening),
    PatternKey::new(0, MoveCategory::Capture, 2, GamePhase::Opening),
    PatternKey::new(0, MoveCategory::Threat, 1, GamePhase::Middlegame),
    PatternKey::new(0, MoveCategory::Advance, 0, GamePhase::Endgame),
];

fn replay<S: PatternStore>(store: &mut S, games: &[Vec<(usize, Outcome, f64)>]) {
    for game in games {
        store.begin_game().unwrap();
        for &(i, outcome, score) in game {
            store.upsert(KEYS[i], outcome, score).unwrap();
        }
    }
}

fn all_records<S: PatternStore>(store: &S) -> Vec<PatternRecord> {
    store.top(usize::MAX, &PatternFilter::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn unseen_keys_are_neutral(key in arb_pattern_key()) {
        let store = MemoryPatternStore::default();
        let record = store.lookup(&key);
        prop_assert_eq!(0.0, record.confidence);
        prop_assert_eq!(NEUTRAL_PRIORITY, record.priority);
        let normalized = MovePrioritizer::normalize_priority(record.priority);
        prop_assert!(0.0 < normalized && normalized < 1.0);
    }

    #[test]
    fn confidence_is_monotone_and_capped(saturation in 0.5..500.0f64, n in 0..10_000u64) {
        let config = PriorityConfig { saturation, ..PriorityConfig::DEFAULT };
        let c0 = config.confidence(n);
        let c1 = config.confidence(n + 1);
        prop_assert!(c0 <= c1);
        prop_assert!(c1 <= 1.0);
        prop_assert!(c0 >= 0.0);
    }

    #[test]
    fn confidence_never_decreases_while_learning(games in arb_observations()) {
        let mut store = MemoryPatternStore::default();
        let mut last = [0.0f64; 4];
        for game in &games {
            store.begin_game().unwrap();
            for &(i, outcome, score) in game {
                let record = store.upsert(KEYS[i], outcome, score).unwrap();
                prop_assert!(record.confidence >= last[i]);
                prop_assert!(record.confidence <= 1.0);
                prop_assert!(!record.priority.is_nan());
                last[i] = record.confidence;
            }
        }
    }

    #[test]
    fn recompute_is_idempotent(games in arb_observations(), rate in 0.01..0.99f64) {
        let mut store = MemoryPatternStore::default();
        replay(&mut store, &games);
        decay::recompute(&mut store, rate).unwrap();
        let once = all_records(&store);
        decay::recompute(&mut store, rate).unwrap();
        let twice = all_records(&store);
        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            prop_assert_eq!(a.key, b.key);
            prop_assert_eq!(a.priority.to_bits(), b.priority.to_bits());
            prop_assert_eq!(a.win_rate.to_bits(), b.win_rate.to_bits());
            prop_assert_eq!(a.average_score.to_bits(), b.average_score.to_bits());
            prop_assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
            prop_assert_eq!(a.times_seen, b.times_seen);
        }
    }

    #[test]
    fn single_win_is_learned_exactly(
        key in arb_pebbles_key(),
        side in arb_player_id(),
        score in -20_000.0..20_000.0f64,
    ) {
        let mut store = MemoryPatternStore::default();
        let record = GameRecord {
            moves: vec![MoveRecord { key, side }],
            result: GameResult::Winner(side),
            final_score: ByPlayer::from_fn(|p| if p == side { score } else { -score }),
            turns: 1,
        };
        crate::learning::record_game(&mut store, &record).unwrap();
        let r = store.get(&key).unwrap().unwrap();
        prop_assert_eq!(1, r.times_seen);
        prop_assert_eq!(1, r.wins);
        prop_assert_eq!(score, r.average_score);
    }
}

#[cfg(feature = "sqlite")]
proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        ..ProptestConfig::default()
    })]

    #[test]
    fn sqlite_store_agrees_with_memory_store(games in arb_observations(), rate in 0.05..0.95f64) {
        let mut memory = MemoryPatternStore::default();
        let mut sqlite = SqlitePatternStore::open_in_memory(PriorityConfig::DEFAULT, 256).unwrap();
        replay(&mut memory, &games);
        replay(&mut sqlite, &games);
        prop_assert_eq!(all_records(&memory), all_records(&sqlite));
        decay::recompute(&mut memory, rate).unwrap();
        decay::recompute(&mut sqlite, rate).unwrap();
        prop_assert_eq!(all_records(&memory), all_records(&sqlite));
    }
}
