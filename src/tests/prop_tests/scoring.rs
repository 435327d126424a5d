use super::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: CASES,
        ..ProptestConfig::default()
    })]

    #[test]
    fn score_is_zero_sum_for_non_terminal_states(gs in arb_reachable_pebbles()) {
        prop_assume!(!gs.is_terminal());
        let scorer = DifferentialScorer::default();
        let a = scorer.score(&gs, PlayerId::PlayerFirst);
        let b = scorer.score(&gs, PlayerId::PlayerSecond);
        prop_assert!((a + b).abs() < 1e-9, "{a} vs {b}");
    }

    #[test]
    fn differential_is_antisymmetric_at_every_reachable_state(gs in arb_reachable_pebbles()) {
        let scorer = DifferentialScorer::default();
        let a = scorer.differential(&gs, PlayerId::PlayerFirst);
        let b = scorer.differential(&gs, PlayerId::PlayerSecond);
        prop_assert!((a + b).abs() < 1e-9);
    }

    #[test]
    fn loss_below_draw_below_win(d in -4999.0..4999.0f64, turns in 0..100_000u32) {
        let scorer = DifferentialScorer::default();
        prop_assume!(d.abs() < scorer.config().plausible_advantage_bound());
        let loss = scorer.terminal_score(d, turns, Outcome::Loss);
        let draw = scorer.terminal_score(d, turns, Outcome::Draw);
        let win = scorer.terminal_score(d, turns, Outcome::Win);
        prop_assert!(loss < draw);
        prop_assert!(draw < win);
    }

    #[test]
    fn any_loss_below_any_draw_below_any_win(
        d1 in -4999.0..4999.0f64,
        d2 in -4999.0..4999.0f64,
        t1 in 0..10_000u32,
        t2 in 0..10_000u32,
    ) {
        let scorer = DifferentialScorer::default();
        prop_assert!(scorer.terminal_score(d1, t1, Outcome::Loss) < scorer.terminal_score(d2, t2, Outcome::Draw));
        prop_assert!(scorer.terminal_score(d1, t1, Outcome::Draw) < scorer.terminal_score(d2, t2, Outcome::Win));
    }

    #[test]
    fn faster_wins_score_higher(d in -4999.0..4999.0f64, t in 0..10_000u32, delta in 1..1_000u32) {
        let scorer = DifferentialScorer::default();
        prop_assert!(scorer.terminal_score(d, t, Outcome::Win) > scorer.terminal_score(d, t + delta, Outcome::Win));
    }
}
