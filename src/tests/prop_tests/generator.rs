use enum_map::Enum;

use proptest::prelude::*;

use crate::game_tree_search::*;
use crate::patterns::{GamePhase, MoveCategory, Outcome, PatternKey};
use crate::tests::pebbles::Pebbles;

pub fn arb_enum<E: std::fmt::Debug + Enum>() -> impl Strategy<Value = E> {
    (0..E::LENGTH).prop_map(E::from_usize)
}

pub fn arb_player_id() -> impl Strategy<Value = PlayerId> {
    arb_enum()
}

pub fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Win), Just(Outcome::Loss), Just(Outcome::Draw)]
}

prop_compose! {
    pub fn arb_pattern_key()(
        unit_type in 0..8u8,
        category in arb_enum::<MoveCategory>(),
        distance_bucket in 0..6u8,
        phase in arb_enum::<GamePhase>(),
        extra in prop::array::uniform3(0..3u8),
    ) -> PatternKey {
        PatternKey::new(unit_type, category, distance_bucket, phase).with_extra(extra)
    }
}

prop_compose! {
    /// Key inside the `Pebbles` key space.
    pub fn arb_pebbles_key()(
        category in arb_enum::<MoveCategory>(),
        distance_bucket in 0..3u8,
        phase in arb_enum::<GamePhase>(),
    ) -> PatternKey {
        PatternKey::new(0, category, distance_bucket, phase)
    }
}

prop_compose! {
    /// A position reached by playing random legal takes from a fresh pile.
    pub fn arb_reachable_pebbles()(pile in 4..40u8, takes in prop::collection::vec(1..=3u8, 0..16)) -> Pebbles {
        let mut state = Pebbles::new(pile);
        for take in takes {
            if state.is_terminal() {
                break;
            }
            let take = take.min(state.remaining);
            state = state.apply(take).unwrap();
        }
        state
    }
}

/// `(key index, outcome, score)` observations spread over several games.
pub fn arb_observations() -> impl Strategy<Value = Vec<Vec<(usize, Outcome, f64)>>> {
    prop::collection::vec(
        prop::collection::vec((0..4usize, arb_outcome(), -3000.0..3000.0f64), 1..6),
        1..12,
    )
}
