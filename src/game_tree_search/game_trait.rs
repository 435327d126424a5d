use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};
use smallvec::SmallVec;

use crate::patterns::{KeySpace, PatternKey};

use super::PlayerId;

/// Observable per-side features of a position, weighted by the scorer.
pub type FeatureVector = SmallVec<[f64; 8]>;

/// The rules collaborator supplied by each game.
///
/// The search core never looks inside a game state; everything it needs to
/// know goes through this trait.
pub trait Game: Debug + Clone + Send + Sync {
    type Action: Copy + Clone + Send + Sync + Debug + PartialEq + Eq + Serialize + DeserializeOwned;
    type Actions: IntoIterator<Item = Self::Action>;
    type Error: Debug + Display;

    /// Bounds of every pattern key `classify` may produce.
    const KEY_SPACE: KeySpace;

    /// Weights applied to `feature_vector`, index for index. Missing weights count as 1.
    const FEATURE_WEIGHTS: &'static [f64] = &[];

    fn to_move(&self) -> Option<PlayerId>;

    /// Legal moves for `side`. Must be empty exactly when the state is terminal.
    fn legal_moves(&self, side: PlayerId) -> Self::Actions;

    /// Returns the successor state. The receiver is left untouched.
    fn apply(&self, action: Self::Action) -> Result<Self, Self::Error>;

    fn is_terminal(&self) -> bool;

    fn winner(&self) -> Option<PlayerId>;

    /// Number of turns played so far.
    fn turn_number(&self) -> u32;

    /// Summarize `action` into its abstract move type.
    fn classify(before: &Self, after: &Self, action: Self::Action, side: PlayerId) -> PatternKey;

    fn feature_vector(&self, side: PlayerId) -> FeatureVector;

    /// Hint that `action` must be searched regardless of its learned priority.
    fn is_decisive(&self, _action: Self::Action) -> bool {
        false
    }
}
