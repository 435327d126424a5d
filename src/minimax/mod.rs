pub mod search;

pub use crate::minimax::search::{PrioritizedMinimax, SearchConfig};
