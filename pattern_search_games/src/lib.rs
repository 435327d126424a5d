//! Reference rule sets for the pattern-learning search engine.

pub mod connect4;
pub mod tictactoe;

pub use connect4::Connect4;
pub use tictactoe::TicTacToe;

#[cfg(test)]
mod tests;
