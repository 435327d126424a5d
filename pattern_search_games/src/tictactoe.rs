//! Tic-tac-toe on a 3x3 board. Cells are indexed row-major:
//!
//! ```text
//! 0 | 1 | 2
//! 3 | 4 | 5
//! 6 | 7 | 8
//! ```

use thiserror::Error;

use pattern_search::prelude::*;
use pattern_search::smallvec::{smallvec, SmallVec};

pub const CELLS: usize = 9;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TicTacToeError {
    #[error("cell {0} is out of range")]
    OutOfRange(u8),
    #[error("cell {0} is occupied")]
    Occupied(u8),
    #[error("game is over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicTacToe {
    board: [Option<PlayerId>; CELLS],
    player: PlayerId,
    winner: Option<PlayerId>,
    filled: u8,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Board from a 9-character string of `X`, `O` and `.`; X is the first player.
    /// The side to move is derived from the piece counts.
    pub fn from_str_board(s: &str) -> Option<Self> {
        let mut game = Self::new();
        let mut chars = s.chars().filter(|c| !c.is_whitespace());
        for cell in game.board.iter_mut() {
            *cell = match chars.next()? {
                'X' | 'x' => Some(PlayerId::PlayerFirst),
                'O' | 'o' => Some(PlayerId::PlayerSecond),
                '.' => None,
                _ => return None,
            };
        }
        if chars.next().is_some() {
            return None;
        }
        let count = |p| game.board.iter().filter(|&&c| c == Some(p)).count();
        let (x, o) = (count(PlayerId::PlayerFirst), count(PlayerId::PlayerSecond));
        if x != o && x != o + 1 {
            return None;
        }
        game.filled = (x + o) as u8;
        game.player = if x == o {
            PlayerId::PlayerFirst
        } else {
            PlayerId::PlayerSecond
        };
        game.winner = game.find_winner();
        Some(game)
    }

    #[inline]
    pub fn cell(&self, index: usize) -> Option<PlayerId> {
        self.board[index]
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled as usize == CELLS
    }

    fn find_winner(&self) -> Option<PlayerId> {
        LINES.iter().find_map(|line| {
            let first = self.board[line[0]]?;
            line.iter().all(|&i| self.board[i] == Some(first)).then_some(first)
        })
    }

    /// Lines holding `n` of `side`'s marks and nothing of the opponent's.
    fn open_lines(&self, side: PlayerId, n: usize) -> usize {
        LINES
            .iter()
            .filter(|line| {
                let mine = line.iter().filter(|&&i| self.board[i] == Some(side)).count();
                let theirs = line.iter().filter(|&&i| self.board[i] == Some(side.opposite())).count();
                mine == n && theirs == 0
            })
            .count()
    }

    /// Whether `side` would complete a line by playing `cell`.
    fn completes_line(&self, cell: usize, side: PlayerId) -> bool {
        LINES.iter().filter(|line| line.contains(&cell)).any(|line| {
            line.iter()
                .all(|&i| i == cell || self.board[i] == Some(side))
        })
    }

    /// 0 for the centre, 1 for corners, 2 for edges.
    pub fn ring(cell: usize) -> u8 {
        match cell {
            4 => 0,
            0 | 2 | 6 | 8 => 1,
            _ => 2,
        }
    }
}

impl Game for TicTacToe {
    type Action = u8;
    type Actions = SmallVec<[u8; CELLS]>;
    type Error = TicTacToeError;

    const KEY_SPACE: KeySpace = KeySpace::new(1, 3);
    const FEATURE_WEIGHTS: &'static [f64] = &[1.0, 4.0, 0.5];

    fn to_move(&self) -> Option<PlayerId> {
        if self.is_terminal() {
            None
        } else {
            Some(self.player)
        }
    }

    fn legal_moves(&self, side: PlayerId) -> Self::Actions {
        if self.is_terminal() || side != self.player {
            return smallvec![];
        }
        (0..CELLS as u8).filter(|&i| self.board[i as usize].is_none()).collect()
    }

    fn apply(&self, cell: u8) -> Result<Self, TicTacToeError> {
        if self.is_terminal() {
            return Err(TicTacToeError::GameOver);
        }
        let index = cell as usize;
        if index >= CELLS {
            return Err(TicTacToeError::OutOfRange(cell));
        }
        if self.board[index].is_some() {
            return Err(TicTacToeError::Occupied(cell));
        }
        let mut next = self.clone();
        next.board[index] = Some(self.player);
        next.filled += 1;
        next.winner = next.find_winner();
        next.player = self.player.opposite();
        Ok(next)
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_full()
    }

    fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    fn turn_number(&self) -> u32 {
        self.filled as u32
    }

    fn classify(before: &Self, after: &Self, cell: u8, side: PlayerId) -> PatternKey {
        let index = cell as usize;
        let category = if after.winner == Some(side) {
            MoveCategory::Capture
        } else if before.completes_line(index, side.opposite()) {
            MoveCategory::Block
        } else if after.open_lines(side, 2) > before.open_lines(side, 2) {
            MoveCategory::Threat
        } else {
            MoveCategory::Placement
        };
        let phase = GamePhase::from_progress(before.filled as f64 / CELLS as f64);
        PatternKey::new(0, category, Self::ring(index), phase)
    }

    /// `[open lines with one mark, open lines with two marks, holds the centre]`
    fn feature_vector(&self, side: PlayerId) -> FeatureVector {
        smallvec![
            self.open_lines(side, 1) as f64,
            self.open_lines(side, 2) as f64,
            if self.board[4] == Some(side) { 1.0 } else { 0.0 },
        ]
    }

    /// Blocking an immediate win is never optional.
    fn is_decisive(&self, cell: u8) -> bool {
        let index = cell as usize;
        index < CELLS && self.board[index].is_none() && self.completes_line(index, self.player.opposite())
    }
}
