//! Connect four on a 7-column, 6-row board. Cells are stored row-major with
//! row 0 at the bottom; an action is the column to drop a disc into.

use thiserror::Error;

use pattern_search::prelude::*;
use pattern_search::smallvec::{smallvec, SmallVec};

pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS;

const CENTER_COL: usize = COLS / 2;

/// Direction vectors: horizontal, vertical, diagonal /, diagonal \
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Connect4Error {
    #[error("column {0} is out of range")]
    OutOfRange(u8),
    #[error("column {0} is full")]
    ColumnFull(u8),
    #[error("game is over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect4 {
    board: [Option<PlayerId>; BOARD_SIZE],
    heights: [u8; COLS],
    player: PlayerId,
    winner: Option<PlayerId>,
    moves: u8,
}

impl Default for Connect4 {
    fn default() -> Self {
        Self {
            board: [None; BOARD_SIZE],
            heights: [0; COLS],
            player: PlayerId::PlayerFirst,
            winner: None,
            moves: 0,
        }
    }
}

impl Connect4 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play a sequence of columns from the empty board.
    pub fn from_moves(columns: &[u8]) -> Result<Self, Connect4Error> {
        columns.iter().try_fold(Self::new(), |game, &col| game.apply(col))
    }

    #[inline]
    fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> Option<PlayerId> {
        self.board[Self::pos(col, row)]
    }

    #[inline]
    pub fn height(&self, col: usize) -> u8 {
        self.heights[col]
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.moves as usize == BOARD_SIZE
    }

    fn at(&self, col: i32, row: i32) -> Option<Option<PlayerId>> {
        if (0..COLS as i32).contains(&col) && (0..ROWS as i32).contains(&row) {
            Some(self.board[Self::pos(col as usize, row as usize)])
        } else {
            None
        }
    }

    /// Length of the line through (col, row) if `side` had a disc there.
    fn line_through(&self, col: usize, row: usize, side: PlayerId, (dc, dr): (i32, i32)) -> usize {
        let run = |sign: i32| {
            let mut n = 0;
            let (mut c, mut r) = (col as i32 + sign * dc, row as i32 + sign * dr);
            while self.at(c, r) == Some(Some(side)) {
                n += 1;
                c += sign * dc;
                r += sign * dr;
            }
            n
        };
        1 + run(1) + run(-1)
    }

    /// Whether dropping into `col` would give `side` four in a row.
    pub fn wins_by_dropping(&self, col: usize, side: PlayerId) -> bool {
        let Some(&height) = self.heights.get(col) else {
            return false;
        };
        let row = height as usize;
        row < ROWS
            && DIRECTIONS
                .iter()
                .any(|&d| self.line_through(col, row, side, d) >= 4)
    }

    /// Windows of four holding exactly `n` of `side`'s discs and none of the opponent's.
    fn open_windows(&self, side: PlayerId, n: usize) -> usize {
        let mut count = 0;
        for col in 0..COLS as i32 {
            for row in 0..ROWS as i32 {
                'window: for (dc, dr) in DIRECTIONS {
                    let (mut mine, mut theirs) = (0, 0);
                    for k in 0..4 {
                        match self.at(col + k * dc, row + k * dr) {
                            None => continue 'window,
                            Some(Some(p)) if p == side => mine += 1,
                            Some(Some(_)) => theirs += 1,
                            Some(None) => {}
                        }
                    }
                    if mine == n && theirs == 0 {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    fn center_discs(&self, side: PlayerId) -> usize {
        (0..ROWS).filter(|&row| self.cell(CENTER_COL, row) == Some(side)).count()
    }

    /// 0 for rows 0-1, 1 for rows 2-3, 2 for rows 4-5.
    pub fn height_tier(row: usize) -> u8 {
        (row / 2).min(2) as u8
    }
}

impl Game for Connect4 {
    type Action = u8;
    type Actions = SmallVec<[u8; COLS]>;
    type Error = Connect4Error;

    /// Distance from the centre column (0..=3) and landing height tier in `extra[0]`.
    const KEY_SPACE: KeySpace = KeySpace::new(1, 4).with_extra([3, 1, 1]);
    const FEATURE_WEIGHTS: &'static [f64] = &[5.0, 1.0, 2.0];

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
        // Centre columns first.
        const ORDER: [u8; COLS] = [3, 2, 4, 1, 5, 0, 6];
        ORDER
            .iter()
            .copied()
            .filter(|&c| (self.heights[c as usize] as usize) < ROWS)
            .collect()
    }

    fn apply(&self, column: u8) -> Result<Self, Connect4Error> {
        if self.is_terminal() {
            return Err(Connect4Error::GameOver);
        }
        let col = column as usize;
        if col >= COLS {
            return Err(Connect4Error::OutOfRange(column));
        }
        if self.heights[col] as usize >= ROWS {
            return Err(Connect4Error::ColumnFull(column));
        }
        let wins = self.wins_by_dropping(col, self.player);
        let mut next = self.clone();
        let row = self.heights[col] as usize;
        next.board[Self::pos(col, row)] = Some(self.player);
        next.heights[col] += 1;
        next.moves += 1;
        if wins {
            next.winner = Some(self.player);
        }
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
        self.moves as u32
    }

    fn classify(before: &Self, after: &Self, column: u8, side: PlayerId) -> PatternKey {
        let col = column as usize;
        let row = before.heights[col] as usize;
        let category = if after.winner == Some(side) {
            MoveCategory::Capture
        } else if before.wins_by_dropping(col, side.opposite()) {
            MoveCategory::Block
        } else if after.open_windows(side, 3) > before.open_windows(side, 3) {
            MoveCategory::Threat
        } else if row > 0 {
            MoveCategory::Advance
        } else {
            MoveCategory::Placement
        };
        let distance = (col as i32 - CENTER_COL as i32).unsigned_abs() as u8;
        let phase = GamePhase::from_progress(before.moves as f64 / BOARD_SIZE as f64);
        PatternKey::new(0, category, distance, phase).with_extra([Self::height_tier(row), 0, 0])
    }

    /// `[open windows with three discs, open windows with two discs, discs in the centre column]`
    fn feature_vector(&self, side: PlayerId) -> FeatureVector {
        smallvec![
            self.open_windows(side, 3) as f64,
            self.open_windows(side, 2) as f64,
            self.center_discs(side) as f64,
        ]
    }

    /// Dropping where the opponent would otherwise connect four.
    fn is_decisive(&self, column: u8) -> bool {
        self.wins_by_dropping(column as usize, self.player.opposite())
    }
}
