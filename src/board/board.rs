//! Board structure with incremental hashing and a move stack

use std::fmt;

use super::bitboard::Bitboard;
use super::{Move, Pos, Stone, BOARD_SIZE, TOTAL_CELLS};
use crate::error::EngineError;
use crate::search::zobrist;

/// Game board.
///
/// Cells live in a flat array indexed by `y * 15 + x`; each color also keeps
/// a bitboard for cheap iteration over its stones. The Zobrist hash is kept
/// in sync on every placement and removal.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [Stone; TOTAL_CELLS],
    /// Black stones bitboard
    pub black: Bitboard,
    /// White stones bitboard
    pub white: Bitboard,
    hash: u64,
    /// Moves applied through `apply_move`/`make_move`, most recent last
    history: Vec<Move>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Stone::Empty; TOTAL_CELLS],
            black: Bitboard::new(),
            white: Bitboard::new(),
            hash: 0,
            history: Vec::with_capacity(TOTAL_CELLS),
        }
    }

    /// Build a board from a row-major grid (`grid[y][x]`, 0/1/2 encoded).
    ///
    /// Stones set up this way are not part of the move stack, so
    /// `undo_move` never removes them.
    pub fn from_grid(grid: &[Vec<u8>]) -> Result<Self, EngineError> {
        let cols = grid.first().map_or(0, Vec::len);
        if grid.len() != BOARD_SIZE || grid.iter().any(|row| row.len() != BOARD_SIZE) {
            return Err(EngineError::InvalidBoardDimensions {
                rows: grid.len(),
                cols,
            });
        }

        let mut board = Self::new();
        for (y, row) in grid.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                let stone = Stone::from_cell_value(value).ok_or(EngineError::InvalidCellValue {
                    x: x as u8,
                    y: y as u8,
                    value,
                })?;
                if stone != Stone::Empty {
                    board.set_cell(Pos::new(x as u8, y as u8), stone);
                }
            }
        }
        Ok(board)
    }

    /// Replay a chronological move list onto an empty board.
    pub fn from_moves(moves: &[Move]) -> Result<Self, EngineError> {
        let mut board = Self::new();
        for &mv in moves {
            board.apply_move(mv)?;
        }
        Ok(board)
    }

    /// Row-major 0/1/2 grid of the current position
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        (0..BOARD_SIZE)
            .map(|y| {
                (0..BOARD_SIZE)
                    .map(|x| self.cells[y * BOARD_SIZE + x].cell_value())
                    .collect()
            })
            .collect()
    }

    /// Get stone at position
    #[inline]
    pub fn get(&self, pos: Pos) -> Stone {
        self.cells[pos.to_index()]
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.cells[pos.to_index()] == Stone::Empty
    }

    /// Validated move application.
    ///
    /// Rejects `Stone::Empty` as a player and occupied target cells.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), EngineError> {
        if !Pos::is_valid(i32::from(mv.x), i32::from(mv.y)) {
            return Err(EngineError::OutOfBounds {
                x: i32::from(mv.x),
                y: i32::from(mv.y),
            });
        }
        if mv.player == Stone::Empty {
            return Err(EngineError::InvalidPlayer { x: mv.x, y: mv.y });
        }
        if !self.is_empty(mv.pos()) {
            return Err(EngineError::OverlappingOrCorruptState { x: mv.x, y: mv.y });
        }
        self.make_move(mv.pos(), mv.player);
        Ok(())
    }

    /// Unchecked placement for search code that only plays empty cells.
    /// Must be paired with `undo_move`.
    #[inline]
    pub(crate) fn make_move(&mut self, pos: Pos, stone: Stone) {
        debug_assert!(self.is_empty(pos), "make_move on occupied cell {pos}");
        debug_assert!(stone != Stone::Empty);
        self.set_cell(pos, stone);
        self.history.push(Move::new(pos, stone));
    }

    /// Take back the most recent move, returning it.
    #[inline]
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        self.clear_cell(mv.pos(), mv.player);
        Some(mv)
    }

    #[inline]
    fn set_cell(&mut self, pos: Pos, stone: Stone) {
        self.cells[pos.to_index()] = stone;
        match stone {
            Stone::Black => self.black.set(pos),
            Stone::White => self.white.set(pos),
            Stone::Empty => return,
        }
        self.hash ^= zobrist::stone_key(pos, stone);
    }

    #[inline]
    fn clear_cell(&mut self, pos: Pos, stone: Stone) {
        self.cells[pos.to_index()] = Stone::Empty;
        match stone {
            Stone::Black => self.black.clear(pos),
            Stone::White => self.white.clear(pos),
            Stone::Empty => return,
        }
        self.hash ^= zobrist::stone_key(pos, stone);
    }

    /// Get bitboard for a color (returns None for Empty)
    #[inline]
    pub fn stones(&self, stone: Stone) -> Option<&Bitboard> {
        match stone {
            Stone::Black => Some(&self.black),
            Stone::White => Some(&self.white),
            Stone::Empty => None,
        }
    }

    /// Iterate over every occupied cell
    pub fn occupied(&self) -> impl Iterator<Item = Pos> + '_ {
        self.black.iter_ones().chain(self.white.iter_ones())
    }

    /// Zobrist hash of the stones on the board
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Total stones on board
    #[inline]
    pub fn stone_count(&self) -> u32 {
        self.black.count() + self.white.count()
    }

    /// Number of moves on the move stack
    #[inline]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.stone_count() as usize == TOTAL_CELLS
    }

    /// Side to move inferred from stone counts (Black moves first)
    pub fn side_to_move(&self) -> Stone {
        if self.black.count() > self.white.count() {
            Stone::White
        } else {
            Stone::Black
        }
    }

    /// Empty cells in index order
    pub fn empty_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..TOTAL_CELLS)
            .filter(move |&i| self.cells[i] == Stone::Empty)
            .map(Pos::from_index)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..BOARD_SIZE {
            write!(f, " {}", (b'A' + x as u8) as char)?;
        }
        writeln!(f)?;
        for y in (0..BOARD_SIZE).rev() {
            write!(f, "{:>3}", y + 1)?;
            for x in 0..BOARD_SIZE {
                let c = match self.cells[y * BOARD_SIZE + x] {
                    Stone::Empty => '.',
                    Stone::Black => 'X',
                    Stone::White => 'O',
                };
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
