//! Board representation for Gomoku

pub mod bitboard;
pub mod board;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// Re-exports
pub use bitboard::Bitboard;
pub use board::Board;

/// Board size (15x15)
pub const BOARD_SIZE: usize = 15;
pub const TOTAL_CELLS: usize = BOARD_SIZE * BOARD_SIZE; // 225

/// Column letters used by the `H8` style notation
const COLUMNS: &[u8; BOARD_SIZE] = b"ABCDEFGHIJKLMNO";

/// Stone colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Empty,
    Black,
    White,
}

impl Stone {
    /// Get opponent color
    #[inline]
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            Stone::Empty => Stone::Empty,
        }
    }

    /// Index into per-color tables (Black = 0, White = 1)
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Stone::White => 1,
            _ => 0,
        }
    }

    /// Grid encoding used by external callers: 0 empty, 1 black, 2 white
    pub fn from_cell_value(value: u8) -> Option<Stone> {
        match value {
            0 => Some(Stone::Empty),
            1 => Some(Stone::Black),
            2 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn cell_value(self) -> u8 {
        match self {
            Stone::Empty => 0,
            Stone::Black => 1,
            Stone::White => 2,
        }
    }
}

/// Position on the board. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: u8,
    pub y: u8,
}

impl Pos {
    #[inline]
    pub fn new(x: u8, y: u8) -> Self {
        debug_assert!(x < BOARD_SIZE as u8 && y < BOARD_SIZE as u8);
        Self { x, y }
    }

    /// Checked constructor for untrusted coordinates
    pub fn try_new(x: i32, y: i32) -> Result<Self, EngineError> {
        if Self::is_valid(x, y) {
            Ok(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            Err(EngineError::OutOfBounds { x, y })
        }
    }

    /// Board center (H8)
    #[inline]
    pub const fn center() -> Self {
        Self {
            x: (BOARD_SIZE / 2) as u8,
            y: (BOARD_SIZE / 2) as u8,
        }
    }

    #[inline]
    pub fn to_index(self) -> usize {
        self.y as usize * BOARD_SIZE + self.x as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self {
            x: (idx % BOARD_SIZE) as u8,
            y: (idx / BOARD_SIZE) as u8,
        }
    }

    #[inline]
    pub fn is_valid(x: i32, y: i32) -> bool {
        x >= 0 && x < BOARD_SIZE as i32 && y >= 0 && y < BOARD_SIZE as i32
    }

    /// Step `k` cells along `(dx, dy)`, `None` when leaving the board
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, k: i32) -> Option<Pos> {
        let x = i32::from(self.x) + dx * k;
        let y = i32::from(self.y) + dy * k;
        if Self::is_valid(x, y) {
            Some(Pos {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    /// Manhattan distance from the board center
    #[inline]
    pub fn center_distance(self) -> i32 {
        let c = (BOARD_SIZE / 2) as i32;
        (i32::from(self.x) - c).abs() + (i32::from(self.y) - c).abs()
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_index().cmp(&other.to_index())
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COLUMNS[self.x as usize] as char, self.y + 1)
    }
}

impl FromStr for Pos {
    type Err = EngineError;

    /// Parse `H8` style notation (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let col = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| EngineError::InvalidNotation(s.to_string()))?;
        let x = COLUMNS
            .iter()
            .position(|&c| c as char == col)
            .ok_or_else(|| EngineError::InvalidNotation(s.to_string()))?;
        let row: usize = chars
            .as_str()
            .parse()
            .map_err(|_| EngineError::InvalidNotation(s.to_string()))?;
        if row == 0 || row > BOARD_SIZE {
            return Err(EngineError::InvalidNotation(s.to_string()));
        }
        Ok(Pos::new(x as u8, (row - 1) as u8))
    }
}

/// A stone placement by one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub x: u8,
    pub y: u8,
    pub player: Stone,
}

impl Move {
    #[inline]
    pub fn new(pos: Pos, player: Stone) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            player,
        }
    }

    #[inline]
    pub fn pos(self) -> Pos {
        Pos::new(self.x, self.y)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.player {
            Stone::Black => "B",
            Stone::White => "W",
            Stone::Empty => "?",
        };
        write!(f, "{side}:{}", Pos::new(self.x, self.y))
    }
}
