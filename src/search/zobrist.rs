//! Zobrist hashing for position identification
//!
//! Every (cell, color) pair owns a fixed 64-bit key. A board's hash is the XOR
//! of the keys of its occupied cells, so placing or removing a stone is a
//! single XOR. The keys are generated at compile time from a fixed seed: the
//! table is immutable, identical across runs and shared by every request
//! without synchronization.
//!
//! # Example
//!
//! ```
//! use gomoku::board::{Board, Move, Pos, Stone};
//! use gomoku::search::zobrist;
//!
//! let mut board = Board::new();
//! let before = board.hash();
//!
//! let pos = Pos::new(7, 7);
//! board.apply_move(Move::new(pos, Stone::Black)).unwrap();
//!
//! // Incremental update is equivalent to full recomputation
//! assert_eq!(board.hash(), zobrist::update(before, pos, Stone::Black));
//! assert_eq!(board.hash(), zobrist::full_hash(&board));
//! ```

use crate::board::{Board, Pos, Stone, TOTAL_CELLS};

/// Keys for [black, white] stones at each cell, plus the side-to-move key
struct Keys {
    stones: [[u64; TOTAL_CELLS]; 2],
    black_to_move: u64,
}

/// SplitMix64 step: a fixed seed gives the same table on every build.
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (state, z ^ (z >> 31))
}

const fn generate_keys() -> Keys {
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
    let mut stones = [[0u64; TOTAL_CELLS]; 2];
    let mut i = 0;
    while i < TOTAL_CELLS {
        let (s, black) = splitmix64(seed);
        let (s, white) = splitmix64(s);
        stones[0][i] = black;
        stones[1][i] = white;
        seed = s;
        i += 1;
    }
    let (_, black_to_move) = splitmix64(seed);
    Keys {
        stones,
        black_to_move,
    }
}

static KEYS: Keys = generate_keys();

/// Key for a stone of `stone`'s color at `pos` (0 for `Stone::Empty`)
#[inline]
pub fn stone_key(pos: Pos, stone: Stone) -> u64 {
    match stone {
        Stone::Black => KEYS.stones[0][pos.to_index()],
        Stone::White => KEYS.stones[1][pos.to_index()],
        Stone::Empty => 0,
    }
}

/// Incrementally update a hash for placing or removing a stone.
///
/// XOR is its own inverse, so the same call serves both directions.
#[inline]
#[must_use]
pub fn update(hash: u64, pos: Pos, stone: Stone) -> u64 {
    hash ^ stone_key(pos, stone)
}

/// Recompute the hash of a board from scratch (O(stones)).
#[must_use]
pub fn full_hash(board: &Board) -> u64 {
    let mut h = 0u64;
    for pos in board.black.iter_ones() {
        h ^= KEYS.stones[0][pos.to_index()];
    }
    for pos in board.white.iter_ones() {
        h ^= KEYS.stones[1][pos.to_index()];
    }
    h
}

/// Transposition key: board hash plus the side to move.
///
/// The board hash alone is a pure function of the stones; search needs to
/// tell apart the same stones with different players to move.
#[inline]
#[must_use]
pub fn position_key(board_hash: u64, side_to_move: Stone) -> u64 {
    if side_to_move == Stone::Black {
        board_hash ^ KEYS.black_to_move
    } else {
        board_hash
    }
}
