//! Set of board cells packed into words
//!
//! Used for each colour's stones and for scratch sets of candidate cells.
//! Iteration always yields cells in board-index order.

use super::{Pos, TOTAL_CELLS};

const WORDS: usize = (TOTAL_CELLS + 63) / 64;

/// One bit per cell, bit `i` of the set is cell `Pos::from_index(i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitboard {
    words: [u64; WORDS],
}

#[inline]
fn split(pos: Pos) -> (usize, u64) {
    let idx = pos.to_index();
    (idx / 64, 1u64 << (idx % 64))
}

impl Bitboard {
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    #[inline]
    pub fn set(&mut self, pos: Pos) {
        let (word, mask) = split(pos);
        self.words[word] |= mask;
    }

    #[inline]
    pub fn clear(&mut self, pos: Pos) {
        let (word, mask) = split(pos);
        self.words[word] &= !mask;
    }

    /// Number of cells in the set
    #[inline]
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Cells in the set, lowest index first
    pub fn iter_ones(&self) -> BitboardIter {
        BitboardIter {
            words: self.words,
            word: 0,
        }
    }
}

/// Cells of a [`Bitboard`] in index order.
///
/// Only `Pos` values are ever inserted, so no bit past the last cell is set.
pub struct BitboardIter {
    words: [u64; WORDS],
    word: usize,
}

impl Iterator for BitboardIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        while self.word < WORDS {
            let bits = self.words[self.word];
            if bits != 0 {
                self.words[self.word] = bits & (bits - 1);
                let idx = self.word * 64 + bits.trailing_zeros() as usize;
                return Some(Pos::from_index(idx));
            }
            self.word += 1;
        }
        None
    }
}
