//! Transposition Table for caching search results
//!
//! The transposition table stores search results indexed by position key,
//! enabling reuse of previous search results for positions we've seen before.
//! It holds at most `capacity` entries; when full, the least recently used
//! entry is evicted.
//!
//! # Example
//!
//! ```
//! use gomoku::board::Pos;
//! use gomoku::search::{EntryType, TranspositionTable};
//!
//! let mut tt = TranspositionTable::new(1024);
//!
//! // Store a search result
//! let hash = 0x123456789ABCDEF0;
//! tt.store(hash, 5, 100, EntryType::Exact, Some(Pos::new(7, 7)));
//!
//! // Deep enough: usable
//! assert_eq!(tt.probe(hash, 4).map(|e| e.score), Some(100));
//! // Shallower than requested: not usable, but the move is still known
//! assert!(tt.probe(hash, 6).is_none());
//! assert_eq!(tt.best_move(hash), Some(Pos::new(7, 7)));
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::board::Pos;

/// Entry type for score interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Exact score - the search completed normally
    Exact,
    /// Lower bound - score >= stored value (beta cutoff)
    LowerBound,
    /// Upper bound - score <= stored value (alpha fail-low)
    UpperBound,
}

/// Transposition table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    /// Position key (board hash with side to move)
    pub hash: u64,
    /// Remaining search depth for this entry
    pub depth: u8,
    /// Evaluation score
    pub score: i32,
    /// Type of score (exact, lower bound, upper bound)
    pub entry_type: EntryType,
    /// Best move found for this position
    pub best_move: Option<Pos>,
}

impl TTEntry {
    /// Apply this entry to a search window.
    ///
    /// Exact scores are returned directly. Bounds tighten `alpha` or `beta`;
    /// the stored score becomes the node value only once the window closes.
    pub fn cutoff(&self, alpha: &mut i32, beta: &mut i32) -> Option<i32> {
        match self.entry_type {
            EntryType::Exact => return Some(self.score),
            EntryType::LowerBound => *alpha = (*alpha).max(self.score),
            EntryType::UpperBound => *beta = (*beta).min(self.score),
        }
        (*alpha >= *beta).then_some(self.score)
    }
}

const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Node {
    entry: TTEntry,
    prev: usize,
    next: usize,
}

/// Transposition table with LRU eviction.
///
/// Entries live in a slab linked into a recency list (`head` is the most
/// recently used); a hash map finds the slab slot of a key.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    index: HashMap<u64, usize>,
    nodes: Vec<Node>,
    head: usize,
    tail: usize,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl TranspositionTable {
    /// Create a table holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Probe the table for a position.
    ///
    /// Returns the entry only if it was searched at least `depth` deep.
    /// A successful probe marks the entry as recently used.
    pub fn probe(&mut self, hash: u64, depth: u8) -> Option<TTEntry> {
        match self.index.get(&hash).copied() {
            Some(slot) if self.nodes[slot].entry.depth >= depth => {
                self.hits += 1;
                self.touch(slot);
                Some(self.nodes[slot].entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Best move stored for a position, regardless of depth.
    #[must_use]
    pub fn best_move(&self, hash: u64) -> Option<Pos> {
        self.index
            .get(&hash)
            .and_then(|&slot| self.nodes[slot].entry.best_move)
    }

    /// Store a position in the table.
    ///
    /// An existing entry for the same key is overwritten only by a result
    /// at least as deep. A new key evicts the least recently used entry when
    /// the table is full.
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        score: i32,
        entry_type: EntryType,
        best_move: Option<Pos>,
    ) {
        let entry = TTEntry {
            hash,
            depth,
            score,
            entry_type,
            best_move,
        };

        if let Some(&slot) = self.index.get(&hash) {
            if depth >= self.nodes[slot].entry.depth {
                self.nodes[slot].entry = entry;
            }
            self.touch(slot);
            return;
        }

        let slot = if self.nodes.len() < self.capacity {
            self.nodes.push(Node {
                entry,
                prev: NIL,
                next: NIL,
            });
            self.nodes.len() - 1
        } else {
            // Reuse the least recently used slot
            let slot = self.tail;
            self.unlink(slot);
            self.index.remove(&self.nodes[slot].entry.hash);
            self.nodes[slot].entry = entry;
            self.evictions += 1;
            slot
        };
        self.index.insert(hash, slot);
        self.push_front(slot);
    }

    /// Clear all entries and statistics.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.head = NIL;
        self.tail = NIL;
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get statistics about table usage.
    #[must_use]
    pub fn stats(&self) -> TTStats {
        TTStats {
            capacity: self.capacity,
            used: self.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    fn touch(&mut self, slot: usize) {
        if self.head != slot {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }
}

/// Statistics about transposition table usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TTStats {
    /// Maximum number of entries
    pub capacity: usize,
    /// Number of entries currently stored
    pub used: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tt_store_and_probe() {
        let mut tt = TranspositionTable::new(16);
        let hash = 0x1234_5678_9ABC_DEF0;
        tt.store(hash, 5, 100, EntryType::Exact, Some(Pos::new(7, 7)));

        let entry = tt.probe(hash, 5).unwrap();
        assert_eq!(entry.score, 100);
        assert_eq!(entry.best_move, Some(Pos::new(7, 7)));
        assert!(tt.probe(hash, 3).is_some());
        assert!(tt.probe(0xDEAD, 1).is_none());
    }

    #[test]
    fn test_tt_insufficient_depth() {
        let mut tt = TranspositionTable::new(16);
        tt.store(42, 3, 100, EntryType::Exact, Some(Pos::new(1, 2)));
        assert!(tt.probe(42, 5).is_none());
        assert_eq!(tt.best_move(42), Some(Pos::new(1, 2)));
    }

    #[test]
    fn test_tt_replacement_prefers_depth() {
        let mut tt = TranspositionTable::new(16);
        tt.store(7, 6, 10, EntryType::Exact, None);
        tt.store(7, 4, 20, EntryType::Exact, None);
        assert_eq!(tt.probe(7, 0).unwrap().score, 10);
        tt.store(7, 6, 30, EntryType::LowerBound, None);
        assert_eq!(tt.probe(7, 0).unwrap().score, 30);
        assert_eq!(tt.len(), 1);
    }

    #[test]
    fn test_tt_lru_eviction() {
        let mut tt = TranspositionTable::new(3);
        tt.store(1, 1, 1, EntryType::Exact, None);
        tt.store(2, 1, 2, EntryType::Exact, None);
        tt.store(3, 1, 3, EntryType::Exact, None);

        // Touch 1 so that 2 becomes least recently used
        assert!(tt.probe(1, 1).is_some());
        tt.store(4, 1, 4, EntryType::Exact, None);

        assert_eq!(tt.len(), 3);
        assert!(tt.probe(2, 0).is_none());
        assert!(tt.probe(1, 0).is_some());
        assert!(tt.probe(3, 0).is_some());
        assert!(tt.probe(4, 0).is_some());
        assert_eq!(tt.stats().evictions, 1);
    }

    #[test]
    fn test_tt_never_exceeds_capacity() {
        let mut tt = TranspositionTable::new(8);
        for h in 0..1000u64 {
            tt.store(h, (h % 5) as u8, h as i32, EntryType::UpperBound, None);
            assert!(tt.len() <= 8);
        }
        assert_eq!(tt.stats().used, 8);
        assert_eq!(tt.stats().evictions, 992);
        // The most recent entries survive
        assert!(tt.probe(999, 0).is_some());
    }

    #[test]
    fn test_tt_clear() {
        let mut tt = TranspositionTable::new(4);
        tt.store(9, 2, 0, EntryType::Exact, None);
        tt.probe(9, 2);
        tt.clear();
        assert!(tt.is_empty());
        assert_eq!(tt.stats().hits, 0);
        assert!(tt.probe(9, 0).is_none());
        // Still usable after clearing
        tt.store(9, 2, 5, EntryType::Exact, None);
        assert_eq!(tt.probe(9, 2).unwrap().score, 5);
    }

    #[test]
    fn test_entry_bounds() {
        let lower = TTEntry {
            hash: 0,
            depth: 1,
            score: 50,
            entry_type: EntryType::LowerBound,
            best_move: None,
        };
        let (mut alpha, mut beta) = (0, 100);
        assert_eq!(lower.cutoff(&mut alpha, &mut beta), None);
        assert_eq!(alpha, 50);

        let (mut alpha, mut beta) = (0, 40);
        assert_eq!(lower.cutoff(&mut alpha, &mut beta), Some(50));

        let upper = TTEntry {
            entry_type: EntryType::UpperBound,
            ..lower
        };
        let (mut alpha, mut beta) = (0, 100);
        assert_eq!(upper.cutoff(&mut alpha, &mut beta), None);
        assert_eq!(beta, 50);
        let (mut alpha, mut beta) = (60, 100);
        assert_eq!(upper.cutoff(&mut alpha, &mut beta), Some(50));

        let exact = TTEntry {
            entry_type: EntryType::Exact,
            ..lower
        };
        let (mut alpha, mut beta) = (-10, 10);
        assert_eq!(exact.cutoff(&mut alpha, &mut beta), Some(50));
    }
}
