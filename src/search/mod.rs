//! Search module for Gomoku analysis
//!
//! Contains:
//! - Zobrist hashing for position identification
//! - LRU transposition table for caching search results
//! - Candidate generation and move ordering
//! - Alpha-Beta search with iterative deepening
//! - VCF/VCT threat search for forced wins

pub mod alphabeta;
pub mod ordering;
pub mod threat;
pub mod tt;
pub mod zobrist;

pub use alphabeta::{
    is_loss_score, is_win_score, ScoredMove, SearchLimits, SearchResult, SearchStats, SearchType,
    Searcher, WIN_SCORE, WIN_THRESHOLD,
};
pub use ordering::{generate_candidates, MoveOrderer};
pub use threat::{
    detect_vcf, detect_vct, find_vct_defenses, ThreatSearcher, VcfResult, VctDefense, VctResult,
};
pub use tt::{EntryType, TTEntry, TTStats, TranspositionTable};
