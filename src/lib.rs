//! Gomoku position analysis and move search engine
//!
//! An analysis engine for freestyle Gomoku (Caro) on a 15x15 board:
//! - Five or more in a row wins
//! - No captures, no forbidden moves
//! - Black moves first
//!
//! # Architecture
//!
//! The engine is organized into several modules:
//! - [`board`]: Board representation with bitboards and Zobrist hashing
//! - [`rules`]: Five-in-a-row detection
//! - [`eval`]: Threat detection, position evaluation and move classification
//! - [`search`]: Search algorithms (alpha-beta, VCF/VCT)
//! - [`engine`]: Best-move engine integrating all components
//! - [`analysis`]: Whole-game walkthrough with mistakes and patterns
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use gomoku::{Board, Engine, Move, Pos, Stone};
//!
//! let mut board = Board::new();
//! board.apply_move(Move::new(Pos::center(), Stone::Black)).unwrap();
//!
//! let mut engine = Engine::new();
//! let result = engine.find_best_moves(&board, Stone::White, Duration::from_millis(300), 3);
//! if let Some(pos) = result.best_move {
//!     println!("White plays {pos} ({:?})", result.search_type);
//! }
//! ```
//!
//! # Search Priority
//!
//! The engine follows this search priority:
//! 1. Immediate winning move (instant)
//! 2. Blocking the opponent's five
//! 3. VCF - Victory by Continuous Fours
//! 4. VCT - Victory by Continuous Threats
//! 5. Defense against the opponent's forced win
//! 6. Alpha-Beta search with transposition table

pub mod analysis;
pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod rules;
pub mod search;

// Re-export commonly used types for convenience
pub use analysis::{analyze_game, AnalysisResult, GameAnalyzer, PositionAnalysis};
pub use board::{Board, Move, Pos, Stone, BOARD_SIZE};
pub use config::{AnalysisConfig, EngineConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use eval::{EvaluationResult, MoveQuality, ThreatResult, ThreatType};
pub use search::{SearchResult, SearchType, VcfResult};
