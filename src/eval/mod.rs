//! Evaluation module for Gomoku positions
//!
//! Contains:
//! - Fixed threat scores and line geometry
//! - Threat detection (line patterns and multi-line composites)
//! - Static position evaluation, win probability and move classification

pub mod heuristic;
pub mod patterns;
pub mod threats;

pub use heuristic::{
    classify_move, classify_quality, evaluate, evaluate_position, move_quality_score,
    position_bonus, sigmoid, win_probability, EvaluationResult, MoveQuality,
    WIN_PROBABILITY_SCALE,
};
pub use patterns::{CompositeKind, Direction, PatternScore, ThreatType};
pub use threats::{
    composite_at, composite_moves, detect_all_threats, five_cells, four_moves, move_threat,
    threat_score, threats_at, CompositeThreat, ThreatRecord, ThreatResult,
};
