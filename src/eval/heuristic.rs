//! Heuristic evaluation function for Gomoku board positions
//!
//! This module provides the static evaluation used at search leaves and by
//! game analysis. It evaluates board positions based on:
//! - Pattern scoring (fives, fours, threes, twos, broken patterns)
//! - Positional bonuses (center control)
//!
//! Scores map onto a win probability through a logistic curve, and the gap
//! between a played move and the best move maps onto a quality class.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Pos, Stone, BOARD_SIZE};

use super::patterns::ThreatType;
use super::threats::{threat_counts, threat_score};

/// Scale of the logistic curve: a score of `K` is about a 73% win chance.
pub const WIN_PROBABILITY_SCALE: f64 = 1000.0;

/// Maximum Manhattan distance from center on a 15x15 board, plus one.
/// Every cell gets a positive bonus; the corners get 1.
const MAX_BONUS: i32 = BOARD_SIZE as i32;

/// Static evaluation of a position from one player's point of view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub player: Stone,
    /// Threat scores plus positional bonus of `player`
    pub player_score: i32,
    /// Threat scores plus positional bonus of the opponent
    pub opponent_score: i32,
    /// `player_score - opponent_score`
    pub score: i32,
    /// Logistic of `score / K`, always in [0, 1]
    pub win_probability: f64,
    /// Record counts per threat type for `player`
    pub player_threats: BTreeMap<ThreatType, u32>,
    /// Record counts per threat type for the opponent
    pub opponent_threats: BTreeMap<ThreatType, u32>,
}

/// Evaluate the board from the perspective of the given color.
///
/// Returns a score where:
/// - Positive values indicate advantage for `color`
/// - Negative values indicate disadvantage for `color`
///
/// Symmetric for negamax: `evaluate(b, Black) == -evaluate(b, White)`.
#[must_use]
pub fn evaluate(board: &Board, color: Stone) -> i32 {
    let opponent = color.opponent();
    threat_score(board, color) - threat_score(board, opponent) + positional_score(board, color)
        - positional_score(board, opponent)
}

/// Full evaluation with per-side scores, win probability and breakdown.
pub fn evaluate_position(board: &Board, player: Stone) -> EvaluationResult {
    let opponent = player.opponent();
    let player_score = threat_score(board, player) + positional_score(board, player);
    let opponent_score = threat_score(board, opponent) + positional_score(board, opponent);
    let score = player_score - opponent_score;

    EvaluationResult {
        player,
        player_score,
        opponent_score,
        score,
        win_probability: win_probability(score),
        player_threats: breakdown(board, player),
        opponent_threats: breakdown(board, opponent),
    }
}

fn breakdown(board: &Board, color: Stone) -> BTreeMap<ThreatType, u32> {
    let counts = threat_counts(board, color);
    ThreatType::ALL
        .into_iter()
        .filter(|t| counts[t.index()] > 0)
        .map(|t| (t, counts[t.index()]))
        .collect()
}

/// Positional bonus of a single stone.
///
/// Strictly decreasing in Manhattan distance from the center: 15 at H8,
/// 1 in the corners.
#[inline]
pub fn position_bonus(pos: Pos) -> i32 {
    MAX_BONUS - pos.center_distance()
}

/// Sum of positional bonuses of a color's stones.
fn positional_score(board: &Board, color: Stone) -> i32 {
    let Some(stones) = board.stones(color) else {
        return 0;
    };
    stones.iter_ones().map(position_bonus).sum()
}

/// The logistic function `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Win probability of a score, in [0, 1].
#[inline]
pub fn win_probability(score: i32) -> f64 {
    sigmoid(f64::from(score) / WIN_PROBABILITY_SCALE)
}

/// Quality class of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Excellent,
    Good,
    Okay,
    Weak,
    Blunder,
}

impl MoveQuality {
    /// Weak and blunder moves are reported as mistakes
    #[inline]
    pub fn is_mistake(self) -> bool {
        matches!(self, MoveQuality::Weak | MoveQuality::Blunder)
    }
}

/// Quality score in [0, 100] of a move scoring `actual` when the best move
/// scores `best`. Any move at least as good as the best scores 100.
pub fn move_quality_score(actual: i32, best: i32) -> f64 {
    let delta = f64::from(actual) - f64::from(best);
    (200.0 * sigmoid(delta / WIN_PROBABILITY_SCALE)).clamp(0.0, 100.0)
}

/// Map a quality score onto its class.
///
/// Thresholds are closed below: 85 is Excellent, 70 is Good, 50 is Okay,
/// 30 is Weak.
pub fn classify_quality(quality: f64) -> MoveQuality {
    if quality >= 85.0 {
        MoveQuality::Excellent
    } else if quality >= 70.0 {
        MoveQuality::Good
    } else if quality >= 50.0 {
        MoveQuality::Okay
    } else if quality >= 30.0 {
        MoveQuality::Weak
    } else {
        MoveQuality::Blunder
    }
}

/// Classify a move by comparing its score with the best move's score.
pub fn classify_move(actual: i32, best: i32) -> MoveQuality {
    classify_quality(move_quality_score(actual, best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;

    fn place(board: &mut Board, x: u8, y: u8, stone: Stone) {
        board.apply_move(Move::new(Pos::new(x, y), stone)).unwrap();
    }

    #[test]
    fn test_evaluate_empty_board() {
        let board = Board::new();
        assert_eq!(evaluate(&board, Stone::Black), 0, "Empty board should have score 0");
        let result = evaluate_position(&board, Stone::Black);
        assert_eq!(result.win_probability, 0.5);
        assert!(result.player_threats.is_empty());
    }

    #[test]
    fn test_center_bonus_beats_corner() {
        assert!(position_bonus(Pos::center()) > position_bonus(Pos::new(0, 0)));
        assert_eq!(position_bonus(Pos::center()), 15);
        assert_eq!(position_bonus(Pos::new(0, 0)), 1);
        // Every non-corner edge cell sits strictly between
        for i in 1..14 {
            for edge in [Pos::new(i, 0), Pos::new(0, i), Pos::new(i, 14), Pos::new(14, i)] {
                let b = position_bonus(edge);
                assert!(b < position_bonus(Pos::center()) && b > position_bonus(Pos::new(0, 0)));
            }
        }
    }

    #[test]
    fn test_evaluate_negamax_symmetry() {
        let mut board = Board::new();
        place(&mut board, 7, 5, Stone::Black);
        place(&mut board, 7, 6, Stone::Black);
        place(&mut board, 7, 7, Stone::Black); // Open three for Black
        place(&mut board, 3, 3, Stone::White);
        place(&mut board, 3, 4, Stone::White); // Open two for White

        let black_score = evaluate(&board, Stone::Black);
        let white_score = evaluate(&board, Stone::White);
        assert_eq!(
            black_score, -white_score,
            "Negamax symmetry violated: eval(Black)={}, eval(White)={}",
            black_score, white_score
        );
        assert!(black_score > 0);
    }

    #[test]
    fn test_evaluate_position_matches_fast_path() {
        let mut board = Board::new();
        for y in 5..9 {
            place(&mut board, 7, y, Stone::Black);
        }
        place(&mut board, 8, 8, Stone::White);

        let result = evaluate_position(&board, Stone::Black);
        assert_eq!(result.score, evaluate(&board, Stone::Black));
        assert_eq!(result.score, result.player_score - result.opponent_score);
        assert_eq!(result.player_threats.get(&ThreatType::OpenFour), Some(&1));
        assert!(result.win_probability > 0.99);
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert_eq!(sigmoid(0.0), 0.5);
        for s in [-1_000_000, -5_000, -1, 0, 1, 777, 100_000, 1_000_000] {
            let p = win_probability(s);
            assert!((0.0..=1.0).contains(&p), "p({s}) = {p}");
        }
        assert!(win_probability(1000) > win_probability(999));
    }

    #[test]
    fn test_quality_of_best_move_is_full() {
        assert_eq!(move_quality_score(500, 500), 100.0);
        assert_eq!(move_quality_score(900, 500), 100.0);
        assert_eq!(classify_move(0, 0), MoveQuality::Excellent);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify_quality(100.0), MoveQuality::Excellent);
        assert_eq!(classify_quality(85.0), MoveQuality::Excellent);
        assert_eq!(classify_quality(84.999), MoveQuality::Good);
        assert_eq!(classify_quality(70.0), MoveQuality::Good);
        assert_eq!(classify_quality(69.999), MoveQuality::Okay);
        assert_eq!(classify_quality(50.0), MoveQuality::Okay);
        assert_eq!(classify_quality(49.999), MoveQuality::Weak);
        assert_eq!(classify_quality(30.0), MoveQuality::Weak);
        assert_eq!(classify_quality(29.999), MoveQuality::Blunder);
        assert_eq!(classify_quality(0.0), MoveQuality::Blunder);
    }

    #[test]
    fn test_classify_move_losses() {
        // Losing an open four's worth of score is a blunder
        assert_eq!(classify_move(-10_000, 0), MoveQuality::Blunder);
        // A small loss is still fine
        assert!(!classify_move(-50, 0).is_mistake());
        assert!(MoveQuality::Weak.is_mistake());
    }
}
