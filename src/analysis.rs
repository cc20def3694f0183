//! Whole-game walkthrough and single-position analysis
//!
//! Every move of a game is scored before and after it is played from the
//! mover's point of view, compared against the best alternative found by
//! the search, and classified. Missed forced wins and allowed forks are
//! reported as critical mistakes; composite threats created by a move are
//! reported as tactical patterns.
//!
//! The total time budget is divided across the remaining moves. Once it is
//! spent, the remaining moves are judged by static evaluation only.
//!
//! # Example
//!
//! ```
//! use gomoku::analysis::analyze_game;
//! use gomoku::board::{Move, Pos, Stone};
//!
//! let moves: Vec<Move> = [(7, 7), (7, 8), (8, 7), (8, 8), (9, 7), (9, 8), (10, 7), (0, 0), (11, 7)]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &(x, y))| {
//!         let player = if i % 2 == 0 { Stone::Black } else { Stone::White };
//!         Move::new(Pos::new(x, y), player)
//!     })
//!     .collect();
//!
//! let result = analyze_game(&moves).unwrap();
//! assert_eq!(result.timeline.len(), 9);
//! assert_eq!(result.summary.winner, Some(Stone::Black));
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::board::{Board, Move, Pos, Stone};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::eval::{
    classify_quality, composite_at, composite_moves, detect_all_threats, evaluate, evaluate_position,
    five_cells, move_quality_score, CompositeKind, EvaluationResult, MoveQuality, ThreatResult,
};
use crate::rules::{check_winner, has_five_at_pos};
use crate::search::{SearchLimits, SearchResult, WIN_SCORE};

/// One timeline entry: a played move and how it was judged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveEvaluation {
    pub move_index: usize,
    #[serde(rename = "move")]
    pub mv: Move,
    /// Evaluation after the move, from the mover's point of view
    pub evaluation: EvaluationResult,
    pub score_before: i32,
    pub score_after: i32,
    pub win_probability_before: f64,
    pub win_probability_after: f64,
    /// Change in win probability, in percentage points
    pub swing: f64,
    pub is_significant: bool,
    pub is_critical: bool,
    pub quality: Option<MoveQuality>,
    pub quality_score: Option<f64>,
    pub best_alternative: Option<Pos>,
    /// Depth the move was judged at (0 for static judgement)
    pub search_depth: u8,
    /// False when judging the move failed; the static fields are still set
    pub analysis_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A weak move
    Minor,
    /// A blunder
    Major,
    /// A missed forced win or an allowed fork
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MistakeKind {
    PoorMove,
    MissedWin,
    AllowedFork,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mistake {
    pub move_index: usize,
    pub player: Stone,
    pub severity: Severity,
    pub kind: MistakeKind,
    pub played: Pos,
    pub best_alternative: Option<Pos>,
    pub quality_score: f64,
}

/// A composite threat created by a played move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TacticalPattern {
    pub move_index: usize,
    pub player: Stone,
    pub kind: CompositeKind,
    pub pivot: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_moves: usize,
    /// Mean quality score of black's judged moves
    pub black_accuracy: f64,
    pub white_accuracy: f64,
    pub black_mistakes: usize,
    pub white_mistakes: usize,
    pub critical_mistakes: usize,
    pub winner: Option<Stone>,
    /// The loser's last critical mistake, else the move that made five
    pub decisive_move: Option<usize>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub timeline: Vec<MoveEvaluation>,
    pub mistakes: Vec<Mistake>,
    pub patterns: Vec<TacticalPattern>,
    /// Recommended move for the side to move after the last move
    pub best_move: Option<Pos>,
    pub summary: AnalysisSummary,
}

/// Analysis of a single position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionAnalysis {
    pub player: Stone,
    pub evaluation: EvaluationResult,
    pub threats: ThreatResult,
    pub opponent_threats: ThreatResult,
    pub search: SearchResult,
}

/// How a move compares with the best alternative
#[derive(Debug, Clone, Copy)]
struct Judgement {
    best_alternative: Option<Pos>,
    best_score: i32,
    actual_score: i32,
    depth: u8,
    missed_win: bool,
    allowed_fork: bool,
}

/// Game analyzer owning one engine for the whole walkthrough.
#[derive(Debug, Clone)]
pub struct GameAnalyzer {
    engine: Engine,
    config: EngineConfig,
}

impl Default for GameAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl GameAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            engine: Engine::from_valid_config(analysis_engine_config(&config)),
            config,
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            engine: Engine::with_config(analysis_engine_config(&config))?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Walk through a game move by move.
    ///
    /// The move list is validated as a whole before anything is analyzed.
    #[instrument(skip(self, moves), fields(moves = moves.len()))]
    pub fn analyze_game(&mut self, moves: &[Move]) -> Result<AnalysisResult, EngineError> {
        let settings = self.config.analysis.clone();
        if moves.len() < settings.min_moves {
            return Err(EngineError::InsufficientMoveHistory {
                required: settings.min_moves,
                actual: moves.len(),
            });
        }
        Board::from_moves(moves)?;

        let start = Instant::now();
        let deadline = start + Duration::from_millis(settings.time_budget_ms);
        let per_move = Duration::from_millis(settings.per_move_ms);
        info!(moves = moves.len(), budget_ms = settings.time_budget_ms, "analyzing game");

        let mut board = Board::new();
        let mut timeline = Vec::with_capacity(moves.len());
        let mut mistakes = Vec::new();
        let mut patterns = Vec::new();
        let mut winning_move = None;
        let mut degraded_from = None;

        for (index, &mv) in moves.iter().enumerate() {
            let player = mv.player;
            let pos = mv.pos();

            // The final recommendation counts as one more slice
            let slices_left = u32::try_from(moves.len() - index + 1).unwrap_or(u32::MAX);
            let remaining = deadline.saturating_duration_since(Instant::now());
            let slice = if remaining.is_zero() {
                degraded_from.get_or_insert(index);
                None
            } else {
                Some(per_move.min(remaining / slices_left))
            };

            if let Some(kind) = composite_at(&board, pos, player) {
                patterns.push(TacticalPattern {
                    move_index: index,
                    player,
                    kind,
                    pivot: pos,
                });
            }

            let before = evaluate_position(&board, player);
            let judgement = self.judge(&board, mv, slice);
            board.apply_move(mv)?;
            let after = evaluate_position(&board, player);

            if winning_move.is_none() && has_five_at_pos(&board, pos, player) {
                winning_move = Some(index);
            }

            let swing = (after.win_probability - before.win_probability) * 100.0;
            let mut entry = MoveEvaluation {
                move_index: index,
                mv,
                score_before: before.score,
                score_after: after.score,
                win_probability_before: before.win_probability,
                win_probability_after: after.win_probability,
                swing,
                is_significant: swing.abs() > settings.significant_swing,
                is_critical: swing.abs() > settings.critical_swing,
                evaluation: after,
                quality: None,
                quality_score: None,
                best_alternative: None,
                search_depth: 0,
                analysis_available: false,
            };

            match judgement {
                Ok(judgement) => {
                    let quality_score = move_quality_score(judgement.actual_score, judgement.best_score);
                    let quality = classify_quality(quality_score);
                    debug!(
                        move_index = index,
                        %pos,
                        best = judgement.best_score,
                        actual = judgement.actual_score,
                        ?quality,
                        "move judged"
                    );
                    if let Some(mistake) = mistake_for(index, mv, &judgement, quality, quality_score) {
                        mistakes.push(mistake);
                    }
                    entry.quality = Some(quality);
                    entry.quality_score = Some(quality_score);
                    entry.best_alternative = judgement.best_alternative;
                    entry.search_depth = judgement.depth;
                    entry.analysis_available = true;
                }
                Err(err) => {
                    warn!(move_index = index, %pos, error = %err, "move analysis failed");
                }
            }
            timeline.push(entry);
        }

        if let Some(index) = degraded_from {
            warn!(from_move = index, "analysis budget spent, judged the rest statically");
        }

        let best_move = self.final_recommendation(&board, deadline, per_move);
        let summary = summarize(&board, &timeline, &mistakes, winning_move, start);
        info!(
            mistakes = mistakes.len(),
            critical = summary.critical_mistakes,
            elapsed_ms = summary.elapsed_ms,
            "game analyzed"
        );

        Ok(AnalysisResult {
            timeline,
            mistakes,
            patterns,
            best_move,
            summary,
        })
    }

    /// Threats, evaluation and best moves of one position, within the
    /// per-move budget.
    #[instrument(skip(self, board), fields(stones = board.stone_count()))]
    pub fn analyze_position(&mut self, board: &Board, player: Stone) -> Result<PositionAnalysis, EngineError> {
        if player == Stone::Empty {
            return Err(EngineError::InvalidPlayer { x: 0, y: 0 });
        }
        let budget = Duration::from_millis(self.config.analysis.per_move_ms);
        let top_n = self.config.top_n;
        Ok(PositionAnalysis {
            player,
            evaluation: evaluate_position(board, player),
            threats: detect_all_threats(board, player),
            opponent_threats: detect_all_threats(board, player.opponent()),
            search: self.engine.find_best_moves(board, player, budget, top_n),
        })
    }

    /// Compare the played move with the best alternative. `slice` is the
    /// search time for this move; `None` means judge statically.
    fn judge(&mut self, before: &Board, mv: Move, slice: Option<Duration>) -> Result<Judgement, EngineError> {
        let player = mv.player;
        let opponent = player.opponent();
        let pos = mv.pos();

        let mut after = before.clone();
        after.apply_move(mv)?;
        if has_five_at_pos(&after, pos, player) {
            return Ok(Judgement {
                best_alternative: Some(pos),
                best_score: WIN_SCORE - 1,
                actual_score: WIN_SCORE - 1,
                depth: 0,
                missed_win: false,
                allowed_fork: false,
            });
        }

        let Some(slice) = slice else {
            let best = self.engine.searcher_mut().static_moves(before, player).into_iter().next();
            let actual = evaluate(&after, player);
            return Ok(Judgement {
                best_alternative: best.map(|m| m.pos),
                best_score: best.map_or(actual, |m| m.score),
                actual_score: actual,
                depth: 0,
                missed_win: false,
                allowed_fork: false,
            });
        };

        let move_deadline = Instant::now() + slice;
        let vcf_depth = self.config.analysis.vcf_depth;
        let search_depth = self.config.analysis.search_depth;

        let threats = self.engine.threats_mut();
        threats.set_deadline(Some(move_deadline));
        let vcf = threats.search_vcf_depth(before, player, vcf_depth);
        let continues_vcf = vcf.found && self.continues_vcf(&after, player, vcf_depth);
        self.engine.threats_mut().set_deadline(None);

        let (best_alternative, best_score, depth, eval_depth) = if vcf.found {
            (
                vcf.first_move(),
                WIN_SCORE - i32::from(vcf.terminal_depth),
                vcf.terminal_depth,
                search_depth,
            )
        } else {
            let remaining = move_deadline.saturating_duration_since(Instant::now());
            let result = self.engine.searcher_mut().search(before, player, remaining, 1);
            (result.best_move, result.score, result.depth_reached, result.depth_reached)
        };

        let actual_score = if best_alternative == Some(pos) || continues_vcf {
            best_score
        } else {
            let limits = SearchLimits {
                deadline: Some(move_deadline),
                max_nodes: Some(self.config.analysis.played_move_node_limit),
            };
            self.engine
                .searcher_mut()
                .evaluate_move_within(before, player, pos, eval_depth, limits)?
        };

        // Forks only matter when the opponent is not busy blocking a five
        let allowed_fork = five_cells(&after, player).is_empty()
            && !composite_moves(&after, opponent).is_empty()
            && best_alternative.map_or(false, |alt| {
                alt != pos && before.is_empty(alt) && alternative_prevents_fork(before, alt, player)
            });

        Ok(Judgement {
            best_alternative,
            best_score,
            actual_score,
            depth,
            missed_win: vcf.found && !continues_vcf,
            allowed_fork,
        })
    }

    /// Whether a position after `player`'s move still has a VCF of that
    /// player, with the opponent's forced block played.
    fn continues_vcf(&mut self, after: &Board, player: Stone, vcf_depth: u8) -> bool {
        let opponent = player.opponent();
        if !five_cells(after, opponent).is_empty() {
            return false;
        }
        match five_cells(after, player).as_slice() {
            [] => false,
            [block] => {
                if vcf_depth < 2 {
                    return false;
                }
                let mut blocked = after.clone();
                blocked.make_move(*block, opponent);
                self.engine
                    .threats_mut()
                    .search_vcf_depth(&blocked, player, vcf_depth - 2)
                    .found
            }
            _ => true,
        }
    }

    /// Best move for the side to move once the game is replayed.
    fn final_recommendation(&mut self, board: &Board, deadline: Instant, per_move: Duration) -> Option<Pos> {
        if check_winner(board).is_some() || board.is_full() {
            return None;
        }
        let side = board
            .last_move()
            .map_or(Stone::Black, |m| m.player.opponent());
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return self
                .engine
                .searcher_mut()
                .static_moves(board, side)
                .first()
                .map(|m| m.pos);
        }
        self.engine
            .find_best_moves(board, side, per_move.min(remaining), 1)
            .best_move
    }
}

/// Engine limits for a walkthrough: shallow, narrow and single-PV.
fn analysis_engine_config(config: &EngineConfig) -> EngineConfig {
    EngineConfig {
        max_depth: config.analysis.search_depth,
        vcf_depth: config.analysis.vcf_depth,
        candidate_limit: config.analysis.candidate_limit,
        top_n: 1,
        ..config.clone()
    }
}

/// Whether playing `alt` instead leaves the opponent without a composite
/// threat move (or busy blocking a five).
fn alternative_prevents_fork(before: &Board, alt: Pos, player: Stone) -> bool {
    let mut board = before.clone();
    board.make_move(alt, player);
    !five_cells(&board, player).is_empty() || composite_moves(&board, player.opponent()).is_empty()
}

/// At most one mistake per move, the most serious kind.
fn mistake_for(
    index: usize,
    mv: Move,
    judgement: &Judgement,
    quality: MoveQuality,
    quality_score: f64,
) -> Option<Mistake> {
    let (severity, kind) = if judgement.missed_win {
        (Severity::Critical, MistakeKind::MissedWin)
    } else if judgement.allowed_fork {
        (Severity::Critical, MistakeKind::AllowedFork)
    } else {
        match quality {
            MoveQuality::Blunder => (Severity::Major, MistakeKind::PoorMove),
            MoveQuality::Weak => (Severity::Minor, MistakeKind::PoorMove),
            _ => return None,
        }
    };
    Some(Mistake {
        move_index: index,
        player: mv.player,
        severity,
        kind,
        played: mv.pos(),
        best_alternative: judgement.best_alternative,
        quality_score,
    })
}

fn accuracy(timeline: &[MoveEvaluation], player: Stone) -> f64 {
    let scores: Vec<f64> = timeline
        .iter()
        .filter(|e| e.mv.player == player)
        .filter_map(|e| e.quality_score)
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[allow(clippy::cast_possible_truncation)]
fn summarize(
    board: &Board,
    timeline: &[MoveEvaluation],
    mistakes: &[Mistake],
    winning_move: Option<usize>,
    start: Instant,
) -> AnalysisSummary {
    let winner = check_winner(board);
    let decisive_move = winner.and_then(|w| {
        mistakes
            .iter()
            .rev()
            .find(|m| m.player == w.opponent() && m.severity == Severity::Critical)
            .map(|m| m.move_index)
            .or(winning_move)
    });
    let count = |player: Stone| mistakes.iter().filter(|m| m.player == player).count();

    AnalysisSummary {
        total_moves: timeline.len(),
        black_accuracy: accuracy(timeline, Stone::Black),
        white_accuracy: accuracy(timeline, Stone::White),
        black_mistakes: count(Stone::Black),
        white_mistakes: count(Stone::White),
        critical_mistakes: mistakes
            .iter()
            .filter(|m| m.severity == Severity::Critical)
            .count(),
        winner,
        decisive_move,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

/// Analyze a game with the default configuration.
pub fn analyze_game(moves: &[Move]) -> Result<AnalysisResult, EngineError> {
    GameAnalyzer::new().analyze_game(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternate(cells: &[(u8, u8)]) -> Vec<Move> {
        cells
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let player = if i % 2 == 0 { Stone::Black } else { Stone::White };
                Move::new(Pos::new(x, y), player)
            })
            .collect()
    }

    #[test]
    fn test_too_few_moves() {
        let moves = alternate(&[(7, 7), (7, 8), (8, 8), (9, 9)]);
        assert_eq!(
            analyze_game(&moves),
            Err(EngineError::InsufficientMoveHistory { required: 5, actual: 4 })
        );
    }

    #[test]
    fn test_invalid_moves_rejected_before_analysis() {
        let moves = alternate(&[(7, 7), (7, 8), (8, 8), (7, 8), (9, 9)]);
        assert_eq!(
            analyze_game(&moves),
            Err(EngineError::OverlappingOrCorruptState { x: 7, y: 8 })
        );

        let mut moves = alternate(&[(7, 7), (7, 8), (8, 8), (6, 6), (9, 9)]);
        moves[2].player = Stone::Empty;
        assert_eq!(
            analyze_game(&moves),
            Err(EngineError::InvalidPlayer { x: 8, y: 8 })
        );

        let mut moves = alternate(&[(7, 7), (7, 8), (8, 8), (6, 6), (9, 9)]);
        moves[4].x = 15;
        assert_eq!(
            analyze_game(&moves),
            Err(EngineError::OutOfBounds { x: 15, y: 9 })
        );
    }

    #[test]
    fn test_winner_and_decisive_move() {
        // Black builds five on row 7; white plays elsewhere
        let moves = alternate(&[
            (7, 7), (0, 0), (8, 7), (0, 2), (9, 7), (0, 4), (10, 7), (0, 6), (11, 7),
        ]);
        let result = analyze_game(&moves).unwrap();
        assert_eq!(result.summary.winner, Some(Stone::Black));
        assert!(result.summary.decisive_move.is_some());
        assert_eq!(result.best_move, None);

        let last = result.timeline.last().unwrap();
        assert_eq!(last.quality, Some(MoveQuality::Excellent));
        assert!(last.analysis_available);
        // White ignored an open three
        assert!(result
            .mistakes
            .iter()
            .any(|m| m.player == Stone::White && m.severity >= Severity::Major));
    }

    #[test]
    fn test_unscored_move_keeps_the_walkthrough_going() {
        let moves = alternate(&[
            (7, 7), (0, 0), (8, 7), (0, 2), (9, 7), (0, 4), (10, 7), (0, 6), (11, 7),
        ]);
        let mut config = EngineConfig::default();
        config.analysis.time_budget_ms = 60_000;
        config.analysis.per_move_ms = 5_000;
        // Too few nodes to score any move that differs from the best one
        config.analysis.played_move_node_limit = 1;
        let mut analyzer = GameAnalyzer::with_config(config).unwrap();
        let result = analyzer.analyze_game(&moves).unwrap();

        assert_eq!(result.timeline.len(), moves.len());
        // White's far-away replies cannot be scored
        let unscored: Vec<usize> = result
            .timeline
            .iter()
            .filter(|e| !e.analysis_available)
            .map(|e| e.move_index)
            .collect();
        assert!(unscored.contains(&1), "unscored: {unscored:?}");
        for entry in result.timeline.iter().filter(|e| !e.analysis_available) {
            assert_eq!(entry.quality, None);
            assert_eq!(entry.quality_score, None);
            assert!(result.mistakes.iter().all(|m| m.move_index != entry.move_index));
        }

        // Later moves are still analyzed
        let last = result.timeline.last().unwrap();
        assert!(last.analysis_available);
        assert_eq!(last.quality, Some(MoveQuality::Excellent));
        assert_eq!(result.summary.winner, Some(Stone::Black));
    }

    #[test]
    fn test_missed_win_is_critical() {
        // Black has an open three after move 4 and plays far away instead
        let moves = alternate(&[(7, 7), (0, 14), (8, 7), (1, 14), (9, 7), (3, 14), (14, 0), (5, 14)]);
        let result = analyze_game(&moves).unwrap();
        let missed = result
            .mistakes
            .iter()
            .find(|m| m.move_index == 6)
            .expect("move 6 should be a mistake");
        assert_eq!(missed.kind, MistakeKind::MissedWin);
        assert_eq!(missed.severity, Severity::Critical);
        assert!(matches!(missed.best_alternative, Some(p) if p == Pos::new(6, 7) || p == Pos::new(10, 7)));
    }

    #[test]
    fn test_timeline_fields() {
        let moves = alternate(&[(7, 7), (7, 8), (8, 8), (6, 6), (9, 9), (10, 10)]);
        let result = analyze_game(&moves).unwrap();
        assert_eq!(result.timeline.len(), moves.len());
        for (i, entry) in result.timeline.iter().enumerate() {
            assert_eq!(entry.move_index, i);
            assert_eq!(entry.mv, moves[i]);
            assert!((0.0..=1.0).contains(&entry.win_probability_after));
            assert!((entry.swing - (entry.win_probability_after - entry.win_probability_before) * 100.0).abs() < 1e-9);
            assert_eq!(entry.is_critical, entry.swing.abs() > 50.0);
            assert_eq!(entry.is_significant, entry.swing.abs() > 20.0);
            if let Some(q) = entry.quality_score {
                assert!((0.0..=100.0).contains(&q));
            }
        }
        assert!(result.best_move.is_some());
    }

    #[test]
    fn test_patterns_reported() {
        // Black's last move at (7,7) makes two open threes
        let moves = alternate(&[(5, 7), (0, 0), (6, 7), (0, 2), (7, 5), (0, 4), (7, 6), (0, 6), (7, 7)]);
        let result = analyze_game(&moves).unwrap();
        assert!(result.patterns.iter().any(|p| p.move_index == 8
            && p.player == Stone::Black
            && p.pivot == Pos::new(7, 7)));
    }

    #[test]
    fn test_analyze_position() {
        let board = Board::from_moves(&alternate(&[(7, 7), (7, 8), (8, 7)])).unwrap();
        let mut analyzer = GameAnalyzer::new();
        let analysis = analyzer.analyze_position(&board, Stone::White).unwrap();
        assert_eq!(analysis.player, Stone::White);
        assert!(analysis.search.best_move.is_some());
        assert!(analysis.opponent_threats.threats.iter().all(|t| t.player == Stone::Black));
        assert!(analyzer.analyze_position(&board, Stone::Empty).is_err());
    }

    #[test]
    fn test_serializes_move_key() {
        let moves = alternate(&[(7, 7), (7, 8), (8, 8), (6, 6), (9, 9)]);
        let result = analyze_game(&moves).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["timeline"][0]["move"].is_object());
        assert!(json["summary"]["total_moves"].is_number());
    }
}
