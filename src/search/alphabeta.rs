//! Alpha-Beta search with iterative deepening and transposition table
//!
//! This module implements the core search algorithm of the engine.
//! It uses negamax with alpha-beta pruning and a transposition table.
//!
//! # Features
//!
//! - Iterative deepening at even depths for time management and move ordering
//! - Deadline polled every 1024 nodes; an aborted depth is discarded
//! - Transposition table for avoiding redundant searches
//! - Multi-PV root: exact scores for the best `top_n` moves
//! - Faster wins score higher (`WIN_SCORE - ply`)
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use gomoku::board::{Board, Move, Pos, Stone};
//! use gomoku::config::EngineConfig;
//! use gomoku::search::Searcher;
//!
//! let mut searcher = Searcher::new(&EngineConfig::default());
//! let mut board = Board::new();
//! board.apply_move(Move::new(Pos::center(), Stone::Black)).unwrap();
//!
//! let result = searcher.search(&board, Stone::White, Duration::from_millis(200), 1);
//! assert!(result.best_move.is_some());
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::board::{Board, Pos, Stone};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::eval::{evaluate, five_cells};
use crate::rules::has_five_at_pos;

use super::ordering::{generate_candidates, MoveOrderer};
use super::tt::{EntryType, TTStats, TranspositionTable};
use super::zobrist::position_key;

/// Score of a five made on the next ply; wins further away score less
pub const WIN_SCORE: i32 = 1_000_000;

/// Infinity score for alpha-beta bounds
const INF: i32 = WIN_SCORE + 1;

/// Scores at or beyond this magnitude are wins or losses at a known distance
pub const WIN_THRESHOLD: i32 = WIN_SCORE - 1000;

/// Nodes between deadline checks
const CHECK_INTERVAL: u64 = 1024;

/// Is this a forced-win score?
#[inline]
pub fn is_win_score(score: i32) -> bool {
    score >= WIN_THRESHOLD
}

/// Is this a forced-loss score?
#[inline]
pub fn is_loss_score(score: i32) -> bool {
    score <= -WIN_THRESHOLD
}

/// Win scores are stored relative to the node, so a transposition reached at
/// a different ply reports the right distance.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if is_win_score(score) {
        score + ply as i32
    } else if is_loss_score(score) {
        score - ply as i32
    } else {
        score
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn score_from_tt(score: i32, ply: usize) -> i32 {
    if is_win_score(score) {
        score - ply as i32
    } else if is_loss_score(score) {
        score + ply as i32
    } else {
        score
    }
}

/// Which stage of the engine produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// The side to move completes five
    ImmediateWin,
    /// Forced win by continuous fours
    Vcf,
    /// Forced win by continuous threats
    Vct,
    /// Stopping the opponent's forced win
    Defense,
    /// Iterative-deepening alpha-beta
    AlphaBeta,
    /// No depth completed: best statically ordered move
    Fallback,
    /// The game is already decided or the board is full
    Terminal,
}

/// Search statistics for diagnostics and tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Total nodes searched
    pub nodes: u64,
    /// Total beta cutoffs (fail-high)
    pub beta_cutoffs: u64,
    /// Beta cutoffs on the first move tried (measures move ordering quality)
    pub first_move_cutoffs: u64,
    /// Total TT probes
    pub tt_probes: u64,
    /// TT probes that decided the node
    pub tt_hits: u64,
}

impl SearchStats {
    /// First-move cutoff rate in percent
    pub fn first_move_rate(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            0.0
        } else {
            self.first_move_cutoffs as f64 / self.beta_cutoffs as f64 * 100.0
        }
    }
}

/// A root move with its score from the mover's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    pub pos: Pos,
    pub score: i32,
}

/// Search result containing the best move found and associated statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Best move found, if any
    pub best_move: Option<Pos>,
    /// Evaluation score of the best move
    pub score: i32,
    /// Deepest completed depth (0 for static results)
    pub depth_reached: u8,
    /// Expected line of play starting with `best_move`
    pub principal_variation: Vec<Pos>,
    pub elapsed_ms: u64,
    /// False when the time budget cut the search short
    pub completed: bool,
    /// Depth the search was cut at, if it was
    pub aborted_depth: Option<u8>,
    /// Total nodes searched
    pub nodes: u64,
    /// Best root moves, best first
    pub candidates: Vec<ScoredMove>,
    pub search_type: SearchType,
}

impl SearchResult {
    /// Result for a position with nothing to search.
    pub(crate) fn terminal(score: i32) -> Self {
        Self {
            best_move: None,
            score,
            depth_reached: 0,
            principal_variation: Vec::new(),
            elapsed_ms: 0,
            completed: true,
            aborted_depth: None,
            nodes: 0,
            candidates: Vec::new(),
            search_type: SearchType::Terminal,
        }
    }

    /// Turn a time-boxed partial result into `SearchTimeout`.
    pub fn ensure_completed(self) -> Result<Self, EngineError> {
        if self.completed {
            Ok(self)
        } else {
            Err(EngineError::SearchTimeout {
                depth: self.aborted_depth.unwrap_or(self.depth_reached.saturating_add(1)),
            })
        }
    }

    /// Does the best move force a win?
    #[inline]
    pub fn is_win(&self) -> bool {
        is_win_score(self.score)
    }
}

#[derive(Debug, Clone)]
struct RootMove {
    pos: Pos,
    score: i32,
    pv: Vec<Pos>,
}

/// Iteration depths: 2, 4, ... up to `max_depth`, ending on `max_depth`
/// itself when it is odd.
fn iteration_depths(max_depth: u8) -> Vec<u8> {
    let max_depth = max_depth.max(1);
    let mut depths: Vec<u8> = (2..=max_depth).step_by(2).collect();
    if max_depth % 2 == 1 {
        depths.push(max_depth);
    }
    depths
}

/// Request-scoped alpha-beta searcher.
///
/// Owns its transposition table and ordering tables; nothing is shared
/// between searchers.
#[derive(Debug, Clone)]
pub struct Searcher {
    tt: TranspositionTable,
    orderer: MoveOrderer,
    max_depth: u8,
    candidate_limit: usize,
    candidate_radius: u8,
    use_tt: bool,
    stats: SearchStats,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    aborted: bool,
}

/// Bounds on a single move evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub deadline: Option<Instant>,
    /// Nodes the evaluation may visit before giving up
    pub max_nodes: Option<u64>,
}

impl Searcher {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tt: TranspositionTable::new(config.tt_capacity),
            orderer: MoveOrderer::new(config.use_move_ordering),
            max_depth: config.max_depth,
            candidate_limit: config.candidate_limit,
            candidate_radius: config.candidate_radius,
            use_tt: config.use_transposition_table,
            stats: SearchStats::default(),
            deadline: None,
            node_limit: None,
            aborted: false,
        }
    }

    /// Statistics of the last search
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn tt_stats(&self) -> TTStats {
        self.tt.stats()
    }

    /// Clear the transposition table, history heuristic and killer moves.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.orderer.clear();
    }

    fn begin(&mut self, deadline: Option<Instant>) {
        self.stats = SearchStats::default();
        self.deadline = deadline;
        self.node_limit = None;
        self.aborted = false;
        self.orderer.new_search();
    }

    #[inline]
    fn out_of_time(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    #[inline]
    fn out_of_nodes(&self) -> bool {
        self.node_limit.map_or(false, |limit| self.stats.nodes > limit)
    }

    /// Iterative deepening search within a time budget.
    ///
    /// Depths 2, 4, ... up to the configured maximum. A new depth is not
    /// started once less than a fifth of the budget remains. If no depth
    /// completes, the best statically ordered move is returned with
    /// `completed = false`.
    #[instrument(skip(self, board), fields(stones = board.stone_count()))]
    pub fn search(
        &mut self,
        board: &Board,
        player: Stone,
        time_budget: Duration,
        top_n: usize,
    ) -> SearchResult {
        let start = Instant::now();
        self.begin(Some(start + time_budget));
        let top_n = top_n.max(1);
        let mut work_board = board.clone();

        let mut best: Option<(u8, Vec<RootMove>)> = None;
        let mut aborted_depth = None;

        for depth in iteration_depths(self.max_depth) {
            let remaining = time_budget.saturating_sub(start.elapsed());
            if best.is_some() && (remaining.is_zero() || remaining < time_budget / 5) {
                debug!(depth, "not enough time left to start depth");
                aborted_depth = Some(depth);
                break;
            }

            let pv_move = best
                .as_ref()
                .and_then(|(_, moves)| moves.first())
                .map(|m| m.pos);

            match self.search_root(&mut work_board, player, depth, top_n, pv_move) {
                Some(moves) => {
                    let decided = moves.first().map_or(true, |m| is_win_score(m.score));
                    if let Some(m) = moves.first() {
                        debug!(
                            depth,
                            score = m.score,
                            best = %m.pos,
                            nodes = self.stats.nodes,
                            "depth complete"
                        );
                    }
                    best = Some((depth, moves));
                    if decided {
                        break;
                    }
                }
                None => {
                    debug!(depth, nodes = self.stats.nodes, "depth aborted at deadline");
                    aborted_depth = Some(depth);
                    break;
                }
            }
        }

        let elapsed = start.elapsed();
        debug!(
            nodes = self.stats.nodes,
            tt_hits = self.stats.tt_hits,
            cutoffs = self.stats.beta_cutoffs,
            first_move_rate = self.stats.first_move_rate(),
            "search finished"
        );

        match best {
            Some((depth, moves)) if !moves.is_empty() => {
                self.build_result(depth, moves, top_n, elapsed, aborted_depth)
            }
            _ => {
                let mut result = self.fallback(board, player, top_n);
                result.elapsed_ms = elapsed_ms(start.elapsed());
                result.aborted_depth = aborted_depth;
                result
            }
        }
    }

    /// Search exactly `depth` plies with no deadline.
    pub fn search_fixed_depth(
        &mut self,
        board: &Board,
        player: Stone,
        depth: u8,
        top_n: usize,
    ) -> SearchResult {
        let start = Instant::now();
        self.begin(None);
        let top_n = top_n.max(1);
        let depth = depth.max(1);
        let mut work_board = board.clone();

        match self.search_root(&mut work_board, player, depth, top_n, None) {
            Some(moves) if !moves.is_empty() => {
                self.build_result(depth, moves, top_n, start.elapsed(), None)
            }
            _ => self.fallback(board, player, top_n),
        }
    }

    /// Score of `player` playing `pos`, searched `depth` plies deep
    /// including the move itself.
    ///
    /// Uses the same scale as the root scores of a search at `depth`;
    /// depth 0 is the static evaluation after the move.
    pub fn evaluate_move(
        &mut self,
        board: &Board,
        player: Stone,
        pos: Pos,
        depth: u8,
    ) -> Result<i32, EngineError> {
        self.evaluate_move_within(board, player, pos, depth, SearchLimits::default())
    }

    /// [`Searcher::evaluate_move`] bounded by `limits`; running past either
    /// bound returns `SearchTimeout`.
    pub fn evaluate_move_within(
        &mut self,
        board: &Board,
        player: Stone,
        pos: Pos,
        depth: u8,
        limits: SearchLimits,
    ) -> Result<i32, EngineError> {
        if player == Stone::Empty {
            return Err(EngineError::InvalidPlayer { x: pos.x, y: pos.y });
        }
        if !board.is_empty(pos) {
            return Err(EngineError::OverlappingOrCorruptState { x: pos.x, y: pos.y });
        }

        self.begin(limits.deadline);
        self.node_limit = limits.max_nodes;
        let mut work_board = board.clone();
        work_board.make_move(pos, player);
        if has_five_at_pos(&work_board, pos, player) {
            return Ok(WIN_SCORE - 1);
        }
        if depth == 0 {
            return Ok(evaluate(&work_board, player));
        }

        let mut pv = Vec::new();
        let score = self.negamax(&mut work_board, player.opponent(), depth - 1, 1, -INF, INF, &mut pv);
        self.node_limit = None;
        score.map(|s| -s).ok_or(EngineError::SearchTimeout { depth })
    }

    /// Static scores of every candidate, best first (ties keep the static
    /// move order).
    pub fn static_moves(&mut self, board: &Board, player: Stone) -> Vec<ScoredMove> {
        let mut moves = generate_candidates(board, player, self.candidate_radius, self.candidate_limit);
        self.orderer.order(board, player, &mut moves, 0);

        let mut work_board = board.clone();
        let mut scored: Vec<ScoredMove> = moves
            .into_iter()
            .map(|pos| {
                work_board.make_move(pos, player);
                let score = if has_five_at_pos(&work_board, pos, player) {
                    WIN_SCORE - 1
                } else {
                    evaluate(&work_board, player)
                };
                work_board.undo_move();
                ScoredMove { pos, score }
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    fn fallback(&mut self, board: &Board, player: Stone, top_n: usize) -> SearchResult {
        let moves = self.static_moves(board, player);
        let best = moves.first().copied();
        SearchResult {
            best_move: best.map(|m| m.pos),
            score: best.map_or(0, |m| m.score),
            depth_reached: 0,
            principal_variation: best.map(|m| m.pos).into_iter().collect(),
            elapsed_ms: 0,
            completed: false,
            aborted_depth: None,
            nodes: self.stats.nodes,
            candidates: moves.into_iter().take(top_n).collect(),
            search_type: SearchType::Fallback,
        }
    }

    fn build_result(
        &self,
        depth: u8,
        moves: Vec<RootMove>,
        top_n: usize,
        elapsed: Duration,
        aborted_depth: Option<u8>,
    ) -> SearchResult {
        let candidates = moves
            .iter()
            .take(top_n)
            .map(|m| ScoredMove {
                pos: m.pos,
                score: m.score,
            })
            .collect();
        let best = moves.into_iter().next();
        SearchResult {
            best_move: best.as_ref().map(|m| m.pos),
            score: best.as_ref().map_or(0, |m| m.score),
            depth_reached: depth,
            principal_variation: best.map(|m| m.pv).unwrap_or_default(),
            elapsed_ms: elapsed_ms(elapsed),
            completed: aborted_depth.is_none(),
            aborted_depth,
            nodes: self.stats.nodes,
            candidates,
            search_type: SearchType::AlphaBeta,
        }
    }

    /// Root search keeping exact scores for the best `top_n` moves.
    ///
    /// A move is searched with alpha at the current n-th best score, so
    /// moves that cannot enter the list fail low cheaply.
    fn search_root(
        &mut self,
        board: &mut Board,
        player: Stone,
        depth: u8,
        top_n: usize,
        pv_move: Option<Pos>,
    ) -> Option<Vec<RootMove>> {
        let opponent = player.opponent();
        let mut moves = generate_candidates(board, player, self.candidate_radius, self.candidate_limit);
        self.orderer.order(board, player, &mut moves, 0);
        // Previous iteration's best move first
        if let Some(i) = pv_move.and_then(|pv| moves.iter().position(|&m| m == pv)) {
            moves[..=i].rotate_right(1);
        }

        let mut scored: Vec<RootMove> = Vec::with_capacity(top_n + 1);
        let mut child_pv = Vec::new();
        for mv in moves {
            let alpha = if scored.len() >= top_n {
                scored[top_n - 1].score
            } else {
                -INF
            };

            board.make_move(mv, player);
            let score = if has_five_at_pos(board, mv, player) {
                child_pv.clear();
                Some(WIN_SCORE - 1)
            } else {
                self.negamax(board, opponent, depth - 1, 1, -INF, -alpha, &mut child_pv)
                    .map(|s| -s)
            };
            board.undo_move();
            let score = score?;

            if score > alpha {
                let mut pv = Vec::with_capacity(child_pv.len() + 1);
                pv.push(mv);
                pv.extend_from_slice(&child_pv);
                // After existing equal scores: earlier moves win ties
                let at = scored.partition_point(|m| m.score >= score);
                scored.insert(at, RootMove { pos: mv, score, pv });
                scored.truncate(top_n);
            }
        }
        Some(scored)
    }

    /// Negamax with alpha-beta pruning. `None` means the deadline or node
    /// limit passed;
    /// the board is restored before returning either way.
    #[allow(clippy::too_many_arguments, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn negamax(
        &mut self,
        board: &mut Board,
        player: Stone,
        depth: u8,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
        pv: &mut Vec<Pos>,
    ) -> Option<i32> {
        pv.clear();
        self.stats.nodes += 1;
        if self.aborted
            || self.out_of_nodes()
            || (self.stats.nodes % CHECK_INTERVAL == 0 && self.out_of_time())
        {
            self.aborted = true;
            return None;
        }

        // Five on the next move ends the game
        if let Some(&win) = five_cells(board, player).first() {
            pv.push(win);
            return Some(WIN_SCORE - (ply as i32 + 1));
        }
        if depth == 0 {
            return Some(evaluate(board, player));
        }

        let key = position_key(board.hash(), player);
        let alpha_orig = alpha;
        if self.use_tt {
            self.stats.tt_probes += 1;
            if let Some(mut entry) = self.tt.probe(key, depth) {
                entry.score = score_from_tt(entry.score, ply);
                if let Some(score) = entry.cutoff(&mut alpha, &mut beta) {
                    self.stats.tt_hits += 1;
                    pv.extend(entry.best_move);
                    return Some(score);
                }
            }
        }

        let mut moves = generate_candidates(board, player, self.candidate_radius, self.candidate_limit);
        if moves.is_empty() {
            // Board full: draw
            return Some(0);
        }
        self.orderer.order(board, player, &mut moves, ply);

        let opponent = player.opponent();
        let mut best_score = -INF;
        let mut best_move = None;
        let mut cutoff = false;
        let mut child_pv = Vec::new();

        for (i, &mv) in moves.iter().enumerate() {
            board.make_move(mv, player);
            let score = self
                .negamax(board, opponent, depth - 1, ply + 1, -beta, -alpha, &mut child_pv)
                .map(|s| -s);
            board.undo_move();
            let score = score?;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                pv.clear();
                pv.push(mv);
                pv.extend_from_slice(&child_pv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.stats.beta_cutoffs += 1;
                if i == 0 {
                    self.stats.first_move_cutoffs += 1;
                }
                self.orderer.record_cutoff(mv, player, depth, ply);
                cutoff = true;
                break;
            }
        }

        if let Some(mv) = best_move {
            if !cutoff && best_score > alpha_orig {
                self.orderer.record_best(mv, player, depth);
            }
        }

        if self.use_tt {
            let entry_type = if best_score <= alpha_orig {
                EntryType::UpperBound
            } else if best_score >= beta {
                EntryType::LowerBound
            } else {
                EntryType::Exact
            };
            self.tt.store(key, depth, score_to_tt(best_score, ply), entry_type, best_move);
        }

        Some(best_score)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Move;

    fn setup_board(black: &[(u8, u8)], white: &[(u8, u8)]) -> Board {
        let mut board = Board::new();
        for &(x, y) in black {
            board.apply_move(Move::new(Pos::new(x, y), Stone::Black)).unwrap();
        }
        for &(x, y) in white {
            board.apply_move(Move::new(Pos::new(x, y), Stone::White)).unwrap();
        }
        board
    }

    fn config(ordering: bool, tt: bool) -> EngineConfig {
        EngineConfig {
            use_move_ordering: ordering,
            use_transposition_table: tt,
            candidate_limit: 12,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_iteration_depths() {
        assert_eq!(iteration_depths(8), vec![2, 4, 6, 8]);
        assert_eq!(iteration_depths(5), vec![2, 4, 5]);
        assert_eq!(iteration_depths(1), vec![1]);
        assert_eq!(iteration_depths(0), vec![1]);
    }

    #[test]
    fn test_tt_score_adjustment_roundtrip() {
        for score in [WIN_SCORE - 5, -(WIN_SCORE - 7), 1234, 0] {
            assert_eq!(score_from_tt(score_to_tt(score, 6), 6), score);
        }
        // A win 3 plies below a node at ply 4 is stored as 3 plies from the node
        assert_eq!(score_to_tt(WIN_SCORE - 7, 4), WIN_SCORE - 3);
    }

    #[test]
    fn test_search_empty_board() {
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search(&Board::new(), Stone::Black, Duration::from_millis(500), 1);
        assert_eq!(result.best_move, Some(Pos::center()));
    }

    #[test]
    fn test_search_finds_winning_move() {
        let board = setup_board(&[(3, 7), (4, 7), (5, 7), (6, 7)], &[(2, 7), (9, 9), (10, 10)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search(&board, Stone::Black, Duration::from_millis(500), 1);
        assert_eq!(result.best_move, Some(Pos::new(7, 7)));
        assert_eq!(result.score, WIN_SCORE - 1);
        assert!(result.is_win());
        assert!(result.completed);
    }

    #[test]
    fn test_search_blocks_opponent_win() {
        let board = setup_board(&[(3, 7), (4, 7), (5, 7), (6, 7), (0, 0)], &[(2, 7), (9, 9), (10, 10)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search(&board, Stone::White, Duration::from_millis(500), 1);
        assert_eq!(result.best_move, Some(Pos::new(7, 7)));
    }

    #[test]
    fn test_open_four_scores_distance() {
        // Black open three: the open four wins on the third ply
        let board = setup_board(&[(6, 7), (7, 7), (8, 7)], &[(6, 9), (8, 9)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search_fixed_depth(&board, Stone::Black, 2, 1);
        assert_eq!(result.score, WIN_SCORE - 3);
        assert_eq!(result.principal_variation.len(), 3);
        let first = result.best_move.unwrap();
        assert!(first == Pos::new(5, 7) || first == Pos::new(9, 7));
    }

    #[test]
    fn test_top_n_candidates_sorted() {
        let board = setup_board(&[(7, 7), (8, 8)], &[(7, 8)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search_fixed_depth(&board, Stone::White, 2, 3);
        assert_eq!(result.candidates.len(), 3);
        assert!(result.candidates.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(result.candidates[0].pos, result.best_move.unwrap());
        assert_eq!(result.candidates[0].score, result.score);
    }

    #[test]
    fn test_multi_pv_scores_are_exact() {
        let board = setup_board(&[(7, 7), (8, 8), (6, 9)], &[(7, 8), (8, 7)]);
        let mut searcher = Searcher::new(&config(true, false));
        let result = searcher.search_fixed_depth(&board, Stone::White, 2, 3);
        for candidate in &result.candidates {
            let exact = searcher.evaluate_move(&board, Stone::White, candidate.pos, 2).unwrap();
            assert_eq!(candidate.score, exact, "{}", candidate.pos);
        }
    }

    #[test]
    fn test_ordering_preserves_value() {
        let board = setup_board(&[(7, 7), (8, 8), (6, 9), (9, 6)], &[(7, 8), (8, 7), (6, 6)]);
        let mut ordered = Searcher::new(&config(true, false));
        let mut unordered = Searcher::new(&config(false, false));
        let a = ordered.search_fixed_depth(&board, Stone::White, 3, 1);
        let b = unordered.search_fixed_depth(&board, Stone::White, 3, 1);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn test_evaluate_move_errors() {
        let board = setup_board(&[(7, 7)], &[]);
        let mut searcher = Searcher::new(&config(true, true));
        assert_eq!(
            searcher.evaluate_move(&board, Stone::White, Pos::new(7, 7), 2),
            Err(EngineError::OverlappingOrCorruptState { x: 7, y: 7 })
        );
        assert!(matches!(
            searcher.evaluate_move(&board, Stone::Empty, Pos::new(0, 0), 2),
            Err(EngineError::InvalidPlayer { .. })
        ));
    }

    #[test]
    fn test_evaluate_move_node_limit() {
        let board = setup_board(&[(7, 7)], &[]);
        let mut searcher = Searcher::new(&config(true, false));
        let tight = SearchLimits {
            deadline: None,
            max_nodes: Some(1),
        };
        assert_eq!(
            searcher.evaluate_move_within(&board, Stone::White, Pos::new(0, 0), 2, tight),
            Err(EngineError::SearchTimeout { depth: 2 })
        );
        // Static and five-making moves never search
        assert!(searcher
            .evaluate_move_within(&board, Stone::White, Pos::new(0, 0), 0, tight)
            .is_ok());

        // The limit does not outlive its call
        let unlimited = searcher.evaluate_move(&board, Stone::White, Pos::new(0, 0), 2).unwrap();
        let roomy = SearchLimits {
            deadline: None,
            max_nodes: Some(1_000_000),
        };
        assert_eq!(
            searcher.evaluate_move_within(&board, Stone::White, Pos::new(0, 0), 2, roomy),
            Ok(unlimited)
        );
    }

    #[test]
    fn test_zero_budget_falls_back() {
        let board = setup_board(&[(7, 7), (8, 8)], &[(7, 8)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.search(&board, Stone::White, Duration::ZERO, 2);
        // The first iteration may or may not finish before the first poll;
        // either way a real move comes back.
        assert!(result.best_move.is_some());
        if !result.completed {
            assert!(result.clone().ensure_completed().is_err());
        }
    }

    #[test]
    fn test_fallback_result_shape() {
        let board = setup_board(&[(7, 7), (8, 8)], &[(7, 8)]);
        let mut searcher = Searcher::new(&config(true, true));
        let result = searcher.fallback(&board, Stone::White, 2);
        assert_eq!(result.search_type, SearchType::Fallback);
        assert!(!result.completed);
        assert!(result.best_move.is_some());
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(
            result.ensure_completed(),
            Err(EngineError::SearchTimeout { depth: 1 })
        );
    }

    #[test]
    fn test_tt_used_on_repeat_search() {
        let board = setup_board(&[(7, 7), (8, 8), (6, 9)], &[(7, 8), (8, 7)]);
        let mut searcher = Searcher::new(&config(true, true));
        let first = searcher.search_fixed_depth(&board, Stone::White, 3, 1);
        assert!(searcher.tt_stats().used > 0);
        let second = searcher.search_fixed_depth(&board, Stone::White, 3, 1);
        assert!(searcher.stats().tt_hits > 0);
        assert_eq!(first.score, second.score);
    }

    #[test]
    fn test_board_restored_after_search() {
        let board = setup_board(&[(7, 7), (8, 8)], &[(7, 8)]);
        let before = board.clone();
        let mut searcher = Searcher::new(&config(true, true));
        searcher.search_fixed_depth(&board, Stone::White, 2, 1);
        assert_eq!(board, before);
        assert_eq!(board.hash(), before.hash());
    }
}
