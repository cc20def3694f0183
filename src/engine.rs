//! Engine integrating all search components
//!
//! The engine orchestrates the search algorithms to find the best moves in
//! a given position. The search follows a priority system:
//!
//! 1. **Terminal**: the game is already won or the board is full
//! 2. **Immediate win**: a move that completes five
//! 3. **Forced block**: the opponent threatens five next move
//! 4. **VCF (Victory by Continuous Fours)**: forced wins using fours
//! 5. **VCT (Victory by Continuous Threats)**: forced wins using open threes
//! 6. **Defense**: refute the opponent's forced win
//! 7. **Alpha-Beta**: iterative deepening with transposition table
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use gomoku::{Board, Engine, Move, Pos, Stone};
//!
//! let mut engine = Engine::new();
//! let mut board = Board::new();
//! for x in 3..7 {
//!     board.apply_move(Move::new(Pos::new(x, 7), Stone::Black)).unwrap();
//! }
//!
//! let result = engine.find_best_moves(&board, Stone::Black, Duration::from_millis(200), 1);
//! assert!(result.is_win());
//! assert!(result.best_move == Some(Pos::new(2, 7)) || result.best_move == Some(Pos::new(7, 7)));
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::board::{Board, Pos, Stone};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::eval::{detect_all_threats, evaluate, evaluate_position, five_cells, EvaluationResult, ThreatResult};
use crate::rules::{check_winner, has_five_at_pos};
use crate::search::{
    ScoredMove, SearchResult, SearchType, Searcher, ThreatSearcher, VcfResult, VctDefense, WIN_SCORE,
};

/// Request-scoped analysis engine.
///
/// Owns its searchers, transposition table and ordering tables, so one
/// engine serves one request at a time and independent engines can run on
/// separate threads.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    searcher: Searcher,
    threats: ThreatSearcher,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }

    pub(crate) fn from_valid_config(config: EngineConfig) -> Self {
        Self {
            searcher: Searcher::new(&config),
            threats: ThreatSearcher::from_config(&config),
            config,
        }
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use gomoku::{Engine, EngineConfig};
    ///
    /// let config = EngineConfig { max_depth: 4, ..EngineConfig::default() };
    /// let engine = Engine::with_config(config).unwrap();
    /// assert_eq!(engine.config().max_depth, 4);
    ///
    /// let broken = EngineConfig { tt_capacity: 0, ..EngineConfig::default() };
    /// assert!(Engine::with_config(broken).is_err());
    /// ```
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn searcher_mut(&mut self) -> &mut Searcher {
        &mut self.searcher
    }

    pub(crate) fn threats_mut(&mut self) -> &mut ThreatSearcher {
        &mut self.threats
    }

    /// Best moves for `player` within `time_budget`.
    ///
    /// Always returns a move when one exists; `completed = false` marks a
    /// result cut short by the budget.
    #[instrument(skip(self, board), fields(stones = board.stone_count()))]
    pub fn find_best_moves(
        &mut self,
        board: &Board,
        player: Stone,
        time_budget: Duration,
        top_n: usize,
    ) -> SearchResult {
        let start = Instant::now();
        let deadline = start + time_budget;
        let top_n = top_n.max(1);
        let player = if player == Stone::Empty {
            board.side_to_move()
        } else {
            player
        };
        let opponent = player.opponent();

        // 1. Game over
        if let Some(winner) = check_winner(board) {
            let score = if winner == player { WIN_SCORE } else { -WIN_SCORE };
            debug!(?winner, "position already decided");
            return SearchResult::terminal(score);
        }
        if board.is_full() {
            return SearchResult::terminal(0);
        }

        // 2. Immediate five
        if let Some(&win) = five_cells(board, player).first() {
            let mut result = SearchResult::terminal(WIN_SCORE - 1);
            result.best_move = Some(win);
            result.principal_variation = vec![win];
            result.candidates = vec![ScoredMove {
                pos: win,
                score: WIN_SCORE - 1,
            }];
            result.search_type = SearchType::ImmediateWin;
            result.elapsed_ms = elapsed_ms(start);
            return result;
        }

        // 3. The opponent completes five next move unless blocked
        let blocks = five_cells(board, opponent);
        if !blocks.is_empty() {
            debug!(blocks = blocks.len(), "forced block");
            return self.defense_result(board, player, &blocks, top_n, start);
        }

        // 4-5. Our forced wins
        self.threats.set_deadline(Some(deadline));
        let vcf = self.threats.search_vcf(board, player);
        if vcf.found {
            info!(length = vcf.winning_sequence.len(), "VCF found");
            return forced_win_result(&vcf, SearchType::Vcf, self.threats.nodes(), start);
        }
        let vct = self.threats.search_vct(board, player);
        if vct.found {
            info!(length = vct.winning_sequence.len(), "VCT found");
            return forced_win_result(&vct, SearchType::Vct, self.threats.nodes(), start);
        }

        // 6. The opponent's forced win
        let defense = self.threats.find_vct_defenses(board, player);
        self.threats.set_deadline(None);
        if defense.threatened {
            debug!(
                defenses = defense.defenses.len(),
                threat_length = defense.threat.winning_sequence.len(),
                "opponent has a forced win"
            );
            if !defense.defenses.is_empty() {
                return self.defense_result(board, player, &defense.defenses, top_n, start);
            }
        }

        // 7. Alpha-beta with what is left of the budget
        let remaining = deadline.saturating_duration_since(Instant::now());
        let mut result = self.searcher.search(board, player, remaining, top_n);
        result.elapsed_ms = elapsed_ms(start);
        result
    }

    /// Best-move search with the configured budget and `top_n`.
    pub fn best_move(&mut self, board: &Board, player: Stone) -> SearchResult {
        let budget = Duration::from_millis(self.config.time_budget_ms);
        let top_n = self.config.top_n;
        self.find_best_moves(board, player, budget, top_n)
    }

    /// Pick among forced replies by static evaluation after the move.
    fn defense_result(
        &mut self,
        board: &Board,
        player: Stone,
        replies: &[Pos],
        top_n: usize,
        start: Instant,
    ) -> SearchResult {
        let mut work_board = board.clone();
        let mut scored: Vec<ScoredMove> = replies
            .iter()
            .map(|&pos| {
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

        let best = scored.first().copied();
        let mut result = SearchResult::terminal(best.map_or(0, |m| m.score));
        result.best_move = best.map(|m| m.pos);
        result.principal_variation = result.best_move.into_iter().collect();
        result.candidates = scored.into_iter().take(top_n).collect();
        result.search_type = SearchType::Defense;
        result.nodes = self.threats.nodes();
        result.elapsed_ms = elapsed_ms(start);
        result
    }

    /// Every threat of `player` on the board.
    pub fn analyze_threats(&self, board: &Board, player: Stone) -> ThreatResult {
        detect_all_threats(board, player)
    }

    /// Static evaluation from `player`'s point of view.
    pub fn evaluate(&self, board: &Board, player: Stone) -> EvaluationResult {
        evaluate_position(board, player)
    }

    /// VCF search with the configured depth and no deadline.
    pub fn detect_vcf(&mut self, board: &Board, player: Stone) -> VcfResult {
        self.threats.set_deadline(None);
        self.threats.search_vcf(board, player)
    }

    /// Moves for `defender` that stop the opponent's VCT.
    pub fn find_vct_defenses(&mut self, board: &Board, defender: Stone) -> VctDefense {
        self.threats.set_deadline(None);
        self.threats.find_vct_defenses(board, defender)
    }

    /// Clear the transposition table and ordering tables.
    ///
    /// Call this between unrelated games.
    pub fn clear_cache(&mut self) {
        self.searcher.clear();
    }
}

fn forced_win_result(win: &VcfResult, search_type: SearchType, nodes: u64, start: Instant) -> SearchResult {
    let score = WIN_SCORE - i32::from(win.terminal_depth);
    let mut result = SearchResult::terminal(score);
    result.best_move = win.first_move();
    result.principal_variation = win.winning_sequence.iter().map(|m| m.pos()).collect();
    result.candidates = result
        .best_move
        .map(|pos| ScoredMove { pos, score })
        .into_iter()
        .collect();
    result.search_type = search_type;
    result.nodes = nodes;
    result.elapsed_ms = elapsed_ms(start);
    result
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
