//! VCF/VCT threat search for forced wins
//!
//! This module implements specialized threat-space search algorithms:
//! - VCF (Victory by Continuous Fours): every attacker move makes a four, so
//!   every defender reply is forced
//! - VCT (Victory by Continuous Threats): additionally allows open threes,
//!   which the attacker must follow up against every defence
//!
//! These are powerful pruning techniques that can find forced wins much faster
//! than regular alpha-beta search by only considering forcing moves.
//!
//! Depths are counted in plies (attacker and defender moves both count). A
//! winning sequence alternates attacker and defender moves and ends with the
//! attacker's five.
//!
//! # Example
//!
//! ```
//! use gomoku::board::{Board, Move, Pos, Stone};
//! use gomoku::search::detect_vcf;
//!
//! let mut board = Board::new();
//! for x in 5..8 {
//!     board.apply_move(Move::new(Pos::new(x, 7), Stone::Black)).unwrap();
//! }
//! // An open three is one four away from an unstoppable open four
//! let vcf = detect_vcf(&board, Stone::Black, 5);
//! assert!(vcf.found);
//! assert_eq!(vcf.winning_sequence.len(), 3);
//! ```

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;

use crate::board::bitboard::Bitboard;
use crate::board::{Board, Move, Pos, Stone};
use crate::config::EngineConfig;
use crate::eval::{five_cells, four_moves, move_threat, threats_at, ThreatType};
use crate::rules::makes_five;

use super::zobrist::position_key;

/// Cells on a threatened line, either side of the threat move, that count as
/// defences against it
const DEFENCE_REACH: i32 = 5;

/// Failed-position memo size at which it is flushed
const MEMO_LIMIT: usize = 1 << 16;

/// Result of a VCF/VCT search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VcfResult {
    /// Whether a forced win was found
    pub found: bool,
    /// Alternating attacker/defender moves, ending with the attacker's five
    pub winning_sequence: Vec<Move>,
    /// Length of the sequence in plies
    pub terminal_depth: u8,
}

/// VCT results share the VCF shape.
pub type VctResult = VcfResult;

impl VcfResult {
    /// Create a result indicating no forced win was found
    #[inline]
    fn not_found() -> Self {
        Self::default()
    }

    /// Create a result with a found winning sequence
    #[inline]
    fn found(sequence: Vec<Move>) -> Self {
        Self {
            found: true,
            terminal_depth: u8::try_from(sequence.len()).unwrap_or(u8::MAX),
            winning_sequence: sequence,
        }
    }

    /// The attacker's first move, if a win was found
    pub fn first_move(&self) -> Option<Pos> {
        self.winning_sequence.first().map(|m| m.pos())
    }
}

/// Moves that stop an opponent's forced win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VctDefense {
    /// Whether the opponent has a VCF/VCT at all
    pub threatened: bool,
    /// The opponent's winning line, when threatened
    pub threat: VcfResult,
    /// Moves after which the opponent no longer has a forced win
    pub defenses: Vec<Pos>,
}

/// Threat searcher for VCF/VCT algorithms
#[derive(Debug, Clone)]
pub struct ThreatSearcher {
    /// Maximum depth for VCF search, in plies
    max_vcf_depth: u8,
    /// Maximum depth for VCT search, in plies
    max_vct_depth: u8,
    vcf_node_budget: u64,
    vct_node_budget: u64,
    /// Node counter of the current search
    nodes: u64,
    budget: u64,
    deadline: Option<Instant>,
    exhausted: bool,
    /// Attacker positions (keyed with side) proven not to win in N plies
    failed: HashSet<(u64, u8)>,
}

impl Default for ThreatSearcher {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ThreatSearcher {
    /// Create a threat searcher with custom depth limits
    pub fn with_depths(vcf_depth: u8, vct_depth: u8) -> Self {
        Self {
            max_vcf_depth: vcf_depth,
            max_vct_depth: vct_depth,
            ..Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_vcf_depth: config.vcf_depth,
            max_vct_depth: config.vct_depth,
            vcf_node_budget: config.vcf_node_budget,
            vct_node_budget: config.vct_node_budget,
            nodes: 0,
            budget: config.vcf_node_budget,
            deadline: None,
            exhausted: false,
            failed: HashSet::new(),
        }
    }

    /// Stop searching (reporting no win) once `deadline` passes.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    /// Nodes visited by the last search
    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Whether the last search hit its node budget or deadline
    #[inline]
    pub fn was_exhausted(&self) -> bool {
        self.exhausted
    }

    fn start(&mut self, budget: u64) {
        self.nodes = 0;
        self.budget = budget;
        self.exhausted = false;
        if self.failed.len() > MEMO_LIMIT {
            self.failed.clear();
        }
    }

    /// Count a node; false once the budget or deadline is spent.
    fn tick(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.budget {
            self.exhausted = true;
        } else if self.nodes % 32 == 0 && self.deadline.map_or(false, |d| Instant::now() >= d) {
            self.exhausted = true;
        }
        !self.exhausted
    }

    /// Search for VCF within the configured depth.
    pub fn search_vcf(&mut self, board: &Board, attacker: Stone) -> VcfResult {
        self.search_vcf_depth(board, attacker, self.max_vcf_depth)
    }

    /// Search for VCF within `max_depth` plies.
    pub fn search_vcf_depth(&mut self, board: &Board, attacker: Stone, max_depth: u8) -> VcfResult {
        self.start(self.vcf_node_budget);
        let mut work_board = board.clone();
        let mut sequence = Vec::new();
        if self.vcf(&mut work_board, attacker, max_depth, &mut sequence) {
            VcfResult::found(sequence)
        } else {
            VcfResult::not_found()
        }
    }

    /// Search for VCT within the configured depth.
    pub fn search_vct(&mut self, board: &Board, attacker: Stone) -> VctResult {
        self.search_vct_depth(board, attacker, self.max_vct_depth)
    }

    /// Search for VCT within `max_depth` plies.
    pub fn search_vct_depth(&mut self, board: &Board, attacker: Stone, max_depth: u8) -> VctResult {
        self.start(self.vct_node_budget);
        let mut work_board = board.clone();
        let mut sequence = Vec::new();
        if self.vct(&mut work_board, attacker, max_depth, &mut sequence) {
            VcfResult::found(sequence)
        } else {
            VcfResult::not_found()
        }
    }

    /// Attacker node of the VCF tree.
    fn vcf(&mut self, board: &mut Board, attacker: Stone, plies_left: u8, seq: &mut Vec<Move>) -> bool {
        if !self.tick() {
            return false;
        }

        if let Some(&win) = five_cells(board, attacker).first() {
            seq.push(Move::new(win, attacker));
            return true;
        }
        // A four, its block and the five
        if plies_left < 3 {
            return false;
        }

        let key = (position_key(board.hash(), attacker), plies_left);
        if self.failed.contains(&key) {
            return false;
        }

        let defender = attacker.opponent();
        let threats = five_cells(board, defender);
        let candidates = match threats.len() {
            0 => four_moves(board, attacker),
            // Forced to block, and the block must itself be a four
            1 => threats
                .into_iter()
                .filter(|&p| move_threat(board, p, attacker).map_or(false, ThreatType::is_four_class))
                .collect(),
            _ => Vec::new(),
        };

        for four in candidates {
            board.make_move(four, attacker);
            let fives = five_cells(board, attacker);
            let won = match fives.as_slice() {
                [] => false,
                [block] => {
                    let block = *block;
                    let mark = seq.len();
                    seq.push(Move::new(four, attacker));
                    seq.push(Move::new(block, defender));
                    board.make_move(block, defender);
                    let won = self.vcf(board, attacker, plies_left - 2, seq);
                    board.undo_move();
                    if !won {
                        seq.truncate(mark);
                    }
                    won
                }
                // Two ways to five: whichever the defender blocks, the other wins
                [first, second, ..] => {
                    seq.push(Move::new(four, attacker));
                    seq.push(Move::new(*first, defender));
                    seq.push(Move::new(*second, attacker));
                    true
                }
            };
            board.undo_move();
            if won {
                return true;
            }
            if self.exhausted {
                return false;
            }
        }

        self.failed.insert(key);
        false
    }

    /// Attacker node of the VCT tree.
    fn vct(&mut self, board: &mut Board, attacker: Stone, plies_left: u8, seq: &mut Vec<Move>) -> bool {
        if !self.tick() {
            return false;
        }

        if let Some(&win) = five_cells(board, attacker).first() {
            seq.push(Move::new(win, attacker));
            return true;
        }
        if plies_left < 3 {
            return false;
        }
        if self.vcf(board, attacker, plies_left, seq) {
            return true;
        }
        if self.exhausted {
            return false;
        }

        let defender = attacker.opponent();
        // Threes are not forcing against a defender with fours of its own
        if !five_cells(board, defender).is_empty() || !four_moves(board, defender).is_empty() {
            return false;
        }

        for three in three_moves(board, attacker) {
            board.make_move(three, attacker);
            let defences = defences_against(board, three, attacker);
            let mark = seq.len();
            seq.push(Move::new(three, attacker));

            let mut all_lost = !defences.is_empty();
            for (i, &defence) in defences.iter().enumerate() {
                board.make_move(defence, defender);
                // Only the first defence's line is kept in the sequence
                let won = if i == 0 {
                    seq.push(Move::new(defence, defender));
                    self.vct(board, attacker, plies_left - 2, seq)
                } else {
                    let mut scratch = Vec::new();
                    self.vct(board, attacker, plies_left - 2, &mut scratch)
                };
                board.undo_move();
                if !won {
                    all_lost = false;
                    break;
                }
            }

            board.undo_move();
            if all_lost {
                return true;
            }
            seq.truncate(mark);
            if self.exhausted {
                return false;
            }
        }
        false
    }

    /// Moves for `defender` after which the opponent has no VCT.
    pub fn find_vct_defenses(&mut self, board: &Board, defender: Stone) -> VctDefense {
        let attacker = defender.opponent();
        let threat = self.search_vct(board, attacker);
        if !threat.found {
            return VctDefense::default();
        }

        let mut defenses = Vec::new();
        let mut work_board = board.clone();
        for cell in defence_candidates(board, defender, &threat) {
            if makes_five(&work_board, cell, defender) {
                defenses.push(cell);
                continue;
            }
            work_board.make_move(cell, defender);
            let refuted = !self.search_vct(&work_board, attacker).found && !self.exhausted;
            work_board.undo_move();
            if refuted {
                defenses.push(cell);
            }
        }

        VctDefense {
            threatened: true,
            threat,
            defenses,
        }
    }
}

/// Moves after which `attacker` has an open-three-class threat through them.
fn three_moves(board: &Board, attacker: Stone) -> Vec<Pos> {
    crate::eval::threats::line_neighbors(board, attacker)
        .iter_ones()
        .filter(|&p| move_threat(board, p, attacker).map_or(false, ThreatType::is_open_three_class))
        .collect()
}

/// Empty cells on the lines of the open threes through `three`.
fn defences_against(board: &Board, three: Pos, attacker: Stone) -> Vec<Pos> {
    let mut cells = Bitboard::new();
    for record in threats_at(board, three, attacker) {
        if !record.threat_type.is_open_three_class() {
            continue;
        }
        let (dx, dy) = record.direction.delta();
        for k in (-DEFENCE_REACH..=DEFENCE_REACH).filter(|&k| k != 0) {
            if let Some(p) = three.offset(dx, dy, k) {
                if board.is_empty(p) {
                    cells.set(p);
                }
            }
        }
    }
    cells.iter_ones().collect()
}

/// Cells worth trying against a found threat: the cells of the winning line,
/// the lines through its first move, and the defender's own fours.
fn defence_candidates(board: &Board, defender: Stone, threat: &VcfResult) -> Vec<Pos> {
    let mut cells = Bitboard::new();
    for m in &threat.winning_sequence {
        if board.is_empty(m.pos()) {
            cells.set(m.pos());
        }
    }
    if let Some(first) = threat.first_move() {
        for (dx, dy) in crate::rules::DIRECTIONS {
            for k in (-DEFENCE_REACH..=DEFENCE_REACH).filter(|&k| k != 0) {
                if let Some(p) = first.offset(dx, dy, k) {
                    if board.is_empty(p) {
                        cells.set(p);
                    }
                }
            }
        }
    }
    for p in four_moves(board, defender) {
        cells.set(p);
    }
    cells.iter_ones().collect()
}

/// Search for a VCF of `player` within `max_depth` plies.
pub fn detect_vcf(board: &Board, player: Stone, max_depth: u8) -> VcfResult {
    ThreatSearcher::default().search_vcf_depth(board, player, max_depth)
}

/// Search for a VCT of `player` within `max_depth` plies.
pub fn detect_vct(board: &Board, player: Stone, max_depth: u8) -> VctResult {
    ThreatSearcher::default().search_vct_depth(board, player, max_depth)
}

/// Moves for `defender` that stop the opponent's VCT within `max_depth`.
pub fn find_vct_defenses(board: &Board, defender: Stone, max_depth: u8) -> VctDefense {
    ThreatSearcher::with_depths(max_depth, max_depth).find_vct_defenses(board, defender)
}
