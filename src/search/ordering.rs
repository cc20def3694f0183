//! Candidate generation and move ordering
//!
//! Candidate generation decides *which* moves a node searches; ordering only
//! decides *in which order*. Keeping the two apart means turning ordering off
//! searches exactly the same tree, just with fewer cutoffs.
//!
//! Ordering tiers, strictly:
//! 1. Moves that complete or block a five or an open four
//! 2. Killer moves (two per ply)
//! 3. History heuristic, higher first
//! 4. Positional bonus, then board index

use std::cmp::Reverse;

use crate::board::bitboard::Bitboard;
use crate::board::{Board, Pos, Stone, TOTAL_CELLS};
use crate::eval::{five_cells, move_threat, position_bonus, ThreatType};

/// Maximum ply tracked by the killer table
pub const MAX_PLY: usize = 64;

/// Candidate moves for `player`, in board index order.
///
/// - Empty board: the center only.
/// - `player` can complete five: those cells.
/// - The opponent can complete five and `player` cannot: the blocking cells.
/// - Otherwise: empty cells within Chebyshev `radius` of any stone. When more
///   than `limit` remain, the ones with the highest static potential are
///   kept (ties by index).
pub fn generate_candidates(board: &Board, player: Stone, radius: u8, limit: usize) -> Vec<Pos> {
    if board.is_board_empty() {
        return vec![Pos::center()];
    }

    let wins = five_cells(board, player);
    if !wins.is_empty() {
        return wins;
    }
    let blocks = five_cells(board, player.opponent());
    if !blocks.is_empty() {
        return blocks;
    }

    let r = i32::from(radius);
    let mut near = Bitboard::new();
    for stone in board.occupied() {
        for dy in -r..=r {
            for dx in -r..=r {
                if let Some(p) = stone.offset(dx, dy, 1) {
                    if board.is_empty(p) {
                        near.set(p);
                    }
                }
            }
        }
    }

    let mut moves: Vec<Pos> = near.iter_ones().collect();
    if moves.len() > limit {
        let mut ranked: Vec<(i32, Pos)> = moves
            .iter()
            .map(|&p| (static_potential(board, p, player), p))
            .collect();
        ranked.sort_by_key(|&(potential, p)| (Reverse(potential), p));
        moves = ranked.into_iter().take(limit).map(|(_, p)| p).collect();
        moves.sort_unstable();
    }
    moves
}

/// Attack plus defence value of a cell, with the positional bonus as a
/// tiebreaker.
fn static_potential(board: &Board, pos: Pos, player: Stone) -> i32 {
    let attack = move_threat(board, pos, player).map_or(0, ThreatType::score);
    let defence = move_threat(board, pos, player.opponent()).map_or(0, ThreatType::score);
    attack + defence + position_bonus(pos)
}

/// Tactical tier of a move: 0 = own five, 1 = block five,
/// 2 = own open four, 3 = block open four, 4 = none.
fn tactical_rank(board: &Board, pos: Pos, player: Stone) -> u8 {
    let own = move_threat(board, pos, player);
    let theirs = move_threat(board, pos, player.opponent());
    match (own, theirs) {
        (Some(ThreatType::Five), _) => 0,
        (_, Some(ThreatType::Five)) => 1,
        (Some(ThreatType::OpenFour), _) => 2,
        (_, Some(ThreatType::OpenFour)) => 3,
        _ => 4,
    }
}

/// Killer and history tables for one search.
#[derive(Debug, Clone)]
pub struct MoveOrderer {
    enabled: bool,
    killers: [[Option<Pos>; 2]; MAX_PLY],
    history: [[u32; TOTAL_CELLS]; 2],
}

impl MoveOrderer {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            killers: [[None; 2]; MAX_PLY],
            history: [[0; TOTAL_CELLS]; 2],
        }
    }

    /// Sort `moves` best-first. A no-op when ordering is disabled, so the
    /// moves stay in the order they were generated.
    pub fn order(&self, board: &Board, player: Stone, moves: &mut [Pos], ply: usize) {
        if !self.enabled || moves.len() < 2 {
            return;
        }
        let killers = self.killers(ply);
        moves.sort_by_cached_key(|&pos| {
            let killer = killers
                .iter()
                .position(|&k| k == Some(pos))
                .unwrap_or(killers.len());
            (
                tactical_rank(board, pos, player),
                killer,
                Reverse(self.history_score(pos, player)),
                Reverse(position_bonus(pos)),
                pos.to_index(),
            )
        });
    }

    /// Record a move that caused a beta cutoff.
    pub fn record_cutoff(&mut self, pos: Pos, player: Stone, depth: u8, ply: usize) {
        if !self.enabled {
            return;
        }
        if ply < MAX_PLY && self.killers[ply][0] != Some(pos) {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = Some(pos);
        }
        self.bump_history(pos, player, depth);
    }

    /// Record the best move of a node that raised alpha without a cutoff.
    pub fn record_best(&mut self, pos: Pos, player: Stone, depth: u8) {
        if self.enabled {
            self.bump_history(pos, player, depth);
        }
    }

    fn bump_history(&mut self, pos: Pos, player: Stone, depth: u8) {
        let d = u32::from(depth);
        let slot = &mut self.history[player.index()][pos.to_index()];
        *slot = slot.saturating_add(d * d);
    }

    /// Killer moves stored for a ply (empty beyond `MAX_PLY`)
    #[must_use]
    pub fn killers(&self, ply: usize) -> [Option<Pos>; 2] {
        self.killers.get(ply).copied().unwrap_or([None, None])
    }

    #[inline]
    #[must_use]
    pub fn history_score(&self, pos: Pos, player: Stone) -> u32 {
        self.history[player.index()][pos.to_index()]
    }

    /// Forget killers, keep history (call between searches).
    pub fn new_search(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
    }

    /// Clear history heuristic and killer moves.
    pub fn clear(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[0; TOTAL_CELLS]; 2];
    }
}
