//! Win condition checking for freestyle Gomoku
//!
//! Five or more consecutive stones of one color in any of the four line
//! directions win. There are no captures or forbidden moves.

use crate::board::{Board, Pos, Stone};

/// Direction vectors for line checking (4 directions)
pub const DIRECTIONS: [(i32, i32); 4] = [
    (1, 0),  // Horizontal
    (0, 1),  // Vertical
    (1, 1),  // Diagonal down
    (1, -1), // Diagonal up
];

/// Consecutive `color` stones through `pos` along `(dx, dy)`, counting `pos`
/// itself whether or not it is occupied.
#[inline]
pub fn line_length(board: &Board, pos: Pos, dx: i32, dy: i32, color: Stone) -> usize {
    let mut count = 1;
    for sign in [1, -1] {
        let mut k = 1;
        while let Some(p) = pos.offset(dx * sign, dy * sign, k) {
            if board.get(p) != color {
                break;
            }
            count += 1;
            k += 1;
        }
    }
    count
}

/// Fast five-in-a-row check through a specific position.
///
/// Only checks 4 directions from the given position. No allocation.
#[inline]
pub fn has_five_at_pos(board: &Board, pos: Pos, color: Stone) -> bool {
    board.get(pos) == color
        && DIRECTIONS
            .iter()
            .any(|&(dx, dy)| line_length(board, pos, dx, dy, color) >= 5)
}

/// Would a `color` stone on the empty cell `pos` complete five or more?
#[inline]
pub fn makes_five(board: &Board, pos: Pos, color: Stone) -> bool {
    board.is_empty(pos)
        && DIRECTIONS
            .iter()
            .any(|&(dx, dy)| line_length(board, pos, dx, dy, color) >= 5)
}

/// The stones of a five-or-more line through `pos`, if one exists.
pub fn find_five_line_at_pos(board: &Board, pos: Pos, color: Stone) -> Option<Vec<Pos>> {
    if board.get(pos) != color {
        return None;
    }
    for &(dx, dy) in &DIRECTIONS {
        if line_length(board, pos, dx, dy, color) < 5 {
            continue;
        }
        // Walk back to the start of the run, then collect forward
        let mut start = pos;
        while let Some(p) = start.offset(-dx, -dy, 1) {
            if board.get(p) != color {
                break;
            }
            start = p;
        }
        let mut line = vec![start];
        let mut k = 1;
        while let Some(p) = start.offset(dx, dy, k) {
            if board.get(p) != color {
                break;
            }
            line.push(p);
            k += 1;
        }
        return Some(line);
    }
    None
}

/// Find the positions of any five-in-a-row of `color`.
pub fn find_five_positions(board: &Board, color: Stone) -> Option<Vec<Pos>> {
    let stones = board.stones(color)?;
    stones
        .iter_ones()
        .find_map(|pos| find_five_line_at_pos(board, pos, color))
}

/// Check if there's 5+ in a row for the given color
pub fn has_five_in_row(board: &Board, color: Stone) -> bool {
    find_five_positions(board, color).is_some()
}

/// Check for a winner. Black is reported first if both colors have a five
/// (an inconsistent position that validated replays never produce).
pub fn check_winner(board: &Board) -> Option<Stone> {
    [Stone::Black, Stone::White]
        .into_iter()
        .find(|&stone| has_five_in_row(board, stone))
}
