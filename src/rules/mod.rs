//! Game rules for freestyle Gomoku
//!
//! Five or more in a row wins; every empty cell is a legal move.

pub mod win;

pub use win::{
    check_winner, find_five_line_at_pos, find_five_positions, has_five_at_pos, has_five_in_row,
    line_length, makes_five, DIRECTIONS,
};
