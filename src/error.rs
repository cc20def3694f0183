//! Error taxonomy for board validation and search

use thiserror::Error;

/// Errors reported to callers of the engine.
///
/// Validation variants carry the offending coordinates. They are raised
/// before any search starts and never silently corrected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("board must be 15x15, got {rows}x{cols}")]
    InvalidBoardDimensions { rows: usize, cols: usize },

    #[error("invalid cell value {value} at ({x}, {y})")]
    InvalidCellValue { x: u8, y: u8, value: u8 },

    #[error("move at ({x}, {y}) has no player")]
    InvalidPlayer { x: u8, y: u8 },

    #[error("coordinates ({x}, {y}) are off the board")]
    OutOfBounds { x: i32, y: i32 },

    #[error("cell ({x}, {y}) is already occupied")]
    OverlappingOrCorruptState { x: u8, y: u8 },

    #[error("at least {required} moves are needed for game analysis, got {actual}")]
    InsufficientMoveHistory { required: usize, actual: usize },

    #[error("search ran out of time before completing depth {depth}")]
    SearchTimeout { depth: u8 },

    #[error("invalid coordinate notation: {0:?}")]
    InvalidNotation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
