//! Pattern scores and line geometry for Gomoku evaluation
//!
//! The score ladder is fixed: every threat class outranks the next one down,
//! and evaluation, ordering and classification all read from it.

use serde::{Deserialize, Serialize};

/// Pattern scores for evaluation
pub struct PatternScore;

impl PatternScore {
    // Winning patterns
    /// Five in a row - immediate win
    pub const FIVE: i32 = 100_000;

    // Strong attacking patterns
    /// Open four: _OOOO_ (two ways to make five, cannot be blocked)
    pub const OPEN_FOUR: i32 = 10_000;
    /// Closed four: XOOOO_ or _OOOOX (one way to extend)
    pub const FOUR: i32 = 1_000;
    /// Split four: O_OOO, OO_OO, OOO_O (the gap makes five)
    pub const BROKEN_FOUR: i32 = 800;

    // Moderate threats
    /// Open three: _OOO_ (becomes open four if not blocked)
    pub const OPEN_THREE: i32 = 500;
    /// Closed three: XOOO_ or _OOOX (one side blocked)
    pub const THREE: i32 = 100;
    /// Split three: O_OO or OO_O with at least one open end
    pub const BROKEN_THREE: i32 = 80;

    // Building patterns
    /// Open two: _OO_ (potential to grow)
    pub const OPEN_TWO: i32 = 10;
}

/// Tactical class of a single line pattern, strongest first.
///
/// The derived `Ord` follows declaration order, so `Five < OpenFour < ...`
/// and `min()` over a set picks the strongest threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Five,
    OpenFour,
    Four,
    BrokenFour,
    OpenThree,
    Three,
    BrokenThree,
    OpenTwo,
}

impl ThreatType {
    /// All threat types, strongest first
    pub const ALL: [ThreatType; 8] = [
        ThreatType::Five,
        ThreatType::OpenFour,
        ThreatType::Four,
        ThreatType::BrokenFour,
        ThreatType::OpenThree,
        ThreatType::Three,
        ThreatType::BrokenThree,
        ThreatType::OpenTwo,
    ];

    /// Base score of this threat type
    #[inline]
    pub const fn score(self) -> i32 {
        match self {
            ThreatType::Five => PatternScore::FIVE,
            ThreatType::OpenFour => PatternScore::OPEN_FOUR,
            ThreatType::Four => PatternScore::FOUR,
            ThreatType::BrokenFour => PatternScore::BROKEN_FOUR,
            ThreatType::OpenThree => PatternScore::OPEN_THREE,
            ThreatType::Three => PatternScore::THREE,
            ThreatType::BrokenThree => PatternScore::BROKEN_THREE,
            ThreatType::OpenTwo => PatternScore::OPEN_TWO,
        }
    }

    /// Threats that make five on the next move (one cell away)
    #[inline]
    pub const fn is_four_class(self) -> bool {
        matches!(
            self,
            ThreatType::OpenFour | ThreatType::Four | ThreatType::BrokenFour
        )
    }

    /// Threats that become an open four on the next move
    #[inline]
    pub const fn is_open_three_class(self) -> bool {
        matches!(self, ThreatType::OpenThree | ThreatType::BrokenThree)
    }

    /// Index into per-type arrays (declaration order)
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// The four line directions of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Horizontal,
    Vertical,
    /// Top-left to bottom-right (x and y both increase)
    DiagDown,
    /// Bottom-left to top-right (x increases, y decreases)
    DiagUp,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::DiagDown,
        Direction::DiagUp,
    ];

    /// Unit step `(dx, dy)` along this direction
    #[inline]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
            Direction::DiagDown => (1, 1),
            Direction::DiagUp => (1, -1),
        }
    }
}

/// Kind of multi-line threat formed around a single stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeKind {
    DoubleFour,
    FourThree,
    /// Two open threes: the classic fork
    DoubleThree,
}

impl CompositeKind {
    /// Composite kind formed by two component threats, if any
    pub fn of(a: ThreatType, b: ThreatType) -> Option<CompositeKind> {
        match (a.is_four_class(), b.is_four_class()) {
            (true, true) => Some(CompositeKind::DoubleFour),
            (true, false) if b.is_open_three_class() => Some(CompositeKind::FourThree),
            (false, true) if a.is_open_three_class() => Some(CompositeKind::FourThree),
            (false, false) if a.is_open_three_class() && b.is_open_three_class() => {
                Some(CompositeKind::DoubleThree)
            }
            _ => None,
        }
    }
}
