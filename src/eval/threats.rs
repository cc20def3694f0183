//! Tactical pattern detection on line geometry
//!
//! Every maximal run of a player's stones is examined once per direction,
//! starting from the first stone of the run. Two runs of at most three stones
//! separated by a single empty cell are read as one broken pattern (`XX_XX`,
//! `X_XX`, ...) and the second run is not classified again; any other run is
//! classified by its length and open ends.
//!
//! The same scanner serves three consumers: full detection (records with
//! positions), the evaluator's allocation-free score sum, and hypothetical
//! probes that place a virtual stone without touching the board.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::board::bitboard::Bitboard;
use crate::board::{Board, Pos, Stone};

use super::patterns::{CompositeKind, Direction, ThreatType};

/// One detected line threat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatRecord {
    pub threat_type: ThreatType,
    /// Stones forming the pattern, in board index order
    pub positions: Vec<Pos>,
    pub direction: Direction,
    pub player: Stone,
    /// Number of outer ends that are on the board and empty (0..=2)
    pub open_ends: u8,
}

impl ThreatRecord {
    #[inline]
    pub fn score(&self) -> i32 {
        self.threat_type.score()
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.positions.binary_search(&pos).is_ok()
    }
}

/// Two threats in different directions sharing one stone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeThreat {
    pub kind: CompositeKind,
    /// The shared stone
    pub pivot: Pos,
    pub components: Vec<ThreatRecord>,
    pub critical: bool,
}

/// All threats of one player on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatResult {
    pub player: Stone,
    pub threats: Vec<ThreatRecord>,
    pub composites: Vec<CompositeThreat>,
    /// Sum of the base scores of `threats`
    pub score: i32,
}

impl ThreatResult {
    /// Number of records of the given type
    pub fn count(&self, threat_type: ThreatType) -> usize {
        self.threats
            .iter()
            .filter(|t| t.threat_type == threat_type)
            .count()
    }

    pub fn has(&self, threat_type: ThreatType) -> bool {
        self.threats.iter().any(|t| t.threat_type == threat_type)
    }

    /// Strongest threat type present, if any
    pub fn strongest(&self) -> Option<ThreatType> {
        self.threats.iter().map(|t| t.threat_type).min()
    }

    /// Record counts per type, strongest first, omitting absent types
    pub fn breakdown(&self) -> BTreeMap<ThreatType, u32> {
        let mut map = BTreeMap::new();
        for t in &self.threats {
            *map.entry(t.threat_type).or_insert(0) += 1;
        }
        map
    }
}

/// A classified segment of one line, before positions are materialized.
#[derive(Debug, Clone, Copy)]
struct LineMatch {
    threat_type: ThreatType,
    direction: Direction,
    start: Pos,
    /// Stones before the gap
    head: i32,
    /// Stones after the gap (0 for a gap-free run)
    tail: i32,
    open_ends: u8,
}

impl LineMatch {
    fn step(&self, k: i32) -> Option<Pos> {
        let (dx, dy) = self.direction.delta();
        self.start.offset(dx, dy, k)
    }

    fn positions(&self) -> Vec<Pos> {
        let mut positions: Vec<Pos> = (0..self.head)
            .chain((0..self.tail).map(|k| self.head + 1 + k))
            .filter_map(|k| self.step(k))
            .collect();
        positions.sort_unstable();
        positions
    }

    fn contains(&self, pos: Pos) -> bool {
        let in_head = (0..self.head).any(|k| self.step(k) == Some(pos));
        in_head || (0..self.tail).any(|k| self.step(self.head + 1 + k) == Some(pos))
    }

    /// Empty cells where one more stone completes five
    fn five_cells<F: Fn(Pos) -> Stone>(&self, get: &F) -> [Option<Pos>; 2] {
        let empty = |p: Option<Pos>| p.filter(|&p| get(p) == Stone::Empty);
        if self.tail > 0 {
            // Broken four: only the gap
            if self.threat_type == ThreatType::BrokenFour {
                return [self.step(self.head), None];
            }
            return [None, None];
        }
        if self.head >= 4 {
            [empty(self.step(-1)), empty(self.step(self.head))]
        } else {
            [None, None]
        }
    }

    fn into_record(self, player: Stone) -> ThreatRecord {
        ThreatRecord {
            threat_type: self.threat_type,
            positions: self.positions(),
            direction: self.direction,
            player,
            open_ends: self.open_ends,
        }
    }
}

/// Classify a gap-free run by length and open ends
#[inline]
fn classify_run(len: i32, open_ends: u8) -> Option<ThreatType> {
    match (len, open_ends) {
        (n, _) if n >= 5 => Some(ThreatType::Five),
        (4, 2) => Some(ThreatType::OpenFour),
        (4, 1) => Some(ThreatType::Four),
        (3, 2) => Some(ThreatType::OpenThree),
        (3, 1) => Some(ThreatType::Three),
        (2, 2) => Some(ThreatType::OpenTwo),
        _ => None,
    }
}

/// Consecutive `player` stones starting at `from` (inclusive) along `(dx, dy)`
#[inline]
fn run_length<F: Fn(Pos) -> Stone>(get: &F, from: Pos, dx: i32, dy: i32, player: Stone) -> i32 {
    let mut k = 0;
    while let Some(p) = from.offset(dx, dy, k) {
        if get(p) != player {
            break;
        }
        k += 1;
    }
    k
}

#[inline]
fn is_open<F: Fn(Pos) -> Stone>(get: &F, cell: Option<Pos>) -> bool {
    cell.map_or(false, |p| get(p) == Stone::Empty)
}

/// Broken pattern formed by the run at `start` and the run one gap after it.
///
/// Both runs must be at most three long; a longer run is classified on its
/// own, so `XXXX_X` and `X_XXXX` read the same.
fn broken_match<F: Fn(Pos) -> Stone>(
    get: &F,
    start: Pos,
    direction: Direction,
    player: Stone,
) -> Option<LineMatch> {
    let (dx, dy) = direction.delta();
    let head = run_length(get, start, dx, dy, player);
    if head > 3 || !is_open(get, start.offset(dx, dy, head)) {
        return None;
    }
    let tail = start
        .offset(dx, dy, head + 1)
        .map_or(0, |p| run_length(get, p, dx, dy, player));
    if tail == 0 || tail > 3 {
        return None;
    }

    let before_open = is_open(get, start.offset(dx, dy, -1));
    let outer_open = is_open(get, start.offset(dx, dy, head + 1 + tail));
    let open_ends = u8::from(before_open) + u8::from(outer_open);
    let threat_type = match head + tail {
        n if n >= 4 => ThreatType::BrokenFour,
        3 if open_ends > 0 => ThreatType::BrokenThree,
        _ => return None,
    };
    Some(LineMatch {
        threat_type,
        direction,
        start,
        head,
        tail,
        open_ends,
    })
}

/// First stone of the run that ends one gap before `start`, if any.
fn preceding_run<F: Fn(Pos) -> Stone>(
    get: &F,
    start: Pos,
    direction: Direction,
    player: Stone,
) -> Option<Pos> {
    let (dx, dy) = direction.delta();
    let gap = start.offset(dx, dy, -1)?;
    let last = start.offset(dx, dy, -2)?;
    if get(gap) != Stone::Empty || get(last) != player {
        return None;
    }
    let len = run_length(get, last, -dx, -dy, player);
    last.offset(dx, dy, -(len - 1))
}

/// Classify the segment whose first stone is `start`.
///
/// `start` must hold a `player` stone; whether the previous cell also does is
/// the caller's concern (the full scan skips such cells). A run that is
/// already the tail of a broken pattern is not classified again, so a
/// pattern and its mirror image yield the same records.
fn match_segment<F: Fn(Pos) -> Stone>(
    get: &F,
    start: Pos,
    direction: Direction,
    player: Stone,
) -> Option<LineMatch> {
    if let Some(m) = broken_match(get, start, direction, player) {
        return Some(m);
    }
    let absorbed = preceding_run(get, start, direction, player)
        .map_or(false, |p| broken_match(get, p, direction, player).is_some());
    if absorbed {
        return None;
    }

    let (dx, dy) = direction.delta();
    let head = run_length(get, start, dx, dy, player);
    let open_ends = u8::from(is_open(get, start.offset(dx, dy, -1)))
        + u8::from(is_open(get, start.offset(dx, dy, head)));
    classify_run(head, open_ends).map(|threat_type| LineMatch {
        threat_type,
        direction,
        start,
        head,
        tail: 0,
        open_ends,
    })
}

/// Visit every classified segment of `player` on the board.
fn scan<V: FnMut(LineMatch)>(board: &Board, player: Stone, mut visit: V) {
    let Some(stones) = board.stones(player) else {
        return;
    };
    let get = |p: Pos| board.get(p);
    for pos in stones.iter_ones() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            // Only the first stone of a run starts a segment
            if pos.offset(dx, dy, -1).map_or(false, |p| board.get(p) == player) {
                continue;
            }
            if let Some(m) = match_segment(&get, pos, direction, player) {
                visit(m);
            }
        }
    }
}

/// Detect every threat of `player`, plus the composites they form.
pub fn detect_all_threats(board: &Board, player: Stone) -> ThreatResult {
    let mut threats = Vec::new();
    scan(board, player, |m| threats.push(m.into_record(player)));
    let score = threats.iter().map(ThreatRecord::score).sum();
    let composites = find_composites(&threats);
    ThreatResult {
        player,
        threats,
        composites,
        score,
    }
}

/// Sum of threat scores of `player`, without materializing records.
pub fn threat_score(board: &Board, player: Stone) -> i32 {
    let mut total = 0;
    scan(board, player, |m| total += m.threat_type.score());
    total
}

/// Per-type record counts of `player`, indexed by `ThreatType::index`.
pub fn threat_counts(board: &Board, player: Stone) -> [u32; 8] {
    let mut counts = [0u32; 8];
    scan(board, player, |m| counts[m.threat_type.index()] += 1);
    counts
}

/// Group four-class and open-three-class records by shared stone.
///
/// Each pivot yields at most one composite: the strongest pairing of two
/// records lying in different directions.
fn find_composites(threats: &[ThreatRecord]) -> Vec<CompositeThreat> {
    let mut by_pivot: BTreeMap<Pos, Vec<usize>> = BTreeMap::new();
    for (i, t) in threats.iter().enumerate() {
        if t.threat_type.is_four_class() || t.threat_type.is_open_three_class() {
            for &p in &t.positions {
                by_pivot.entry(p).or_default().push(i);
            }
        }
    }

    let mut composites = Vec::new();
    for (pivot, ids) in by_pivot {
        let mut best: Option<(CompositeKind, usize, usize)> = None;
        for (n, &i) in ids.iter().enumerate() {
            for &j in &ids[n + 1..] {
                let (a, b) = (&threats[i], &threats[j]);
                if a.direction == b.direction {
                    continue;
                }
                if let Some(kind) = CompositeKind::of(a.threat_type, b.threat_type) {
                    if best.map_or(true, |(k, _, _)| kind < k) {
                        best = Some((kind, i, j));
                    }
                }
            }
        }
        if let Some((kind, i, j)) = best {
            composites.push(CompositeThreat {
                kind,
                pivot,
                components: vec![threats[i].clone(), threats[j].clone()],
                critical: true,
            });
        }
    }
    composites
}

/// Records of `player` whose stones include `pos`.
pub fn threats_at(board: &Board, pos: Pos, player: Stone) -> Vec<ThreatRecord> {
    detect_all_threats(board, player)
        .threats
        .into_iter()
        .filter(|t| t.contains(pos))
        .collect()
}

/// Strongest threat a `player` stone on the empty cell `pos` would create.
///
/// The board is read through a view with the virtual stone in place, so
/// nothing is mutated. Returns `None` for occupied cells.
pub fn move_threat(board: &Board, pos: Pos, player: Stone) -> Option<ThreatType> {
    direction_threats(board, pos, player)
        .into_iter()
        .flatten()
        .min()
}

/// Composite a `player` stone on the empty cell `pos` would pivot.
///
/// Pairs the strongest threat through `pos` in each direction and returns
/// the strongest composite kind any two directions form.
pub fn composite_at(board: &Board, pos: Pos, player: Stone) -> Option<CompositeKind> {
    let per_direction = direction_threats(board, pos, player);
    let mut best: Option<CompositeKind> = None;
    for (i, a) in per_direction.iter().enumerate() {
        for b in &per_direction[i + 1..] {
            if let (Some(a), Some(b)) = (a, b) {
                if let Some(kind) = CompositeKind::of(*a, *b) {
                    best = Some(best.map_or(kind, |k| k.min(kind)));
                }
            }
        }
    }
    best
}

/// Empty cells where `player` would create a composite threat.
pub fn composite_moves(board: &Board, player: Stone) -> Vec<Pos> {
    line_neighbors(board, player)
        .iter_ones()
        .filter(|&p| composite_at(board, p, player).is_some())
        .collect()
}

/// Strongest threat through `pos` per direction, with a virtual `player`
/// stone on `pos`, indexed like `Direction::ALL`.
fn direction_threats(board: &Board, pos: Pos, player: Stone) -> [Option<ThreatType>; 4] {
    let mut result = [None; 4];
    if player == Stone::Empty || !board.is_empty(pos) {
        return result;
    }
    let get = |p: Pos| if p == pos { player } else { board.get(p) };

    for (slot, direction) in Direction::ALL.into_iter().enumerate() {
        let mut best: Option<ThreatType> = None;
        let (dx, dy) = direction.delta();
        // First stone of the run containing pos
        let back = run_length(&get, pos, -dx, -dy, player);
        let Some(run_start) = pos.offset(dx, dy, -(back - 1)) else {
            continue;
        };
        // A run one gap further back may read pos's run as its tail
        let earlier = preceding_run(&get, run_start, direction, player);

        for start in std::iter::once(run_start).chain(earlier) {
            if let Some(m) = match_segment(&get, start, direction, player) {
                if m.contains(pos) {
                    best = Some(best.map_or(m.threat_type, |b| b.min(m.threat_type)));
                }
            }
        }
        result[slot] = best;
    }
    result
}

/// Empty cells where `player` completes five or more, in index order.
pub fn five_cells(board: &Board, player: Stone) -> Vec<Pos> {
    let get = |p: Pos| board.get(p);
    let mut cells = Bitboard::new();
    scan(board, player, |m| {
        for p in m.five_cells(&get).into_iter().flatten() {
            cells.set(p);
        }
    });
    cells.iter_ones().collect()
}

/// Empty cells within four steps along a line of some `player` stone.
pub(crate) fn line_neighbors(board: &Board, player: Stone) -> Bitboard {
    let mut near = Bitboard::new();
    let Some(stones) = board.stones(player) else {
        return near;
    };
    for pos in stones.iter_ones() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.delta();
            for sign in [1, -1] {
                for k in 1..=4 {
                    match pos.offset(dx * sign, dy * sign, k) {
                        Some(p) if board.is_empty(p) => near.set(p),
                        Some(p) if board.get(p) == player => {}
                        _ => break,
                    }
                }
            }
        }
    }
    near
}

/// Empty cells where `player` creates a four-class threat (one move from
/// five) without completing five, in index order.
pub fn four_moves(board: &Board, player: Stone) -> Vec<Pos> {
    line_neighbors(board, player)
        .iter_ones()
        .filter(|&p| move_threat(board, p, player).map_or(false, ThreatType::is_four_class))
        .collect()
}
