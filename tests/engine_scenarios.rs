use std::time::Duration;

use gomoku::analysis::analyze_game;
use gomoku::board::{Board, Move, Pos, Stone};
use gomoku::config::EngineConfig;
use gomoku::eval::{classify_quality, detect_all_threats, position_bonus, sigmoid, MoveQuality, ThreatType};
use gomoku::rules::check_winner;
use gomoku::search::{detect_vcf, is_win_score, SearchType, Searcher};
use gomoku::Engine;

fn board_with(black: &[(u8, u8)], white: &[(u8, u8)]) -> Board {
    let mut board = Board::new();
    for &(x, y) in black {
        board.apply_move(Move::new(Pos::new(x, y), Stone::Black)).expect("empty cell");
    }
    for &(x, y) in white {
        board.apply_move(Move::new(Pos::new(x, y), Stone::White)).expect("empty cell");
    }
    board
}

fn searcher(ordering: bool) -> Searcher {
    Searcher::new(&EngineConfig {
        use_move_ordering: ordering,
        use_transposition_table: false,
        candidate_limit: 12,
        ..EngineConfig::default()
    })
}

/// A full-board game with no five for either side: two-wide diagonal
/// stripes, played outward from the center.
fn drawn_full_game() -> Vec<Move> {
    let mut black = Vec::new();
    let mut white = Vec::new();
    for y in 0..15u8 {
        for x in 0..15u8 {
            let pos = Pos::new(x, y);
            if ((u32::from(x) + 2 * u32::from(y) + 1) / 2) % 2 == 1 {
                black.push(pos);
            } else {
                white.push(pos);
            }
        }
    }
    black.sort_by_key(|p| (p.center_distance(), p.to_index()));
    white.sort_by_key(|p| (p.center_distance(), p.to_index()));
    assert_eq!((black.len(), white.len()), (113, 112));

    let mut moves = Vec::with_capacity(225);
    for i in 0..113 {
        moves.push(Move::new(black[i], Stone::Black));
        if i < 112 {
            moves.push(Move::new(white[i], Stone::White));
        }
    }
    moves
}

#[test]
fn center_bonus_exceeds_corner() {
    let h8: Pos = "H8".parse().expect("valid notation");
    let a1: Pos = "A1".parse().expect("valid notation");
    assert_eq!(h8, Pos::new(7, 7));
    assert_eq!(a1, Pos::new(0, 0));
    assert!(position_bonus(h8) > position_bonus(a1));
}

#[test]
fn vertical_open_four_detected_once() {
    let board = board_with(&[(7, 5), (7, 6), (7, 7), (7, 8)], &[]);
    let threats = detect_all_threats(&board, Stone::Black);

    let open_fours: Vec<_> = threats
        .threats
        .iter()
        .filter(|t| t.threat_type == ThreatType::OpenFour)
        .collect();
    assert_eq!(open_fours.len(), 1);
    assert_eq!(open_fours[0].score(), 10_000);
    assert_eq!(
        open_fours[0].positions,
        vec![Pos::new(7, 5), Pos::new(7, 6), Pos::new(7, 7), Pos::new(7, 8)]
    );
}

#[test]
fn immediate_five_is_returned_with_win_score() {
    let board = board_with(&[(3, 7), (4, 7), (5, 7), (6, 7)], &[(2, 7), (0, 0), (14, 14)]);
    let mut engine = Engine::new();
    let result = engine.find_best_moves(&board, Stone::Black, Duration::from_millis(500), 3);
    assert_eq!(result.best_move, Some(Pos::new(7, 7)));
    assert_eq!(result.search_type, SearchType::ImmediateWin);
    assert!(is_win_score(result.score));
}

#[test]
fn move_ordering_keeps_value_and_saves_nodes() {
    // Black open three: the open four wins, and ordering tries it first
    let board = board_with(&[(6, 7), (7, 7), (8, 7), (5, 10)], &[(6, 9), (8, 9), (9, 5)]);

    let mut ordered = searcher(true);
    let mut unordered = searcher(false);
    let a = ordered.search_fixed_depth(&board, Stone::Black, 2, 1);
    let b = unordered.search_fixed_depth(&board, Stone::Black, 2, 1);

    assert_eq!(a.score, b.score);
    assert!(ordered.stats().nodes <= unordered.stats().nodes);
}

/// Scattered middle-game positions around the center, from a fixed seed.
fn scattered_positions(count: usize) -> Vec<(Board, Stone)> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut positions = Vec::with_capacity(count);
    while positions.len() < count {
        let stones = 6 + (next() % 5) as usize;
        let mut board = Board::new();
        while (board.stone_count() as usize) < stones {
            let x = 4 + (next() % 7) as u8;
            let y = 4 + (next() % 7) as u8;
            let pos = Pos::new(x, y);
            if board.is_empty(pos) {
                let player = board.side_to_move();
                board.apply_move(Move::new(pos, player)).expect("empty cell");
            }
        }
        if check_winner(&board).is_none() {
            let player = board.side_to_move();
            positions.push((board, player));
        }
    }
    positions
}

#[test]
fn move_ordering_keeps_value_and_saves_nodes_over_positions() {
    let mut ordered_nodes = 0;
    let mut unordered_nodes = 0;
    for (i, (board, player)) in scattered_positions(16).iter().enumerate() {
        let mut ordered = searcher(true);
        let mut unordered = searcher(false);
        let a = ordered.search_fixed_depth(board, *player, 3, 1);
        let b = unordered.search_fixed_depth(board, *player, 3, 1);
        assert_eq!(a.score, b.score, "position {i}");
        ordered_nodes += ordered.stats().nodes;
        unordered_nodes += unordered.stats().nodes;
    }
    // Single positions may go either way; the set as a whole must not
    assert!(
        ordered_nodes <= unordered_nodes,
        "ordered {ordered_nodes} > unordered {unordered_nodes}"
    );
}

#[test]
fn move_ordering_keeps_value_in_quiet_position() {
    let board = board_with(&[(7, 7), (8, 8), (6, 8)], &[(7, 8), (8, 7)]);
    for depth in [1, 2, 3] {
        let a = searcher(true).search_fixed_depth(&board, Stone::White, depth, 1);
        let b = searcher(false).search_fixed_depth(&board, Stone::White, depth, 1);
        assert_eq!(a.score, b.score, "depth {depth}");
    }
}

#[test]
fn deeper_search_never_prefers_a_worse_move() {
    let board = board_with(&[(7, 7), (8, 8), (6, 8)], &[(7, 8), (8, 7)]);
    let mut shallow = searcher(true);
    let mut deep = searcher(true);

    let shallow_result = shallow.search_fixed_depth(&board, Stone::White, 2, 1);
    let deep_result = deep.search_fixed_depth(&board, Stone::White, 4, 1);

    let shallow_move = shallow_result.best_move.expect("a move");
    let shallow_under_deep = deep
        .evaluate_move(&board, Stone::White, shallow_move, 4)
        .expect("valid move");
    assert!(deep_result.score >= shallow_under_deep);
}

#[test]
fn vcf_found_ends_in_five() {
    let board = board_with(&[(6, 7), (7, 7), (8, 7), (4, 4)], &[(6, 9), (8, 9), (10, 12)]);
    let vcf = detect_vcf(&board, Stone::Black, 7);
    assert!(vcf.found);
    assert_eq!(vcf.terminal_depth as usize, vcf.winning_sequence.len());
    assert_eq!(vcf.winning_sequence.len() % 2, 1);

    let mut replay = board.clone();
    for (i, mv) in vcf.winning_sequence.iter().enumerate() {
        let expected = if i % 2 == 0 { Stone::Black } else { Stone::White };
        assert_eq!(mv.player, expected);
        replay.apply_move(*mv).expect("sequence plays on empty cells");
    }
    assert_eq!(check_winner(&replay), Some(Stone::Black));
}

#[test]
fn vcf_not_found_without_fours() {
    let board = board_with(&[(7, 7), (9, 9)], &[(8, 8)]);
    let vcf = detect_vcf(&board, Stone::Black, 12);
    assert!(!vcf.found);
    assert!(vcf.winning_sequence.is_empty());
}

#[test]
fn hashes_distinguish_positions_and_ignore_move_order() {
    let a = board_with(&[(7, 7), (8, 8)], &[(7, 8)]);
    let b = board_with(&[(7, 7), (8, 7)], &[(7, 8)]);
    assert_ne!(a.hash(), b.hash());

    let mut c = Board::new();
    for (x, y, player) in [(8, 8, Stone::Black), (7, 8, Stone::White), (7, 7, Stone::Black)] {
        c.apply_move(Move::new(Pos::new(x, y), player)).expect("empty cell");
    }
    assert_eq!(a.hash(), c.hash());
}

#[test]
fn sigmoid_is_a_probability() {
    assert_eq!(sigmoid(0.0), 0.5);
    for x in [-1e9, -50.0, -1.0, 0.3, 7.0, 1e9] {
        let p = sigmoid(x);
        assert!((0.0..=1.0).contains(&p), "sigmoid({x}) = {p}");
    }
}

#[test]
fn quality_thresholds_are_closed_below() {
    assert_eq!(classify_quality(100.0), MoveQuality::Excellent);
    assert_eq!(classify_quality(85.0), MoveQuality::Excellent);
    assert_eq!(classify_quality(84.99), MoveQuality::Good);
    assert_eq!(classify_quality(70.0), MoveQuality::Good);
    assert_eq!(classify_quality(69.99), MoveQuality::Okay);
    assert_eq!(classify_quality(50.0), MoveQuality::Okay);
    assert_eq!(classify_quality(49.99), MoveQuality::Weak);
    assert_eq!(classify_quality(30.0), MoveQuality::Weak);
    assert_eq!(classify_quality(29.99), MoveQuality::Blunder);
    assert_eq!(classify_quality(0.0), MoveQuality::Blunder);
}

#[test]
fn full_game_analysis_stays_within_budget() {
    let moves = drawn_full_game();
    let board = Board::from_moves(&moves).expect("valid game");
    assert!(board.is_full());
    assert_eq!(check_winner(&board), None);

    let result = analyze_game(&moves).expect("analysis succeeds");
    assert_eq!(result.timeline.len(), 225);
    assert_eq!(result.summary.total_moves, 225);
    assert_eq!(result.summary.winner, None);
    assert_eq!(result.best_move, None);
    assert!(result.timeline.iter().all(|e| e.analysis_available));

    // Timing only means something in optimized builds
    if !cfg!(debug_assertions) {
        assert!(
            result.summary.elapsed_ms <= 2_000,
            "took {} ms",
            result.summary.elapsed_ms
        );
    }
}
