use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gomoku::board::{Board, Move, Pos, Stone};
use gomoku::config::EngineConfig;
use gomoku::eval::{detect_all_threats, evaluate};
use gomoku::search::{detect_vcf, Searcher};
use gomoku::Engine;

/// A twelve-stone middle game with threats for both sides.
fn middle_game() -> Board {
    let cells = [
        (7, 7), (7, 8), (8, 7), (6, 7), (8, 8), (9, 9),
        (6, 6), (5, 5), (8, 6), (8, 5), (9, 7), (10, 7),
    ];
    let mut board = Board::new();
    for (i, &(x, y)) in cells.iter().enumerate() {
        let player = if i % 2 == 0 { Stone::Black } else { Stone::White };
        board
            .apply_move(Move::new(Pos::new(x, y), player))
            .expect("bench position is valid");
    }
    board
}

fn eval_benchmarks(c: &mut Criterion) {
    let board = middle_game();
    let mut group = c.benchmark_group("eval");
    group.sample_size(100);

    group.bench_function("detect_all_threats", |b| {
        b.iter(|| detect_all_threats(black_box(&board), Stone::Black))
    });

    group.bench_function("evaluate", |b| {
        b.iter(|| evaluate(black_box(&board), Stone::Black))
    });

    group.finish();
}

fn search_benchmarks(c: &mut Criterion) {
    let board = middle_game();
    let config = EngineConfig::default();
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    group.bench_function("alphabeta_depth_2", |b| {
        b.iter(|| {
            let mut searcher = Searcher::new(&config);
            searcher.search_fixed_depth(black_box(&board), Stone::Black, 2, 1)
        })
    });

    group.bench_function("alphabeta_depth_4", |b| {
        b.iter(|| {
            let mut searcher = Searcher::new(&config);
            searcher.search_fixed_depth(black_box(&board), Stone::Black, 4, 1)
        })
    });

    group.bench_function("vcf_depth_12", |b| {
        b.iter(|| detect_vcf(black_box(&board), Stone::Black, 12))
    });

    group.bench_function("find_best_moves_200ms", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.find_best_moves(black_box(&board), Stone::Black, Duration::from_millis(200), 3)
        })
    });

    group.finish();
}

criterion_group!(benches, eval_benchmarks, search_benchmarks);
criterion_main!(benches);
