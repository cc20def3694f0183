//! Gomoku analysis CLI
//!
//! ## Usage
//!
//! - `gomoku analyze game.json` - Walk through a game and report mistakes
//! - `gomoku best-move position.json` - Best moves for a position
//! - `gomoku threats position.json` - Threats and evaluation of a position
//!
//! Results are printed as JSON on stdout; logs go to stderr (`RUST_LOG`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use gomoku::{Board, Engine, EngineConfig, GameAnalyzer, Move, Stone};

/// Gomoku position analysis and move search
#[derive(Parser)]
#[command(name = "gomoku")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file overriding the default engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a whole game: timeline, mistakes and patterns
    Analyze {
        /// Move list: `[{"x":7,"y":7,"player":"black"}, ...]` or `{"moves": [...]}`
        game: PathBuf,
    },
    /// Best moves for the side to move
    BestMove {
        /// Position: `{"board": [[0, ...], ...]}` or `{"moves": [...]}`
        position: PathBuf,
        /// Number of scored moves to report
        #[arg(long)]
        top: Option<usize>,
        /// Time budget in milliseconds
        #[arg(long)]
        time_ms: Option<u64>,
    },
    /// Threats and static evaluation of a position
    Threats {
        position: PathBuf,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GameInput {
    Moves(Vec<Move>),
    Game { moves: Vec<Move> },
}

#[derive(Deserialize)]
struct PositionInput {
    #[serde(default)]
    board: Option<Vec<Vec<u8>>>,
    #[serde(default)]
    moves: Option<Vec<Move>>,
    /// Side to analyze for; inferred from stone counts when absent
    #[serde(default)]
    player: Option<Stone>,
}

#[derive(Serialize)]
struct ThreatReport {
    black: gomoku::ThreatResult,
    white: gomoku::ThreatResult,
    evaluation: gomoku::EvaluationResult,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { game } => run_analyze(config, &game),
        Commands::BestMove {
            position,
            top,
            time_ms,
        } => run_best_move(config, &position, top, time_ms),
        Commands::Threats { position } => run_threats(&position),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = EngineConfig::from_json(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!(?config, "loaded configuration");
    Ok(config)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_position(path: &Path) -> Result<(Board, Stone)> {
    let input: PositionInput = read_json(path)?;
    let board = match (input.board, input.moves) {
        (Some(grid), None) => Board::from_grid(&grid)?,
        (None, Some(moves)) => Board::from_moves(&moves)?,
        (Some(_), Some(_)) => bail!("{}: give either `board` or `moves`, not both", path.display()),
        (None, None) => bail!("{}: missing `board` or `moves`", path.display()),
    };
    let player = match input.player {
        Some(Stone::Empty) => bail!("{}: `player` must be black or white", path.display()),
        Some(player) => player,
        None => board.side_to_move(),
    };
    Ok((board, player))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing result")?;
    println!("{json}");
    Ok(())
}

fn run_analyze(config: EngineConfig, path: &Path) -> Result<()> {
    let moves = match read_json::<GameInput>(path)? {
        GameInput::Moves(moves) | GameInput::Game { moves } => moves,
    };
    info!(moves = moves.len(), "analyzing {}", path.display());

    let mut analyzer = GameAnalyzer::with_config(config)?;
    let result = analyzer
        .analyze_game(&moves)
        .with_context(|| format!("analyzing {}", path.display()))?;
    print_json(&result)
}

fn run_best_move(config: EngineConfig, path: &Path, top: Option<usize>, time_ms: Option<u64>) -> Result<()> {
    let (board, player) = load_position(path)?;
    let budget = Duration::from_millis(time_ms.unwrap_or(config.time_budget_ms));
    let top_n = top.unwrap_or(config.top_n);

    let mut engine = Engine::with_config(config)?;
    let result = engine.find_best_moves(&board, player, budget, top_n);
    info!(
        best = ?result.best_move,
        search_type = ?result.search_type,
        depth = result.depth_reached,
        elapsed_ms = result.elapsed_ms,
        "search done"
    );
    print_json(&result)
}

fn run_threats(path: &Path) -> Result<()> {
    let (board, player) = load_position(path)?;
    let engine = Engine::new();
    print_json(&ThreatReport {
        black: engine.analyze_threats(&board, Stone::Black),
        white: engine.analyze_threats(&board, Stone::White),
        evaluation: engine.evaluate(&board, player),
    })
}
