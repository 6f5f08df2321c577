//! Headless Empire game runner.
//!
//! Plays games without a display for strategy testing, balance runs and
//! determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # One game, computer against the auto-moving player side
//! cargo run -p empire_headless -- run --seed 7 --rounds 300 --save game.sav
//!
//! # Let the computer strategy play both sides
//! cargo run -p empire_headless -- run --seed 7 --computer-both
//!
//! # 200 seeds in parallel
//! cargo run -p empire_headless -- batch --count 200 --output results/
//!
//! # Render a saved game's maps
//! cargo run -p empire_headless -- show --file game.sav --layer real
//!
//! # Same seed several times, compare hashes
//! cargo run -p empire_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use empire_core::prelude::*;
use empire_headless::{
    ascii_visualizer::{render_saved_game, AsciiConfig, MapLayer},
    batch::{run_batch, verify_determinism, BatchConfig},
    game_runner::{play_out, run_game, GameConfig},
};

#[derive(Parser)]
#[command(name = "empire_headless")]
#[command(about = "Headless Empire game runner for strategy testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration (RON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Run {
        /// Game seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Stop after this many rounds (0 = play to the end)
        #[arg(short, long, default_value = "500")]
        rounds: u32,

        /// Save the game here when finished
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Also save every N rounds (requires --save)
        #[arg(long, default_value = "0", requires = "save")]
        autosave: u32,

        /// Continue a saved game instead of starting a new one
        #[arg(long, conflicts_with = "seed")]
        resume: Option<PathBuf>,

        /// The computer strategy plays the player side too
        #[arg(long)]
        computer_both: bool,
    },

    /// Run a batch of games in parallel
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Round limit per game
        #[arg(short, long, default_value = "500")]
        rounds: u32,

        /// The computer strategy plays the player side too
        #[arg(long)]
        computer_both: bool,
    },

    /// Render a saved game's maps as ASCII
    Show {
        /// Saved game
        #[arg(short, long)]
        file: PathBuf,

        /// Map to draw
        #[arg(short, long, value_enum, default_value = "real")]
        layer: LayerArg,

        /// Draw the off-board border ring
        #[arg(long)]
        border: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Verify determinism by playing the same seed several times
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Rounds per run
        #[arg(long, default_value = "100")]
        rounds: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LayerArg {
    /// Ground truth
    Real,
    /// The player's view map
    Player,
    /// The computer's view map
    Computer,
}

impl From<LayerArg> for MapLayer {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Real => Self::Real,
            LayerArg::Player => Self::View(Owner::Player),
            LayerArg::Computer => Self::View(Owner::Computer),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs on stderr; stdout carries results
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let engine = load_engine(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            seed,
            rounds,
            save,
            autosave,
            resume,
            computer_both,
        } => cmd_run(engine, seed, rounds, save, autosave, resume, computer_both),
        Commands::Batch {
            count,
            parallel,
            output,
            seed,
            rounds,
            computer_both,
        } => cmd_batch(engine, count, parallel, output, seed, rounds, computer_both),
        Commands::Show {
            file,
            layer,
            border,
            no_color,
        } => cmd_show(&file, layer, border, no_color),
        Commands::Verify { seed, runs, rounds } => cmd_verify(&engine, seed, runs, rounds),
    }
}

fn fail(message: &str) -> ! {
    tracing::error!("{message}");
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_engine(path: Option<&Path>) -> EngineConfig {
    let Some(path) = path else {
        return EngineConfig::default();
    };
    match EngineConfig::load(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Loaded engine config");
            config
        }
        Err(e) => fail(&format!("Cannot load config: {e}")),
    }
}

/// Play one game
fn cmd_run(
    mut engine: EngineConfig,
    seed: u64,
    rounds: u32,
    save: Option<PathBuf>,
    autosave: u32,
    resume: Option<PathBuf>,
    computer_both: bool,
) {
    engine.computer_plays_player |= computer_both;
    let mut config = GameConfig::new(seed)
        .with_engine(engine)
        .with_max_rounds(rounds);
    if let Some(path) = save {
        config = config.with_save(path, autosave);
    }

    let result = match resume {
        Some(path) => {
            let game = Game::load(&path)
                .unwrap_or_else(|e| fail(&format!("Cannot load {}: {e}", path.display())));
            tracing::info!(path = %path.display(), date = game.date(), "Resuming game");
            config.game_id = format!("game_{}", game.seed());
            play_out(game, &config)
        }
        None => run_game(&config),
    };
    let result = result.unwrap_or_else(|e| fail(&format!("Game failed: {e}")));

    let metrics = &result.metrics;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("GAME OVER after {} rounds", metrics.rounds);
    eprintln!("{}", "=".repeat(50));
    match &metrics.winner {
        Some(winner) => eprintln!("Winner: {winner} ({})", metrics.end_condition),
        None => eprintln!("No winner ({})", metrics.end_condition),
    }
    for (side, stats) in &metrics.sides {
        eprintln!(
            "  {side}: {} cities, {} built, {} lost",
            stats.final_cities,
            stats.total_built(),
            stats.total_lost()
        );
    }
    eprintln!("State hash: {:016x}", metrics.final_state_hash);

    match serde_json::to_string(metrics) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("Cannot encode metrics: {e}")),
    }
}

/// Run a batch of games
fn cmd_batch(
    mut engine: EngineConfig,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    rounds: u32,
    computer_both: bool,
) {
    engine.computer_plays_player |= computer_both;

    if let Err(e) = std::fs::create_dir_all(&output) {
        fail(&format!(
            "Cannot create output directory '{}': {e}",
            output.display()
        ));
    }

    let config = BatchConfig {
        game_count: count,
        parallel_games: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        max_rounds: rounds,
        engine,
    };
    let results = run_batch(config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fail(&format!("Failed to save results: {e}"));
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Games played: {}", results.games.len());
    if !results.errors.is_empty() {
        eprintln!("Games FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Rounds: avg {:.1}, min {}, max {}",
        summary.avg_rounds, summary.min_rounds, summary.max_rounds
    );
    eprintln!("\nWin Rates:");
    for owner in Owner::BOTH {
        eprintln!("  {owner}: {:.1}%", summary.win_rate(owner) * 100.0);
    }
    eprintln!(
        "  undecided: {}, resignations: {}",
        summary.undecided, summary.resignations
    );

    if !results.errors.is_empty() {
        eprintln!("\nGAME FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!("  {error}");
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Render a saved game
fn cmd_show(file: &Path, layer: LayerArg, border: bool, no_color: bool) {
    let config = AsciiConfig {
        show_legend: true,
        use_color: !no_color,
        show_border: border,
    };
    match render_saved_game(file, layer.into(), &config) {
        Ok(text) => print!("{text}"),
        Err(e) => fail(&format!("Cannot show {}: {e}", file.display())),
    }
}

/// Verify determinism
fn cmd_verify(engine: &EngineConfig, seed: u64, runs: u32, rounds: u32) {
    tracing::info!(seed, runs, rounds, "Verifying determinism");

    match verify_determinism(engine, seed, runs, rounds) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => fail("Non-determinism detected!"),
        Err(e) => fail(&format!("Game failed: {e}")),
    }
}
