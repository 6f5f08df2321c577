//! Headless game runner for strategy testing and CI verification.
//!
//! Plays whole games without a display:
//!
//! - **Single games**: one seeded game with an optional round limit and
//!   autosave
//! - **Batches**: many seeds in parallel, with metrics written as JSON
//! - **Determinism checks**: the same seed several times, comparing state
//!   hashes
//! - **Map rendering**: a saved game's real map or view maps as ASCII
//!
//! # Example
//!
//! ```bash
//! # Play one game and keep the save
//! cargo run -p empire_headless -- run --seed 42 --save game.sav
//!
//! # Show what the computer knows
//! cargo run -p empire_headless -- show --file game.sav --layer computer
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii_visualizer;
pub mod batch;
pub mod game_runner;
pub mod metrics;

pub use ascii_visualizer::{render_map, render_saved_game, AsciiConfig, MapLayer};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use game_runner::{play_out, run_game, GameConfig, GameResult};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector, SideMetrics};
