//! Batch game runner for strategy testing.
//!
//! Runs many seeds in parallel using rayon and collects metrics across
//! all of them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use empire_core::error::Result;
use empire_core::prelude::{EngineConfig, Owner};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game_runner::{run_game, GameConfig};
use crate::metrics::{BatchSummary, GameMetrics};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Maximum rounds per game (0 = unlimited)
    pub max_rounds: u32,
    /// Engine settings shared by every game
    pub engine: EngineConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_rounds: 500,
            engine: EngineConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` games
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the round limit
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set engine settings
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig::new(seed)
            .with_engine(self.engine.clone())
            .with_max_rounds(self.max_rounds)
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("game {game_index} (seed {seed}): {message}")]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total games
    pub total: u32,
    /// Completed games
    pub completed: AtomicU32,
    /// Start time
    pub start_time: Instant,
    wins: Mutex<[u32; 2]>,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
            wins: Mutex::new([0; 2]),
        }
    }

    /// Record a completed game
    pub fn record_completion(&self, winner: Option<Owner>) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(w) = winner {
            if let Ok(mut wins) = self.wins.lock() {
                wins[w.index()] += 1;
            }
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }
        let per_game = self.start_time.elapsed().as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }

    /// Current win rate of one side among completed games
    pub fn current_win_rate(&self, owner: Owner) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        self.wins
            .lock()
            .map(|wins| f64::from(wins[owner.index()]) / f64::from(completed))
            .unwrap_or(0.0)
    }

    /// Log progress
    pub fn report(&self) {
        let eta = self.eta();
        info!(
            completed = self.current(),
            total = self.total,
            percent = format!("{:.1}", self.percentage()),
            eta = format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60),
            player_wins = format!("{:.1}%", self.current_win_rate(Owner::Player) * 100.0),
            computer_wins = format!("{:.1}%", self.current_win_rate(Owner::Computer) * 100.0),
            "Batch progress"
        );
    }
}

fn winner_of(metrics: &GameMetrics) -> Option<Owner> {
    match metrics.winner.as_deref() {
        Some("player") => Some(Owner::Player),
        Some("computer") => Some(Owner::Computer),
        _ => None,
    }
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        max_rounds = config.max_rounds,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<std::result::Result<GameMetrics, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_game(&config.game_config(seed)) {
                Ok(result) => {
                    progress.record_completion(winner_of(&result.metrics));
                    let completed = progress.current();
                    if completed % 10 == 0 {
                        debug!("Progress: {}/{}", completed, config.game_count);
                    }
                    if completed % 100 == 0 {
                        progress.report();
                    }
                    Ok(result.metrics)
                }
                Err(e) => {
                    warn!(game = i, seed, error = %e, "Game failed");
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(std::result::Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(std::result::Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(std::result::Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        games = games.len(),
        failed = errors.len(),
        secs = format!("{duration_seconds:.1}"),
        "Batch complete"
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and compare final state hashes.
///
/// # Errors
///
/// Returns the first game error.
pub fn verify_determinism(
    engine: &EngineConfig,
    seed: u64,
    runs: u32,
    max_rounds: u32,
) -> Result<bool> {
    let config = GameConfig::new(seed)
        .with_engine(engine.clone())
        .with_max_rounds(max_rounds);
    let hashes = (0..runs.max(2))
        .map(|_| run_game(&config).map(|r| r.metrics.final_state_hash))
        .collect::<Result<Vec<u64>>>()?;
    info!(seed, runs = hashes.len(), hash = format!("{:016x}", hashes[0]), "Determinism check");
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use empire_test_utils::fixtures::small_config;

    fn quick(count: u32) -> BatchConfig {
        BatchConfig::new(count)
            .with_engine(small_config())
            .with_max_rounds(8)
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.game_count, 100);
        assert_eq!(config.max_rounds, 500);
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_max_rounds(40);

        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.max_rounds, 40);
        assert_eq!(config.game_config(7).seed, 7);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_completion(Some(Owner::Computer));
        progress.record_completion(Some(Owner::Player));
        progress.record_completion(Some(Owner::Computer));

        assert_eq!(progress.current(), 3);
        assert!((progress.current_win_rate(Owner::Computer) - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_batch_error_message() {
        let error = BatchError {
            game_index: 3,
            seed: 42,
            message: "unit table full".to_string(),
        };
        assert_eq!(error.to_string(), "game 3 (seed 42): unit table full");
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(quick(4).with_seed(100));
        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);
        let mut seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        seeds.sort_unstable();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&small_config(), 12345, 3, 6).unwrap());
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(quick(2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games.len(), 2);
        assert_eq!(loaded.config.max_rounds, 8);
    }
}
