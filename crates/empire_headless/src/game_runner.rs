//! Runs one complete game without a display.

use std::path::PathBuf;
use std::time::Instant;

use empire_core::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::{GameMetrics, MetricsCollector};

/// Progress logging interval (rounds).
const PROGRESS_LOG_INTERVAL: u32 = 50;

/// Configuration for a single game run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Random seed; fixes the map and every decision.
    pub seed: u64,
    /// Stop after this many rounds if nobody has won (0 = unlimited).
    pub max_rounds: u32,
    /// Engine settings.
    pub engine: EngineConfig,
    /// Where to write the game, if anywhere.
    pub save_path: Option<PathBuf>,
    /// Save every N rounds (0 = only at the end).
    pub autosave_every: u32,
    /// Game ID for tracking.
    pub game_id: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_rounds: 500,
            engine: EngineConfig::default(),
            save_path: None,
            autosave_every: 0,
            game_id: "game_0".to_string(),
        }
    }
}

impl GameConfig {
    /// Config for a seed with default engine settings.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            game_id: format!("game_{seed}"),
            ..Default::default()
        }
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Set engine settings.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Save to `path`, every `every` rounds and at the end.
    pub fn with_save(mut self, path: PathBuf, every: u32) -> Self {
        self.save_path = Some(path);
        self.autosave_every = every;
        self
    }
}

/// Result of running a game.
#[derive(Debug)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// The game as it stood when the run stopped.
    pub game: Game,
}

/// Start a game from its config and play it out.
///
/// # Errors
///
/// Returns an error if the map cannot be generated, a round fails or a
/// save cannot be written.
pub fn run_game(config: &GameConfig) -> Result<GameResult> {
    let game = Game::new(config.engine.clone(), config.seed)?;
    play_out(game, config)
}

/// Play an existing game until someone wins or the round limit is hit.
///
/// # Errors
///
/// Returns an error if a round fails or a save cannot be written.
pub fn play_out(mut game: Game, config: &GameConfig) -> Result<GameResult> {
    let start = Instant::now();
    info!(
        game_id = %config.game_id,
        seed = game.seed(),
        max_rounds = config.max_rounds,
        "Starting game"
    );

    let mut collector = MetricsCollector::new(&config.game_id, game.seed());
    let mut rounds = 0u32;
    let mut outcome = game.outcome();
    while !outcome.is_over() && (config.max_rounds == 0 || rounds < config.max_rounds) {
        let summary = game.play_round()?;
        rounds += 1;
        collector.record_round(&summary, game.world());
        outcome = summary.outcome;

        if rounds % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                game_id = %config.game_id,
                date = game.date(),
                player_cities = game.world().city_count(Owner::Player),
                computer_cities = game.world().city_count(Owner::Computer),
                "Progress"
            );
        }
        if let Some(path) = &config.save_path {
            if config.autosave_every > 0 && rounds % config.autosave_every == 0 {
                game.save(path)?;
            }
        }
    }
    if let Some(path) = &config.save_path {
        game.save(path)?;
    }

    let metrics = collector.finish(rounds, outcome, game.state_hash());
    info!(
        game_id = %config.game_id,
        rounds,
        winner = ?metrics.winner,
        end = %metrics.end_condition,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Game finished"
    );
    Ok(GameResult { metrics, game })
}
