//! The turn driver and saved games.
//!
//! A [`Game`] owns the world, the one seeded RNG every random decision
//! draws from, and the configuration. A round is a player turn followed by
//! a computer turn; each turn runs production and then moves the side's
//! units in move order. The whole game serializes with `bincode`, RNG
//! state included, so a restored game continues exactly as the original
//! would have.
//!
//! # Determinism
//!
//! Given the same seed, configuration and combat resolver, two games play
//! identical rounds. No system randomness, clocks or hash-map iteration
//! order reach the simulation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combat::{CombatResolver, DiceCombat};
use crate::config::EngineConfig;
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::mapgen::{generate_map, pick_home_cities};
use crate::pieces::{Owner, PieceType};
use crate::policy::{move_side, AutoPilot, ComputerStrategy, TurnContext};
use crate::production::{produce, ProductionPlanner};
use crate::world::World;

/// Save file format version.
pub const SAVE_VERSION: u32 = 1;

/// Where the game stands after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Both sides are still in it.
    Ongoing,
    /// One side has won.
    Won {
        /// The winner.
        winner: Owner,
        /// True if the loser gave up rather than being wiped out.
        resigned: bool,
    },
}

impl Outcome {
    /// True once a side has won.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Won { .. })
    }
}

/// Events from one side's turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvents {
    /// Turn number the events belong to.
    pub date: u32,
    /// Everything that happened, in order.
    pub events: Vec<GameEvent>,
}

impl TurnEvents {
    /// Units built during the turn.
    #[must_use]
    pub fn units_built(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GameEvent::UnitBuilt { .. }))
            .count()
    }

    /// Cities that changed hands during the turn.
    #[must_use]
    pub fn cities_captured(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, GameEvent::CityCaptured { .. }))
            .count()
    }
}

/// Result of one full round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Player turn.
    pub player: TurnEvents,
    /// Computer turn.
    pub computer: TurnEvents,
    /// Standing after the round.
    pub outcome: Outcome,
}

/// Versioned envelope written by [`Game::save`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    /// Format version.
    pub version: u32,
    /// Seed the game was started with.
    pub seed: u64,
    /// Turn number at save time.
    pub date: u32,
    /// Serialized game.
    pub state: Vec<u8>,
    /// State hash of the serialized game.
    pub hash: u64,
}

/// A game in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    world: World,
    rng: ChaCha8Rng,
    config: EngineConfig,
    seed: u64,
}

impl Game {
    /// Start a game on a freshly generated map.
    ///
    /// The player gets one random city building its captured-city
    /// production, the computer the city farthest from it with production
    /// left to its planner.
    ///
    /// # Errors
    ///
    /// Returns an error if the map has no room for two cities.
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let map = generate_map(&config.map, &mut rng)?;
        let mut world = map
            .into_world(config.production.unit_capacity)?
            .with_stack_limit(config.production.stack_limit);
        let (player, computer) = pick_home_cities(&world, &mut rng)?;

        world.assign_city(player, Some(Owner::Player))?;
        if let Some(city) = world.city_id_at(player).and_then(|id| world.city_mut(id)) {
            city.prod = Some(config.production.captured_city_production);
            city.func = config.player_city_functions;
        }
        world.assign_city(computer, Some(Owner::Computer))?;
        info!(seed, player, computer, cities = world.cities().len(), "game created");
        Ok(Self {
            world,
            rng,
            config,
            seed,
        })
    }

    /// Play on a prepared world.
    #[must_use]
    pub fn from_world(world: World, config: EngineConfig, seed: u64) -> Self {
        Self {
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            seed,
        }
    }

    /// The board.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable board, for setting up scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed the game was started with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current turn number.
    #[must_use]
    pub fn date(&self) -> u32 {
        self.world.date()
    }

    // ------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------

    /// Play one side's turn with the given combat resolver.
    ///
    /// The computer (and the player when the computer plays both sides)
    /// rescans, re-plans production and moves by strategy; otherwise the
    /// player's units follow their functions.
    ///
    /// # Errors
    ///
    /// Propagates world errors. No-progress conditions never surface here.
    pub fn run_turn(&mut self, owner: Owner, combat: &mut dyn CombatResolver) -> Result<TurnEvents> {
        let dims = self.world.dims();
        let by_strategy = owner == Owner::Computer || self.config.computer_plays_player;
        if by_strategy {
            self.world.scan_all(owner);
            ProductionPlanner::new(&self.world, owner, &self.config.production)
                .plan(&mut self.world)?;
        }
        produce(&mut self.world, owner, &mut self.rng)?;

        let mut ctx = TurnContext {
            world: &mut self.world,
            rng: &mut self.rng,
            combat,
            config: &self.config,
        };
        if by_strategy {
            move_side(&mut ComputerStrategy::new(owner, dims), &mut ctx)?;
        } else {
            move_side(&mut AutoPilot::new(owner, dims), &mut ctx)?;
        }

        let events = self.world.drain_events();
        let date = self.world.date();
        info!(
            date,
            %owner,
            events = events.len(),
            cities = self.world.city_count(owner),
            "turn complete"
        );
        Ok(TurnEvents { date, events })
    }

    /// Play one side's turn with fair dice.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    pub fn turn(&mut self, owner: Owner) -> Result<TurnEvents> {
        self.run_turn(owner, &mut DiceCombat)
    }

    /// Play a player turn then a computer turn, and advance the date.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    pub fn play_round_with(&mut self, combat: &mut dyn CombatResolver) -> Result<RoundSummary> {
        let player = self.run_turn(Owner::Player, combat)?;
        let computer = self.run_turn(Owner::Computer, combat)?;
        self.world.advance_date();
        let outcome = self.outcome();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(date = self.world.date(), state_hash = hash, "Game state hash");
        }

        Ok(RoundSummary {
            player,
            computer,
            outcome,
        })
    }

    /// Play a round with fair dice.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    pub fn play_round(&mut self) -> Result<RoundSummary> {
        self.play_round_with(&mut DiceCombat)
    }

    /// Who, if anyone, has won.
    ///
    /// A side with no cities and no armies has lost. The computer resigns
    /// once it holds fewer than a third of the player's cities and fewer
    /// than a third of the player's armies.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let cities = |o| self.world.city_count(o);
        let armies = |o| self.world.unit_count(o, PieceType::Army);
        let wiped = |o| cities(o) == 0 && armies(o) == 0;
        if wiped(Owner::Player) {
            return Outcome::Won {
                winner: Owner::Computer,
                resigned: false,
            };
        }
        if wiped(Owner::Computer) {
            return Outcome::Won {
                winner: Owner::Player,
                resigned: false,
            };
        }
        let outclassed = cities(Owner::Computer) * 3 < cities(Owner::Player)
            && armies(Owner::Computer) * 3 < armies(Owner::Player);
        if outclassed {
            return Outcome::Won {
                winner: Owner::Player,
                resigned: true,
            };
        }
        Outcome::Ongoing
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Hash of the complete game state, RNG position included.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        self.world.date().hash(&mut hasher);
        bincode::serialize(&self.world)
            .unwrap_or_default()
            .hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);
        self.rng.get_stream().hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the game.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game: {e}")))
    }

    /// Deserialize a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a serialized game.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize game: {e}")))
    }

    /// Wrap the game in a versioned save envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_save_bytes(&self) -> Result<Vec<u8>> {
        let envelope = SaveFile {
            version: SAVE_VERSION,
            seed: self.seed,
            date: self.world.date(),
            state: self.serialize()?,
            hash: self.state_hash(),
        };
        bincode::serialize(&envelope)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize save: {e}")))
    }

    /// Restore a game from a save envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::VersionMismatch`] for another format version
    /// and [`GameError::InvalidState`] for corrupt data or a state that no
    /// longer matches its recorded hash.
    pub fn from_save_bytes(data: &[u8]) -> Result<Self> {
        let envelope: SaveFile = bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to read save: {e}")))?;
        if envelope.version != SAVE_VERSION {
            return Err(GameError::VersionMismatch {
                expected: SAVE_VERSION,
                found: envelope.version,
            });
        }
        let game = Self::deserialize(&envelope.state)?;
        if game.state_hash() != envelope.hash {
            return Err(GameError::InvalidState(format!(
                "Save hash mismatch at turn {}",
                envelope.date
            )));
        }
        Ok(game)
    }

    /// Write the game to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_save_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            GameError::InvalidState(format!("Failed to write {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), date = self.world.date(), "game saved");
        Ok(())
    }

    /// Read a game from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid save.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            GameError::InvalidState(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_save_bytes(&bytes)
    }
}
