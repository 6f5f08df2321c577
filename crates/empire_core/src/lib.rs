//! # Empire Core
//!
//! Decision engine for a two-sided island conquest wargame.
//!
//! This crate contains **only** deterministic logic:
//! - No terminal IO or rendering
//! - No system randomness (one seeded RNG, saved with the game)
//! - Units and cities iterated in stable order
//!
//! ## Crate Structure
//!
//! - [`geometry`] - Grid locations, directions, distances
//! - [`world`] - Ground truth, the unit pool, cities and per-side views
//! - [`pathfinding`] - Cost-field searches over a side's view
//! - [`policy`] - Per-unit movement for the computer and auto-moved units
//! - [`production`] - City production and the production planner
//! - [`game`] - Turn driver, outcome and saved games

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod function;
pub mod game;
pub mod geometry;
pub mod mapgen;
pub mod pathfinding;
pub mod pieces;
pub mod policy;
pub mod production;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{AttackOutcome, CombatResolver, DiceCombat};
    pub use crate::config::{EngineConfig, MapConfig, PathTuning, PolicyTuning, ProductionTuning};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{GameEvent, LossCause};
    pub use crate::function::Function;
    pub use crate::game::{Game, Outcome, RoundSummary, TurnEvents};
    pub use crate::geometry::{Direction, Location, MapDims};
    pub use crate::pieces::{Owner, PieceType};
    pub use crate::world::{City, Terrain, Unit, UnitId, ViewMap, World};
}
