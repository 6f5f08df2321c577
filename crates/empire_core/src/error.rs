//! Error types for the decision engine.

use thiserror::Error;

use crate::geometry::Location;
use crate::world::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all engine errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Every slot of the unit pool is in use.
    #[error("Unit pool exhausted")]
    PoolExhausted,

    /// A location outside the board was used.
    #[error("Invalid location: {0}")]
    InvalidLocation(Location),

    /// A handle that does not name a live unit.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// No city stands at the given location.
    #[error("No city at location {0}")]
    CityNotFound(Location),

    /// A carrier has no room for more cargo.
    #[error("Cargo full on unit {0}")]
    CargoFull(UnitId),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Configuration file parsing error.
    #[error("Failed to parse config '{path}': {message}")]
    ConfigParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Consistency audit failure.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Saved game written by an incompatible format version.
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build reads.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },
}
