//! Events emitted while a turn is played.
//!
//! The engine never prints. Everything a display or a log would want to
//! report is recorded here and handed back from each turn.

use serde::{Deserialize, Serialize};

use crate::geometry::Location;
use crate::pieces::{Owner, PieceType};
use crate::world::UnitId;

/// Why a unit was removed from play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCause {
    /// Lost a fight.
    Combat,
    /// Consumed attacking a city.
    CityAssault,
    /// Army killed when its city fell.
    CityCaptured,
    /// Fighter ran out of fuel.
    FuelExhausted,
    /// Satellite reached the end of its range.
    BurnedOut,
    /// Army won a fight at sea with nowhere to stand.
    Drowned,
    /// Went down with the ship carrying it.
    ShipSunk,
    /// Did not fit aboard a damaged carrier.
    Overloaded,
}

/// Something that happened during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A city finished a unit.
    UnitBuilt {
        /// Building side.
        owner: Owner,
        /// Piece type built.
        kind: PieceType,
        /// The new unit.
        unit: UnitId,
        /// City location.
        loc: Location,
    },
    /// A unit left play.
    UnitLost {
        /// Side that lost it.
        owner: Owner,
        /// Piece type lost.
        kind: PieceType,
        /// Handle the unit had.
        unit: UnitId,
        /// Where it happened.
        loc: Location,
        /// What killed it.
        cause: LossCause,
    },
    /// A city changed hands.
    CityCaptured {
        /// City location.
        loc: Location,
        /// Previous owner.
        from: Option<Owner>,
        /// New owner.
        to: Owner,
    },
    /// An assault on a city failed.
    CityHeld {
        /// City location.
        loc: Location,
        /// Side that attacked.
        attacker: Owner,
    },
    /// Two units fought.
    Battle {
        /// Attacking side.
        attacker: Owner,
        /// Attacking piece type.
        attacker_kind: PieceType,
        /// Defending piece type.
        defender_kind: PieceType,
        /// Where the defender stood.
        loc: Location,
        /// Side left standing.
        winner: Owner,
    },
    /// A city could not place its finished unit.
    ProductionStalled {
        /// City owner.
        owner: Owner,
        /// City location.
        loc: Location,
        /// Piece type waiting.
        kind: PieceType,
    },
    /// A city changed what it builds.
    ProductionChanged {
        /// City owner.
        owner: Owner,
        /// City location.
        loc: Location,
        /// New production.
        kind: PieceType,
    },
}

impl GameEvent {
    /// True for a unit loss of the given side.
    #[must_use]
    pub fn is_loss_of(&self, side: Owner) -> bool {
        matches!(self, Self::UnitLost { owner, .. } if *owner == side)
    }
}
