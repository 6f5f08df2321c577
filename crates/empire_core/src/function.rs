//! Programmed functions: the persistent per-unit and per-city orders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, Location};

/// A standing order that drives a unit without further input.
///
/// Every unit carries one, and every city carries one per piece type to
/// hand to the units it builds. The computer also uses [`Function::Load`]
/// and [`Function::Unload`] on its own armies and transports to record
/// whether they are gathering or delivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Function {
    /// No orders; the unit waits.
    #[default]
    Idle,
    /// Step to a random legal neighbor each move.
    Random,
    /// Stay put.
    Sentry,
    /// Wait in port until the cargo hold is full.
    Fill,
    /// Fighter heads for the nearest place to land.
    Land,
    /// Head for the nearest unexplored territory.
    Explore,
    /// Army seeks a transport to board; transport seeks armies to carry.
    Load,
    /// Army seeks the nearest attackable city or unit.
    Attack,
    /// Damaged ship heads for port.
    Repair,
    /// Army boards an adjacent transport as soon as one appears.
    BoardTransport,
    /// Transport carries its cargo toward the best landing.
    Unload,
    /// Keep stepping in one compass direction.
    Direction(Direction),
    /// Travel to a location, then go idle.
    MoveTo(Location),
}

impl Function {
    /// True if the function names a destination.
    #[must_use]
    pub const fn is_destination(self) -> bool {
        matches!(self, Self::MoveTo(_))
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "none",
            Self::Random => "random",
            Self::Sentry => "sentry",
            Self::Fill => "fill",
            Self::Land => "land",
            Self::Explore => "explore",
            Self::Load => "load",
            Self::Attack => "attack",
            Self::Repair => "repair",
            Self::BoardTransport => "transport",
            Self::Unload => "unload",
            Self::Direction(_) => "direction",
            Self::MoveTo(_) => "destination",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direction(dir) => write!(f, "{}", dir.key()),
            Self::MoveTo(loc) => write!(f, "{loc}"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(Function::default(), Function::Idle);
    }

    #[test]
    fn test_display() {
        assert_eq!(Function::Attack.to_string(), "attack");
        assert_eq!(Function::Direction(Direction::SouthWest).to_string(), "Z");
        assert_eq!(Function::MoveTo(1234).to_string(), "1234");
        assert!(Function::MoveTo(3).is_destination());
        assert!(!Function::Fill.is_destination());
    }
}
