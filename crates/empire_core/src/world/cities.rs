//! Cities: fixed production sites that change hands by capture.

use serde::{Deserialize, Serialize};

use crate::function::Function;
use crate::geometry::Location;
use crate::pieces::{Owner, PieceType, NUM_PIECES};

/// Index of a city in the world's city table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CityId(pub u32);

impl CityId {
    /// Position in the city table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// Where the city stands; never changes.
    pub loc: Location,
    /// Current owner, `None` while unowned.
    pub owner: Option<Owner>,
    /// Function handed to each piece type built or landing here.
    pub func: [Function; NUM_PIECES],
    /// Work accumulated toward the current production. Negative after a
    /// production change penalty.
    pub work: i32,
    /// What the city is building.
    pub prod: Option<PieceType>,
}

impl City {
    /// A fresh unowned city.
    #[must_use]
    pub fn new(loc: Location) -> Self {
        Self {
            loc,
            owner: None,
            func: [Function::Idle; NUM_PIECES],
            work: 0,
            prod: None,
        }
    }

    /// True if `owner` holds this city.
    #[must_use]
    pub fn is_owned_by(&self, owner: Owner) -> bool {
        self.owner == Some(owner)
    }

    /// Function for units of `kind` produced or stationed here.
    #[must_use]
    pub fn function_for(&self, kind: PieceType) -> Function {
        self.func[kind.index()]
    }

    /// Switch production, forfeiting `build_time / penalty_divisor` work.
    ///
    /// Setting the current production again is free.
    pub fn set_production(&mut self, kind: PieceType, penalty_divisor: u32) {
        if self.prod == Some(kind) {
            return;
        }
        self.prod = Some(kind);
        let penalty = kind.attr().build_time / penalty_divisor.max(1);
        self.work = -(penalty as i32);
    }

    /// Forget owner, production and orders.
    pub(crate) fn reset(&mut self) {
        self.prod = None;
        self.work = 0;
        self.func = [Function::Idle; NUM_PIECES];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_production_applies_penalty() {
        let mut city = City::new(42);
        city.set_production(PieceType::Transport, 5);
        assert_eq!(city.prod, Some(PieceType::Transport));
        assert_eq!(city.work, -6);
        city.work = 10;
        city.set_production(PieceType::Transport, 5);
        assert_eq!(city.work, 10);
        city.set_production(PieceType::Army, 5);
        assert_eq!(city.work, -1);
    }

    #[test]
    fn test_reset_clears_orders() {
        let mut city = City::new(7);
        city.owner = Some(Owner::Player);
        city.func[PieceType::Army.index()] = Function::Attack;
        city.set_production(PieceType::Fighter, 5);
        city.reset();
        assert_eq!(city.prod, None);
        assert_eq!(city.work, 0);
        assert_eq!(city.function_for(PieceType::Army), Function::Idle);
        assert!(city.is_owned_by(Owner::Player));
    }
}
