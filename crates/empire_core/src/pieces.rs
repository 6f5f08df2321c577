//! Piece types, their static attributes, and the two sides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of piece types.
pub const NUM_PIECES: usize = 9;

/// Terrain a piece may cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mobility {
    /// Land only.
    Land,
    /// Water only.
    Water,
    /// Land or water.
    Air,
}

/// Static attributes of a piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceAttr {
    /// Display letter for the player's pieces.
    pub letter: char,
    /// Short name.
    pub name: &'static str,
    /// Plural name.
    pub plural: &'static str,
    /// View symbols the piece may move onto.
    pub terrain: &'static str,
    /// Work points needed to build one.
    pub build_time: u32,
    /// Damage dealt per successful blow.
    pub strength: u32,
    /// Hit points when fully repaired.
    pub max_hits: u32,
    /// Cells per turn at full health.
    pub speed: u32,
    /// Cargo slots at full health.
    pub capacity: u32,
    /// Moves before running out of fuel, `None` for unlimited.
    pub range: Option<u32>,
}

static PIECE_ATTRS: [PieceAttr; NUM_PIECES] = [
    PieceAttr {
        letter: 'A',
        name: "army",
        plural: "armies",
        terrain: "+",
        build_time: 5,
        strength: 1,
        max_hits: 1,
        speed: 1,
        capacity: 0,
        range: None,
    },
    // Fighter range is an even multiple of its speed so it can fly out
    // two turns and back.
    PieceAttr {
        letter: 'F',
        name: "fighter",
        plural: "fighters",
        terrain: ".+",
        build_time: 10,
        strength: 1,
        max_hits: 1,
        speed: 8,
        capacity: 0,
        range: Some(32),
    },
    PieceAttr {
        letter: 'P',
        name: "patrol boat",
        plural: "patrol boats",
        terrain: ".",
        build_time: 15,
        strength: 1,
        max_hits: 1,
        speed: 4,
        capacity: 0,
        range: None,
    },
    PieceAttr {
        letter: 'D',
        name: "destroyer",
        plural: "destroyers",
        terrain: ".",
        build_time: 20,
        strength: 1,
        max_hits: 3,
        speed: 2,
        capacity: 0,
        range: None,
    },
    PieceAttr {
        letter: 'S',
        name: "submarine",
        plural: "submarines",
        terrain: ".",
        build_time: 20,
        strength: 3,
        max_hits: 2,
        speed: 2,
        capacity: 0,
        range: None,
    },
    PieceAttr {
        letter: 'T',
        name: "troop transport",
        plural: "troop transports",
        terrain: ".",
        build_time: 30,
        strength: 1,
        max_hits: 1,
        speed: 2,
        capacity: 6,
        range: None,
    },
    PieceAttr {
        letter: 'C',
        name: "aircraft carrier",
        plural: "aircraft carriers",
        terrain: ".",
        build_time: 30,
        strength: 1,
        max_hits: 8,
        speed: 2,
        capacity: 8,
        range: None,
    },
    PieceAttr {
        letter: 'B',
        name: "battleship",
        plural: "battleships",
        terrain: ".",
        build_time: 40,
        strength: 2,
        max_hits: 10,
        speed: 2,
        capacity: 0,
        range: None,
    },
    PieceAttr {
        letter: 'Z',
        name: "satellite",
        plural: "satellites",
        terrain: ".+",
        build_time: 50,
        strength: 0,
        max_hits: 1,
        speed: 10,
        capacity: 0,
        range: Some(500),
    },
];

/// The nine kinds of piece.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum PieceType {
    /// Land unit; the only piece that captures cities.
    Army,
    /// Aircraft with limited fuel.
    Fighter,
    /// Fast light ship.
    Patrol,
    /// Escort ship.
    Destroyer,
    /// Hard-hitting ship.
    Submarine,
    /// Carries armies.
    Transport,
    /// Carries fighters.
    Carrier,
    /// Heavy ship.
    Battleship,
    /// Orbiting scout.
    Satellite,
}

/// Order in which a side's pieces move each turn.
pub const MOVE_ORDER: [PieceType; NUM_PIECES] = [
    PieceType::Satellite,
    PieceType::Transport,
    PieceType::Carrier,
    PieceType::Battleship,
    PieceType::Patrol,
    PieceType::Submarine,
    PieceType::Destroyer,
    PieceType::Army,
    PieceType::Fighter,
];

impl PieceType {
    /// All piece types in declaration order.
    pub const ALL: [Self; NUM_PIECES] = [
        Self::Army,
        Self::Fighter,
        Self::Patrol,
        Self::Destroyer,
        Self::Submarine,
        Self::Transport,
        Self::Carrier,
        Self::Battleship,
        Self::Satellite,
    ];

    /// Position in [`PieceType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Static attributes of this type.
    #[must_use]
    pub fn attr(self) -> &'static PieceAttr {
        &PIECE_ATTRS[self as usize]
    }

    /// Uppercase display letter.
    #[must_use]
    pub fn letter(self) -> char {
        self.attr().letter
    }

    /// Parse an uppercase or lowercase piece letter.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        Self::ALL.into_iter().find(|p| p.letter() == upper)
    }

    /// Terrain the piece can cross.
    #[must_use]
    pub const fn mobility(self) -> Mobility {
        match self {
            Self::Army => Mobility::Land,
            Self::Fighter | Self::Satellite => Mobility::Air,
            _ => Mobility::Water,
        }
    }

    /// True for the six sea-going types.
    #[must_use]
    pub const fn is_ship(self) -> bool {
        matches!(self.mobility(), Mobility::Water)
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attr().name)
    }
}

/// One of the two sides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Owner {
    /// The human side; uppercase symbols.
    Player,
    /// The computer side; lowercase symbols.
    Computer,
}

impl Owner {
    /// Both sides.
    pub const BOTH: [Self; 2] = [Self::Player, Self::Computer];

    /// Index used for per-side tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Computer,
            Self::Computer => Self::Player,
        }
    }

    /// View symbol of a city held by this side.
    #[must_use]
    pub const fn city_symbol(self) -> char {
        match self {
            Self::Player => 'O',
            Self::Computer => 'X',
        }
    }

    /// View symbol of one of this side's pieces.
    #[must_use]
    pub fn piece_symbol(self, kind: PieceType) -> char {
        match self {
            Self::Player => kind.letter(),
            Self::Computer => kind.letter().to_ascii_lowercase(),
        }
    }

    /// Side owning a piece symbol, if the symbol is a piece.
    #[must_use]
    pub fn of_piece_symbol(symbol: char) -> Option<(Self, PieceType)> {
        let kind = PieceType::from_letter(symbol)?;
        let owner = if symbol.is_ascii_uppercase() {
            Self::Player
        } else {
            Self::Computer
        };
        Some((owner, kind))
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Computer => f.write_str("computer"),
        }
    }
}

/// View symbol of an unowned city.
pub const UNOWNED_CITY: char = '*';

/// View symbol of a city with the given owner.
#[must_use]
pub const fn city_symbol(owner: Option<Owner>) -> char {
    match owner {
        Some(owner) => owner.city_symbol(),
        None => UNOWNED_CITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_table_values() {
        let fighter = PieceType::Fighter.attr();
        assert_eq!(fighter.speed, 8);
        assert_eq!(fighter.range, Some(32));
        assert_eq!(PieceType::Transport.attr().capacity, 6);
        assert_eq!(PieceType::Carrier.attr().capacity, 8);
        assert_eq!(PieceType::Battleship.attr().max_hits, 10);
        assert_eq!(PieceType::Army.attr().range, None);
    }

    #[test]
    fn test_letters_roundtrip() {
        for kind in PieceType::ALL {
            assert_eq!(PieceType::from_letter(kind.letter()), Some(kind));
            assert_eq!(
                Owner::of_piece_symbol(Owner::Computer.piece_symbol(kind)),
                Some((Owner::Computer, kind))
            );
        }
        assert_eq!(PieceType::from_letter('+'), None);
    }

    #[test]
    fn test_move_order_covers_every_type() {
        let mut seen = MOVE_ORDER.to_vec();
        seen.sort();
        assert_eq!(seen, PieceType::ALL.to_vec());
        assert_eq!(MOVE_ORDER[0], PieceType::Satellite);
        assert_eq!(MOVE_ORDER[8], PieceType::Fighter);
    }

    #[test]
    fn test_city_symbols() {
        assert_eq!(city_symbol(None), '*');
        assert_eq!(city_symbol(Some(Owner::Player)), 'O');
        assert_eq!(Owner::Computer.city_symbol(), 'X');
        assert_eq!(Owner::Player.opponent(), Owner::Computer);
    }

    #[test]
    fn test_ship_classification() {
        assert!(PieceType::Submarine.is_ship());
        assert!(!PieceType::Army.is_ship());
        assert!(!PieceType::Fighter.is_ship());
        assert!(!PieceType::Satellite.is_ship());
    }
}
