//! Objective tables: which view symbols a search is looking for and how
//! strongly it prefers each one.

use crate::geometry::Location;
use crate::pieces::{Owner, PieceType};
use crate::world::World;

/// How much an objective symbol adds to the path cost when ranking finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// A fixed bias; lower is more attractive.
    Cost(u32),
    /// A city building transports, valued by how soon the next one is due.
    /// Cities building anything else are not objectives at all.
    TransportBuild,
}

/// A static objective table, written from the point of view of `home`.
///
/// Tables are mirrored for the other side: piece letters swap case and the
/// two city symbols swap. Marker symbols (`$`, `x`, digits, `*` and the
/// unexplored blank) mean the same to both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveTable {
    /// Side the symbols are written for.
    pub home: Owner,
    /// Objective symbols with their weights, in priority order.
    pub targets: &'static [(char, Weight)],
}

/// Computer transport looking for unexplored water.
pub const TT_EXPLORE: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[(' ', Weight::Cost(1))],
};

/// Computer transport looking for armies waiting to board.
pub const TT_LOAD: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[('$', Weight::Cost(1))],
};

/// Computer transport looking for a continent worth invading.
///
/// Continents with four or more target cities are grabbed at once; fewer
/// cities earn a growing detour allowance. `0` marks continents the side
/// already has a foothold on.
pub const TT_UNLOAD: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[
        ('9', Weight::Cost(1)),
        ('8', Weight::Cost(1)),
        ('7', Weight::Cost(1)),
        ('6', Weight::Cost(1)),
        ('5', Weight::Cost(1)),
        ('4', Weight::Cost(1)),
        ('3', Weight::Cost(11)),
        ('2', Weight::Cost(21)),
        ('1', Weight::Cost(41)),
        ('0', Weight::Cost(101)),
        (' ', Weight::Cost(61)),
    ],
};

/// Computer army looking for something to fight on land.
pub const ARMY_FIGHT: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[
        ('O', Weight::Cost(1)),
        ('*', Weight::Cost(1)),
        ('T', Weight::Cost(1)),
        ('A', Weight::Cost(1)),
        (' ', Weight::Cost(11)),
    ],
};

/// Computer army looking for a ride: a loading transport or a city
/// about to build one.
pub const ARMY_LOAD: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[('$', Weight::Cost(1)), ('x', Weight::TransportBuild)],
};

/// Computer fighter looking for prey.
pub const FIGHTER_FIGHT: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[
        ('T', Weight::Cost(1)),
        ('C', Weight::Cost(1)),
        ('F', Weight::Cost(5)),
        ('B', Weight::Cost(5)),
        ('S', Weight::Cost(5)),
        ('D', Weight::Cost(5)),
        ('P', Weight::Cost(5)),
        ('A', Weight::Cost(5)),
        (' ', Weight::Cost(9)),
    ],
};

/// Computer warship looking for prey.
pub const SHIP_FIGHT: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[
        ('T', Weight::Cost(1)),
        ('C', Weight::Cost(1)),
        ('B', Weight::Cost(3)),
        ('S', Weight::Cost(3)),
        ('D', Weight::Cost(3)),
        ('P', Weight::Cost(3)),
        (' ', Weight::Cost(21)),
    ],
};

/// Computer ship looking for a port.
pub const SHIP_REPAIR: ObjectiveTable = ObjectiveTable {
    home: Owner::Computer,
    targets: &[('X', Weight::Cost(1))],
};

/// Player army exploring.
pub const USER_ARMY: ObjectiveTable = ObjectiveTable {
    home: Owner::Player,
    targets: &[(' ', Weight::Cost(1))],
};

/// Player army looking for something to attack.
pub const USER_ARMY_ATTACK: ObjectiveTable = ObjectiveTable {
    home: Owner::Player,
    targets: &[
        ('*', Weight::Cost(1)),
        ('X', Weight::Cost(1)),
        ('a', Weight::Cost(1)),
        (' ', Weight::Cost(12)),
    ],
};

/// Player fighter exploring.
pub const USER_FIGHTER: ObjectiveTable = ObjectiveTable {
    home: Owner::Player,
    targets: &[(' ', Weight::Cost(1))],
};

/// Player ship exploring.
pub const USER_SHIP: ObjectiveTable = ObjectiveTable {
    home: Owner::Player,
    targets: &[(' ', Weight::Cost(1))],
};

/// Player ship looking for a port.
pub const USER_SHIP_REPAIR: ObjectiveTable = ObjectiveTable {
    home: Owner::Player,
    targets: &[('O', Weight::Cost(1))],
};

/// Adjacent attack lists, computer perspective.
pub const TT_ATTACK: &str = "T";
/// Targets an army attacks when adjacent.
pub const ARMY_ATTACK: &str = "O*TACFBSDP";
/// Targets a fighter attacks when adjacent.
pub const FIGHTER_ATTACK: &str = "TCFBSDPA";
/// Targets a warship attacks when adjacent.
pub const SHIP_ATTACK: &str = "TCBSDP";

/// Translate a symbol written for the computer into `owner`'s terms.
#[must_use]
pub fn mirror_symbol(symbol: char, written_for: Owner, owner: Owner) -> char {
    if written_for == owner {
        return symbol;
    }
    match symbol {
        'O' => 'X',
        'X' => 'O',
        c if PieceType::from_letter(c).is_some() => {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        }
        c => c,
    }
}

/// Translate an attack list written for the computer into `owner`'s terms.
#[must_use]
pub fn attack_list(list: &str, owner: Owner) -> String {
    list.chars()
        .map(|c| mirror_symbol(c, Owner::Computer, owner))
        .collect()
}

/// An objective table resolved for one searching side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objectives {
    owner: Owner,
    targets: Vec<(char, Weight)>,
    target_loc: Option<Location>,
}

impl Objectives {
    /// Resolve a table for `owner`.
    #[must_use]
    pub fn resolve(table: &ObjectiveTable, owner: Owner) -> Self {
        let targets = table
            .targets
            .iter()
            .map(|&(symbol, weight)| (mirror_symbol(symbol, table.home, owner), weight))
            .collect();
        Self {
            owner,
            targets,
            target_loc: None,
        }
    }

    /// A single explicit location as the only objective.
    #[must_use]
    pub fn destination(loc: Location, owner: Owner) -> Self {
        Self {
            owner,
            targets: Vec::new(),
            target_loc: Some(loc),
        }
    }

    /// Side doing the search; its own cities are treated as ports.
    #[must_use]
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Explicit target location, if this is a destination search.
    #[must_use]
    pub fn target_loc(&self) -> Option<Location> {
        self.target_loc
    }

    /// Resolved symbol list.
    #[must_use]
    pub fn targets(&self) -> &[(char, Weight)] {
        &self.targets
    }

    /// Priority list for step selection, as a symbol string.
    #[must_use]
    pub fn symbols(&self) -> String {
        self.targets.iter().map(|&(c, _)| c).collect()
    }

    /// Cost of finding `loc`, showing `symbol`, from a ring at `base`.
    /// `None` if the cell is not an objective.
    #[must_use]
    pub fn evaluate(&self, world: &World, loc: Location, symbol: char, base: u32) -> Option<u32> {
        if let Some(target) = self.target_loc {
            return (target == loc).then_some(base + 1);
        }
        let &(_, weight) = self.targets.iter().find(|&&(c, _)| c == symbol)?;
        match weight {
            Weight::Cost(w) => Some(base + w),
            Weight::TransportBuild => {
                let city = world.city_at(loc)?;
                if city.prod != Some(PieceType::Transport) {
                    return None;
                }
                let build = PieceType::Transport.attr().build_time as i32;
                let remaining = (build - city.work).max(0) as u32;
                Some(base + 2 * remaining)
            }
        }
    }
}
