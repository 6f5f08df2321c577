//! Test fixtures: small hand-drawn worlds and scripted combat.
//!
//! Maps use the ASCII notation of [`empire_core::mapgen::parse_ascii`]:
//! `.` water, `+` land, `*` unowned city, `O` player city, `X` computer
//! city.

use empire_core::prelude::*;
use empire_core::mapgen::parse_ascii;
use rand::RngCore;

/// Pool size used by fixture worlds.
pub const FIXTURE_CAPACITY: usize = 200;

/// A coastline: land in the west, open sea in the east, one city each.
pub const COAST: &str = "\
............
.+++++......
.++O++......
.+++++......
.+++++......
.++X++......
.+++++......
............
";

/// Two islands separated by a strait, each with one owned city and one
/// unowned city.
pub const TWO_ISLANDS: &str = "\
....................
.++++.........++++..
.+O++.........++X+..
.++*+.........+*++..
.++++.........++++..
....................
";

/// Open sea with no land at all.
pub const OPEN_SEA: &str = "\
..........
..........
..........
..........
..........
..........
";

/// Build a world from an ASCII map.
///
/// # Panics
///
/// Panics if the map does not parse.
#[must_use]
pub fn world_from_ascii(map: &str) -> World {
    match parse_ascii(map, FIXTURE_CAPACITY) {
        Ok(world) => world,
        Err(e) => panic!("fixture map does not parse: {e}"),
    }
}

/// Let a side see the whole board as it is now.
pub fn reveal(world: &mut World, owner: Owner) {
    for loc in 0..world.dims().size() {
        world.update(owner, loc);
    }
}

/// Create a unit at `(row, col)` and let its owner see around it.
///
/// # Panics
///
/// Panics if the unit cannot be created.
pub fn spawn(world: &mut World, owner: Owner, kind: PieceType, row: usize, col: usize) -> UnitId {
    let loc = world.dims().loc(row, col);
    let id = match world.create_unit(owner, kind, loc) {
        Ok(id) => id,
        Err(e) => panic!("cannot spawn {kind:?} at ({row}, {col}): {e}"),
    };
    world.scan(owner, loc);
    id
}

/// Create `count` units of `kind` aboard `ship`.
///
/// # Panics
///
/// Panics if the ship is gone or has no room.
pub fn spawn_aboard(world: &mut World, ship: UnitId, kind: PieceType, count: usize) -> Vec<UnitId> {
    let Some((owner, loc)) = world.unit(ship).map(|s| (s.owner, s.loc)) else {
        panic!("ship {ship} is not alive");
    };
    (0..count)
        .map(|_| {
            let id = match world.create_unit(owner, kind, loc) {
                Ok(id) => id,
                Err(e) => panic!("cannot create cargo: {e}"),
            };
            if let Err(e) = world.embark(ship, id) {
                panic!("cannot embark {id} on {ship}: {e}");
            }
            id
        })
        .collect()
}

/// A configuration for quick full games on a small generated map.
#[must_use]
pub fn small_config() -> EngineConfig {
    EngineConfig {
        map: MapConfig {
            width: 40,
            height: 24,
            city_count: 12,
            ..MapConfig::default()
        },
        production: ProductionTuning {
            unit_capacity: 600,
            ..ProductionTuning::default()
        },
        ..EngineConfig::default()
    }
}

/// Wraps a fixture world in a game with the default configuration.
#[must_use]
pub fn game_on(world: World, seed: u64) -> Game {
    Game::from_world(world, EngineConfig::default(), seed)
}

/// Attacker wins every assault and every fight.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysWin;

impl CombatResolver for AlwaysWin {
    fn assault_succeeds(&mut self, _rng: &mut dyn RngCore) -> bool {
        true
    }

    fn defender_strikes(&mut self, _rng: &mut dyn RngCore) -> bool {
        false
    }
}

/// Attacker loses every assault and every fight.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysLose;

impl CombatResolver for AlwaysLose {
    fn assault_succeeds(&mut self, _rng: &mut dyn RngCore) -> bool {
        false
    }

    fn defender_strikes(&mut self, _rng: &mut dyn RngCore) -> bool {
        true
    }
}
