//! Scratch view maps annotated with loading and landing markers.
//!
//! Each builder copies a side's view and overwrites a few cells with marker
//! symbols that the objective tables look for: `$` for a ride or a
//! passenger that is ready, `x` for a city about to launch a transport,
//! and a digit for how many cities a landing would put in reach.

use std::collections::HashMap;

use crate::config::PolicyTuning;
use crate::function::Function;
use crate::pathfinding::{continent, scan_continent, unmark_explore_locs};
use crate::pieces::{Owner, PieceType, UNOWNED_CITY};
use crate::world::{Terrain, UnitId, ViewMap, World};

/// Marker for a transport or army ready to load.
pub const READY: char = '$';
/// Marker for a city building a transport that an army may wait at.
pub const TRANSPORT_CITY: char = 'x';

/// Map for an army looking for a ride.
///
/// Loading transports are marked `$`. A city building transports is marked
/// `x` if this army is already waiting near it, or if too few armies are
/// waiting there to fill the transport it will launch.
#[must_use]
pub fn army_load_map(world: &World, owner: Owner, army: UnitId, tuning: &PolicyTuning) -> ViewMap {
    let dims = world.dims();
    let mut map = world.view(owner).clone();
    for &id in world.units_of(owner, PieceType::Transport) {
        if let Some(tt) = world.unit(id).filter(|u| u.func == Function::Load) {
            map.set_contents(tt.loc, READY);
        }
    }

    let waiting: Vec<_> = world
        .units_of(owner, PieceType::Army)
        .iter()
        .filter_map(|&id| world.unit(id))
        .filter(|a| a.func == Function::Load)
        .map(|a| (a.id, a.loc))
        .collect();
    let near = |loc, city| dims.dist(loc, city) <= tuning.load_radius;

    for city in world.cities() {
        if !city.is_owned_by(owner) || city.prod != Some(PieceType::Transport) {
            continue;
        }
        let this_army_near = waiting
            .iter()
            .any(|&(id, loc)| id == army && near(loc, city.loc));
        let crowd = waiting.iter().filter(|&&(_, loc)| near(loc, city.loc)).count();
        if this_army_near || (crowd as u32) < tuning.load_army_threshold {
            map.set_contents(city.loc, TRANSPORT_CITY);
        }
    }
    map
}

/// Map for a transport looking for passengers: armies waiting on shore.
#[must_use]
pub fn transport_load_map(world: &World, owner: Owner) -> ViewMap {
    let mut map = world.view(owner).clone();
    for &id in world.units_of(owner, PieceType::Army) {
        if let Some(army) = world
            .unit(id)
            .filter(|a| a.func == Function::Load && a.ship.is_none())
        {
            map.set_contents(army.loc, READY);
        }
    }
    map
}

/// Map for a loaded transport choosing where to land.
///
/// Blanks are filled from the prediction first. Every enemy or unowned
/// city is then replaced by a digit: `0` if the side already holds a city
/// on that continent, otherwise the number of enemy and unowned cities
/// there, capped at nine.
#[must_use]
pub fn unload_map(world: &World, owner: Owner, predicted: &ViewMap) -> ViewMap {
    let mut base = world.view(owner).clone();
    unmark_explore_locs(&mut base, predicted);
    let mut map = base.clone();
    let enemy_city = owner.opponent().city_symbol();
    let dims = base.dims();

    let mut digits: HashMap<usize, char> = HashMap::new();
    for loc in 0..dims.size() {
        let symbol = base.contents(loc);
        if symbol != enemy_city && symbol != UNOWNED_CITY {
            continue;
        }
        if let Some(&digit) = digits.get(&loc) {
            map.set_contents(loc, digit);
            continue;
        }
        let land = continent(world, &base, loc, Terrain::Water);
        let scan = scan_continent(&base, &land);
        let digit = if scan.cities_of(owner) > 0 {
            '0'
        } else {
            let targets = (scan.cities_of(owner.opponent()) + scan.unowned_cities).min(9);
            char::from_digit(targets as u32, 10).unwrap_or('9')
        };
        for member in land.locations() {
            let s = base.contents(member);
            if s == enemy_city || s == UNOWNED_CITY {
                digits.insert(member, digit);
            }
        }
        map.set_contents(loc, digit);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MapDims;

    /// 12x8: a west island (columns 1..=3), open sea, an east island
    /// (columns 8..=10).
    fn two_islands() -> World {
        let dims = MapDims::new(12, 8);
        let terrain = (0..dims.size())
            .map(|loc| {
                let c = dims.col(loc);
                if (1..=3).contains(&c) || (8..=10).contains(&c) {
                    Terrain::Land
                } else {
                    Terrain::Water
                }
            })
            .collect();
        let cities = [dims.loc(2, 2), dims.loc(2, 9), dims.loc(5, 9), dims.loc(4, 3)];
        let mut world = World::new(dims, terrain, &cities, 32).unwrap();
        for loc in 0..dims.size() {
            world.update(Owner::Computer, loc);
        }
        world
    }

    #[test]
    fn test_unload_digits_count_targets() {
        let mut world = two_islands();
        let dims = world.dims();
        world.assign_city(dims.loc(2, 2), Some(Owner::Computer)).unwrap();
        let predicted = world.view(Owner::Computer).clone();
        let map = unload_map(&world, Owner::Computer, &predicted);
        assert_eq!(map.contents(dims.loc(2, 9)), '2');
        assert_eq!(map.contents(dims.loc(5, 9)), '2');
        // Same continent as an own city.
        assert_eq!(map.contents(dims.loc(4, 3)), '0');
        assert_eq!(map.contents(dims.loc(2, 2)), 'X');
    }

    #[test]
    fn test_transport_load_map_marks_waiting_armies() {
        let mut world = two_islands();
        let dims = world.dims();
        let waiting = world
            .create_unit(Owner::Computer, PieceType::Army, dims.loc(3, 3))
            .unwrap();
        world.set_function(waiting, Function::Load).unwrap();
        world
            .create_unit(Owner::Computer, PieceType::Army, dims.loc(5, 2))
            .unwrap();
        let map = transport_load_map(&world, Owner::Computer);
        assert_eq!(map.contents(dims.loc(3, 3)), READY);
        assert_ne!(map.contents(dims.loc(5, 2)), READY);
    }

    #[test]
    fn test_army_load_map_marks_transport_city() {
        let mut world = two_islands();
        let dims = world.dims();
        let city = dims.loc(2, 2);
        world.assign_city(city, Some(Owner::Computer)).unwrap();
        world.set_production(city, PieceType::Transport, 5).unwrap();
        let army = world
            .create_unit(Owner::Computer, PieceType::Army, dims.loc(4, 2))
            .unwrap();
        let tuning = PolicyTuning {
            load_army_threshold: 0,
            ..PolicyTuning::default()
        };
        // Not waiting and the city needs nobody: unmarked.
        let map = army_load_map(&world, Owner::Computer, army, &tuning);
        assert_eq!(map.contents(city), 'X');
        world.set_function(army, Function::Load).unwrap();
        let map = army_load_map(&world, Owner::Computer, army, &tuning);
        assert_eq!(map.contents(city), TRANSPORT_CITY);
    }
}
