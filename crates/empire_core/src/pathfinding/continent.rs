//! Continent and water-body helpers over a view map.

use crate::geometry::{Location, MapDims};
use crate::pieces::{Owner, PieceType, NUM_PIECES};
use crate::world::{Terrain, ViewMap, World, LAND, UNEXPLORED, WATER};

/// Cells belonging to one continent or water body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continent {
    member: Vec<bool>,
}

impl Continent {
    /// True if the location belongs.
    #[must_use]
    pub fn contains(&self, loc: Location) -> bool {
        self.member.get(loc).copied().unwrap_or(false)
    }

    /// Member locations in index order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.member
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(loc, _)| loc)
    }
}

/// Terrain of a cell as a side sees it, falling back to ground truth for
/// symbols that are not bare terrain.
fn effective_terrain(world: &World, view: &ViewMap, loc: Location) -> Terrain {
    match view.contents(loc) {
        LAND => Terrain::Land,
        WATER => Terrain::Water,
        _ => world.terrain(loc),
    }
}

/// Flood the cells connected to `loc` whose terrain is not `exclude`.
///
/// Unexplored cells join the continent but are not expanded from. Cities
/// always join and are expanded from, so a water body includes the ports
/// on its shore.
#[must_use]
pub fn continent(world: &World, view: &ViewMap, loc: Location, exclude: Terrain) -> Continent {
    let dims = view.dims();
    let mut member = vec![false; dims.size()];
    if !dims.on_board(loc) {
        return Continent { member };
    }
    member[loc] = true;
    let mut frontier = vec![loc];
    while let Some(cur) = frontier.pop() {
        for n in dims.adjacent(cur) {
            if member[n] {
                continue;
            }
            if view.contents(n) == UNEXPLORED {
                member[n] = true;
            } else if world.city_at(n).is_some() || effective_terrain(world, view, n) != exclude {
                member[n] = true;
                frontier.push(n);
            }
        }
    }
    Continent { member }
}

/// What a side knows about one continent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinentScan {
    /// Member cells.
    pub size: usize,
    /// Member cells never seen.
    pub unexplored: usize,
    /// Cities per side.
    pub cities: [usize; 2],
    /// Unowned cities.
    pub unowned_cities: usize,
    /// Units per side and type.
    pub units: [[usize; NUM_PIECES]; 2],
}

impl ContinentScan {
    /// Cities of one side.
    #[must_use]
    pub fn cities_of(&self, owner: Owner) -> usize {
        self.cities[owner.index()]
    }

    /// Units of one side and type.
    #[must_use]
    pub fn units_of(&self, owner: Owner, kind: PieceType) -> usize {
        self.units[owner.index()][kind.index()]
    }
}

/// Count what the view shows on a continent.
#[must_use]
pub fn scan_continent(view: &ViewMap, cont: &Continent) -> ContinentScan {
    let mut counts = ContinentScan::default();
    for loc in cont.locations() {
        counts.size += 1;
        match view.contents(loc) {
            UNEXPLORED => counts.unexplored += 1,
            '*' => counts.unowned_cities += 1,
            'O' => counts.cities[Owner::Player.index()] += 1,
            'X' => counts.cities[Owner::Computer.index()] += 1,
            symbol => {
                if let Some((owner, kind)) = Owner::of_piece_symbol(symbol) {
                    counts.units[owner.index()][kind.index()] += 1;
                }
            }
        }
    }
    counts
}

/// True if the water body at `loc` offers `owner` nothing: no unowned or
/// enemy city on its shore and nothing left to explore.
#[must_use]
pub fn is_lake(world: &World, view: &ViewMap, loc: Location, owner: Owner) -> bool {
    let water = continent(world, view, loc, Terrain::Land);
    let counts = scan_continent(view, &water);
    counts.unowned_cities == 0 && counts.cities_of(owner.opponent()) == 0 && counts.unexplored == 0
}

/// Guess the terrain of unexplored cells from their explored neighbors.
///
/// A cell is filled when enough neighbors agree: five of eight inside the
/// board, three of five along an edge, two of three in a corner. Passes
/// repeat until nothing changes; a final pass fills any cell whose
/// explored neighbors lean one way. Cells that stay blank are the frontier
/// still worth exploring.
#[must_use]
pub fn predict_unexplored(world: &World, view: &ViewMap) -> ViewMap {
    let dims = view.dims();
    let mut current = view.clone();
    loop {
        let mut next = current.clone();
        let mut changed = false;
        for loc in blank_cells(dims, &current) {
            let (land, water, total) = neighbor_terrain(world, &current, loc);
            let needed = match total {
                8 => 5,
                5 => 3,
                _ => 2,
            };
            if land >= needed {
                next.set_contents(loc, LAND);
                changed = true;
            } else if water >= needed {
                next.set_contents(loc, WATER);
                changed = true;
            }
        }
        current = next;
        if !changed {
            break;
        }
    }
    let mut last = current.clone();
    for loc in blank_cells(dims, &current) {
        let (land, water, _) = neighbor_terrain(world, &current, loc);
        if land > water {
            last.set_contents(loc, LAND);
        } else if water > land {
            last.set_contents(loc, WATER);
        }
    }
    last
}

fn blank_cells(dims: MapDims, view: &ViewMap) -> Vec<Location> {
    (0..dims.size())
        .filter(|&loc| dims.on_board(loc) && view.contents(loc) == UNEXPLORED)
        .collect()
}

/// Land and water among a cell's on-board neighbors, and how many there
/// are.
fn neighbor_terrain(world: &World, view: &ViewMap, loc: Location) -> (u32, u32, u32) {
    let (mut land, mut water, mut total) = (0, 0, 0);
    for n in view.dims().adjacent(loc) {
        total += 1;
        if view.contents(n) == UNEXPLORED {
            continue;
        }
        match effective_terrain(world, view, n) {
            Terrain::Land => land += 1,
            Terrain::Water => water += 1,
        }
    }
    (land, water, total)
}

/// Replace blanks in `map` with the predicted symbol.
pub fn unmark_explore_locs(map: &mut ViewMap, predicted: &ViewMap) {
    let dims = map.dims();
    for loc in 0..dims.size() {
        if map.contents(loc) == UNEXPLORED {
            map.set_contents(loc, predicted.contents(loc));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10x8 board: land in columns 1..=4, water in columns 5..=8, a
    /// coastal city and an inland one.
    fn coast() -> World {
        let dims = MapDims::new(10, 8);
        let terrain = (0..dims.size())
            .map(|loc| {
                if dims.col(loc) <= 4 {
                    Terrain::Land
                } else {
                    Terrain::Water
                }
            })
            .collect();
        World::new(dims, terrain, &[dims.loc(3, 4), dims.loc(5, 2)], 8).unwrap()
    }

    fn reveal_all(world: &mut World, owner: Owner) {
        let dims = world.dims();
        for loc in 0..dims.size() {
            world.update(owner, loc);
        }
    }

    #[test]
    fn test_land_continent_stops_at_water() {
        let mut world = coast();
        reveal_all(&mut world, Owner::Computer);
        let dims = world.dims();
        let view = world.view(Owner::Computer);
        let land = continent(&world, view, dims.loc(2, 2), Terrain::Water);
        assert!(land.contains(dims.loc(6, 1)));
        assert!(land.contains(dims.loc(3, 4)));
        assert!(!land.contains(dims.loc(3, 5)));
        let counts = scan_continent(view, &land);
        assert_eq!(counts.unowned_cities, 2);
        assert_eq!(counts.size, 6 * 4);
    }

    #[test]
    fn test_unexplored_included_not_expanded() {
        let mut world = coast();
        let dims = world.dims();
        world.scan(Owner::Player, dims.loc(2, 2));
        let view = world.view(Owner::Player);
        let land = continent(&world, view, dims.loc(2, 2), Terrain::Water);
        assert!(land.contains(dims.loc(4, 2)));
        assert!(!land.contains(dims.loc(5, 2)));
        assert_eq!(scan_continent(view, &land).unexplored, 7);
    }

    #[test]
    fn test_lake_detection() {
        let mut world = coast();
        reveal_all(&mut world, Owner::Computer);
        let dims = world.dims();
        let sea = dims.loc(3, 6);
        assert!(!is_lake(&world, world.view(Owner::Computer), sea, Owner::Computer));
        world.assign_city(dims.loc(3, 4), Some(Owner::Computer)).unwrap();
        reveal_all(&mut world, Owner::Computer);
        assert!(is_lake(&world, world.view(Owner::Computer), sea, Owner::Computer));
        assert!(!is_lake(&world, world.view(Owner::Computer), sea, Owner::Player));
    }

    #[test]
    fn test_prediction_fills_interior() {
        let mut world = coast();
        reveal_all(&mut world, Owner::Computer);
        let dims = world.dims();
        let hole = dims.loc(3, 7);
        world.view_mut(Owner::Computer).set_contents(hole, UNEXPLORED);
        let predicted = predict_unexplored(&world, world.view(Owner::Computer));
        assert_eq!(predicted.contents(hole), WATER);

        let mut scratch = world.view(Owner::Computer).clone();
        unmark_explore_locs(&mut scratch, &predicted);
        assert_eq!(scratch.contents(hole), WATER);
    }

    #[test]
    fn test_prediction_leaves_unknown_frontier() {
        let world = coast();
        let view = world.view(Owner::Player);
        let predicted = predict_unexplored(&world, view);
        assert_eq!(predicted.contents(world.dims().loc(3, 3)), UNEXPLORED);
    }
}
