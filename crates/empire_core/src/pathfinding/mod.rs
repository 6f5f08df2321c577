//! Cost-field pathfinder.
//!
//! A search floods outward from an origin over one side's view of the
//! board, ring by ring in increasing cost, classifying every cell it meets
//! as land, water or not enterable. Along the way it ranks every cell whose
//! symbol is in the objective table by `ring cost + weight` and stops as
//! soon as no later ring can beat the best find.
//!
//! The resulting [`CostField`] outlives the search: callers mark the
//! cheapest path back from the chosen objective and then pick steps along
//! it with [`CostField::find_dir`].

mod continent;
mod cost_field;
mod objectives;

pub use continent::{
    continent, is_lake, predict_unexplored, scan_continent, unmark_explore_locs, Continent,
    ContinentScan,
};
pub use cost_field::{count_adjacent, CostField, PathCell, PathTerrain};
pub use objectives::{
    attack_list, mirror_symbol, ObjectiveTable, Objectives, Weight, ARMY_ATTACK, ARMY_FIGHT,
    ARMY_LOAD, FIGHTER_ATTACK, FIGHTER_FIGHT, SHIP_ATTACK, SHIP_FIGHT, SHIP_REPAIR, TT_ATTACK,
    TT_EXPLORE, TT_LOAD, TT_UNLOAD, USER_ARMY, USER_ARMY_ATTACK, USER_FIGHTER, USER_SHIP,
    USER_SHIP_REPAIR,
};

use tracing::trace;

use crate::config::PathTuning;
use crate::geometry::{Location, INFINITY};
use crate::pieces::{Mobility, Owner};
use crate::world::{Terrain, ViewMap, World, LAND, UNEXPLORED, WATER};

/// Which terrain a search may cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    /// Land only.
    Land,
    /// Water only.
    Water,
    /// Land and water alike, starting as land.
    Air,
    /// Start on land; land may spill into water, water stays on water.
    /// Reports nothing unless an objective costs less than `beat_cost`.
    LandThenWater {
        /// Cost an objective must undercut to be reported.
        beat_cost: u32,
    },
    /// Start on water; water may spill onto land, land stays on land.
    WaterThenLand,
}

impl Search {
    /// The search matching a piece's mobility.
    #[must_use]
    pub const fn for_mobility(mobility: Mobility) -> Self {
        match mobility {
            Mobility::Land => Self::Land,
            Mobility::Water => Self::Water,
            Mobility::Air => Self::Air,
        }
    }

    const fn start_terrain(self) -> PathTerrain {
        match self {
            Self::Water | Self::WaterThenLand => PathTerrain::Water,
            Self::Land | Self::Air | Self::LandThenWater { .. } => PathTerrain::Land,
        }
    }
}

/// Runs searches over one view of one world.
#[derive(Debug, Clone, Copy)]
pub struct Pathfinder<'a> {
    world: &'a World,
    view: &'a ViewMap,
    tuning: &'a PathTuning,
}

impl<'a> Pathfinder<'a> {
    /// Search over an arbitrary view, such as an annotated scratch copy.
    #[must_use]
    pub fn new(world: &'a World, view: &'a ViewMap, tuning: &'a PathTuning) -> Self {
        Self {
            world,
            view,
            tuning,
        }
    }

    /// Search over a side's own view.
    #[must_use]
    pub fn for_owner(world: &'a World, owner: Owner, tuning: &'a PathTuning) -> Self {
        Self::new(world, world.view(owner), tuning)
    }

    /// The view being searched.
    #[must_use]
    pub fn view(&self) -> &'a ViewMap {
        self.view
    }

    /// Find the best objective reachable from `origin`.
    ///
    /// Fills `field` as a side effect. Returns `None` when nothing in the
    /// reachable area matches, or, for [`Search::LandThenWater`], nothing
    /// beats the caller's cost.
    pub fn find(
        &self,
        field: &mut CostField,
        origin: Location,
        search: Search,
        objectives: &Objectives,
    ) -> Option<Location> {
        field.reset();
        let dims = self.view.dims();
        if !dims.on_board(origin) {
            return None;
        }
        field.set(origin, 0, 0, search.start_terrain());

        let mut best = Best {
            loc: None,
            cost: match search {
                Search::LandThenWater { beat_cost } => beat_cost,
                _ => INFINITY,
            },
        };
        let mut rings: Vec<Vec<Location>> = vec![vec![origin]];
        let mut cur = 0usize;
        loop {
            if self.tuning.max_path_cost.is_some_and(|cap| cur as u32 > cap) {
                break;
            }
            let ring = std::mem::take(&mut rings[cur]);
            for loc in ring {
                if field.settled[loc] || field.cost(loc) != cur as u32 {
                    continue;
                }
                field.settled[loc] = true;
                self.expand(field, &mut rings, loc, search, objectives, &mut best);
            }
            let Some(next) = (cur + 1..rings.len()).find(|&c| !rings[c].is_empty()) else {
                break;
            };
            if best.cost <= next as u32 + 1 {
                break;
            }
            cur = next;
        }
        trace!(origin, ?search, found = ?best.loc, cost = best.cost, "search done");
        best.loc
    }

    /// First leg toward a concrete destination.
    ///
    /// The destination itself is treated as a non-enterable objective, so
    /// the search succeeds as soon as the mover can reach a neighbor of it.
    pub fn find_destination(
        &self,
        field: &mut CostField,
        origin: Location,
        dest: Location,
        mobility: Mobility,
        owner: Owner,
    ) -> Option<Location> {
        let objectives = Objectives::destination(dest, owner);
        self.find(field, origin, Search::for_mobility(mobility), &objectives)
    }

    fn expand(
        &self,
        field: &mut CostField,
        rings: &mut Vec<Vec<Location>>,
        from: Location,
        search: Search,
        objectives: &Objectives,
        best: &mut Best,
    ) {
        let dims = self.view.dims();
        let cur = field.cost(from);
        let from_terrain = field.cell(from).terrain;
        for n in dims.adjacent(from) {
            if field.settled[n] {
                continue;
            }
            let class = self.terrain_type(field, objectives, from, n);
            if let Some(inc) = self.step_cost(search, from_terrain, class) {
                let cost = cur + inc;
                if cost < field.cost(n) {
                    field.set(n, cost, inc, class);
                    let slot = cost as usize;
                    if rings.len() <= slot {
                        rings.resize_with(slot + 1, Vec::new);
                    }
                    rings[slot].push(n);
                }
            }

            let symbol = self.view.contents(n);
            if let Some(cost) = objectives.evaluate(self.world, n, symbol, cur) {
                if cost < best.cost {
                    best.cost = cost;
                    best.loc = Some(n);
                    if !field.is_reached(n) {
                        let entry = self.tuning.objective_entry_cost;
                        field.set(n, cur + entry, entry, PathTerrain::Unknown);
                    }
                }
            }
        }
    }

    /// Classify `to` as reached from `from`.
    fn terrain_type(
        &self,
        field: &CostField,
        objectives: &Objectives,
        from: Location,
        to: Location,
    ) -> PathTerrain {
        if objectives.target_loc() == Some(to) {
            return PathTerrain::Unknown;
        }
        match self.view.contents(to) {
            LAND => PathTerrain::Land,
            WATER => PathTerrain::Water,
            UNEXPLORED => field.cell(from).terrain,
            _ => {
                if let Some(city) = self.world.city_at(to) {
                    if city.is_owned_by(objectives.owner()) {
                        PathTerrain::Water
                    } else {
                        PathTerrain::Unknown
                    }
                } else {
                    match self.world.terrain(to) {
                        Terrain::Land => PathTerrain::Land,
                        Terrain::Water => PathTerrain::Water,
                    }
                }
            }
        }
    }

    fn step_cost(&self, search: Search, from: PathTerrain, to: PathTerrain) -> Option<u32> {
        use PathTerrain::{Land, Water};
        match (search, from, to) {
            (Search::Land, _, Land)
            | (Search::Water, _, Water)
            | (Search::Air, _, Land | Water)
            | (Search::LandThenWater { .. }, Land, Land)
            | (Search::LandThenWater { .. }, Water, Water)
            | (Search::WaterThenLand, Water, Water)
            | (Search::WaterThenLand, Land, Land) => Some(1),
            (Search::LandThenWater { .. }, Land, Water) => Some(self.tuning.lw_water_cost),
            (Search::WaterThenLand, Water, Land) => Some(self.tuning.wl_land_cost),
            _ => None,
        }
    }
}

struct Best {
    loc: Option<Location>,
    cost: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MapDims;
    use crate::pieces::PieceType;

    fn tuning() -> PathTuning {
        PathTuning::default()
    }

    /// Build a fully explored world from rows of terrain symbols; `*` is
    /// an unowned city on land.
    fn world_from(rows: &[&str]) -> World {
        let height = rows.len();
        let width = rows[0].len();
        let dims = MapDims::new(width, height);
        let mut terrain = Vec::with_capacity(dims.size());
        let mut cities = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                terrain.push(if ch == '.' { Terrain::Water } else { Terrain::Land });
                if ch == '*' {
                    cities.push(dims.loc(r, c));
                }
            }
        }
        let mut world = World::new(dims, terrain, &cities, 64).unwrap();
        for owner in Owner::BOTH {
            for loc in 0..dims.size() {
                world.update(owner, loc);
            }
        }
        world
    }

    #[test]
    fn test_open_water_costs_are_step_counts() {
        let world = world_from(&[
            ".......", ".......", ".......", ".......", ".......", ".......",
        ]);
        let dims = world.dims();
        let tuning = tuning();
        let finder = Pathfinder::for_owner(&world, Owner::Computer, &tuning);
        let mut field = CostField::new(dims);
        let origin = dims.loc(2, 2);
        let none = Objectives::resolve(&SHIP_REPAIR, Owner::Computer);
        assert_eq!(finder.find(&mut field, origin, Search::Water, &none), None);
        for loc in 0..dims.size() {
            if dims.on_board(loc) {
                assert_eq!(field.cost(loc), dims.steps(origin, loc));
            }
        }
    }

    #[test]
    fn test_land_search_finds_unowned_city() {
        let world = world_from(&[
            "..........",
            ".++++++*+.",
            ".+.......+",
            "..........",
        ]);
        let dims = world.dims();
        let tuning = tuning();
        let finder = Pathfinder::for_owner(&world, Owner::Computer, &tuning);
        let mut field = CostField::new(dims);
        let fight = Objectives::resolve(&ARMY_FIGHT, Owner::Computer);
        let origin = dims.loc(1, 1);
        let found = finder.find(&mut field, origin, Search::Land, &fight);
        assert_eq!(found, Some(dims.loc(1, 7)));
        // Cities are not enterable; the objective sits one entry cost past
        // the ring it was seen from.
        assert_eq!(field.cost(dims.loc(1, 7)), 5 + 2);
        assert!(!field.is_reached(dims.loc(2, 3)));
    }

    #[test]
    fn test_weights_bias_choice() {
        // An unexplored cell two steps west, a city four steps east.
        let mut world = world_from(&[
            "..........",
            ".++++++*+.",
            "..........",
        ]);
        let dims = world.dims();
        world
            .view_mut(Owner::Computer)
            .set_contents(dims.loc(1, 1), UNEXPLORED);
        let tuning = tuning();
        let finder = Pathfinder::for_owner(&world, Owner::Computer, &tuning);
        let mut field = CostField::new(dims);
        let fight = Objectives::resolve(&ARMY_FIGHT, Owner::Computer);
        let found = finder.find(&mut field, dims.loc(1, 3), Search::Land, &fight);
        // Unexplored weighs 11, the city 1: 1 + 11 > 3 + 1.
        assert_eq!(found, Some(dims.loc(1, 7)));
    }

    #[test]
    fn test_no_objective_terminates() {
        let world = world_from(&["......", ".++++.", ".++++.", "......"]);
        let dims = world.dims();
        let tuning = tuning();
        let finder = Pathfinder::for_owner(&world, Owner::Player, &tuning);
        let mut field = CostField::new(dims);
        let attack = Objectives::resolve(&USER_ARMY_ATTACK, Owner::Player);
        assert_eq!(
            finder.find(&mut field, dims.loc(1, 1), Search::Land, &attack),
            None
        );
        assert_eq!(field.cost(dims.loc(2, 4)), 3);
    }

    #[test]
    fn test_land_then_water_must_beat_cost() {
        let mut world = world_from(&[
            "........",
            ".+++....",
            ".+++....",
            "........",
        ]);
        let dims = world.dims();
        let transport = world
            .create_unit(Owner::Computer, PieceType::Transport, dims.loc(1, 6))
            .unwrap();
        world.unit_mut(transport).unwrap().func = crate::function::Function::Load;
        let mut view = world.view(Owner::Computer).clone();
        view.set_contents(dims.loc(1, 6), '$');
        let tuning = tuning();
        let finder = Pathfinder::new(&world, &view, &tuning);
        let mut field = CostField::new(dims);
        let load = Objectives::resolve(&ARMY_LOAD, Owner::Computer);
        let origin = dims.loc(1, 1);
        // Two land steps, water entry 2, one more water step, weight 1.
        let found = finder.find(
            &mut field,
            origin,
            Search::LandThenWater { beat_cost: INFINITY },
            &load,
        );
        assert_eq!(found, Some(dims.loc(1, 6)));
        let cost = field.cost(dims.loc(1, 6));
        assert_eq!(cost, 6);
        assert_eq!(
            finder.find(&mut field, origin, Search::LandThenWater { beat_cost: 5 }, &load),
            None
        );
    }

    #[test]
    fn test_destination_and_step() {
        let world = world_from(&[
            "........",
            "........",
            "........",
            "........",
            "........",
        ]);
        let dims = world.dims();
        let tuning = tuning();
        let finder = Pathfinder::for_owner(&world, Owner::Player, &tuning);
        let mut field = CostField::new(dims);
        let origin = dims.loc(2, 1);
        let dest = dims.loc(2, 5);
        let found =
            finder.find_destination(&mut field, origin, dest, Mobility::Water, Owner::Player);
        assert_eq!(found, Some(dest));
        field.mark_path(dest);
        // Every cheapest path is marked; diagonals are tried first.
        let step = field.find_dir(world.view(Owner::Player), origin, ".", " ");
        assert_eq!(step, Some(dims.loc(1, 2)));
        assert!(field.is_path(dims.loc(2, 2)));
    }

    #[test]
    fn test_cost_cap_stops_search() {
        let world = world_from(&[".........................."; 3]);
        let dims = world.dims();
        let tuning = PathTuning {
            max_path_cost: Some(5),
            ..PathTuning::default()
        };
        let finder = Pathfinder::for_owner(&world, Owner::Player, &tuning);
        let mut field = CostField::new(dims);
        let dest = dims.loc(1, 24);
        assert_eq!(
            finder.find_destination(&mut field, dims.loc(1, 1), dest, Mobility::Water, Owner::Player),
            None
        );
        assert!(!field.is_reached(dims.loc(1, 10)));
    }
}
