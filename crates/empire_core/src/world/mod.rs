//! World state: ground truth, the unit pool, cities and both sides' views.
//!
//! [`World`] is the single owner of every cell, city and unit. Units are
//! addressed by [`UnitId`] handles into a fixed-capacity pool and indexed
//! three ways at once: by owner and type, by cell, and by carrier. Every
//! mutation that touches more than one index goes through a method here so
//! the indexes never disagree between two unit moves.

mod audit;
mod cities;
mod map;
mod units;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use cities::{City, CityId};
pub use map::{RealCell, Terrain, ViewCell, ViewMap, LAND, UNEXPLORED, WATER};
pub use units::{Unit, UnitId, UnitPool};

use crate::error::{GameError, Result};
use crate::events::{GameEvent, LossCause};
use crate::function::Function;
use crate::geometry::{Direction, Location, MapDims};
use crate::pieces::{city_symbol, Owner, PieceType, NUM_PIECES};

/// The complete mutable state of a game board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    dims: MapDims,
    cells: Vec<RealCell>,
    cities: Vec<City>,
    units: UnitPool,
    by_owner: [[Vec<UnitId>; NUM_PIECES]; 2],
    views: [ViewMap; 2],
    date: u32,
    stack_limit: Option<usize>,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl World {
    /// Build a world from a terrain grid and city sites.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the terrain grid does not
    /// match the dimensions, or [`GameError::InvalidLocation`] if a city
    /// site is off-board, on water, or duplicated.
    pub fn new(
        dims: MapDims,
        terrain: Vec<Terrain>,
        city_locs: &[Location],
        unit_capacity: usize,
    ) -> Result<Self> {
        if terrain.len() != dims.size() {
            return Err(GameError::InvalidState(format!(
                "terrain has {} cells, expected {}",
                terrain.len(),
                dims.size()
            )));
        }
        let mut cells: Vec<RealCell> = terrain.into_iter().map(RealCell::new).collect();
        let mut cities = Vec::with_capacity(city_locs.len());
        for &loc in city_locs {
            if !dims.on_board(loc) || cells[loc].terrain != Terrain::Land || cells[loc].city.is_some()
            {
                return Err(GameError::InvalidLocation(loc));
            }
            cells[loc].city = Some(CityId(cities.len() as u32));
            cities.push(City::new(loc));
        }
        Ok(Self {
            dims,
            cells,
            cities,
            units: UnitPool::new(unit_capacity),
            by_owner: Default::default(),
            views: [ViewMap::new(dims), ViewMap::new(dims)],
            date: 0,
            stack_limit: None,
            events: Vec::new(),
        })
    }

    /// Limit how many units may share one cell.
    #[must_use]
    pub fn with_stack_limit(mut self, limit: Option<usize>) -> Self {
        self.stack_limit = limit;
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Grid dimensions.
    #[must_use]
    pub fn dims(&self) -> MapDims {
        self.dims
    }

    /// Current turn number.
    #[must_use]
    pub fn date(&self) -> u32 {
        self.date
    }

    /// Advance the turn counter.
    pub fn advance_date(&mut self) {
        self.date += 1;
    }

    /// Real terrain at a location; water outside the grid.
    #[must_use]
    pub fn terrain(&self, loc: Location) -> Terrain {
        self.cells.get(loc).map_or(Terrain::Water, |c| c.terrain)
    }

    /// Ground-truth cell.
    #[must_use]
    pub fn cell(&self, loc: Location) -> Option<&RealCell> {
        self.cells.get(loc)
    }

    /// Units in a cell, cargo included.
    #[must_use]
    pub fn units_at(&self, loc: Location) -> &[UnitId] {
        self.cells.get(loc).map_or(&[], |c| c.units.as_slice())
    }

    /// City standing at a location.
    #[must_use]
    pub fn city_id_at(&self, loc: Location) -> Option<CityId> {
        self.cells.get(loc)?.city
    }

    /// City standing at a location.
    #[must_use]
    pub fn city_at(&self, loc: Location) -> Option<&City> {
        self.city(self.city_id_at(loc)?)
    }

    /// A city by id.
    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(id.index())
    }

    /// A city by id, mutably.
    pub fn city_mut(&mut self, id: CityId) -> Option<&mut City> {
        self.cities.get_mut(id.index())
    }

    /// All cities in table order.
    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Ids of the cities held by `owner`, in table order.
    #[must_use]
    pub fn cities_of(&self, owner: Owner) -> Vec<CityId> {
        self.cities
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_owned_by(owner))
            .map(|(i, _)| CityId(i as u32))
            .collect()
    }

    /// Number of cities held by `owner`.
    #[must_use]
    pub fn city_count(&self, owner: Owner) -> usize {
        self.cities.iter().filter(|c| c.is_owned_by(owner)).count()
    }

    /// A live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// A live unit, mutably.
    ///
    /// Location, carrier and cargo must only change through
    /// [`World::move_unit`], [`World::embark`] and [`World::disembark`];
    /// [`World::audit`] reports direct edits that break the indexes.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    /// The unit pool.
    #[must_use]
    pub fn units(&self) -> &UnitPool {
        &self.units
    }

    /// Live units of one side and type, in creation order.
    #[must_use]
    pub fn units_of(&self, owner: Owner, kind: PieceType) -> &[UnitId] {
        &self.by_owner[owner.index()][kind.index()]
    }

    /// Number of live units of one side and type.
    #[must_use]
    pub fn unit_count(&self, owner: Owner, kind: PieceType) -> usize {
        self.units_of(owner, kind).len()
    }

    /// A side's view of the board.
    #[must_use]
    pub fn view(&self, owner: Owner) -> &ViewMap {
        &self.views[owner.index()]
    }

    /// A side's view of the board, mutably.
    pub fn view_mut(&mut self, owner: Owner) -> &mut ViewMap {
        &mut self.views[owner.index()]
    }

    /// True if no more units fit in the cell.
    #[must_use]
    pub fn stack_full(&self, loc: Location) -> bool {
        self.stack_limit
            .is_some_and(|limit| self.units_at(loc).len() >= limit)
    }

    /// The unit shown for a cell: the highest piece type present, with
    /// satellites shown only when nothing else is there.
    #[must_use]
    pub fn find_obj_at_loc(&self, loc: Location) -> Option<UnitId> {
        let mut best: Option<&Unit> = None;
        let mut satellite = None;
        for unit in self.units_at(loc).iter().filter_map(|&id| self.unit(id)) {
            if unit.kind == PieceType::Satellite {
                satellite.get_or_insert(unit.id);
            } else if best.map_or(true, |b| unit.kind > b.kind) {
                best = Some(unit);
            }
        }
        best.map(|u| u.id).or(satellite)
    }

    /// Ground-truth symbol for a cell.
    #[must_use]
    pub fn real_symbol(&self, loc: Location) -> char {
        if let Some(city) = self.city_at(loc) {
            return city_symbol(city.owner);
        }
        self.find_obj_at_loc(loc)
            .and_then(|id| self.unit(id))
            .map_or_else(|| self.terrain(loc).symbol(), Unit::symbol)
    }

    /// A unit of `kind` owned by `owner` at `loc` with room for cargo.
    #[must_use]
    pub fn find_nfull(&self, owner: Owner, kind: PieceType, loc: Location) -> Option<UnitId> {
        self.units_at(loc)
            .iter()
            .filter_map(|&id| self.unit(id))
            .find(|u| u.owner == owner && u.kind == kind && !u.is_full())
            .map(|u| u.id)
    }

    /// True if the unit may step onto `loc` as its owner sees the board.
    ///
    /// The view symbol must be in the piece's terrain; beyond that armies
    /// may board own transports with room, ships and fighters may enter
    /// own cities, and fighters may land on own carriers with room.
    #[must_use]
    pub fn good_loc(&self, id: UnitId, loc: Location) -> bool {
        let Some(unit) = self.unit(id) else {
            return false;
        };
        if !self.dims.on_board(loc) {
            return false;
        }
        let symbol = self.view(unit.owner).contents(loc);
        if unit.kind.attr().terrain.contains(symbol) {
            return true;
        }
        if unit.kind == PieceType::Army {
            return self
                .find_nfull(unit.owner, PieceType::Transport, loc)
                .is_some();
        }
        if self.city_at(loc).is_some_and(|c| c.is_owned_by(unit.owner)) {
            return true;
        }
        unit.kind == PieceType::Fighter
            && self
                .find_nfull(unit.owner, PieceType::Carrier, loc)
                .is_some()
    }

    /// Nearest city of `owner` by straight-line distance, with the
    /// distance. Ties go to the earlier city in the table.
    #[must_use]
    pub fn find_nearest_city(&self, owner: Owner, loc: Location) -> Option<(Location, u32)> {
        self.cities
            .iter()
            .filter(|c| c.is_owned_by(owner))
            .map(|c| (c.loc, self.dims.dist(loc, c.loc)))
            .min_by_key(|&(_, d)| d)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Refresh one cell of a side's view from ground truth.
    pub fn update(&mut self, owner: Owner, loc: Location) {
        if !self.dims.contains(loc) {
            return;
        }
        let symbol = self.real_symbol(loc);
        let date = self.date;
        self.views[owner.index()].observe(loc, symbol, date);
    }

    /// Refresh a cell and its on-board neighbors.
    pub fn scan(&mut self, owner: Owner, loc: Location) {
        let dims = self.dims;
        for n in dims.adjacent(loc) {
            self.update(owner, n);
        }
        self.update(owner, loc);
    }

    /// Satellite scan: a normal scan plus scans centered two steps out in
    /// every direction.
    pub fn scan_sat(&mut self, owner: Owner, loc: Location) {
        let dims = self.dims;
        for dir in Direction::ALL {
            let far = dims
                .neighbor(loc, dir)
                .and_then(|n| dims.neighbor(n, dir))
                .filter(|&n| dims.on_board(n));
            if let Some(far) = far {
                self.scan(owner, far);
            }
        }
        self.scan(owner, loc);
    }

    /// Scan around every unit and city of a side.
    pub fn scan_all(&mut self, owner: Owner) {
        let mut spots: Vec<(Location, bool)> = self
            .units
            .iter()
            .filter(|u| u.owner == owner)
            .map(|u| (u.loc, u.kind == PieceType::Satellite))
            .collect();
        spots.extend(
            self.cities
                .iter()
                .filter(|c| c.is_owned_by(owner))
                .map(|c| (c.loc, false)),
        );
        for (loc, wide) in spots {
            if wide {
                self.scan_sat(owner, loc);
            } else {
                self.scan(owner, loc);
            }
        }
    }

    // ------------------------------------------------------------------
    // Unit mutation
    // ------------------------------------------------------------------

    /// Create a unit at an on-board location.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidLocation`] for an off-board location and
    /// [`GameError::PoolExhausted`] when no slot is free.
    pub fn create_unit(&mut self, owner: Owner, kind: PieceType, loc: Location) -> Result<UnitId> {
        if !self.dims.on_board(loc) {
            return Err(GameError::InvalidLocation(loc));
        }
        let id = self.units.allocate(owner, kind, loc)?;
        self.cells[loc].units.push(id);
        self.by_owner[owner.index()][kind.index()].push(id);
        trace!(unit = %id, %owner, ?kind, loc, "unit created");
        Ok(id)
    }

    /// Remove a unit and everything it carries.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the handle is not live.
    pub fn kill_unit(&mut self, id: UnitId, cause: LossCause) -> Result<()> {
        let unit = self.units.get(id).ok_or(GameError::UnitNotFound(id))?;
        let cargo = unit.cargo.clone();
        for passenger in cargo {
            self.kill_unit(passenger, LossCause::ShipSunk)?;
        }
        self.disembark(id)?;
        let Some(unit) = self.units.release(id) else {
            return Err(GameError::UnitNotFound(id));
        };
        self.cells[unit.loc].units.retain(|&u| u != id);
        self.by_owner[unit.owner.index()][unit.kind.index()].retain(|&u| u != id);
        debug!(unit = %id, owner = %unit.owner, kind = ?unit.kind, loc = unit.loc, ?cause, "unit lost");
        self.events.push(GameEvent::UnitLost {
            owner: unit.owner,
            kind: unit.kind,
            unit: id,
            loc: unit.loc,
            cause,
        });
        self.update(unit.owner, unit.loc);
        Ok(())
    }

    /// Move a unit one step, carrying its cargo.
    ///
    /// Costs one move and, for limited-range pieces, one unit of range.
    /// Leaving the carrying ship disembarks; an army arriving on an own
    /// transport with room boards it, and a fighter arriving on an own
    /// carrier with room lands on it unless a city is there. The owner's
    /// view is rescanned around the new location.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for a dead handle and
    /// [`GameError::InvalidLocation`] for an off-board target.
    pub fn move_unit(&mut self, id: UnitId, new_loc: Location) -> Result<()> {
        if !self.dims.on_board(new_loc) {
            return Err(GameError::InvalidLocation(new_loc));
        }
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        unit.moved += 1;
        if let Some(range) = unit.range.as_mut() {
            *range = range.saturating_sub(1);
        }
        let (owner, kind, ship) = (unit.owner, unit.kind, unit.ship);

        if let Some(ship) = ship {
            let ship_loc = self.units.get(ship).map(|s| s.loc);
            if ship_loc != Some(new_loc) {
                self.disembark(id)?;
            }
        }
        self.relocate(id, new_loc);

        let carrier_kind = match kind {
            PieceType::Army => Some(PieceType::Transport),
            PieceType::Fighter if self.city_id_at(new_loc).is_none() => Some(PieceType::Carrier),
            _ => None,
        };
        let aboard = self.units.get(id).and_then(|u| u.ship).is_some();
        if let (Some(carrier_kind), false) = (carrier_kind, aboard) {
            if let Some(carrier) = self.find_nfull(owner, carrier_kind, new_loc) {
                self.embark(carrier, id)?;
            }
        }

        if kind == PieceType::Satellite {
            self.scan_sat(owner, new_loc);
        } else {
            self.scan(owner, new_loc);
        }
        Ok(())
    }

    /// Move a unit and its cargo between cell lists without any rules.
    fn relocate(&mut self, id: UnitId, new_loc: Location) {
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        let old_loc = unit.loc;
        unit.loc = new_loc;
        let cargo = unit.cargo.clone();
        self.cells[old_loc].units.retain(|&u| u != id);
        self.cells[new_loc].units.push(id);
        for passenger in cargo {
            self.relocate(passenger, new_loc);
        }
    }

    /// Put a unit aboard a ship in the same cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for dead handles,
    /// [`GameError::InvalidState`] if the two are not together or the
    /// ship cannot carry that piece, and [`GameError::CargoFull`] if the
    /// ship has no room.
    pub fn embark(&mut self, ship: UnitId, id: UnitId) -> Result<()> {
        let carrier = self.units.get(ship).ok_or(GameError::UnitNotFound(ship))?;
        let passenger = self.units.get(id).ok_or(GameError::UnitNotFound(id))?;
        if passenger.ship == Some(ship) {
            return Ok(());
        }
        let fits = matches!(
            (carrier.kind, passenger.kind),
            (PieceType::Transport, PieceType::Army) | (PieceType::Carrier, PieceType::Fighter)
        );
        if !fits || carrier.loc != passenger.loc || carrier.owner != passenger.owner {
            return Err(GameError::InvalidState(format!(
                "unit {id} cannot board {ship}"
            )));
        }
        if carrier.is_full() {
            return Err(GameError::CargoFull(ship));
        }
        self.disembark(id)?;
        if let Some(carrier) = self.units.get_mut(ship) {
            carrier.cargo.push(id);
        }
        if let Some(passenger) = self.units.get_mut(id) {
            passenger.ship = Some(ship);
        }
        Ok(())
    }

    /// Take a unit off the ship carrying it, if any. It stays in the cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for a dead handle.
    pub fn disembark(&mut self, id: UnitId) -> Result<()> {
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        if let Some(ship) = unit.ship.take() {
            if let Some(carrier) = self.units.get_mut(ship) {
                carrier.cargo.retain(|&c| c != id);
            }
        }
        Ok(())
    }

    /// Give a unit a new standing order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for a dead handle.
    pub fn set_function(&mut self, id: UnitId, func: Function) -> Result<()> {
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        unit.func = func;
        Ok(())
    }

    /// Drop cargo that no longer fits after damage, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] for a dead handle.
    pub fn survive(&mut self, id: UnitId) -> Result<()> {
        loop {
            let unit = self.units.get(id).ok_or(GameError::UnitNotFound(id))?;
            if unit.cargo.len() as u32 <= unit.capacity() {
                return Ok(());
            }
            let Some(&victim) = unit.cargo.last() else {
                return Ok(());
            };
            self.kill_unit(victim, LossCause::Overloaded)?;
        }
    }

    /// Hand a unit and its cargo to the other side.
    fn transfer_unit(&mut self, id: UnitId, new_owner: Owner) {
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        let (old_owner, kind) = (unit.owner, unit.kind);
        unit.owner = new_owner;
        unit.func = Function::Idle;
        let cargo = unit.cargo.clone();
        self.by_owner[old_owner.index()][kind.index()].retain(|&u| u != id);
        self.by_owner[new_owner.index()][kind.index()].push(id);
        for passenger in cargo {
            self.transfer_unit(passenger, new_owner);
        }
    }

    // ------------------------------------------------------------------
    // City mutation
    // ------------------------------------------------------------------

    /// Give a city to a side without combat, as at game start.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CityNotFound`] if no city stands at `loc`.
    pub fn assign_city(&mut self, loc: Location, owner: Option<Owner>) -> Result<()> {
        let id = self.city_id_at(loc).ok_or(GameError::CityNotFound(loc))?;
        let city = &mut self.cities[id.index()];
        city.owner = owner;
        city.reset();
        if let Some(owner) = owner {
            self.scan(owner, loc);
        }
        Ok(())
    }

    /// A side takes a city by force.
    ///
    /// Armies in the city die, the remaining non-satellite units change
    /// sides and go idle, and the city starts over with the given
    /// production and functions.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CityNotFound`] if no city stands at `loc`.
    pub fn capture_city(
        &mut self,
        loc: Location,
        new_owner: Owner,
        production: Option<PieceType>,
        functions: [Function; NUM_PIECES],
    ) -> Result<()> {
        let id = self.city_id_at(loc).ok_or(GameError::CityNotFound(loc))?;
        let from = self.cities[id.index()].owner;

        let present: Vec<UnitId> = self.units_at(loc).to_vec();
        for uid in &present {
            let Some(unit) = self.units.get(*uid) else {
                continue;
            };
            if unit.owner != new_owner && unit.kind == PieceType::Army {
                self.kill_unit(*uid, LossCause::CityCaptured)?;
            }
        }
        for uid in present {
            let Some(unit) = self.units.get(uid) else {
                continue;
            };
            if unit.owner != new_owner && unit.kind != PieceType::Satellite && unit.ship.is_none() {
                self.transfer_unit(uid, new_owner);
            }
        }

        let city = &mut self.cities[id.index()];
        city.owner = Some(new_owner);
        city.reset();
        city.prod = production;
        city.func = functions;
        self.events.push(GameEvent::CityCaptured {
            loc,
            from,
            to: new_owner,
        });
        debug!(loc, ?from, to = %new_owner, "city captured");
        self.scan(new_owner, loc);
        if let Some(from) = from {
            self.update(from, loc);
        }
        Ok(())
    }

    /// Set a city's production, applying the change penalty.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CityNotFound`] if no city stands at `loc`.
    pub fn set_production(
        &mut self,
        loc: Location,
        kind: PieceType,
        penalty_divisor: u32,
    ) -> Result<()> {
        let id = self.city_id_at(loc).ok_or(GameError::CityNotFound(loc))?;
        let city = &mut self.cities[id.index()];
        if city.prod == Some(kind) {
            return Ok(());
        }
        city.set_production(kind, penalty_divisor);
        if let Some(owner) = city.owner {
            self.events
                .push(GameEvent::ProductionChanged { owner, loc, kind });
        }
        Ok(())
    }

    /// Set the function a city hands to one piece type.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CityNotFound`] if no city stands at `loc`.
    pub fn set_city_function(
        &mut self,
        loc: Location,
        kind: PieceType,
        func: Function,
    ) -> Result<()> {
        let id = self.city_id_at(loc).ok_or(GameError::CityNotFound(loc))?;
        self.cities[id.index()].func[kind.index()] = func;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Record an event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x6 grid: water everywhere except a land strip on row 2.
    fn strip_world() -> World {
        let dims = MapDims::new(8, 6);
        let mut terrain = vec![Terrain::Water; dims.size()];
        for col in 1..7 {
            terrain[dims.loc(2, col)] = Terrain::Land;
        }
        World::new(dims, terrain, &[dims.loc(2, 3)], 32).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_city() {
        let dims = MapDims::new(8, 6);
        let terrain = vec![Terrain::Water; dims.size()];
        let err = World::new(dims, terrain, &[dims.loc(2, 2)], 8).unwrap_err();
        assert!(matches!(err, GameError::InvalidLocation(_)));
    }

    #[test]
    fn test_create_and_kill_keeps_indexes() {
        let mut world = strip_world();
        let loc = world.dims().loc(2, 1);
        let id = world.create_unit(Owner::Player, PieceType::Army, loc).unwrap();
        assert_eq!(world.units_at(loc), &[id]);
        assert_eq!(world.units_of(Owner::Player, PieceType::Army), &[id]);
        world.kill_unit(id, LossCause::Combat).unwrap();
        assert!(world.units_at(loc).is_empty());
        assert_eq!(world.unit_count(Owner::Player, PieceType::Army), 0);
        assert!(world.unit(id).is_none());
        world.audit().unwrap();
    }

    #[test]
    fn test_move_onto_transport_embarks() {
        let mut world = strip_world();
        let dims = world.dims();
        let shore = dims.loc(2, 1);
        let sea = dims.loc(1, 1);
        let army = world.create_unit(Owner::Player, PieceType::Army, shore).unwrap();
        let transport = world
            .create_unit(Owner::Player, PieceType::Transport, sea)
            .unwrap();
        world.move_unit(army, sea).unwrap();
        assert_eq!(world.unit(army).unwrap().ship, Some(transport));
        assert_eq!(world.unit(transport).unwrap().cargo, vec![army]);

        let next = dims.loc(1, 2);
        world.move_unit(transport, next).unwrap();
        assert_eq!(world.unit(army).unwrap().loc, next);
        assert_eq!(world.units_at(next).len(), 2);
        world.audit().unwrap();
    }

    #[test]
    fn test_move_burns_range() {
        let mut world = strip_world();
        let dims = world.dims();
        let fighter = world
            .create_unit(Owner::Computer, PieceType::Fighter, dims.loc(2, 2))
            .unwrap();
        world.move_unit(fighter, dims.loc(1, 2)).unwrap();
        let unit = world.unit(fighter).unwrap();
        assert_eq!(unit.range, Some(31));
        assert_eq!(unit.moved, 1);
    }

    #[test]
    fn test_kill_ship_kills_cargo() {
        let mut world = strip_world();
        let sea = world.dims().loc(1, 4);
        let transport = world
            .create_unit(Owner::Computer, PieceType::Transport, sea)
            .unwrap();
        let army = world.create_unit(Owner::Computer, PieceType::Army, sea).unwrap();
        world.embark(transport, army).unwrap();
        world.kill_unit(transport, LossCause::Combat).unwrap();
        assert!(world.unit(army).is_none());
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        world.audit().unwrap();
    }

    #[test]
    fn test_embark_full_is_error() {
        let mut world = strip_world();
        let sea = world.dims().loc(1, 4);
        let carrier = world
            .create_unit(Owner::Player, PieceType::Carrier, sea)
            .unwrap();
        world.unit_mut(carrier).unwrap().hits = 1;
        let first = world.create_unit(Owner::Player, PieceType::Fighter, sea).unwrap();
        let second = world.create_unit(Owner::Player, PieceType::Fighter, sea).unwrap();
        world.embark(carrier, first).unwrap();
        let err = world.embark(carrier, second).unwrap_err();
        assert!(matches!(err, GameError::CargoFull(_)));
    }

    #[test]
    fn test_scan_updates_view() {
        let mut world = strip_world();
        let dims = world.dims();
        let city = dims.loc(2, 3);
        world.assign_city(city, Some(Owner::Player)).unwrap();
        let view = world.view(Owner::Player);
        assert_eq!(view.contents(city), 'O');
        assert_eq!(view.contents(dims.loc(2, 2)), LAND);
        assert_eq!(view.contents(dims.loc(1, 3)), WATER);
        assert_eq!(view.contents(dims.loc(4, 3)), UNEXPLORED);
        assert_eq!(world.view(Owner::Computer).contents(city), UNEXPLORED);
    }

    #[test]
    fn test_find_obj_prefers_highest_type() {
        let mut world = strip_world();
        let sea = world.dims().loc(1, 5);
        let sat = world
            .create_unit(Owner::Player, PieceType::Satellite, sea)
            .unwrap();
        assert_eq!(world.find_obj_at_loc(sea), Some(sat));
        world.create_unit(Owner::Player, PieceType::Patrol, sea).unwrap();
        let battleship = world
            .create_unit(Owner::Player, PieceType::Battleship, sea)
            .unwrap();
        assert_eq!(world.find_obj_at_loc(sea), Some(battleship));
        assert_eq!(world.real_symbol(sea), 'B');
    }

    #[test]
    fn test_good_loc_rules() {
        let mut world = strip_world();
        let dims = world.dims();
        let city = dims.loc(2, 3);
        world.assign_city(city, Some(Owner::Player)).unwrap();
        let army = world
            .create_unit(Owner::Player, PieceType::Army, dims.loc(2, 2))
            .unwrap();
        world.scan(Owner::Player, dims.loc(2, 2));
        let patrol = world
            .create_unit(Owner::Player, PieceType::Patrol, dims.loc(1, 3))
            .unwrap();
        world.scan(Owner::Player, dims.loc(1, 3));
        assert!(world.good_loc(army, dims.loc(2, 1)));
        assert!(!world.good_loc(army, dims.loc(1, 2)));
        assert!(!world.good_loc(army, city));
        assert!(world.good_loc(patrol, city));
        assert!(world.good_loc(patrol, dims.loc(1, 4)));
        assert!(!world.good_loc(patrol, dims.loc(0, 3)));
    }

    #[test]
    fn test_capture_city_kills_armies_and_transfers_ships() {
        let mut world = strip_world();
        let city = world.dims().loc(2, 3);
        world.assign_city(city, Some(Owner::Computer)).unwrap();
        let army = world.create_unit(Owner::Computer, PieceType::Army, city).unwrap();
        let ship = world
            .create_unit(Owner::Computer, PieceType::Destroyer, city)
            .unwrap();
        world.unit_mut(ship).unwrap().func = Function::Explore;
        world
            .capture_city(city, Owner::Player, Some(PieceType::Army), [Function::Idle; NUM_PIECES])
            .unwrap();
        assert!(world.unit(army).is_none());
        let ship = world.unit(ship).unwrap();
        assert_eq!(ship.owner, Owner::Player);
        assert_eq!(ship.func, Function::Idle);
        assert_eq!(world.city_at(city).unwrap().owner, Some(Owner::Player));
        assert_eq!(world.city_at(city).unwrap().prod, Some(PieceType::Army));
        world.audit().unwrap();
    }

    #[test]
    fn test_nearest_city() {
        let dims = MapDims::new(12, 6);
        let mut terrain = vec![Terrain::Water; dims.size()];
        for col in 1..11 {
            terrain[dims.loc(2, col)] = Terrain::Land;
        }
        let mut world =
            World::new(dims, terrain, &[dims.loc(2, 2), dims.loc(2, 9)], 8).unwrap();
        world.assign_city(dims.loc(2, 2), Some(Owner::Player)).unwrap();
        world.assign_city(dims.loc(2, 9), Some(Owner::Player)).unwrap();
        assert_eq!(
            world.find_nearest_city(Owner::Player, dims.loc(3, 8)),
            Some((dims.loc(2, 9), 1))
        );
        assert_eq!(world.find_nearest_city(Owner::Computer, 0), None);
    }
}
