//! City production and the computer's production planner.

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::{debug, warn};

use crate::config::ProductionTuning;
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::function::Function;
use crate::geometry::{Direction, Location, INFINITY};
use crate::pathfinding::{continent, is_lake, scan_continent};
use crate::pieces::{Owner, PieceType, NUM_PIECES};
use crate::world::{CityId, Terrain, UnitId, World};

/// Advance every city of `owner` by one turn of work.
///
/// A city that has saved up its piece's build time spawns the piece and
/// starts over from zero work. A city that cannot place the piece, because
/// the pool is exhausted or the cell is full, stalls with its work intact
/// and tries again next turn.
///
/// # Errors
///
/// Propagates world errors other than pool exhaustion.
pub fn produce(world: &mut World, owner: Owner, rng: &mut dyn RngCore) -> Result<Vec<UnitId>> {
    let mut built = Vec::new();
    for cid in world.cities_of(owner) {
        let Some(city) = world.city_mut(cid) else {
            continue;
        };
        let Some(kind) = city.prod else {
            continue;
        };
        city.work += 1;
        let build = kind.attr().build_time as i32;
        if city.work < build {
            continue;
        }
        let (loc, func) = (city.loc, city.function_for(kind));

        if world.stack_full(loc) {
            stall(world, owner, loc, kind);
            continue;
        }
        let id = match world.create_unit(owner, kind, loc) {
            Ok(id) => id,
            Err(GameError::PoolExhausted) => {
                stall(world, owner, loc, kind);
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Some(city) = world.city_mut(cid) {
            city.work = 0;
        }

        let func = if kind == PieceType::Satellite {
            let dir = Direction::DIAGONALS
                .choose(rng)
                .copied()
                .unwrap_or(Direction::NorthEast);
            Function::Direction(dir)
        } else {
            func
        };
        world.set_function(id, func)?;
        if kind == PieceType::Satellite {
            world.scan_sat(owner, loc);
        } else {
            world.scan(owner, loc);
        }
        debug!(%owner, ?kind, unit = %id, loc, "unit built");
        world.push_event(GameEvent::UnitBuilt {
            owner,
            kind,
            unit: id,
            loc,
        });
        built.push(id);
    }
    Ok(built)
}

fn stall(world: &mut World, owner: Owner, loc: Location, kind: PieceType) {
    warn!(%owner, ?kind, loc, "production stalled");
    world.push_event(GameEvent::ProductionStalled { owner, loc, kind });
}

/// Desired share of cities per piece type, indexed like [`PieceType::ALL`].
type Ratio = [u64; NUM_PIECES];

const RATIO_SMALL: Ratio = [60, 0, 10, 0, 0, 20, 0, 0, 0];
const RATIO_MEDIUM: Ratio = [90, 10, 10, 10, 10, 40, 0, 0, 0];
const RATIO_LARGE: Ratio = [120, 20, 20, 10, 10, 60, 10, 10, 0];
const RATIO_HUGE: Ratio = [150, 30, 30, 20, 20, 70, 10, 10, 0];

fn ratio_for(city_count: usize) -> &'static Ratio {
    match city_count {
        0..=10 => &RATIO_SMALL,
        11..=20 => &RATIO_MEDIUM,
        21..=30 => &RATIO_LARGE,
        _ => &RATIO_HUGE,
    }
}

/// Chooses what a side's cities build.
///
/// Only cities building nothing or building armies are revisited each
/// turn; everything else keeps its production once chosen.
#[derive(Debug)]
pub struct ProductionPlanner<'a> {
    owner: Owner,
    tuning: &'a ProductionTuning,
    counts: [u64; NUM_PIECES],
    ratio: &'static Ratio,
}

impl<'a> ProductionPlanner<'a> {
    /// A planner for one side, sized to its current city count.
    #[must_use]
    pub fn new(world: &World, owner: Owner, tuning: &'a ProductionTuning) -> Self {
        let mut counts = [0; NUM_PIECES];
        for city in world.cities().iter().filter(|c| c.is_owned_by(owner)) {
            if let Some(kind) = city.prod {
                counts[kind.index()] += 1;
            }
        }
        Self {
            owner,
            tuning,
            counts,
            ratio: ratio_for(world.city_count(owner)),
        }
    }

    /// Cities of this side currently building each piece type.
    #[must_use]
    pub fn counts(&self) -> &[u64; NUM_PIECES] {
        &self.counts
    }

    /// Re-plan every eligible city.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    pub fn plan(&mut self, world: &mut World) -> Result<()> {
        for cid in world.cities_of(self.owner) {
            let prod = world.city(cid).and_then(|c| c.prod);
            if prod.is_none() || prod == Some(PieceType::Army) {
                self.plan_city(world, cid)?;
            }
        }
        Ok(())
    }

    fn plan_city(&mut self, world: &mut World, cid: CityId) -> Result<()> {
        let owner = self.owner;
        let Some(city) = world.city(cid) else {
            return Ok(());
        };
        let (loc, prod) = (city.loc, city.prod);
        let view = world.view(owner);
        let lake = is_lake(world, view, loc, owner);
        let land = continent(world, view, loc, Terrain::Water);
        let scan = scan_continent(view, &land);

        let enemy_cities = scan.cities_of(owner.opponent());
        let interest = scan.unexplored > 0
            || enemy_cities > 0
            || scan.unowned_cities > 0
            || scan.units_of(owner.opponent(), PieceType::Army) > 0;
        let army_producers = world
            .cities()
            .iter()
            .filter(|c| {
                c.is_owned_by(owner) && c.prod == Some(PieceType::Army) && land.contains(c.loc)
            })
            .count();

        let mut need = enemy_cities as i64 - army_producers as i64;
        if enemy_cities > 0 || scan.unowned_cities > 0 {
            need += 1;
        }
        if need > 0 || (enemy_cities > 0 && prod.is_none()) {
            return self.switch(world, loc, prod, PieceType::Army);
        }
        if prod == Some(PieceType::Army) && army_producers <= 1 {
            return Ok(());
        }
        if self.counts[PieceType::Transport.index()] == 0 && !lake {
            return self.switch(world, loc, prod, PieceType::Transport);
        }
        if prod == Some(PieceType::Army) && interest {
            return Ok(());
        }
        if let Some(current) = prod {
            if !self.overproduced(current) {
                return Ok(());
            }
        }
        let choice = self.needed(prod, interest, lake);
        self.switch(world, loc, prod, choice)
    }

    /// True if moving one city off `kind` would improve the balance.
    fn overproduced(&self, kind: PieceType) -> bool {
        let have = self.counts[kind.index()];
        let want = self.ratio[kind.index()];
        PieceType::ALL.iter().any(|&other| {
            other != kind
                && self.ratio[other.index()] > 0
                && have.saturating_sub(1) * self.ratio[other.index()]
                    < (self.counts[other.index()] + 1) * want
        })
    }

    /// The piece type furthest below its share, pretending the city has
    /// already stopped building `current`.
    fn needed(&self, current: Option<PieceType>, army_ok: bool, lake: bool) -> PieceType {
        let mut counts = self.counts;
        if let Some(kind) = current {
            counts[kind.index()] = counts[kind.index()].saturating_sub(1);
        }
        let infinity = u64::from(INFINITY);
        if !army_ok {
            counts[PieceType::Army.index()] = infinity;
        }
        let ratio = self.ratio;
        if lake {
            let (a, f) = (PieceType::Army.index(), PieceType::Fighter.index());
            return if counts[a] * ratio[f] <= counts[f] * ratio[a] {
                PieceType::Army
            } else {
                PieceType::Fighter
            };
        }
        counts[PieceType::Fighter.index()] = infinity;
        let mut best = PieceType::Army;
        for kind in PieceType::ALL {
            let i = kind.index();
            if ratio[i] == 0 {
                continue;
            }
            if counts[i] * ratio[best.index()] < counts[best.index()] * ratio[i] {
                best = kind;
            }
        }
        best
    }

    fn switch(
        &mut self,
        world: &mut World,
        loc: Location,
        from: Option<PieceType>,
        to: PieceType,
    ) -> Result<()> {
        if from == Some(to) {
            return Ok(());
        }
        world.set_production(loc, to, self.tuning.change_penalty_divisor)?;
        if let Some(from) = from {
            self.counts[from.index()] = self.counts[from.index()].saturating_sub(1);
        }
        self.counts[to.index()] += 1;
        debug!(owner = %self.owner, loc, ?from, ?to, "production planned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MapDims;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 12x8 island: land in rows 2..=5, columns 2..=9, water around it.
    fn island(cities: &[(usize, usize)]) -> World {
        let dims = MapDims::new(12, 8);
        let terrain = (0..dims.size())
            .map(|loc| {
                let (r, c) = (dims.row(loc), dims.col(loc));
                if (2..=5).contains(&r) && (2..=9).contains(&c) {
                    Terrain::Land
                } else {
                    Terrain::Water
                }
            })
            .collect();
        let locs: Vec<Location> = cities.iter().map(|&(r, c)| dims.loc(r, c)).collect();
        World::new(dims, terrain, &locs, 32).unwrap()
    }

    #[test]
    fn test_city_builds_after_build_time() {
        let mut world = island(&[(2, 2)]);
        let city = world.dims().loc(2, 2);
        world.assign_city(city, Some(Owner::Player)).unwrap();
        world.set_production(city, PieceType::Army, 5).unwrap();
        world
            .set_city_function(city, PieceType::Army, Function::Sentry)
            .unwrap();
        // Army build time 5 minus a penalty of 1.
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..5 {
            assert!(produce(&mut world, Owner::Player, &mut rng).unwrap().is_empty());
        }
        let built = produce(&mut world, Owner::Player, &mut rng).unwrap();
        assert_eq!(built.len(), 1);
        let unit = world.unit(built[0]).unwrap();
        assert_eq!(unit.func, Function::Sentry);
        assert_eq!(world.city_at(city).unwrap().work, 0);
    }

    #[test]
    fn test_stall_keeps_work() {
        let mut world = island(&[(2, 2)]).with_stack_limit(Some(1));
        let city = world.dims().loc(2, 2);
        world.assign_city(city, Some(Owner::Computer)).unwrap();
        world.set_production(city, PieceType::Army, 5).unwrap();
        world.city_mut(CityId(0)).unwrap().work = 4;
        world.create_unit(Owner::Computer, PieceType::Fighter, city).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(produce(&mut world, Owner::Computer, &mut rng).unwrap().is_empty());
        assert_eq!(world.city_at(city).unwrap().work, 5);
        assert!(world.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::ProductionStalled {
                kind: PieceType::Army,
                ..
            }
        )));
    }

    #[test]
    fn test_build_after_stall_starts_from_zero() {
        let mut world = island(&[(2, 2)]).with_stack_limit(Some(1));
        let city = world.dims().loc(2, 2);
        world.assign_city(city, Some(Owner::Computer)).unwrap();
        world.set_production(city, PieceType::Army, 5).unwrap();
        world.city_mut(CityId(0)).unwrap().work = 4;
        let blocker = world.create_unit(Owner::Computer, PieceType::Fighter, city).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..6 {
            assert!(produce(&mut world, Owner::Computer, &mut rng).unwrap().is_empty());
        }
        assert_eq!(world.city_at(city).unwrap().work, 10);

        world
            .kill_unit(blocker, crate::events::LossCause::Combat)
            .unwrap();
        let built = produce(&mut world, Owner::Computer, &mut rng).unwrap();
        assert_eq!(built.len(), 1);
        assert_eq!(world.city_at(city).unwrap().work, 0);
    }

    #[test]
    fn test_satellite_gets_a_diagonal() {
        let mut world = island(&[(3, 5)]);
        let city = world.dims().loc(3, 5);
        world.assign_city(city, Some(Owner::Player)).unwrap();
        world.set_production(city, PieceType::Satellite, 5).unwrap();
        world.city_mut(CityId(0)).unwrap().work = 49;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let built = produce(&mut world, Owner::Player, &mut rng).unwrap();
        let func = world.unit(built[0]).unwrap().func;
        assert!(matches!(func, Function::Direction(d) if d.is_diagonal()));
    }

    #[test]
    fn test_first_city_builds_armies_with_targets_around() {
        let mut world = island(&[(3, 3), (4, 8)]);
        let dims = world.dims();
        world.assign_city(dims.loc(3, 3), Some(Owner::Computer)).unwrap();
        for loc in 0..dims.size() {
            world.update(Owner::Computer, loc);
        }
        let tuning = ProductionTuning::default();
        let mut planner = ProductionPlanner::new(&world, Owner::Computer, &tuning);
        planner.plan(&mut world).unwrap();
        assert_eq!(world.city_at(dims.loc(3, 3)).unwrap().prod, Some(PieceType::Army));
        assert_eq!(planner.counts()[PieceType::Army.index()], 1);
    }

    #[test]
    fn test_second_city_builds_transports() {
        let mut world = island(&[(2, 2), (2, 9)]);
        let dims = world.dims();
        for loc in [dims.loc(2, 2), dims.loc(2, 9)] {
            world.assign_city(loc, Some(Owner::Computer)).unwrap();
        }
        world.set_production(dims.loc(2, 2), PieceType::Army, 5).unwrap();
        // The sea around the island is unexplored, so it is not a lake.
        for r in 1..=6 {
            for c in 1..=10 {
                let loc = dims.loc(r, c);
                if world.terrain(loc) == Terrain::Land {
                    world.update(Owner::Computer, loc);
                }
            }
        }
        let tuning = ProductionTuning::default();
        let mut planner = ProductionPlanner::new(&world, Owner::Computer, &tuning);
        planner.plan(&mut world).unwrap();
        assert_eq!(world.city_at(dims.loc(2, 2)).unwrap().prod, Some(PieceType::Army));
        assert_eq!(
            world.city_at(dims.loc(2, 9)).unwrap().prod,
            Some(PieceType::Transport)
        );
    }

    #[test]
    fn test_ratio_tables_by_size() {
        assert_eq!(ratio_for(10)[0], 60);
        assert_eq!(ratio_for(11)[0], 90);
        assert_eq!(ratio_for(30)[0], 120);
        assert_eq!(ratio_for(31)[0], 150);
    }
}
