//! The computer's per-piece strategy.

use tracing::debug;

use super::maps::{army_load_map, unload_map};
use super::tactics::{
    at_sea, attack_adjacent, attack_profile, head_for, load_army, move_objective,
    predicted_view, transport_load_step, transport_unload_step, unit,
};
use super::{Step, TurnContext, UnitPolicy};
use crate::config::PolicyTuning;
use crate::error::Result;
use crate::function::Function;
use crate::geometry::{Location, MapDims, INFINITY};
use crate::pathfinding::{
    mirror_symbol, predict_unexplored, CostField, Objectives, Pathfinder, Search, ARMY_FIGHT,
    ARMY_LOAD, FIGHTER_FIGHT, SHIP_FIGHT, SHIP_REPAIR, TT_UNLOAD,
};
use crate::pieces::{Owner, PieceType, UNOWNED_CITY};
use crate::world::{UnitId, ViewMap, World};

/// Objective-driven strategy that moves every unit of one side.
///
/// Holds two scratch cost fields so an army can compare a land objective
/// with a ride without losing either path, and the side's predicted map,
/// refreshed at the start of each turn.
#[derive(Debug, Clone)]
pub struct ComputerStrategy {
    owner: Owner,
    field: CostField,
    alt_field: CostField,
    predicted: ViewMap,
}

impl ComputerStrategy {
    /// Strategy for `owner` on a board of the given size.
    #[must_use]
    pub fn new(owner: Owner, dims: MapDims) -> Self {
        Self {
            owner,
            field: CostField::new(dims),
            alt_field: CostField::new(dims),
            predicted: ViewMap::new(dims),
        }
    }

    fn army_step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        ctx.world.set_function(id, Function::Idle)?;
        let (list, terrain) = attack_profile(unit(ctx.world, id)?);
        if let Some(step) = attack_adjacent(ctx, id, &list, terrain)? {
            return Ok(step);
        }

        let u = unit(ctx.world, id)?;
        let (owner, loc, ship) = (u.owner, u.loc, u.ship);
        if let Some(ship) = ship {
            if at_sea(ctx.world, loc) {
                load_army(ctx, id)?;
                return Ok(Step::Wait);
            }
            let loading = ctx
                .world
                .unit(ship)
                .is_some_and(|s| s.func != Function::Unload);
            if loading {
                load_army(ctx, id)?;
                return Ok(Step::Wait);
            }
            let map = unload_map(ctx.world, owner, &self.predicted);
            let dest = Pathfinder::new(ctx.world, &map, &ctx.config.path).find(
                &mut self.field,
                loc,
                Search::WaterThenLand,
                &Objectives::resolve(&TT_UNLOAD, owner),
            );
            return move_objective(ctx, &mut self.field, id, dest, " ");
        }

        let dest = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::Land,
            &Objectives::resolve(&ARMY_FIGHT, owner),
        );
        let cross_cost = match dest {
            Some(d) => {
                let symbol = ctx.world.view(owner).contents(d);
                let allowance = self.crossing_allowance(&ctx.config.policy, symbol);
                2 * i64::from(self.field.cost(d)) - i64::from(allowance)
            }
            None => i64::from(INFINITY),
        };
        if dest.is_none() || cross_cost > 0 {
            let beat_cost = u32::try_from(cross_cost).map_or(INFINITY, |c| c.min(INFINITY));
            let map = army_load_map(ctx.world, owner, id, &ctx.config.policy);
            let ride = Pathfinder::new(ctx.world, &map, &ctx.config.path).find(
                &mut self.alt_field,
                loc,
                Search::LandThenWater { beat_cost },
                &Objectives::resolve(&ARMY_LOAD, owner),
            );
            if let Some(ride) = ride {
                return self.board_ship(ctx, id, ride);
            }
        }
        move_objective(ctx, &mut self.field, id, dest, " ")
    }

    /// Detour an army may spend on a boat ride instead of walking to a
    /// land objective showing `symbol`.
    fn crossing_allowance(&self, tuning: &PolicyTuning, symbol: char) -> u32 {
        let enemy = self.owner.opponent();
        if symbol == enemy.piece_symbol(PieceType::Army) || symbol == enemy.city_symbol() {
            tuning.cross_cost_enemy
        } else if symbol == UNOWNED_CITY {
            tuning.cross_cost_unowned
        } else {
            tuning.cross_cost_explore
        }
    }

    fn board_ship(&mut self, ctx: &mut TurnContext<'_>, id: UnitId, ride: Location) -> Result<Step> {
        if load_army(ctx, id)? {
            return Ok(Step::Moved);
        }
        ctx.world.set_function(id, Function::Load)?;
        let loc = unit(ctx.world, id)?.loc;
        if ctx.world.dims().is_adjacent(loc, ride) && ctx.world.city_at(ride).is_some() {
            return Ok(Step::Wait);
        }
        let ride_symbol = mirror_symbol('t', Owner::Computer, self.owner);
        move_objective(ctx, &mut self.alt_field, id, Some(ride), &format!("{ride_symbol}."))
    }

    fn transport_step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        let u = unit(ctx.world, id)?;
        if u.cargo.is_empty() {
            let (list, terrain) = attack_profile(u);
            ctx.world.set_function(id, Function::Load)?;
            if let Some(step) = attack_adjacent(ctx, id, &list, terrain)? {
                return Ok(step);
            }
        } else if u.is_full() {
            ctx.world.set_function(id, Function::Unload)?;
        }
        if unit(ctx.world, id)?.func == Function::Unload {
            transport_unload_step(ctx, &mut self.field, &self.predicted, id)
        } else {
            transport_load_step(ctx, &mut self.field, &self.predicted, id)
        }
    }

    fn fighter_step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        let (list, terrain) = attack_profile(unit(ctx.world, id)?);
        if let Some(step) = attack_adjacent(ctx, id, &list, terrain)? {
            return Ok(step);
        }
        let u = unit(ctx.world, id)?;
        let (owner, loc, range) = (u.owner, u.loc, u.range.unwrap_or(INFINITY));
        let home = ctx.world.find_nearest_city(owner, loc).map(|(city, _)| city);
        if let Some(home) = home {
            let steps = ctx.world.dims().steps(loc, home);
            if range <= steps + ctx.config.policy.fighter_fuel_margin {
                debug!(unit = %id, loc, home, range, "fighter returning to refuel");
                return self.fly_home(ctx, id, home);
            }
        }
        let dest = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::Air,
            &Objectives::resolve(&FIGHTER_FIGHT, owner),
        );
        if dest.is_some() {
            return move_objective(ctx, &mut self.field, id, dest, " ");
        }
        match home {
            Some(home) => self.fly_home(ctx, id, home),
            None => Ok(Step::Wait),
        }
    }

    fn fly_home(&mut self, ctx: &mut TurnContext<'_>, id: UnitId, home: Location) -> Result<Step> {
        if unit(ctx.world, id)?.loc == home {
            return Ok(Step::Wait);
        }
        Ok(head_for(ctx, &mut self.field, id, home, " ")?.unwrap_or(Step::Wait))
    }

    fn ship_step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        let u = unit(ctx.world, id)?;
        let (owner, loc) = (u.owner, u.loc);
        if u.is_damaged() && ctx.config.policy.ships_seek_repair {
            if in_port(ctx.world, owner, loc) {
                return Ok(Step::Wait);
            }
            let port = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
                &mut self.field,
                loc,
                Search::Water,
                &Objectives::resolve(&SHIP_REPAIR, owner),
            );
            if port.is_some() {
                return move_objective(ctx, &mut self.field, id, port, ".");
            }
        }

        let (list, terrain) = attack_profile(unit(ctx.world, id)?);
        if let Some(step) = attack_adjacent(ctx, id, &list, terrain)? {
            return Ok(step);
        }
        let map = predicted_view(ctx.world, owner, &self.predicted);
        let objectives = Objectives::resolve(&SHIP_FIGHT, owner);
        let dest = Pathfinder::new(ctx.world, &map, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::Water,
            &objectives,
        );
        move_objective(ctx, &mut self.field, id, dest, &objectives.symbols())
    }
}

fn in_port(world: &World, owner: Owner, loc: Location) -> bool {
    world.city_at(loc).is_some_and(|c| c.is_owned_by(owner))
}

impl UnitPolicy for ComputerStrategy {
    fn owner(&self) -> Owner {
        self.owner
    }

    fn begin_turn(&mut self, world: &World) {
        self.predicted = predict_unexplored(world, world.view(self.owner));
    }

    fn step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        match unit(ctx.world, id)?.kind {
            PieceType::Army => self.army_step(ctx, id),
            PieceType::Transport => self.transport_step(ctx, id),
            PieceType::Fighter => self.fighter_step(ctx, id),
            PieceType::Satellite => Ok(Step::Wait),
            _ => self.ship_step(ctx, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatResolver;
    use crate::config::EngineConfig;
    use crate::policy::move_side;
    use crate::world::Terrain;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    struct AttackerWins;

    impl CombatResolver for AttackerWins {
        fn assault_succeeds(&mut self, _rng: &mut dyn RngCore) -> bool {
            true
        }

        fn defender_strikes(&mut self, _rng: &mut dyn RngCore) -> bool {
            false
        }
    }

    /// 12x8, land in columns 0..=5, water from column 6 on; every cell
    /// already seen by the computer.
    fn coast(cities: &[Location]) -> World {
        let dims = MapDims::new(12, 8);
        let terrain = (0..dims.size())
            .map(|loc| {
                if dims.col(loc) <= 5 {
                    Terrain::Land
                } else {
                    Terrain::Water
                }
            })
            .collect();
        World::new(dims, terrain, cities, 64).unwrap()
    }

    fn reveal(world: &mut World) {
        for loc in 0..world.dims().size() {
            world.update(Owner::Computer, loc);
        }
    }

    fn computer_turn(world: &mut World) {
        let mut strategy = ComputerStrategy::new(Owner::Computer, world.dims());
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut combat = AttackerWins;
        let config = EngineConfig::default();
        let mut ctx = TurnContext {
            world,
            rng: &mut rng,
            combat: &mut combat,
            config: &config,
        };
        move_side(&mut strategy, &mut ctx).unwrap();
    }

    #[test]
    fn test_crossing_allowance_by_objective() {
        let strategy = ComputerStrategy::new(Owner::Computer, MapDims::new(12, 8));
        let tuning = PolicyTuning::default();
        assert_eq!(strategy.crossing_allowance(&tuning, 'O'), 60);
        assert_eq!(strategy.crossing_allowance(&tuning, 'A'), 60);
        assert_eq!(strategy.crossing_allowance(&tuning, '*'), 30);
        assert_eq!(strategy.crossing_allowance(&tuning, ' '), 14);
        // Enemy transport falls through to the explore allowance.
        assert_eq!(strategy.crossing_allowance(&tuning, 'T'), 14);
    }

    #[test]
    fn test_army_assaults_adjacent_enemy_city() {
        let dims = MapDims::new(12, 8);
        let city = dims.loc(3, 3);
        let mut world = coast(&[city]);
        world.assign_city(city, Some(Owner::Player)).unwrap();
        let army = world
            .create_unit(Owner::Computer, PieceType::Army, dims.loc(3, 2))
            .unwrap();
        reveal(&mut world);

        computer_turn(&mut world);

        assert_eq!(world.city_at(city).unwrap().owner, Some(Owner::Computer));
        assert!(world.unit(army).is_none());
    }

    #[test]
    fn test_full_transport_switches_to_unload() {
        let dims = MapDims::new(12, 8);
        let mut world = coast(&[]);
        let sea = dims.loc(4, 9);
        let tt = world
            .create_unit(Owner::Computer, PieceType::Transport, sea)
            .unwrap();
        for _ in 0..6 {
            let army = world.create_unit(Owner::Computer, PieceType::Army, sea).unwrap();
            world.embark(tt, army).unwrap();
        }
        reveal(&mut world);

        computer_turn(&mut world);

        let tt = world.unit(tt).unwrap();
        assert_eq!(tt.func, Function::Unload);
        assert_eq!(tt.cargo.len(), 6);
    }

    #[test]
    fn test_fighter_low_on_fuel_lands_home() {
        let dims = MapDims::new(12, 8);
        let city = dims.loc(3, 3);
        let mut world = coast(&[city]);
        world.assign_city(city, Some(Owner::Computer)).unwrap();
        let fighter = world
            .create_unit(Owner::Computer, PieceType::Fighter, dims.loc(3, 8))
            .unwrap();
        world.unit_mut(fighter).unwrap().range = Some(7);
        reveal(&mut world);

        computer_turn(&mut world);

        let f = world.unit(fighter).unwrap();
        assert_eq!(f.loc, city);
        assert_eq!(f.range, Some(32));
    }

    #[test]
    fn test_damaged_ship_repairs_in_port() {
        let dims = MapDims::new(12, 8);
        let port = dims.loc(3, 5);
        let mut world = coast(&[port]);
        world.assign_city(port, Some(Owner::Computer)).unwrap();
        let destroyer = world
            .create_unit(Owner::Computer, PieceType::Destroyer, port)
            .unwrap();
        world.unit_mut(destroyer).unwrap().hits = 1;
        reveal(&mut world);

        computer_turn(&mut world);

        let d = world.unit(destroyer).unwrap();
        assert_eq!(d.loc, port);
        assert_eq!(d.hits, 2);
    }
}
