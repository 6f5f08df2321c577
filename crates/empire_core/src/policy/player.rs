//! Function-driven auto-move for the player's units.
//!
//! Each unit follows its standing [`Function`]. A function that can no
//! longer make progress is dropped: the unit goes idle and waits for new
//! orders instead of failing the turn.

use rand::seq::SliceRandom;
use tracing::debug;

use super::maps::army_load_map;
use super::tactics::{
    attack_adjacent, attack_profile, head_for, load_army, move_objective, transport_load_step,
    transport_unload_step, unit,
};
use super::{is_landed, Step, TurnContext, UnitPolicy};
use crate::error::Result;
use crate::function::Function;
use crate::geometry::{Direction, Location, MapDims, INFINITY};
use crate::pathfinding::{
    attack_list, mirror_symbol, predict_unexplored, CostField, Objectives, Pathfinder, Search,
    ARMY_ATTACK, ARMY_LOAD, USER_ARMY, USER_ARMY_ATTACK, USER_FIGHTER, USER_SHIP, USER_SHIP_REPAIR,
};
use crate::pieces::{Mobility, Owner, PieceType};
use crate::world::{UnitId, ViewMap, World, UNEXPLORED};

/// Moves a side's units by their standing functions.
#[derive(Debug, Clone)]
pub struct AutoPilot {
    owner: Owner,
    field: CostField,
    predicted: ViewMap,
}

impl AutoPilot {
    /// Auto-move for `owner` on a board of the given size.
    #[must_use]
    pub fn new(owner: Owner, dims: MapDims) -> Self {
        Self {
            owner,
            field: CostField::new(dims),
            predicted: ViewMap::new(dims),
        }
    }

    /// One action under the unit's function; `None` when the function
    /// cannot make progress.
    fn follow(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (func, kind, full) = (u.func, u.kind, u.is_full());
        match func {
            Function::Idle | Function::Sentry => Ok(Some(Step::Wait)),
            Function::Random => random_step(ctx, id),
            Function::Fill => fill(ctx, id),
            Function::Land => self.land(ctx, id),
            Function::Explore => self.explore(ctx, id),
            Function::Load if kind == PieceType::Army => self.army_load(ctx, id),
            Function::Load if kind == PieceType::Transport => {
                if full {
                    ctx.world.set_function(id, Function::Unload)?;
                    return Ok(Some(Step::Transition));
                }
                transport_load_step(ctx, &mut self.field, &self.predicted, id).map(Some)
            }
            Function::Attack if kind == PieceType::Army => self.army_attack(ctx, id),
            Function::Repair => self.repair(ctx, id),
            Function::BoardTransport if kind == PieceType::Army => {
                if load_army(ctx, id)? {
                    ctx.world.set_function(id, Function::Sentry)?;
                    return Ok(Some(Step::Moved));
                }
                Ok(Some(Step::Wait))
            }
            Function::Unload if kind == PieceType::Transport => self.unload(ctx, id),
            Function::Direction(dir) => step_toward(ctx, id, dir),
            Function::MoveTo(dest) => self.move_to(ctx, id, dest),
            _ => Ok(None),
        }
    }

    fn land(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        if u.kind != PieceType::Fighter || is_landed(ctx.world, u) {
            return Ok(None);
        }
        let Some(base) = nearest_base(ctx.world, id) else {
            return Ok(None);
        };
        head_for(ctx, &mut self.field, id, base, " ")
    }

    fn explore(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (owner, kind, loc) = (u.owner, u.kind, u.loc);
        if kind == PieceType::Fighter && low_on_fuel(ctx, id) {
            debug!(unit = %id, loc, "explorer turning back to refuel");
            ctx.world.set_function(id, Function::Land)?;
            return Ok(Some(Step::Transition));
        }
        let table = match kind.mobility() {
            Mobility::Land => &USER_ARMY,
            Mobility::Air => &USER_FIGHTER,
            Mobility::Water => &USER_SHIP,
        };
        let dest = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::for_mobility(kind.mobility()),
            &Objectives::resolve(table, owner),
        );
        if dest.is_none() {
            return Ok(None);
        }
        move_objective(ctx, &mut self.field, id, dest, &UNEXPLORED.to_string()).map(Some)
    }

    fn army_load(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (owner, loc) = (u.owner, u.loc);
        if u.ship.is_some() {
            ctx.world.set_function(id, Function::Sentry)?;
            return Ok(Some(Step::Transition));
        }
        if load_army(ctx, id)? {
            ctx.world.set_function(id, Function::Sentry)?;
            return Ok(Some(Step::Moved));
        }
        let map = army_load_map(ctx.world, owner, id, &ctx.config.policy);
        let ride = Pathfinder::new(ctx.world, &map, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::LandThenWater {
                beat_cost: INFINITY,
            },
            &Objectives::resolve(&ARMY_LOAD, owner),
        );
        if ride.is_none() {
            return Ok(None);
        }
        let adj = format!("{}.", mirror_symbol('t', Owner::Computer, owner));
        move_objective(ctx, &mut self.field, id, ride, &adj).map(Some)
    }

    fn army_attack(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (owner, loc) = (u.owner, u.loc);
        let (_, terrain) = attack_profile(u);
        let objectives = Objectives::resolve(&USER_ARMY_ATTACK, owner);
        let targets: String = objectives.symbols().chars().filter(|&c| c != UNEXPLORED).collect();
        if let Some(step) = attack_adjacent(ctx, id, &targets, terrain)? {
            return Ok(Some(step));
        }
        let dest = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::Land,
            &objectives,
        );
        if dest.is_none() {
            return Ok(None);
        }
        let adj: String = "X*a"
            .chars()
            .map(|c| mirror_symbol(c, Owner::Player, owner))
            .collect();
        move_objective(ctx, &mut self.field, id, dest, &adj).map(Some)
    }

    fn repair(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (owner, loc) = (u.owner, u.loc);
        if !u.kind.is_ship() || !u.is_damaged() {
            return Ok(None);
        }
        if ctx.world.city_at(loc).is_some_and(|c| c.is_owned_by(owner)) {
            return Ok(Some(Step::Wait));
        }
        let port = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find(
            &mut self.field,
            loc,
            Search::Water,
            &Objectives::resolve(&USER_SHIP_REPAIR, owner),
        );
        if port.is_none() {
            return Ok(None);
        }
        move_objective(ctx, &mut self.field, id, port, ".").map(Some)
    }

    fn unload(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
        if unit(ctx.world, id)?.cargo.is_empty() {
            return Ok(None);
        }
        let step = transport_unload_step(ctx, &mut self.field, &self.predicted, id)?;
        if step == Step::Wait {
            let cargo = unit(ctx.world, id)?.cargo.clone();
            debug!(unit = %id, armies = cargo.len(), "landing reached, waking cargo");
            for army in cargo {
                ctx.world.set_function(army, Function::Attack)?;
            }
        }
        Ok(Some(step))
    }

    fn move_to(
        &mut self,
        ctx: &mut TurnContext<'_>,
        id: UnitId,
        dest: Location,
    ) -> Result<Option<Step>> {
        let u = unit(ctx.world, id)?;
        let (owner, kind, loc) = (u.owner, u.kind, u.loc);
        let dims = ctx.world.dims();
        if loc == dest || !dims.on_board(dest) {
            return Ok(None);
        }
        if kind == PieceType::Army && dims.is_adjacent(loc, dest) {
            let targets = attack_list(ARMY_ATTACK, owner);
            if targets.contains(ctx.world.view(owner).contents(dest)) {
                ctx.attack(id, dest)?;
                if ctx.world.unit(id).is_some() {
                    ctx.world.set_function(id, Function::Idle)?;
                }
                return Ok(Some(Step::Moved));
            }
        }
        let step = head_for(ctx, &mut self.field, id, dest, " .")?;
        if ctx.world.unit(id).is_some_and(|u| u.loc == dest) {
            ctx.world.set_function(id, Function::Idle)?;
        }
        Ok(step)
    }
}

/// Nearest own city or carrier with room that a fighter can still reach.
fn nearest_base(world: &World, id: UnitId) -> Option<Location> {
    let u = world.unit(id)?;
    let dims = world.dims();
    let range = u.range.unwrap_or(INFINITY);
    let cities = world
        .cities()
        .iter()
        .filter(|c| c.is_owned_by(u.owner))
        .map(|c| c.loc);
    let carriers = world
        .units_of(u.owner, PieceType::Carrier)
        .iter()
        .filter_map(|&c| world.unit(c))
        .filter(|c| !c.is_full())
        .map(|c| c.loc);
    cities
        .chain(carriers)
        .map(|loc| (loc, dims.steps(u.loc, loc)))
        .filter(|&(_, steps)| steps <= range)
        .min_by_key(|&(_, steps)| steps)
        .map(|(loc, _)| loc)
}

fn low_on_fuel(ctx: &TurnContext<'_>, id: UnitId) -> bool {
    let Some(u) = ctx.world.unit(id) else {
        return false;
    };
    let Some(range) = u.range else {
        return false;
    };
    ctx.world
        .find_nearest_city(u.owner, u.loc)
        .is_some_and(|(city, _)| {
            range <= ctx.world.dims().steps(u.loc, city) + ctx.config.policy.fighter_fuel_margin
        })
}

fn random_step(ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
    let loc = unit(ctx.world, id)?.loc;
    let open: Vec<Location> = ctx
        .world
        .dims()
        .adjacent(loc)
        .filter(|&n| ctx.world.good_loc(id, n))
        .collect();
    let Some(&next) = open.choose(&mut *ctx.rng) else {
        return Ok(None);
    };
    ctx.world.move_unit(id, next)?;
    Ok(Some(Step::Moved))
}

fn fill(ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Option<Step>> {
    let u = unit(ctx.world, id)?;
    if !u.is_full() {
        return Ok(Some(Step::Wait));
    }
    let next = match u.kind {
        PieceType::Transport => Function::Unload,
        PieceType::Carrier => Function::Sentry,
        _ => return Ok(Some(Step::Wait)),
    };
    ctx.world.set_function(id, next)?;
    Ok(Some(Step::Transition))
}

fn step_toward(ctx: &mut TurnContext<'_>, id: UnitId, dir: Direction) -> Result<Option<Step>> {
    let loc = unit(ctx.world, id)?.loc;
    let next = ctx
        .world
        .dims()
        .neighbor(loc, dir)
        .filter(|&n| ctx.world.good_loc(id, n));
    let Some(next) = next else {
        return Ok(None);
    };
    ctx.world.move_unit(id, next)?;
    Ok(Some(Step::Moved))
}

impl UnitPolicy for AutoPilot {
    fn owner(&self) -> Owner {
        self.owner
    }

    fn begin_turn(&mut self, world: &World) {
        self.predicted = predict_unexplored(world, world.view(self.owner));
    }

    fn prepare_unit(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<()> {
        let u = unit(ctx.world, id)?;
        let ordered = ctx
            .world
            .city_at(u.loc)
            .filter(|c| c.is_owned_by(u.owner))
            .map(|c| c.function_for(u.kind))
            .filter(|&f| f != Function::Idle);
        if let Some(func) = ordered {
            ctx.world.set_function(id, func)?;
        }
        Ok(())
    }

    fn step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step> {
        if let Some(step) = self.follow(ctx, id)? {
            return Ok(step);
        }
        debug!(unit = %id, func = %unit(ctx.world, id)?.func, "function dropped");
        ctx.world.set_function(id, Function::Idle)?;
        Ok(Step::Wait)
    }

    fn idle_after_landing(&self) -> bool {
        true
    }
}
