//! Unit movement policies and the per-unit move loop they share.
//!
//! A policy decides one action at a time for a unit; [`move_side`] owns the
//! loop around it: resetting the move counter, refueling landed fighters,
//! burning fuel for airborne ones that wait, crashing empty fighters,
//! flying satellites, capping how often a unit may switch functions in one
//! turn, and repairing ships that sat in port all turn.

mod computer;
mod maps;
mod player;
mod tactics;

pub use computer::ComputerStrategy;
pub use maps::{army_load_map, transport_load_map, unload_map, READY, TRANSPORT_CITY};
pub use player::AutoPilot;

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::combat::{self, AttackOutcome, CombatResolver};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::LossCause;
use crate::function::Function;
use crate::geometry::{Direction, Location};
use crate::pieces::{Owner, PieceType, MOVE_ORDER};
use crate::world::{Unit, UnitId, World};

/// Everything a policy may touch while a side moves.
pub struct TurnContext<'a> {
    /// The board.
    pub world: &'a mut World,
    /// The game's random stream.
    pub rng: &'a mut ChaCha8Rng,
    /// Decides fights.
    pub combat: &'a mut dyn CombatResolver,
    /// Engine tuning.
    pub config: &'a EngineConfig,
}

impl TurnContext<'_> {
    /// Attack `target` with a unit.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    pub fn attack(&mut self, id: UnitId, target: Location) -> Result<AttackOutcome> {
        combat::attack(self.world, self.combat, self.rng, self.config, id, target)
    }
}

/// What a policy did with one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Spent moves, or fought; decide again while moves remain.
    Moved,
    /// Switched function without moving; decide again.
    Transition,
    /// Nothing more to do this turn.
    Wait,
}

/// Decides the actions of one side's units.
pub trait UnitPolicy {
    /// Side this policy moves.
    fn owner(&self) -> Owner;

    /// Called once before the side's units move.
    fn begin_turn(&mut self, _world: &World) {}

    /// Called once per unit before its first decision of the turn.
    ///
    /// # Errors
    ///
    /// Propagates world errors.
    fn prepare_unit(&mut self, _ctx: &mut TurnContext<'_>, _id: UnitId) -> Result<()> {
        Ok(())
    }

    /// Decide and carry out the unit's next action.
    ///
    /// # Errors
    ///
    /// Propagates world errors; a unit that simply cannot progress returns
    /// [`Step::Wait`].
    fn step(&mut self, ctx: &mut TurnContext<'_>, id: UnitId) -> Result<Step>;

    /// Whether a fighter that lands also drops its function.
    fn idle_after_landing(&self) -> bool {
        false
    }
}

/// True if a fighter is on the ground: in an own city or aboard a carrier.
pub(crate) fn is_landed(world: &World, unit: &Unit) -> bool {
    unit.ship.is_some()
        || world
            .city_at(unit.loc)
            .is_some_and(|c| c.is_owned_by(unit.owner))
}

/// Move every unit of the policy's side once, in move order.
///
/// # Errors
///
/// Propagates world errors.
pub fn move_side<P: UnitPolicy + ?Sized>(policy: &mut P, ctx: &mut TurnContext<'_>) -> Result<()> {
    let owner = policy.owner();
    policy.begin_turn(ctx.world);
    for kind in MOVE_ORDER {
        let ids = ctx.world.units_of(owner, kind).to_vec();
        for id in ids {
            let still_ours = ctx
                .world
                .unit(id)
                .is_some_and(|u| u.owner == owner && u.kind == kind);
            if !still_ours {
                continue;
            }
            move_unit(policy, ctx, id)?;
            #[cfg(feature = "debug-validation")]
            if let Err(e) = ctx.world.audit() {
                tracing::error!(unit = %id, error = %e, "audit failed");
                panic!("world audit failed after moving {id}: {e}");
            }
        }
    }
    Ok(())
}

/// Run one unit's whole turn.
fn move_unit<P: UnitPolicy + ?Sized>(
    policy: &mut P,
    ctx: &mut TurnContext<'_>,
    id: UnitId,
) -> Result<()> {
    let Some(u) = ctx.world.unit_mut(id) else {
        return Ok(());
    };
    u.moved = 0;
    let (kind, start) = (u.kind, u.loc);
    if kind == PieceType::Satellite {
        return fly_satellite(ctx.world, id);
    }
    if kind == PieceType::Fighter {
        refuel_if_landed(ctx.world, id);
    }
    policy.prepare_unit(ctx, id)?;

    let max_transitions = ctx.config.policy.max_transitions;
    let mut transitions = 0;
    let mut relocated = false;
    loop {
        let Some(u) = ctx.world.unit(id) else {
            return Ok(());
        };
        if u.moved >= u.moves() {
            break;
        }
        let before = u.moved;
        let step = policy.step(ctx, id)?;
        let Some(u) = ctx.world.unit(id) else {
            return Ok(());
        };
        relocated |= u.loc != start;
        match step {
            Step::Wait => {
                idle_out(ctx.world, id)?;
                break;
            }
            Step::Transition => {
                transitions += 1;
                if transitions > max_transitions {
                    debug!(unit = %id, "too many function changes");
                    idle_out(ctx.world, id)?;
                    break;
                }
            }
            Step::Moved if u.moved == before => {
                idle_out(ctx.world, id)?;
                break;
            }
            Step::Moved => {}
        }
        if kind == PieceType::Fighter && !fighter_after_move(ctx.world, id, policy.idle_after_landing())? {
            return Ok(());
        }
    }

    repair_in_port(ctx.world, id, relocated);
    Ok(())
}

fn refuel_if_landed(world: &mut World, id: UnitId) {
    let landed = world.unit(id).is_some_and(|u| is_landed(world, u));
    if let Some(u) = world.unit_mut(id).filter(|_| landed) {
        u.range = u.kind.attr().range;
    }
}

/// Land or crash a fighter after a move. Returns `false` if it crashed.
fn fighter_after_move(world: &mut World, id: UnitId, idle_on_landing: bool) -> Result<bool> {
    let Some(u) = world.unit(id) else {
        return Ok(false);
    };
    if u.moved > 0 && is_landed(world, u) {
        if let Some(u) = world.unit_mut(id) {
            u.range = u.kind.attr().range;
            u.moved = u.moves();
            if idle_on_landing {
                u.func = Function::Idle;
            }
        }
        return Ok(true);
    }
    if u.range == Some(0) {
        debug!(unit = %id, loc = u.loc, "fighter out of fuel");
        world.kill_unit(id, LossCause::FuelExhausted)?;
        return Ok(false);
    }
    Ok(true)
}

/// Spend a unit's remaining moves standing still. An airborne fighter
/// still burns fuel while it circles.
fn idle_out(world: &mut World, id: UnitId) -> Result<()> {
    let Some(u) = world.unit(id) else {
        return Ok(());
    };
    let airborne = u.kind == PieceType::Fighter && !is_landed(world, u);
    let Some(u) = world.unit_mut(id) else {
        return Ok(());
    };
    let left = u.moves_left();
    u.moved = u.moves();
    if airborne {
        if let Some(range) = u.range.as_mut() {
            *range = range.saturating_sub(left);
        }
        if u.range == Some(0) {
            let loc = u.loc;
            debug!(unit = %id, loc, "fighter out of fuel");
            world.kill_unit(id, LossCause::FuelExhausted)?;
        }
    }
    Ok(())
}

/// A damaged ship that spent the turn in an own port regains one hit.
fn repair_in_port(world: &mut World, id: UnitId, relocated: bool) {
    let Some(u) = world.unit(id) else {
        return;
    };
    let in_port = world.city_at(u.loc).is_some_and(|c| c.is_owned_by(u.owner));
    if relocated || !u.kind.is_ship() || !u.is_damaged() || !in_port {
        return;
    }
    if let Some(u) = world.unit_mut(id) {
        u.hits += 1;
    }
}

/// Where a satellite heading `dir` turns when it meets the edge: the
/// first of three candidate diagonals that stays on board, else the last.
fn bounce(world: &World, loc: Location, dir: Direction) -> Direction {
    use Direction::{NorthEast, NorthWest, SouthEast, SouthWest};
    let options = match dir {
        NorthEast => [NorthWest, SouthEast, SouthWest],
        NorthWest => [NorthEast, SouthWest, SouthEast],
        SouthEast => [NorthEast, SouthWest, NorthWest],
        _ => [NorthWest, SouthEast, NorthEast],
    };
    let dims = world.dims();
    options[..2]
        .iter()
        .copied()
        .find(|&d| dims.neighbor(loc, d).is_some_and(|n| dims.on_board(n)))
        .unwrap_or(options[2])
}

/// Fly a satellite its full speed, bouncing off the edges, and burn it out
/// when its range is spent.
fn fly_satellite(world: &mut World, id: UnitId) -> Result<()> {
    let dims = world.dims();
    loop {
        let Some(u) = world.unit(id) else {
            return Ok(());
        };
        if u.moved >= u.moves() {
            return Ok(());
        }
        let loc = u.loc;
        let mut dir = match u.func {
            Function::Direction(d) if d.is_diagonal() => d,
            _ => Direction::NorthEast,
        };
        let ahead = dims.neighbor(loc, dir).filter(|&n| dims.on_board(n));
        let next = match ahead {
            Some(n) => Some(n),
            None => {
                dir = bounce(world, loc, dir);
                dims.neighbor(loc, dir).filter(|&n| dims.on_board(n))
            }
        };
        world.set_function(id, Function::Direction(dir))?;
        let Some(next) = next else {
            if let Some(u) = world.unit_mut(id) {
                u.moved = u.moves();
            }
            return Ok(());
        };
        world.move_unit(id, next)?;
        if world.unit(id).is_some_and(|u| u.range == Some(0)) {
            debug!(unit = %id, loc = next, "satellite burned out");
            world.kill_unit(id, LossCause::BurnedOut)?;
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DiceCombat;
    use crate::geometry::MapDims;
    use crate::world::Terrain;
    use rand::SeedableRng;

    struct Idle(Owner);

    impl UnitPolicy for Idle {
        fn owner(&self) -> Owner {
            self.0
        }

        fn step(&mut self, _ctx: &mut TurnContext<'_>, _id: UnitId) -> Result<Step> {
            Ok(Step::Wait)
        }
    }

    fn sea(width: usize, height: usize) -> World {
        let dims = MapDims::new(width, height);
        World::new(dims, vec![Terrain::Water; dims.size()], &[], 16).unwrap()
    }

    fn run(world: &mut World, owner: Owner) {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut dice = DiceCombat;
        let config = EngineConfig::default();
        let mut ctx = TurnContext {
            world,
            rng: &mut rng,
            combat: &mut dice,
            config: &config,
        };
        move_side(&mut Idle(owner), &mut ctx).unwrap();
    }

    #[test]
    fn test_circling_fighter_burns_fuel_and_crashes() {
        let mut world = sea(10, 10);
        let id = world
            .create_unit(Owner::Player, PieceType::Fighter, world.dims().loc(4, 4))
            .unwrap();
        for turn in 1..=3 {
            run(&mut world, Owner::Player);
            assert_eq!(world.unit(id).unwrap().range, Some(32 - 8 * turn));
        }
        run(&mut world, Owner::Player);
        assert!(world.unit(id).is_none());
    }

    #[test]
    fn test_satellite_bounces_off_corner() {
        let mut world = sea(8, 8);
        let dims = world.dims();
        let id = world
            .create_unit(Owner::Computer, PieceType::Satellite, dims.loc(2, 5))
            .unwrap();
        world
            .set_function(id, Function::Direction(Direction::NorthEast))
            .unwrap();
        run(&mut world, Owner::Computer);
        // Corner bounce at (1,6), run south-west to the left edge at (6,1),
        // bounce back north-east.
        let sat = world.unit(id).unwrap();
        assert_eq!(sat.moved, 10);
        assert_eq!(sat.range, Some(490));
        assert_eq!(sat.loc, dims.loc(2, 5));
        assert_eq!(sat.func, Function::Direction(Direction::NorthEast));
    }

    #[test]
    fn test_bounce_table() {
        let world = sea(8, 8);
        let dims = world.dims();
        // Top edge, heading north-east: reflect to south-east.
        assert_eq!(
            bounce(&world, dims.loc(1, 3), Direction::NorthEast),
            Direction::SouthEast
        );
        // Top-right corner: straight back.
        assert_eq!(
            bounce(&world, dims.loc(1, 6), Direction::NorthEast),
            Direction::SouthWest
        );
        // Right edge only: north-west.
        assert_eq!(
            bounce(&world, dims.loc(4, 6), Direction::NorthEast),
            Direction::NorthWest
        );
    }

    #[test]
    fn test_satellite_burns_out() {
        let mut world = sea(8, 8);
        let dims = world.dims();
        let id = world
            .create_unit(Owner::Computer, PieceType::Satellite, dims.loc(3, 3))
            .unwrap();
        world.unit_mut(id).unwrap().range = Some(4);
        run(&mut world, Owner::Computer);
        assert!(world.unit(id).is_none());
    }
}
