//! Attack resolution.
//!
//! Fights are decided by a [`CombatResolver`]. The engine ships with
//! [`DiceCombat`], which flips a fair coin for every decision using the
//! game's seeded RNG; tests substitute resolvers that always win or lose.

use rand::{Rng, RngCore};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{GameError, Result};
use crate::events::{GameEvent, LossCause};
use crate::function::Function;
use crate::geometry::Location;
use crate::pieces::{Owner, PieceType, NUM_PIECES};
use crate::world::{Terrain, UnitId, World};

/// Decides the random parts of a fight.
pub trait CombatResolver {
    /// Whether an army assault takes the city.
    fn assault_succeeds(&mut self, rng: &mut dyn RngCore) -> bool;

    /// Whether the next blow of a fight lands on the attacker.
    fn defender_strikes(&mut self, rng: &mut dyn RngCore) -> bool;
}

/// Even odds on every assault and every blow.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiceCombat;

impl CombatResolver for DiceCombat {
    fn assault_succeeds(&mut self, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(0.5)
    }

    fn defender_strikes(&mut self, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(0.5)
    }
}

/// How an attack ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The city fell; the assaulting army was used up.
    CityCaptured,
    /// The city held; the assaulting army died.
    CityHeld,
    /// The defender died and the attacker moved in.
    Won,
    /// The attacker died.
    Lost,
    /// Nothing there could be attacked.
    NoTarget,
}

impl AttackOutcome {
    /// True if the attacking unit is still alive.
    #[must_use]
    pub const fn attacker_survived(self) -> bool {
        matches!(self, Self::Won | Self::NoTarget)
    }
}

/// Production and functions a side gives a city it has just taken.
fn capture_orders(config: &EngineConfig, owner: Owner) -> (Option<PieceType>, [Function; NUM_PIECES]) {
    let plays_itself = owner == Owner::Computer || config.computer_plays_player;
    if plays_itself {
        (None, [Function::Idle; NUM_PIECES])
    } else {
        (
            Some(config.production.captured_city_production),
            config.player_city_functions,
        )
    }
}

/// Attack whatever stands at `target`.
///
/// A city is assaulted; anything else is fought blow by blow until one
/// side is destroyed. A winning attacker moves into the cell, dropping
/// cargo it can no longer carry, and an army that wins its way onto open
/// water drowns.
///
/// # Errors
///
/// Returns [`GameError::UnitNotFound`] if the attacker is not live and
/// [`GameError::InvalidLocation`] for an off-board target.
pub fn attack(
    world: &mut World,
    resolver: &mut dyn CombatResolver,
    rng: &mut dyn RngCore,
    config: &EngineConfig,
    attacker: UnitId,
    target: Location,
) -> Result<AttackOutcome> {
    if !world.dims().on_board(target) {
        return Err(GameError::InvalidLocation(target));
    }
    let unit = world.unit(attacker).ok_or(GameError::UnitNotFound(attacker))?;
    let owner = unit.owner;
    if world.city_at(target).is_some_and(|c| !c.is_owned_by(owner)) {
        return assault_city(world, resolver, rng, config, attacker, target);
    }
    fight(world, resolver, rng, attacker, target)
}

fn assault_city(
    world: &mut World,
    resolver: &mut dyn CombatResolver,
    rng: &mut dyn RngCore,
    config: &EngineConfig,
    attacker: UnitId,
    loc: Location,
) -> Result<AttackOutcome> {
    let owner = world
        .unit(attacker)
        .ok_or(GameError::UnitNotFound(attacker))?
        .owner;
    let defender = world.city_at(loc).and_then(|c| c.owner);
    let outcome = if resolver.assault_succeeds(rng) {
        world.kill_unit(attacker, LossCause::CityAssault)?;
        let (production, functions) = capture_orders(config, owner);
        world.capture_city(loc, owner, production, functions)?;
        AttackOutcome::CityCaptured
    } else {
        world.kill_unit(attacker, LossCause::CityAssault)?;
        world.push_event(GameEvent::CityHeld {
            loc,
            attacker: owner,
        });
        AttackOutcome::CityHeld
    };
    debug!(%owner, loc, ?outcome, "city assault");
    if let Some(defender) = defender {
        world.scan(defender, loc);
    }
    Ok(outcome)
}

/// The unit an attacker would hit at `loc`: the highest enemy piece type
/// there, satellites excluded.
fn defender_at(world: &World, owner: Owner, loc: Location) -> Option<UnitId> {
    world
        .units_at(loc)
        .iter()
        .filter_map(|&id| world.unit(id))
        .filter(|u| u.owner != owner && u.kind != PieceType::Satellite)
        .max_by_key(|u| u.kind)
        .map(|u| u.id)
}

fn fight(
    world: &mut World,
    resolver: &mut dyn CombatResolver,
    rng: &mut dyn RngCore,
    attacker: UnitId,
    loc: Location,
) -> Result<AttackOutcome> {
    let att = world.unit(attacker).ok_or(GameError::UnitNotFound(attacker))?;
    let (att_owner, att_kind, mut att_hits) = (att.owner, att.kind, att.hits);
    let Some(defender) = defender_at(world, att_owner, loc) else {
        return Ok(AttackOutcome::NoTarget);
    };
    let def = world.unit(defender).ok_or(GameError::UnitNotFound(defender))?;
    let (def_owner, def_kind, mut def_hits) = (def.owner, def.kind, def.hits);

    while att_hits > 0 && def_hits > 0 {
        if resolver.defender_strikes(rng) {
            att_hits = att_hits.saturating_sub(def_kind.attr().strength);
        } else {
            def_hits = def_hits.saturating_sub(att_kind.attr().strength);
        }
    }

    let winner = if att_hits > 0 { att_owner } else { def_owner };
    world.push_event(GameEvent::Battle {
        attacker: att_owner,
        attacker_kind: att_kind,
        defender_kind: def_kind,
        loc,
        winner,
    });
    debug!(
        attacker = %attacker,
        ?att_kind,
        ?def_kind,
        loc,
        %winner,
        "battle"
    );

    if att_hits > 0 {
        world.kill_unit(defender, LossCause::Combat)?;
        if let Some(unit) = world.unit_mut(attacker) {
            unit.hits = att_hits;
        }
        world.survive(attacker)?;
        world.move_unit(attacker, loc)?;
        let stranded = att_kind == PieceType::Army
            && world.terrain(loc) == Terrain::Water
            && world.unit(attacker).is_some_and(|u| u.ship.is_none());
        if stranded {
            world.kill_unit(attacker, LossCause::Drowned)?;
            return Ok(AttackOutcome::Lost);
        }
        world.scan(def_owner, loc);
        Ok(AttackOutcome::Won)
    } else {
        world.kill_unit(attacker, LossCause::Combat)?;
        if let Some(unit) = world.unit_mut(defender) {
            unit.hits = def_hits;
        }
        world.survive(defender)?;
        world.scan(def_owner, loc);
        Ok(AttackOutcome::Lost)
    }
}
