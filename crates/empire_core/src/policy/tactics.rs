//! Movement helpers shared by both policies.

use tracing::trace;

use super::maps::{transport_load_map, unload_map};
use super::{Step, TurnContext};
use crate::error::{GameError, Result};
use crate::geometry::Location;
use crate::pathfinding::{
    attack_list, mirror_symbol, unmark_explore_locs, CostField, Objectives, Pathfinder, Search,
    ARMY_ATTACK, FIGHTER_ATTACK, SHIP_ATTACK, TT_ATTACK, TT_EXPLORE, TT_LOAD, TT_UNLOAD,
};
use crate::pieces::{Owner, PieceType};
use crate::world::{Terrain, Unit, UnitId, ViewMap, World, UNEXPLORED};

/// The live unit behind a handle.
pub(crate) fn unit(world: &World, id: UnitId) -> Result<&Unit> {
    world.unit(id).ok_or(GameError::UnitNotFound(id))
}

/// Real cell class as attack filters see it: `*` city, `+` land, `.` water.
fn real_class(world: &World, loc: Location) -> char {
    if world.city_at(loc).is_some() {
        '*'
    } else {
        world.terrain(loc).symbol()
    }
}

/// Best adjacent target: the neighbor whose view symbol comes earliest in
/// `list` and whose real cell class is in `terrain`.
pub(crate) fn find_attack(
    world: &World,
    owner: Owner,
    loc: Location,
    list: &str,
    terrain: &str,
) -> Option<Location> {
    let view = world.view(owner);
    let mut best: Option<(Location, usize)> = None;
    for n in world.dims().adjacent(loc) {
        let Some(rank) = list.chars().position(|c| c == view.contents(n)) else {
            continue;
        };
        if !terrain.contains(real_class(world, n)) {
            continue;
        }
        if best.map_or(true, |(_, b)| rank < b) {
            best = Some((n, rank));
        }
    }
    best.map(|(n, _)| n)
}

/// Attack list and cell classes a unit fights over when adjacent.
pub(crate) fn attack_profile(unit: &Unit) -> (String, &'static str) {
    let list = match unit.kind {
        PieceType::Army => ARMY_ATTACK,
        PieceType::Fighter => FIGHTER_ATTACK,
        PieceType::Transport => TT_ATTACK,
        PieceType::Satellite => "",
        _ => SHIP_ATTACK,
    };
    let terrain = match unit.kind {
        PieceType::Army if unit.ship.is_some() => "+*",
        PieceType::Army => ".+*",
        PieceType::Fighter => ".+",
        _ => ".",
    };
    (attack_list(list, unit.owner), terrain)
}

/// Attack the best adjacent target from `list`, if there is one.
pub(crate) fn attack_adjacent(
    ctx: &mut TurnContext<'_>,
    id: UnitId,
    list: &str,
    terrain: &str,
) -> Result<Option<Step>> {
    let u = unit(ctx.world, id)?;
    let Some(target) = find_attack(ctx.world, u.owner, u.loc, list, terrain) else {
        return Ok(None);
    };
    ctx.attack(id, target)?;
    Ok(Some(Step::Moved))
}

/// View symbols a piece may step onto while following a path.
pub(crate) fn move_terrain(kind: PieceType, owner: Owner) -> String {
    let city = owner.city_symbol();
    match kind {
        PieceType::Army => "+".to_string(),
        PieceType::Fighter | PieceType::Satellite => format!("+.{city}"),
        _ => format!(".{city}"),
    }
}

/// True if neither the cell nor any neighbor is land.
pub(crate) fn at_sea(world: &World, loc: Location) -> bool {
    world.terrain(loc) == Terrain::Water
        && world
            .dims()
            .adjacent(loc)
            .all(|n| world.terrain(n) == Terrain::Water)
}

/// First neighbor showing a symbol from `terrain` that the unit may enter.
pub(crate) fn move_away(world: &World, id: UnitId, terrain: &str) -> Option<Location> {
    let u = world.unit(id)?;
    let view = world.view(u.owner);
    world
        .dims()
        .adjacent(u.loc)
        .find(|&n| terrain.contains(view.contents(n)) && world.good_loc(id, n))
}

fn next_step(
    world: &World,
    field: &CostField,
    id: UnitId,
    terrain: &str,
    adj: &str,
) -> Option<Location> {
    let u = world.unit(id)?;
    field
        .find_dir(world.view(u.owner), u.loc, terrain, adj)
        .filter(|&n| world.good_loc(id, n))
}

/// Walk a unit toward `dest` along the field from the last search.
///
/// Marks the path, steps, and keeps stepping on the same field while moves
/// remain, the destination is not reached and no enemy has come within
/// reach. When the path is blocked the unit tries cells next to the path;
/// an army on a ship never does, so it waits for its ride instead. An army
/// stuck in a city steps out onto any open land.
///
/// # Errors
///
/// Propagates world errors.
pub(crate) fn move_objective(
    ctx: &mut TurnContext<'_>,
    field: &mut CostField,
    id: UnitId,
    dest: Option<Location>,
    adj: &str,
) -> Result<Step> {
    let Some(dest) = dest else {
        return Ok(Step::Wait);
    };
    let u = unit(ctx.world, id)?;
    let (owner, kind, start) = (u.owner, u.kind, u.loc);
    if start == dest {
        return Ok(Step::Wait);
    }
    let mut reuse = true;
    if ctx.world.view(owner).contents(dest) == UNEXPLORED && field.cost(dest) == 2 {
        field.mark_adjacent(start);
        reuse = false;
    } else {
        field.mark_path(dest);
    }
    let terrain = move_terrain(kind, owner);
    let mut moved = false;

    loop {
        let u = unit(ctx.world, id)?;
        let (loc, aboard) = (u.loc, u.ship.is_some());
        let mut next = next_step(ctx.world, field, id, &terrain, adj);
        if next.is_none() && !(kind == PieceType::Army && aboard) {
            field.mark_near_path(loc);
            reuse = false;
            next = next_step(ctx.world, field, id, &terrain, adj);
        }
        if next.is_none() && kind == PieceType::Army && ctx.world.city_at(loc).is_some() {
            next = move_away(ctx.world, id, "+");
            reuse = false;
        }
        let Some(next) = next else {
            return Ok(if moved { Step::Moved } else { Step::Wait });
        };
        trace!(unit = %id, from = loc, to = next, dest, "step");
        ctx.world.move_unit(id, next)?;
        moved = true;

        let Some(u) = ctx.world.unit(id) else {
            return Ok(Step::Moved);
        };
        if !reuse || u.moved >= u.moves() || u.loc == dest {
            return Ok(Step::Moved);
        }
        if kind == PieceType::Fighter {
            if super::is_landed(ctx.world, u) {
                return Ok(Step::Moved);
            }
            let half_tank = PieceType::Fighter.attr().range.unwrap_or(0) / 2;
            let low = u.range.is_some_and(|r| r <= half_tank);
            if low && ctx.world.view(owner).contents(dest) != owner.city_symbol() {
                return Ok(Step::Moved);
            }
        }
        let (list, attack_terrain) = attack_profile(u);
        if find_attack(ctx.world, owner, u.loc, &list, attack_terrain).is_some() {
            return Ok(Step::Moved);
        }
        field.unmark_around(loc);
    }
}

/// Best own transport with room at `loc`, starting from `best` and
/// preferring the fuller one.
fn find_best_tt(world: &World, owner: Owner, best: Option<UnitId>, loc: Location) -> Option<UnitId> {
    let count = |id: UnitId| world.unit(id).map_or(0, |u| u.cargo.len());
    let mut best = best;
    for u in world.units_at(loc).iter().filter_map(|&id| world.unit(id)) {
        if u.owner != owner || u.kind != PieceType::Transport || u.is_full() {
            continue;
        }
        if best.map_or(true, |b| u.cargo.len() > count(b)) {
            best = Some(u.id);
        }
    }
    best
}

/// Put an army aboard the best transport here or next door.
///
/// Returns `false` if there is none. An army already aboard the best
/// transport stays put for the rest of the turn.
///
/// # Errors
///
/// Propagates world errors.
pub(crate) fn load_army(ctx: &mut TurnContext<'_>, id: UnitId) -> Result<bool> {
    let u = unit(ctx.world, id)?;
    let (owner, loc) = (u.owner, u.loc);
    let mut best = find_best_tt(ctx.world, owner, u.ship, loc);
    for n in ctx.world.dims().adjacent(loc) {
        best = find_best_tt(ctx.world, owner, best, n);
    }
    let Some(tt) = best else {
        return Ok(false);
    };
    let tt_loc = unit(ctx.world, tt)?.loc;
    if tt_loc == loc {
        if let Some(u) = ctx.world.unit_mut(id) {
            u.moved = u.moves();
        }
    } else {
        ctx.world.move_unit(id, tt_loc)?;
    }
    if unit(ctx.world, id)?.ship != Some(tt) {
        ctx.world.embark(tt, id)?;
    }
    trace!(unit = %id, transport = %tt, "army boarded");
    Ok(true)
}

/// Copy of a side's view with the blanks filled from a prediction.
pub(crate) fn predicted_view(world: &World, owner: Owner, predicted: &ViewMap) -> ViewMap {
    let mut map = world.view(owner).clone();
    unmark_explore_locs(&mut map, predicted);
    map
}

/// One move of a transport gathering passengers: head for waiting armies,
/// else explore what the prediction leaves unknown.
///
/// # Errors
///
/// Propagates world errors.
pub(crate) fn transport_load_step(
    ctx: &mut TurnContext<'_>,
    field: &mut CostField,
    predicted: &ViewMap,
    id: UnitId,
) -> Result<Step> {
    let u = unit(ctx.world, id)?;
    let (owner, loc) = (u.owner, u.loc);
    let load_map = transport_load_map(ctx.world, owner);
    let mut dest = Pathfinder::new(ctx.world, &load_map, &ctx.config.path).find(
        field,
        loc,
        Search::WaterThenLand,
        &Objectives::resolve(&TT_LOAD, owner),
    );
    if dest.is_none() {
        let explore = predicted_view(ctx.world, owner, predicted);
        dest = Pathfinder::new(ctx.world, &explore, &ctx.config.path).find(
            field,
            loc,
            Search::Water,
            &Objectives::resolve(&TT_EXPLORE, owner),
        );
    }
    let army = mirror_symbol('a', Owner::Computer, owner);
    move_objective(ctx, field, id, dest, &format!("{army}{UNEXPLORED}"))
}

/// One move of a loaded transport heading for the best landing.
///
/// # Errors
///
/// Propagates world errors.
pub(crate) fn transport_unload_step(
    ctx: &mut TurnContext<'_>,
    field: &mut CostField,
    predicted: &ViewMap,
    id: UnitId,
) -> Result<Step> {
    let u = unit(ctx.world, id)?;
    let (owner, loc) = (u.owner, u.loc);
    let map = unload_map(ctx.world, owner, predicted);
    let dest = Pathfinder::new(ctx.world, &map, &ctx.config.path).find(
        field,
        loc,
        Search::WaterThenLand,
        &Objectives::resolve(&TT_UNLOAD, owner),
    );
    move_objective(ctx, field, id, dest, &UNEXPLORED.to_string())
}

/// Head for a concrete location: step straight in when it is next door
/// and enterable, otherwise follow a destination search.
///
/// Returns `None` if no route exists.
///
/// # Errors
///
/// Propagates world errors.
pub(crate) fn head_for(
    ctx: &mut TurnContext<'_>,
    field: &mut CostField,
    id: UnitId,
    dest: Location,
    adj: &str,
) -> Result<Option<Step>> {
    let u = unit(ctx.world, id)?;
    let (owner, kind, loc) = (u.owner, u.kind, u.loc);
    let dims = ctx.world.dims();
    if dims.is_adjacent(loc, dest) && ctx.world.good_loc(id, dest) {
        ctx.world.move_unit(id, dest)?;
        return Ok(Some(Step::Moved));
    }
    let found = Pathfinder::for_owner(ctx.world, owner, &ctx.config.path).find_destination(
        field,
        loc,
        dest,
        kind.mobility(),
        owner,
    );
    if found.is_none() {
        return Ok(None);
    }
    move_objective(ctx, field, id, found, adj).map(Some)
}
