//! Consistency audit of the world's unit indexes.

use super::{UnitId, World};
use crate::error::{GameError, Result};
use crate::pieces::{Owner, PieceType};

impl World {
    /// Check every index against every other.
    ///
    /// Free slots must be empty and named in no list; live units must
    /// appear exactly once in their ownership list and their cell list;
    /// carrier and cargo links must agree, cargo must share its carrier's
    /// cell and fit its hold; city owners must match the city cells.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] describing the first violation.
    pub fn audit(&self) -> Result<()> {
        let fail = |msg: String| Err(GameError::Invariant(msg));
        let slots = self.units.slots();

        for &id in self.units.free_list() {
            if slots.get(id.index()).is_some_and(Option::is_some) {
                return fail(format!("free slot {id} holds a live unit"));
            }
        }
        let free_slots = slots.iter().filter(|s| s.is_none()).count();
        if free_slots != self.units.free_list().len() {
            return fail(format!(
                "{free_slots} empty slots but {} on the free list",
                self.units.free_list().len()
            ));
        }

        for owner in Owner::BOTH {
            for kind in PieceType::ALL {
                for &id in self.units_of(owner, kind) {
                    match self.unit(id) {
                        None => return fail(format!("dead unit {id} in {owner} {kind} list")),
                        Some(u) if u.owner != owner || u.kind != kind => {
                            return fail(format!("unit {id} filed under {owner} {kind}"));
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        for (loc, cell) in self.cells.iter().enumerate() {
            for &id in &cell.units {
                match self.unit(id) {
                    None => return fail(format!("dead unit {id} in cell {loc}")),
                    Some(u) if u.loc != loc => {
                        return fail(format!("unit {id} at {} listed in cell {loc}", u.loc));
                    }
                    Some(_) => {}
                }
            }
        }

        for unit in self.units.iter() {
            let id = unit.id;
            if slots.get(id.index()).and_then(Option::as_ref).map(|u| u.id) != Some(id) {
                return fail(format!("unit {id} stored in the wrong slot"));
            }
            if unit.hits == 0 {
                return fail(format!("live unit {id} has no hits"));
            }
            let owned = occurrences(self.units_of(unit.owner, unit.kind), id);
            if owned != 1 {
                return fail(format!("unit {id} appears {owned} times in its owner list"));
            }
            let located = occurrences(self.units_at(unit.loc), id);
            if located != 1 {
                return fail(format!("unit {id} appears {located} times in cell {}", unit.loc));
            }
            if let Some(ship) = unit.ship {
                let Some(carrier) = self.unit(ship) else {
                    return fail(format!("unit {id} aboard dead ship {ship}"));
                };
                if occurrences(&carrier.cargo, id) != 1 {
                    return fail(format!("unit {id} missing from cargo of {ship}"));
                }
                if carrier.loc != unit.loc {
                    return fail(format!("unit {id} not with its ship {ship}"));
                }
            }
            for &passenger in &unit.cargo {
                if self.unit(passenger).and_then(|p| p.ship) != Some(id) {
                    return fail(format!("cargo {passenger} of {id} does not point back"));
                }
            }
            if unit.cargo.len() as u32 > unit.capacity() {
                return fail(format!("unit {id} carries more than it can hold"));
            }
        }

        for (index, city) in self.cities.iter().enumerate() {
            let at = self.cells.get(city.loc).and_then(|c| c.city);
            if at.map(|c| c.index()) != Some(index) {
                return fail(format!("city {index} not recorded at {}", city.loc));
            }
        }
        Ok(())
    }
}

fn occurrences(list: &[UnitId], id: UnitId) -> usize {
    list.iter().filter(|&&u| u == id).count()
}

#[cfg(test)]
mod tests {
    use crate::events::LossCause;
    use crate::geometry::MapDims;
    use crate::pieces::{Owner, PieceType};
    use crate::world::{Terrain, World};

    fn open_sea() -> World {
        let dims = MapDims::new(6, 6);
        World::new(dims, vec![Terrain::Water; dims.size()], &[], 16).unwrap()
    }

    #[test]
    fn test_clean_world_passes() {
        let mut world = open_sea();
        let a = world.create_unit(Owner::Player, PieceType::Patrol, 7).unwrap();
        world.create_unit(Owner::Computer, PieceType::Carrier, 8).unwrap();
        world.kill_unit(a, LossCause::Combat).unwrap();
        world.audit().unwrap();
    }

    #[test]
    fn test_detects_moved_without_relink() {
        let mut world = open_sea();
        let id = world.create_unit(Owner::Player, PieceType::Patrol, 7).unwrap();
        world.unit_mut(id).unwrap().loc = 8;
        assert!(world.audit().is_err());
    }

    #[test]
    fn test_detects_zero_hits() {
        let mut world = open_sea();
        let id = world.create_unit(Owner::Player, PieceType::Battleship, 7).unwrap();
        world.unit_mut(id).unwrap().hits = 0;
        assert!(world.audit().is_err());
    }

    #[test]
    fn test_detects_one_sided_cargo_link() {
        let mut world = open_sea();
        let carrier = world.create_unit(Owner::Player, PieceType::Carrier, 7).unwrap();
        let fighter = world.create_unit(Owner::Player, PieceType::Fighter, 7).unwrap();
        world.unit_mut(fighter).unwrap().ship = Some(carrier);
        assert!(world.audit().is_err());
    }
}
