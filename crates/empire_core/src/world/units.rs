//! Units and the fixed-capacity pool that owns them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::function::Function;
use crate::geometry::Location;
use crate::pieces::{Owner, PieceType};

/// Stable handle to a unit slot.
///
/// Handles are reused after the unit dies, so holding one across a kill is
/// only meaningful together with a liveness check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Slot index in the pool.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live piece on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// This unit's handle.
    pub id: UnitId,
    /// Side the unit fights for.
    pub owner: Owner,
    /// Piece type.
    pub kind: PieceType,
    /// Current cell; cargo shares its carrier's cell.
    pub loc: Location,
    /// Remaining hit points, always positive for a live unit.
    pub hits: u32,
    /// Moves made so far this turn.
    pub moved: u32,
    /// Standing order.
    pub func: Function,
    /// Ship carrying this unit.
    pub ship: Option<UnitId>,
    /// Units carried by this one.
    pub cargo: Vec<UnitId>,
    /// Fuel left, `None` for unlimited pieces.
    pub range: Option<u32>,
}

impl Unit {
    fn new(id: UnitId, owner: Owner, kind: PieceType, loc: Location) -> Self {
        let attr = kind.attr();
        Self {
            id,
            owner,
            kind,
            loc,
            hits: attr.max_hits,
            moved: 0,
            func: Function::Idle,
            ship: None,
            cargo: Vec::new(),
            range: attr.range,
        }
    }

    /// Moves available per turn at the current damage level.
    ///
    /// A damaged piece moves proportionally slower, rounded up.
    #[must_use]
    pub fn moves(&self) -> u32 {
        let attr = self.kind.attr();
        scaled(attr.speed, self.hits, attr.max_hits)
    }

    /// Cargo slots at the current damage level.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        let attr = self.kind.attr();
        scaled(attr.capacity, self.hits, attr.max_hits)
    }

    /// Moves left this turn.
    #[must_use]
    pub fn moves_left(&self) -> u32 {
        self.moves().saturating_sub(self.moved)
    }

    /// True if the cargo hold has no free slot.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cargo.len() as u32 >= self.capacity()
    }

    /// True if the unit has taken damage.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.hits < self.kind.attr().max_hits
    }

    /// View symbol for this unit.
    #[must_use]
    pub fn symbol(&self) -> char {
        self.owner.piece_symbol(self.kind)
    }
}

fn scaled(value: u32, hits: u32, max_hits: u32) -> u32 {
    if max_hits == 0 {
        return value;
    }
    (value * hits).div_ceil(max_hits)
}

/// Arena of unit slots addressed by [`UnitId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPool {
    slots: Vec<Option<Unit>>,
    free: Vec<UnitId>,
    capacity: usize,
}

impl UnitPool {
    /// Create an empty pool that will hold at most `capacity` units.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
        }
    }

    /// Maximum number of live units.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True if no unit is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take a slot for a new unit.
    ///
    /// Freed slots are reused lowest-first so allocation order is
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PoolExhausted`] when every slot is in use.
    pub(crate) fn allocate(
        &mut self,
        owner: Owner,
        kind: PieceType,
        loc: Location,
    ) -> Result<UnitId> {
        let id = if let Some(id) = self.free.pop() {
            id
        } else if self.slots.len() < self.capacity {
            self.slots.push(None);
            UnitId((self.slots.len() - 1) as u32)
        } else {
            return Err(GameError::PoolExhausted);
        };
        self.slots[id.index()] = Some(Unit::new(id, owner, kind, loc));
        Ok(id)
    }

    /// Return a slot to the pool.
    pub(crate) fn release(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.slots.get_mut(id.index())?.take()?;
        // Keep the free list sorted descending so pop yields the lowest id.
        let pos = self.free.partition_point(|&f| f > id);
        self.free.insert(pos, id);
        Some(unit)
    }

    /// A live unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.slots.get(id.index())?.as_ref()
    }

    /// A live unit, mutably.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// True if the handle names a live unit.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.get(id).is_some()
    }

    /// All live units in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Slot table, including free slots, for the audit.
    pub(crate) fn slots(&self) -> &[Option<Unit>] {
        &self.slots
    }

    /// Free list, for the audit.
    pub(crate) fn free_list(&self) -> &[UnitId] {
        &self.free
    }
}
