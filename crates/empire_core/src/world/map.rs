//! Ground-truth cells and per-side view maps.

use serde::{Deserialize, Serialize};

use crate::geometry::{Location, MapDims};

use super::cities::CityId;
use super::units::UnitId;

/// View symbol of land.
pub const LAND: char = '+';
/// View symbol of water.
pub const WATER: char = '.';
/// View symbol of a cell never seen.
pub const UNEXPLORED: char = ' ';

/// Real terrain under a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Dry land; cities stand on land.
    Land,
    /// Open water.
    Water,
}

impl Terrain {
    /// View symbol of bare terrain.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Land => LAND,
            Self::Water => WATER,
        }
    }
}

/// One cell of ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealCell {
    /// Terrain underneath.
    pub terrain: Terrain,
    /// City standing here.
    pub city: Option<CityId>,
    /// Every unit in the cell, cargo included.
    pub units: Vec<UnitId>,
}

impl RealCell {
    pub(crate) fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            city: None,
            units: Vec::new(),
        }
    }
}

/// One cell of a side's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCell {
    /// Symbol last observed.
    pub contents: char,
    /// Turn of the last observation.
    pub seen: Option<u32>,
}

impl Default for ViewCell {
    fn default() -> Self {
        Self {
            contents: UNEXPLORED,
            seen: None,
        }
    }
}

/// What one side believes the board looks like.
///
/// Only scans write to a view, so it drifts from ground truth as soon as
/// units move out of sight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMap {
    dims: MapDims,
    cells: Vec<ViewCell>,
}

impl ViewMap {
    /// A view with every cell unexplored.
    #[must_use]
    pub fn new(dims: MapDims) -> Self {
        Self {
            dims,
            cells: vec![ViewCell::default(); dims.size()],
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dims(&self) -> MapDims {
        self.dims
    }

    /// Symbol at a location; unexplored outside the grid.
    #[inline]
    #[must_use]
    pub fn contents(&self, loc: Location) -> char {
        self.cells.get(loc).map_or(UNEXPLORED, |c| c.contents)
    }

    /// Turn a location was last seen.
    #[must_use]
    pub fn seen(&self, loc: Location) -> Option<u32> {
        self.cells.get(loc).and_then(|c| c.seen)
    }

    /// Full cell at a location.
    #[must_use]
    pub fn cell(&self, loc: Location) -> Option<&ViewCell> {
        self.cells.get(loc)
    }

    /// Record an observation.
    pub fn observe(&mut self, loc: Location, contents: char, date: u32) {
        if let Some(cell) = self.cells.get_mut(loc) {
            cell.contents = contents;
            cell.seen = Some(date);
        }
    }

    /// Overwrite a symbol without touching the timestamp.
    ///
    /// Used on scratch copies the policies annotate before a search.
    pub fn set_contents(&mut self, loc: Location, contents: char) {
        if let Some(cell) = self.cells.get_mut(loc) {
            cell.contents = contents;
        }
    }

    /// Number of on-board cells still unexplored.
    #[must_use]
    pub fn unexplored_count(&self) -> usize {
        (0..self.cells.len())
            .filter(|&loc| self.dims.on_board(loc) && self.contents(loc) == UNEXPLORED)
            .count()
    }

    /// Render the view as rows of symbols.
    #[must_use]
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.dims.size() + self.dims.height);
        for row in 0..self.dims.height {
            for col in 0..self.dims.width {
                out.push(self.contents(self.dims.loc(row, col)));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_view_is_unexplored() {
        let view = ViewMap::new(MapDims::new(5, 4));
        assert_eq!(view.contents(7), UNEXPLORED);
        assert_eq!(view.seen(7), None);
        // Only the 3x2 interior counts.
        assert_eq!(view.unexplored_count(), 6);
    }

    #[test]
    fn test_observe_sets_timestamp() {
        let mut view = ViewMap::new(MapDims::new(5, 4));
        view.observe(6, LAND, 3);
        assert_eq!(view.contents(6), LAND);
        assert_eq!(view.seen(6), Some(3));
        view.set_contents(6, '$');
        assert_eq!(view.contents(6), '$');
        assert_eq!(view.seen(6), Some(3));
        assert_eq!(view.contents(999), UNEXPLORED);
    }

    #[test]
    fn test_to_ascii_shape() {
        let mut view = ViewMap::new(MapDims::new(3, 3));
        view.observe(4, WATER, 0);
        assert_eq!(view.to_ascii(), "   \n . \n   \n");
    }
}
