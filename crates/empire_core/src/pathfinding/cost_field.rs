//! The transient per-search cost field and path extraction over it.

use crate::geometry::{Direction, Location, MapDims, INFINITY};
use crate::world::ViewMap;

/// How a cell was classified by the last search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTerrain {
    /// Not enterable, or never reached.
    Unknown,
    /// Marked as lying on a chosen path.
    Path,
    /// Reached as land.
    Land,
    /// Reached as water.
    Water,
}

/// One cell of a cost field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCell {
    /// Cheapest known cost from the origin; [`INFINITY`] or more if
    /// unreached.
    pub cost: u32,
    /// Cost of the last step into this cell.
    pub inc_cost: u32,
    /// Classification, or [`PathTerrain::Path`] once marked.
    pub terrain: PathTerrain,
}

impl PathCell {
    const UNREACHED: Self = Self {
        cost: INFINITY,
        inc_cost: INFINITY,
        terrain: PathTerrain::Unknown,
    };
}

/// Step-selection neighbor order: diagonals first, then west, east, north,
/// south.
const DIR_ORDER: [Direction; 8] = [
    Direction::NorthWest,
    Direction::NorthEast,
    Direction::SouthWest,
    Direction::SouthEast,
    Direction::West,
    Direction::East,
    Direction::North,
    Direction::South,
];

/// Cost of reaching every cell from one origin.
///
/// A field is reset at the start of every search and stays valid until the
/// next one, so a mover can take several steps along the same field.
#[derive(Debug, Clone)]
pub struct CostField {
    dims: MapDims,
    cells: Vec<PathCell>,
    pub(crate) settled: Vec<bool>,
}

impl CostField {
    /// An empty field for a grid.
    #[must_use]
    pub fn new(dims: MapDims) -> Self {
        Self {
            dims,
            cells: vec![PathCell::UNREACHED; dims.size()],
            settled: vec![false; dims.size()],
        }
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dims(&self) -> MapDims {
        self.dims
    }

    /// Forget the previous search.
    pub fn reset(&mut self) {
        self.cells.fill(PathCell::UNREACHED);
        self.settled.fill(false);
    }

    /// Cell at a location.
    #[must_use]
    pub fn cell(&self, loc: Location) -> PathCell {
        self.cells.get(loc).copied().unwrap_or(PathCell::UNREACHED)
    }

    /// Cost at a location.
    #[must_use]
    pub fn cost(&self, loc: Location) -> u32 {
        self.cell(loc).cost
    }

    /// True if the cell was reached at finite cost.
    #[must_use]
    pub fn is_reached(&self, loc: Location) -> bool {
        self.cost(loc) < INFINITY
    }

    /// True if the cell is marked as on the path.
    #[must_use]
    pub fn is_path(&self, loc: Location) -> bool {
        self.cell(loc).terrain == PathTerrain::Path
    }

    pub(crate) fn set(&mut self, loc: Location, cost: u32, inc_cost: u32, terrain: PathTerrain) {
        if let Some(cell) = self.cells.get_mut(loc) {
            *cell = PathCell {
                cost,
                inc_cost,
                terrain,
            };
        }
    }

    pub(crate) fn set_terrain(&mut self, loc: Location, terrain: PathTerrain) {
        if let Some(cell) = self.cells.get_mut(loc) {
            cell.terrain = terrain;
        }
    }

    /// Mark every cell on any cheapest path from the origin to `dest`.
    ///
    /// The origin itself is never marked.
    pub fn mark_path(&mut self, dest: Location) {
        let mut stack = vec![dest];
        while let Some(loc) = stack.pop() {
            let cell = self.cell(loc);
            if cell.cost == 0 || cell.terrain == PathTerrain::Path || cell.cost >= INFINITY {
                continue;
            }
            self.set_terrain(loc, PathTerrain::Path);
            let prev_cost = cell.cost.saturating_sub(cell.inc_cost);
            stack.extend(
                self.dims
                    .adjacent(loc)
                    .filter(|&n| self.cost(n) == prev_cost),
            );
        }
    }

    /// Mark the ring around `loc`.
    pub fn mark_adjacent(&mut self, loc: Location) {
        let dims = self.dims;
        for n in dims.adjacent(loc) {
            self.set_terrain(n, PathTerrain::Path);
        }
    }

    /// Mark each neighbor of `loc` that itself touches a path cell other
    /// than `loc`. Lets a mover that has drifted off its path rejoin it.
    pub fn mark_near_path(&mut self, loc: Location) {
        let dims = self.dims;
        let hits: Vec<Location> = dims
            .adjacent(loc)
            .filter(|&n| dims.adjacent(n).any(|x| x != loc && self.is_path(x)))
            .collect();
        for n in hits {
            self.set_terrain(n, PathTerrain::Path);
        }
    }

    /// Clear path marks around a location, as after taking a step.
    pub fn unmark_around(&mut self, loc: Location) {
        let dims = self.dims;
        for n in dims.adjacent(loc).chain(std::iter::once(loc)) {
            if self.is_path(n) {
                self.set_terrain(n, PathTerrain::Unknown);
            }
        }
    }

    /// Pick the next step from `loc`.
    ///
    /// Candidates are marked neighbors whose view symbol is in `terrain`.
    /// Each scores `8 * (len - index)` for every one of its own neighbors
    /// showing a symbol of `adj_char`; the first best candidate in
    /// diagonal-first order wins.
    #[must_use]
    pub fn find_dir(
        &self,
        view: &ViewMap,
        loc: Location,
        terrain: &str,
        adj_char: &str,
    ) -> Option<Location> {
        let mut best: Option<(Location, u32)> = None;
        for dir in DIR_ORDER {
            let Some(n) = self.dims.neighbor(loc, dir) else {
                continue;
            };
            if !self.dims.on_board(n) || !self.is_path(n) || !terrain.contains(view.contents(n)) {
                continue;
            }
            let score = count_adjacent(view, n, adj_char);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((n, score));
            }
        }
        best.map(|(n, _)| n)
    }
}

/// Score of a cell's surroundings: `8 * (len - index)` for each neighbor
/// whose symbol appears in `adj_char`.
#[must_use]
pub fn count_adjacent(view: &ViewMap, loc: Location, adj_char: &str) -> u32 {
    let len = adj_char.chars().count() as u32;
    view.dims()
        .adjacent(loc)
        .filter_map(|n| {
            let symbol = view.contents(n);
            adj_char.chars().position(|c| c == symbol)
        })
        .map(|idx| 8 * (len - idx as u32))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{LAND, UNEXPLORED, WATER};

    fn line_field() -> (CostField, MapDims) {
        // Costs 0..4 along row 2 of a 7x5 grid.
        let dims = MapDims::new(7, 5);
        let mut field = CostField::new(dims);
        for col in 1..6 {
            let cost = (col - 1) as u32;
            field.set(dims.loc(2, col), cost, u32::from(cost > 0), PathTerrain::Water);
        }
        (field, dims)
    }

    #[test]
    fn test_mark_path_walks_back_to_origin() {
        let (mut field, dims) = line_field();
        field.mark_path(dims.loc(2, 5));
        assert!(field.is_path(dims.loc(2, 5)));
        assert!(field.is_path(dims.loc(2, 2)));
        assert!(!field.is_path(dims.loc(2, 1)));
        assert!(!field.is_path(dims.loc(1, 3)));
    }

    #[test]
    fn test_mark_near_path() {
        let (mut field, dims) = line_field();
        field.mark_path(dims.loc(2, 5));
        field.unmark_around(dims.loc(2, 2));
        field.mark_near_path(dims.loc(2, 2));
        // (1,3) and (3,3) touch (2,4); (2,3) touches it too.
        assert!(field.is_path(dims.loc(2, 3)));
        assert!(field.is_path(dims.loc(1, 3)));
        assert!(!field.is_path(dims.loc(1, 1)));
    }

    #[test]
    fn test_find_dir_prefers_adjacent_symbols() {
        let dims = MapDims::new(7, 7);
        let mut view = ViewMap::new(dims);
        let mut field = CostField::new(dims);
        let center = dims.loc(3, 3);
        for loc in 0..dims.size() {
            view.observe(loc, LAND, 0);
        }
        for n in dims.adjacent(center) {
            view.observe(n, WATER, 0);
        }
        field.mark_adjacent(center);
        // Unexplored cells only near the south-east neighbor.
        for loc in [dims.loc(5, 4), dims.loc(5, 5)] {
            view.observe(loc, UNEXPLORED, 0);
        }
        let step = field.find_dir(&view, center, ".", " ");
        assert_eq!(step, Some(dims.loc(4, 4)));
        assert_eq!(field.find_dir(&view, center, "+", " "), None);
    }

    #[test]
    fn test_find_dir_ties_go_to_northwest() {
        let dims = MapDims::new(7, 7);
        let mut view = ViewMap::new(dims);
        let mut field = CostField::new(dims);
        let center = dims.loc(3, 3);
        for n in dims.adjacent(center) {
            view.observe(n, WATER, 0);
        }
        field.mark_adjacent(center);
        assert_eq!(field.find_dir(&view, center, ".", "X"), Some(dims.loc(2, 2)));
    }

    #[test]
    fn test_count_adjacent_weights_by_priority() {
        let dims = MapDims::new(5, 5);
        let mut view = ViewMap::new(dims);
        let center = dims.loc(2, 2);
        for n in dims.adjacent(center) {
            view.observe(n, WATER, 0);
        }
        view.observe(dims.loc(1, 1), 'X', 0);
        view.observe(dims.loc(1, 2), '*', 0);
        // "X*" has len 2: X scores 16, * scores 8.
        assert_eq!(count_adjacent(&view, center, "X*"), 24);
    }
}
