//! Grid geometry: locations, directions, distances and display sectors.
//!
//! A map is a flat row-major grid. The outermost ring of cells is
//! off-board, so every on-board cell has all eight neighbors inside the
//! grid and no search ever has to bounds-check past the edge.

use serde::{Deserialize, Serialize};

/// Index into a flat row-major grid.
pub type Location = usize;

/// Sentinel cost for unreachable cells.
pub const INFINITY: u32 = 1_000_000;

/// Number of display sector rows.
pub const SECTOR_ROWS: usize = 5;

/// Number of display sector columns.
pub const SECTOR_COLS: usize = 2;

/// The eight compass directions, in clockwise order from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Up one row.
    North,
    /// Up one row, right one column.
    NorthEast,
    /// Right one column.
    East,
    /// Down one row, right one column.
    SouthEast,
    /// Down one row.
    South,
    /// Down one row, left one column.
    SouthWest,
    /// Left one column.
    West,
    /// Up one row, left one column.
    NorthWest,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// The four diagonal directions.
    pub const DIAGONALS: [Self; 4] = [
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// Row and column offset of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
            Self::East => (0, 1),
            Self::SouthEast => (1, 1),
            Self::South => (1, 0),
            Self::SouthWest => (1, -1),
            Self::West => (0, -1),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Position in [`Direction::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for the four diagonal directions.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// Keyboard letter used for this direction in saved orders.
    #[must_use]
    pub const fn key(self) -> char {
        match self {
            Self::North => 'W',
            Self::NorthEast => 'E',
            Self::East => 'D',
            Self::SouthEast => 'C',
            Self::South => 'X',
            Self::SouthWest => 'Z',
            Self::West => 'A',
            Self::NorthWest => 'Q',
        }
    }

    /// Inverse of [`Direction::key`], case-insensitive.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_uppercase();
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

/// Dimensions of a map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapDims {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
}

impl Default for MapDims {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl MapDims {
    /// The classic 100x60 board.
    pub const STANDARD: Self = Self {
        width: 100,
        height: 60,
    };

    /// Create dimensions. Grids smaller than 3x3 have no on-board cells.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of cells, on-board or not.
    #[must_use]
    pub const fn size(self) -> usize {
        self.width * self.height
    }

    /// Row of a location.
    #[inline]
    #[must_use]
    pub const fn row(self, loc: Location) -> usize {
        loc / self.width
    }

    /// Column of a location.
    #[inline]
    #[must_use]
    pub const fn col(self, loc: Location) -> usize {
        loc % self.width
    }

    /// Location of a row and column.
    #[inline]
    #[must_use]
    pub const fn loc(self, row: usize, col: usize) -> Location {
        row * self.width + col
    }

    /// True if the location indexes a cell of this grid.
    #[must_use]
    pub const fn contains(self, loc: Location) -> bool {
        loc < self.size()
    }

    /// True if the location is inside the playable area.
    #[must_use]
    pub const fn on_board(self, loc: Location) -> bool {
        if loc >= self.size() {
            return false;
        }
        let row = self.row(loc);
        let col = self.col(loc);
        row > 0 && row + 1 < self.height && col > 0 && col + 1 < self.width
    }

    /// The cell one step away, if it lies inside the grid.
    #[must_use]
    pub fn neighbor(self, loc: Location, dir: Direction) -> Option<Location> {
        if !self.contains(loc) {
            return None;
        }
        let (dr, dc) = dir.delta();
        let row = self.row(loc).checked_add_signed(dr)?;
        let col = self.col(loc).checked_add_signed(dc)?;
        (row < self.height && col < self.width).then(|| self.loc(row, col))
    }

    /// On-board neighbors of a location, in [`Direction::ALL`] order.
    pub fn adjacent(self, loc: Location) -> impl Iterator<Item = Location> {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(loc, dir))
            .filter(move |&n| self.on_board(n))
    }

    /// True if two distinct locations touch.
    #[must_use]
    pub fn is_adjacent(self, a: Location, b: Location) -> bool {
        a != b && self.steps(a, b) == 1
    }

    /// Straight-line distance, rounded down.
    #[must_use]
    pub fn dist(self, a: Location, b: Location) -> u32 {
        let dr = self.row(a).abs_diff(self.row(b));
        let dc = self.col(a).abs_diff(self.col(b));
        isqrt((dr * dr + dc * dc) as u64) as u32
    }

    /// Number of 8-neighbor steps between two locations.
    #[must_use]
    pub fn steps(self, a: Location, b: Location) -> u32 {
        let dr = self.row(a).abs_diff(self.row(b));
        let dc = self.col(a).abs_diff(self.col(b));
        dr.max(dc) as u32
    }

    /// Rows covered by one display sector.
    #[must_use]
    pub const fn rows_per_sector(self) -> usize {
        self.height.div_ceil(SECTOR_ROWS)
    }

    /// Columns covered by one display sector.
    #[must_use]
    pub const fn cols_per_sector(self) -> usize {
        self.width.div_ceil(SECTOR_COLS)
    }

    /// Display sector containing a location, numbered row-major.
    #[must_use]
    pub const fn sector(self, loc: Location) -> usize {
        let sector_row = self.row(loc) / self.rows_per_sector();
        let sector_col = self.col(loc) / self.cols_per_sector();
        sector_row * SECTOR_COLS + sector_col
    }

    /// Top-left location of a display sector.
    #[must_use]
    pub const fn sector_origin(self, sector: usize) -> Location {
        let row = (sector / SECTOR_COLS) * self.rows_per_sector();
        let col = (sector % SECTOR_COLS) * self.cols_per_sector();
        self.loc(row, col)
    }
}

/// Integer square root, rounded down.
#[must_use]
pub fn isqrt(n: u64) -> u64 {
    if n <= 1 {
        return n;
    }
    let mut guess = n / 2;
    loop {
        let next = (guess + n / guess) / 2;
        if next >= guess {
            return guess;
        }
        guess = next;
    }
}
