//! Grid model: 6x8 field of emoji tiles and empty slots.

use rand::Rng;

/// Columns on the field.
pub const COLS: usize = 6;
/// Rows on the field. Row 0 is the top.
pub const ROWS: usize = 8;

/// Icon set in play. Variant A has five icons, B adds a sixth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    A,
    B,
}

const GLYPHS: [&str; 6] = ["😀", "😎", "😡", "😱", "😍", "🤖"];

impl Variant {
    /// Number of distinct tile values drawn by refill.
    pub fn tile_count(self) -> u8 {
        match self {
            Self::A => 5,
            Self::B => 6,
        }
    }

    /// Uniformly random tile from this icon set.
    pub fn random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Tile {
        Tile(rng.gen_range(0..self.tile_count()))
    }

    pub fn tiles(self) -> impl Iterator<Item = Tile> {
        (0..self.tile_count()).map(Tile)
    }
}

/// One icon value. The index is stable across variants (B is A plus one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile(pub u8);

impl Tile {
    pub fn glyph(self) -> &'static str {
        GLYPHS[self.0 as usize % GLYPHS.len()]
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Single cell: empty or holding a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Emoji(Tile),
}

impl Cell {
    #[inline]
    pub fn tile(self) -> Option<Tile> {
        match self {
            Self::Emoji(t) => Some(t),
            Self::Empty => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        self.row < ROWS && self.col < COLS
    }

    /// Up, down, left, right neighbours that fall inside the grid.
    pub fn neighbours(self) -> impl Iterator<Item = Coord> {
        let Coord { row, col } = self;
        [
            row.checked_sub(1).map(|r| Coord::new(r, col)),
            Some(Coord::new(row + 1, col)),
            col.checked_sub(1).map(|c| Coord::new(row, c)),
            Some(Coord::new(row, col + 1)),
        ]
        .into_iter()
        .flatten()
        .filter(|c| c.in_bounds())
    }
}

/// The field. `cells[row][col]`, row 0 on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; COLS]; ROWS],
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Fully populated grid with random tiles from `variant`.
    pub fn random<R: Rng + ?Sized>(variant: Variant, rng: &mut R) -> Self {
        let mut grid = Self::empty();
        grid.refill(variant, rng);
        grid
    }

    /// Build from rows of tile indices; `None` is an empty slot. Short rows stay empty.
    pub fn from_rows(rows: &[&[Option<u8>]]) -> Self {
        let mut grid = Self::empty();
        for (r, row) in rows.iter().take(ROWS).enumerate() {
            for (c, value) in row.iter().take(COLS).enumerate() {
                if let Some(v) = value {
                    grid.cells[r][c] = Cell::Emoji(Tile(*v));
                }
            }
        }
        grid
    }

    /// Cell at `at`; `None` when out of range.
    #[inline]
    pub fn get(&self, at: Coord) -> Option<Cell> {
        if !at.in_bounds() {
            return None;
        }
        Some(self.cells[at.row][at.col])
    }

    #[inline]
    pub fn tile_at(&self, at: Coord) -> Option<Tile> {
        self.get(at).and_then(Cell::tile)
    }

    /// Returns false (and does nothing) when out of range.
    #[inline]
    pub fn set(&mut self, at: Coord, cell: Cell) -> bool {
        if !at.in_bounds() {
            return false;
        }
        self.cells[at.row][at.col] = cell;
        true
    }

    /// Empties an occupied cell. Returns false if it was already empty or out of range.
    pub fn clear(&mut self, at: Coord) -> bool {
        match self.get(at) {
            Some(Cell::Emoji(_)) => self.set(at, Cell::Empty),
            _ => false,
        }
    }

    /// Every coordinate in row-major scan order.
    pub fn coords() -> impl Iterator<Item = Coord> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Coord::new(row, col)))
    }

    /// Occupied cells in row-major scan order.
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, Tile)> + '_ {
        Self::coords().filter_map(|c| self.tile_at(c).map(|t| (c, t)))
    }

    pub fn empty_count(&self) -> usize {
        Self::coords().filter(|&c| self.cells[c.row][c.col].is_empty()).count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// Compact each column downward, keeping top-to-bottom order. Empties end up on top.
    /// Returns how many tiles moved.
    pub fn apply_gravity(&mut self) -> usize {
        let mut moved = 0;
        for col in 0..COLS {
            let mut write = ROWS;
            for row in (0..ROWS).rev() {
                if let Cell::Emoji(t) = self.cells[row][col] {
                    write -= 1;
                    if write != row {
                        self.cells[write][col] = Cell::Emoji(t);
                        self.cells[row][col] = Cell::Empty;
                        moved += 1;
                    }
                }
            }
        }
        moved
    }

    /// Fill every empty cell with a random tile. Returns the filled coordinates.
    pub fn refill<R: Rng + ?Sized>(&mut self, variant: Variant, rng: &mut R) -> Vec<Coord> {
        let mut filled = Vec::new();
        for at in Self::coords() {
            if self.cells[at.row][at.col].is_empty() {
                self.cells[at.row][at.col] = Cell::Emoji(variant.random_tile(rng));
                filled.push(at);
            }
        }
        filled
    }

    /// Column top-to-bottom, for tests and rendering.
    pub fn column(&self, col: usize) -> [Cell; ROWS] {
        let mut out = [Cell::Empty; ROWS];
        if col < COLS {
            for (row, cell) in out.iter_mut().enumerate() {
                *cell = self.cells[row][col];
            }
        }
        out
    }
}

/// Screen placement of the board, used to turn a pointer position into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldLayout {
    pub x: u16,
    pub y: u16,
    pub cell_width: u16,
    pub cell_height: u16,
}

impl FieldLayout {
    /// Cell whose bounds contain `(x, y)`; `None` outside the board.
    pub fn cell_at(&self, x: u16, y: u16) -> Option<Coord> {
        if self.cell_width == 0 || self.cell_height == 0 || x < self.x || y < self.y {
            return None;
        }
        let col = usize::from((x - self.x) / self.cell_width);
        let row = usize::from((y - self.y) / self.cell_height);
        let at = Coord::new(row, col);
        at.in_bounds().then_some(at)
    }

    /// Top-left screen position of `at`.
    pub fn origin_of(&self, at: Coord) -> (u16, u16) {
        (
            self.x + at.col as u16 * self.cell_width,
            self.y + at.row as u16 * self.cell_height,
        )
    }
}
