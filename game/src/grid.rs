use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

pub const DEFAULT_GRID_SIZE: usize = 6;
pub const DEFAULT_SYMBOL_COUNT: usize = 4;
/// Largest board edge the rules accept.
pub const MAX_GRID_SIZE: usize = 64;
/// Tiles render as `A..=Z`, which caps the symbol set.
pub const MAX_SYMBOLS: usize = 26;

const EMPTY_GLYPH: char = '.';

/// One grid cell's symbol. Tiles compare by symbol only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tile(u8);

impl Tile {
    pub const fn new(symbol: u8) -> Self {
        Self(symbol)
    }

    pub const fn symbol(self) -> u8 {
        self.0
    }

    /// Every tile in a symbol set of `symbol_count` entries.
    pub fn all(symbol_count: usize) -> impl Iterator<Item = Tile> {
        (0..symbol_count.min(MAX_SYMBOLS) as u8).map(Tile)
    }

    pub fn glyph(self) -> char {
        if (self.0 as usize) < MAX_SYMBOLS {
            char::from(b'A' + self.0)
        } else {
            '?'
        }
    }

    pub fn from_glyph(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(Self(upper as u8 - b'A'))
        } else {
            None
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Orthogonal neighbours only; a position is never adjacent to itself.
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Square board of cells stored row-major. Row 0 is the top row, so gravity
/// pulls tiles toward higher row indices.
///
/// A `None` cell is the transient empty sentinel used while a cascade clears
/// and refills the board; grids handed back to callers are always full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl Grid {
    pub(crate) fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Parses one string per row, tiles as letters and `.` for an empty cell.
    /// Whitespace inside a row is ignored.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, BoardError> {
        let size = rows.len();
        let mut grid = Self::empty(size);
        for (row, line) in rows.iter().enumerate() {
            let glyphs: Vec<char> = line
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if glyphs.len() != size {
                return Err(BoardError::Configuration(format!(
                    "row {row} has {} cells, expected {size}",
                    glyphs.len()
                )));
            }
            for (col, glyph) in glyphs.into_iter().enumerate() {
                let cell = if glyph == EMPTY_GLYPH {
                    None
                } else {
                    Some(Tile::from_glyph(glyph).ok_or_else(|| {
                        BoardError::Configuration(format!(
                            "unknown tile glyph {glyph:?} at {}",
                            Position::new(row, col)
                        ))
                    })?)
                };
                grid.set(Position::new(row, col), cell);
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn check(&self, pos: Position) -> Result<(), BoardError> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(BoardError::InvalidPosition {
                position: pos,
                size: self.size,
            })
        }
    }

    /// The cell at `pos`; `None` for an empty cell or an out-of-bounds position.
    pub fn get(&self, pos: Position) -> Option<Tile> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[self.index(pos)]
    }

    pub fn cells(&self) -> &[Option<Tile>] {
        &self.cells
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<Tile>]> {
        self.cells.chunks(self.size.max(1))
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row, col)))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// One string of glyphs per row, `.` for empty cells.
    pub fn to_glyph_rows(&self) -> Vec<String> {
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(EMPTY_GLYPH, Tile::glyph))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn set(&mut self, pos: Position, cell: Option<Tile>) {
        let idx = self.index(pos);
        self.cells[idx] = cell;
    }

    pub(crate) fn swap(&mut self, a: Position, b: Position) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
    }

    fn index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "{pos} outside {0}x{0} grid", self.size);
        pos.row * self.size + pos.col
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.to_glyph_rows().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let spaced: Vec<String> = row.chars().map(String::from).collect();
            write!(f, "{}", spaced.join(" "))?;
        }
        Ok(())
    }
}
