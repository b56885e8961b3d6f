//! Immutable world grid.
//!
//! The grid is a fixed W×H array of cells loaded once at startup and shared
//! between sessions as `Arc<Grid>`. It answers two questions: is a position
//! in bounds, and does a cell hold a (lethal) tile. Thread safety comes from
//! immutability; nothing mutates a grid after construction.

use crate::error::ServerError;
use std::collections::HashSet;
use wayfarer_event_system::{Tile, Vector};

/// One grid cell: either empty floor or a trap holding its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Trap(Tile),
}

/// Fixed-size 2D tile map.
///
/// Cells are stored densely in column-major order: `x` indexes columns,
/// matching the transposed pixel layout of the map loader.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from pre-assembled cells.
    ///
    /// `cells` must hold exactly `width * height` entries in column-major
    /// order (`cells[x * height + y]`).
    pub fn new(width: u32, height: u32, cells: Vec<Cell>) -> Result<Self, ServerError> {
        let expected = (width as usize) * (height as usize);
        if cells.len() != expected {
            return Err(ServerError::Map(format!(
                "Grid cell count {} does not match {width}x{height}",
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds an otherwise-empty grid with traps at the given positions.
    ///
    /// Positions outside the grid are rejected.
    pub fn with_traps(
        width: u32,
        height: u32,
        tile: Tile,
        traps: &[(i64, i64)],
    ) -> Result<Self, ServerError> {
        let mut cells = vec![Cell::Empty; (width as usize) * (height as usize)];
        for &(x, y) in traps {
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                return Err(ServerError::Map(format!(
                    "Trap position ({x}, {y}) lies outside the {width}x{height} grid"
                )));
            }
            cells[(x as usize) * (height as usize) + (y as usize)] = Cell::Trap(tile);
        }
        Self::new(width, height, cells)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns true if `position` lies inside the grid.
    pub fn contains(&self, position: Vector) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i64
            && position.y < self.height as i64
    }

    /// Returns the tile at `position`, or `None` for an empty cell.
    ///
    /// Callers check bounds first; out-of-bounds positions read as empty.
    pub fn tile_at(&self, position: Vector) -> Option<Tile> {
        if !self.contains(position) {
            return None;
        }
        let index = (position.x as usize) * (self.height as usize) + (position.y as usize);
        match self.cells[index] {
            Cell::Empty => None,
            Cell::Trap(tile) => Some(tile),
        }
    }

    /// Returns the distinct tile glyphs present on this map.
    ///
    /// The reserved-identifier table uses this set to keep visual identifiers
    /// from impersonating map tiles on a White console background.
    pub fn glyphs(&self) -> HashSet<String> {
        self.cells
            .iter()
            .filter_map(|cell| match cell {
                Cell::Empty => None,
                Cell::Trap(tile) => Some(tile.to_string()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap() -> Tile {
        Tile::new("##").unwrap()
    }

    #[test]
    fn bounds_are_exclusive_of_width_and_height() {
        let grid = Grid::with_traps(3, 3, trap(), &[]).unwrap();
        assert!(grid.contains(Vector::new(0, 0)));
        assert!(grid.contains(Vector::new(2, 2)));
        assert!(!grid.contains(Vector::new(3, 0)));
        assert!(!grid.contains(Vector::new(0, 3)));
        assert!(!grid.contains(Vector::new(-1, 0)));
    }

    #[test]
    fn tile_lookup_distinguishes_traps_from_floor() {
        let grid = Grid::with_traps(3, 3, trap(), &[(1, 0)]).unwrap();
        assert_eq!(grid.tile_at(Vector::new(1, 0)), Some(trap()));
        assert_eq!(grid.tile_at(Vector::new(0, 0)), None);
        assert_eq!(grid.tile_at(Vector::new(-5, 7)), None);
    }

    #[test]
    fn glyph_set_reflects_map_contents() {
        let grid = Grid::with_traps(2, 2, trap(), &[(0, 1), (1, 1)]).unwrap();
        let glyphs = grid.glyphs();
        assert_eq!(glyphs.len(), 1);
        assert!(glyphs.contains("##"));
    }

    #[test]
    fn mismatched_cell_count_is_rejected() {
        assert!(Grid::new(2, 2, vec![Cell::Empty; 3]).is_err());
        assert!(Grid::with_traps(2, 2, trap(), &[(5, 0)]).is_err());
    }
}
