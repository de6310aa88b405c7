//! Grid representation shared by the spatial games.
//!
//! This module contains:
//! - `Coord`: a (row, col) position
//! - `Grid<T>`: a fixed-size rectangular grid with bounds-checked access
//! - `Cell` / `CellStatus`: the naval battle cell, with an occupant set at
//!   setup time and a status that only moves forward from `Untouched`
//!
//! Chess reuses `Grid<Option<Piece>>`; the naval battle uses `Board`.

use crate::error::GameError;
use serde::{Deserialize, Serialize};

/// Position on a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset this coordinate by (dr, dc)
    pub fn offset(&self, dr: i32, dc: i32) -> Coord {
        Coord::new(self.row + dr, self.col + dc)
    }
}

/// Fixed-size 2D grid stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: i32,
    cols: i32,
    cells: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Create a grid filled with `T::default()`
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows as i32,
            cols: cols as i32,
            cells: vec![T::default(); rows * cols],
        }
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        (0..self.rows).contains(&coord.row) && (0..self.cols).contains(&coord.col)
    }

    fn index(&self, coord: Coord) -> Result<usize, GameError> {
        if !self.in_bounds(coord) {
            return Err(GameError::OutOfBounds {
                row: coord.row,
                col: coord.col,
            });
        }
        Ok((coord.row * self.cols + coord.col) as usize)
    }

    /// Cell at a position, failing with `OutOfBounds` off the grid
    pub fn get(&self, coord: Coord) -> Result<&T, GameError> {
        let idx = self.index(coord)?;
        Ok(&self.cells[idx])
    }

    pub fn get_mut(&mut self, coord: Coord) -> Result<&mut T, GameError> {
        let idx = self.index(coord)?;
        Ok(&mut self.cells[idx])
    }

    /// Replace the value at a position, returning the previous one
    pub fn set(&mut self, coord: Coord, value: T) -> Result<T, GameError> {
        let slot = self.get_mut(coord)?;
        Ok(std::mem::replace(slot, value))
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Coord::new(r, c)))
    }

    /// All (coordinate, value) pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &T)> + '_ {
        self.coords().zip(self.cells.iter())
    }
}

/// Attack status of a naval cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellStatus {
    #[default]
    Untouched,
    Hit,
    Miss,
}

/// Identifier of a ship within one fleet
pub type ShipId = u8;

/// A naval cell: optional occupant plus attack status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub occupant: Option<ShipId>,
    pub status: CellStatus,
}

/// Board of naval cells
pub type Board = Grid<Cell>;

/// Create an empty board
pub fn create_board(rows: usize, cols: usize) -> Board {
    Board::new(rows, cols)
}

impl Grid<Cell> {
    /// Cell at (r, c)
    pub fn cell_at(&self, row: i32, col: i32) -> Result<&Cell, GameError> {
        self.get(Coord::new(row, col))
    }

    /// Set the occupant of an empty cell.
    ///
    /// Occupants are only assigned during setup: an occupied cell rejects a
    /// second occupant with `Overlap`.
    pub fn place_occupant(&mut self, coord: Coord, ship: ShipId) -> Result<(), GameError> {
        let cell = self.get_mut(coord)?;
        if cell.occupant.is_some() {
            return Err(GameError::Overlap);
        }
        cell.occupant = Some(ship);
        Ok(())
    }

    /// Move an untouched cell to `Hit` or `Miss`.
    ///
    /// Returns `false` (and changes nothing) when the cell was already
    /// attacked; status never reverts.
    pub fn mark_status(&mut self, coord: Coord, status: CellStatus) -> Result<bool, GameError> {
        let cell = self.get_mut(coord)?;
        if cell.status != CellStatus::Untouched || status == CellStatus::Untouched {
            return Ok(false);
        }
        cell.status = status;
        Ok(true)
    }

    /// Coordinates no one has attacked yet
    pub fn untouched(&self) -> Vec<Coord> {
        self.iter()
            .filter(|(_, cell)| cell.status == CellStatus::Untouched)
            .map(|(coord, _)| coord)
            .collect()
    }
}
