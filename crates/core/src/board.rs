//! Board module - manages the N x N tile grid
//!
//! Each cell holds 0 (empty) or a power of two >= 2.
//! Uses a flat row-major vector so a grid of any size is a single allocation.
//! Coordinates: (row, col) where row 0 is the top edge and col 0 the left edge.

use rand::Rng;

use crate::error::{EngineError, Result};
use crate::types::{MIN_BOARD_SIZE, SPAWN_FOUR_PROBABILITY, SPAWN_HIGH_VALUE, SPAWN_LOW_VALUE};

/// A tile placed by [`Grid::spawn_tile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spawned {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

/// The game grid - N columns x N rows using flat vector storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    size: usize,
    /// Flat vector of cells, row-major order (row * size + col)
    cells: Vec<u32>,
}

/// True for the values a cell may legally hold.
#[inline(always)]
pub fn is_tile_value(value: u32) -> bool {
    value == 0 || (value >= 2 && value.is_power_of_two())
}

impl Grid {
    /// Create an empty grid
    pub fn new(size: usize) -> Result<Self> {
        if size < MIN_BOARD_SIZE {
            return Err(EngineError::invalid(format!(
                "grid size must be at least {MIN_BOARD_SIZE}, got {size}"
            )));
        }
        Ok(Self {
            size,
            cells: vec![0; size * size],
        })
    }

    /// Build a grid from explicit rows.
    ///
    /// Rows must form a square of dimension >= 2 and every value must be 0 or
    /// a power of two >= 2.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        let mut grid = Self::new(size)?;
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return Err(EngineError::invalid(format!(
                    "row {r} has {} cells, expected {size}",
                    row.len()
                )));
            }
            if let Some(&bad) = row.iter().find(|&&v| !is_tile_value(v)) {
                return Err(EngineError::invalid(format!(
                    "row {r} holds {bad}, which is not 0 or a power of two"
                )));
            }
            grid.cells[r * size..(r + 1) * size].copy_from_slice(row);
        }
        Ok(grid)
    }

    /// Build from parts already known to be valid.
    pub(crate) fn from_parts(size: usize, cells: Vec<u32>) -> Self {
        debug_assert_eq!(cells.len(), size * size);
        Self { size, cells }
    }

    /// Calculate flat index from (row, col) coordinates
    #[inline(always)]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.size || col >= self.size {
            return None;
        }
        Some(row * self.size + col)
    }

    /// Grid dimension N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get cell at (row, col); `None` if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Set cell at (row, col). Returns false if out of bounds.
    pub(crate) fn set(&mut self, row: usize, col: usize, value: u32) -> bool {
        match self.index(row, col) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, row: usize) -> &[u32] {
        &self.cells[row * self.size..(row + 1) * self.size]
    }

    pub(crate) fn row_mut(&mut self, row: usize) -> &mut [u32] {
        &mut self.cells[row * self.size..(row + 1) * self.size]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.cells.chunks_exact(self.size)
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.rows().map(|row| row.to_vec()).collect()
    }

    /// Empty cells as (row, col), row-major
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(move |(i, _)| (i / size, i % size))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&v| v != 0)
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&v| u64::from(v)).sum()
    }

    /// True if two orthogonally adjacent cells hold the same non-zero value.
    ///
    /// Checking the right and down neighbour of every cell covers every pair.
    pub fn has_adjacent_pair(&self) -> bool {
        let n = self.size;
        for r in 0..n {
            for c in 0..n {
                let v = self.cells[r * n + c];
                if v == 0 {
                    continue;
                }
                if c + 1 < n && self.cells[r * n + c + 1] == v {
                    return true;
                }
                if r + 1 < n && self.cells[(r + 1) * n + c] == v {
                    return true;
                }
            }
        }
        false
    }

    /// Place a random tile on a uniformly chosen empty cell.
    ///
    /// The tile is a 2 with probability 0.9 and a 4 otherwise. Returns `None`
    /// (and leaves the grid and RNG untouched) when the grid is full.
    pub fn spawn_tile<R: Rng>(&mut self, rng: &mut R) -> Option<Spawned> {
        let empty = self.empty_count();
        if empty == 0 {
            return None;
        }

        let pick = rng.random_range(0..empty);
        let value = if rng.random::<f64>() < SPAWN_FOUR_PROBABILITY {
            SPAWN_HIGH_VALUE
        } else {
            SPAWN_LOW_VALUE
        };

        let (row, col) = self.empty_cells().nth(pick)?;
        self.set(row, col, value);
        Some(Spawned { row, col, value })
    }

    /// Swap rows and columns
    pub fn transpose(&self) -> Self {
        let n = self.size;
        let mut cells = vec![0; n * n];
        for r in 0..n {
            for c in 0..n {
                cells[c * n + r] = self.cells[r * n + c];
            }
        }
        Self::from_parts(n, cells)
    }

    /// Reverse the cells within every row (mirror left/right)
    pub fn reverse_each_row(&self) -> Self {
        let mut out = self.clone();
        for r in 0..self.size {
            out.row_mut(r).reverse();
        }
        out
    }

    /// Reverse the order of the rows (mirror top/bottom)
    pub fn reverse_row_order(&self) -> Self {
        let cells = self
            .cells
            .chunks_exact(self.size)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self::from_parts(self.size, cells)
    }
}
