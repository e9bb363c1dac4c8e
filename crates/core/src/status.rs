//! Status module - terminal-state detection
//!
//! Status is a pure function of the grid and the win threshold. The engine
//! caches the result after every mutation, but it can always be recomputed.

use crate::board::Grid;
use crate::types::GameStatus;

/// Compute the status of `grid`.
///
/// - **Won** if any tile equals `win_tile`
/// - **Lost** if no cell is empty and no two orthogonal neighbours are equal
/// - **Playing** otherwise
///
/// A win takes precedence over a full, stuck grid.
pub fn compute_status(grid: &Grid, win_tile: u32) -> GameStatus {
    if grid.cells().iter().any(|&v| v == win_tile) {
        return GameStatus::Won;
    }
    if grid.is_full() && !grid.has_adjacent_pair() {
        return GameStatus::Lost;
    }
    GameStatus::Playing
}

/// True if some direction would change the grid.
pub fn has_moves(grid: &Grid) -> bool {
    !grid.is_full() || grid.has_adjacent_pair()
}
