//! Slide module - the move algorithm
//!
//! Every direction is reduced to a single "collapse toward index 0" pass:
//!
//! 1. [`orient`] the grid so the move direction points at column 0
//! 2. [`collapse_row`] each oriented row (compact, merge, re-pad)
//! 3. [`unorient`] with the exact inverse transform
//!
//! | Direction | orient | unorient |
//! |-----------|--------|----------|
//! | Left  | identity | identity |
//! | Right | reverse each row | reverse each row |
//! | Up    | transpose | transpose |
//! | Down  | reverse row order, then transpose | transpose, then reverse row order |
//!
//! Down is the only non-involutive transform: its inverse applies the two steps
//! in the opposite order.

use crate::board::Grid;
use crate::types::Direction;

/// Outcome of sliding a grid, before any tile is spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub grid: Grid,
    pub score_delta: u64,
    pub changed: bool,
}

/// Transform `grid` so that `dir` collapses toward column 0 of each row.
pub fn orient(grid: &Grid, dir: Direction) -> Grid {
    match dir {
        Direction::Left => grid.clone(),
        Direction::Right => grid.reverse_each_row(),
        Direction::Up => grid.transpose(),
        Direction::Down => grid.reverse_row_order().transpose(),
    }
}

/// Exact inverse of [`orient`].
pub fn unorient(grid: &Grid, dir: Direction) -> Grid {
    match dir {
        Direction::Left => grid.clone(),
        Direction::Right => grid.reverse_each_row(),
        Direction::Up => grid.transpose(),
        Direction::Down => grid.transpose().reverse_row_order(),
    }
}

/// Collapse one row toward index 0.
///
/// Zeros are removed (stable), then adjacent equal pairs are merged left to
/// right. A tile merges at most once per call, so `[2, 2, 2, 2]` becomes
/// `[4, 4, 0, 0]`. The row is re-padded with zeros to its original length.
///
/// Returns the new row and the sum of the merged values.
///
/// # Examples
///
/// ```
/// use tui_2048_core::collapse_row;
///
/// assert_eq!(collapse_row(&[2, 2, 0, 0]), (vec![4, 0, 0, 0], 4));
/// assert_eq!(collapse_row(&[0, 2, 0, 2]), (vec![4, 0, 0, 0], 4));
/// assert_eq!(collapse_row(&[4, 4, 8, 8]), (vec![8, 16, 0, 0], 24));
/// ```
pub fn collapse_row(row: &[u32]) -> (Vec<u32>, u64) {
    let mut out = Vec::with_capacity(row.len());
    let mut score_delta = 0u64;

    let mut tiles = row.iter().copied().filter(|&v| v != 0).peekable();
    while let Some(tile) = tiles.next() {
        // A pair whose sum would not fit in a cell is left unmerged.
        let merged = match tiles.peek() {
            Some(&next) if next == tile => tile.checked_mul(2),
            _ => None,
        };
        match merged {
            Some(value) => {
                tiles.next();
                score_delta += u64::from(value);
                out.push(value);
            }
            None => out.push(tile),
        }
    }

    out.resize(row.len(), 0);
    (out, score_delta)
}

/// Slide every tile of `grid` in `dir`. No randomness.
///
/// A row counts as changed when its oriented form before and after collapsing
/// differ element-wise; the slide is `changed` when any row is.
pub fn slide(grid: &Grid, dir: Direction) -> Slide {
    let mut oriented = orient(grid, dir);
    let mut score_delta = 0u64;
    let mut changed = false;

    for r in 0..oriented.size() {
        let (collapsed, delta) = collapse_row(oriented.row(r));
        if collapsed.as_slice() != oriented.row(r) {
            changed = true;
            oriented.row_mut(r).copy_from_slice(&collapsed);
        }
        score_delta += delta;
    }

    Slide {
        grid: unorient(&oriented, dir),
        score_delta,
        changed,
    }
}
