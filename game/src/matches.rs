use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position, Tile};

pub const MIN_RUN_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}

/// A maximal line of at least [`MIN_RUN_LEN`] identical tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Run {
    pub axis: Axis,
    pub start: Position,
    pub len: usize,
    pub tile: Tile,
}

impl Run {
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let Run {
            axis, start, len, ..
        } = *self;
        (0..len).map(move |i| match axis {
            Axis::Row => Position::new(start.row, start.col + i),
            Axis::Column => Position::new(start.row + i, start.col),
        })
    }
}

/// Every qualifying run, all horizontal runs (top to bottom) before all
/// vertical runs (left to right). A tile may appear in one run of each axis.
pub fn find_runs(grid: &Grid) -> Vec<Run> {
    let n = grid.size();
    let mut runs = Vec::new();
    for row in 0..n {
        scan_line(
            (0..n).map(|col| Position::new(row, col)),
            grid,
            Axis::Row,
            &mut runs,
        );
    }
    for col in 0..n {
        scan_line(
            (0..n).map(|row| Position::new(row, col)),
            grid,
            Axis::Column,
            &mut runs,
        );
    }
    runs
}

/// Union of the positions covered by any run.
pub fn find_matches(grid: &Grid) -> BTreeSet<Position> {
    matched_positions(&find_runs(grid))
}

pub fn has_matches(grid: &Grid) -> bool {
    !find_runs(grid).is_empty()
}

pub fn matched_positions(runs: &[Run]) -> BTreeSet<Position> {
    runs.iter().flat_map(Run::positions).collect()
}

fn scan_line(
    line: impl Iterator<Item = Position>,
    grid: &Grid,
    axis: Axis,
    out: &mut Vec<Run>,
) {
    let mut current: Option<(Tile, Position, usize)> = None;
    for pos in line {
        let cell = grid.get(pos);
        current = match (current, cell) {
            (Some((tile, start, len)), Some(t)) if t == tile => Some((tile, start, len + 1)),
            (prev, cell) => {
                flush(prev, axis, out);
                cell.map(|t| (t, pos, 1))
            }
        };
    }
    flush(current, axis, out);
}

fn flush(run: Option<(Tile, Position, usize)>, axis: Axis, out: &mut Vec<Run>) {
    if let Some((tile, start, len)) = run {
        if len >= MIN_RUN_LEN {
            out.push(Run {
                axis,
                start,
                len,
                tile,
            });
        }
    }
}
