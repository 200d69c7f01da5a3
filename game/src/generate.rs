use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::BoardEngine;
use crate::cascade::random_tile;
use crate::error::BoardError;
use crate::grid::{Grid, Position, Tile};
use crate::matches::has_matches;

pub const DEFAULT_GENERATION_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationMode {
    /// Place cells row-major, never picking a tile that would complete a line
    /// of three with the two cells to its left or above it.
    #[default]
    LookBack,
    /// Fill uniformly at random and start over while any match exists.
    /// Needs far more attempts than `LookBack` on small symbol sets.
    Reroll,
}

/// A match-free `size`x`size` board over `symbol_count` symbols, using the
/// default look-back generator and attempt budget.
pub fn generate<R: Rng + ?Sized>(
    size: usize,
    symbol_count: usize,
    rng: &mut R,
) -> Result<Grid, BoardError> {
    BoardEngine::new(size, symbol_count).generate(rng)
}

/// One look-back attempt. `None` when some cell has no legal tile left.
pub(crate) fn look_back_attempt<R: Rng + ?Sized>(
    size: usize,
    symbol_count: usize,
    rng: &mut R,
) -> Option<Grid> {
    let mut grid = Grid::empty(size);
    let mut candidates = Vec::with_capacity(symbol_count);
    for pos in grid.positions() {
        candidates.clear();
        candidates.extend(Tile::all(symbol_count).filter(|&t| !completes_line(&grid, pos, t)));
        if candidates.is_empty() {
            return None;
        }
        let pick = candidates[rng.gen_range(0..candidates.len())];
        grid.set(pos, Some(pick));
    }
    Some(grid)
}

/// One reroll attempt. `None` when the random fill contains a match.
pub(crate) fn reroll_attempt<R: Rng + ?Sized>(
    size: usize,
    symbol_count: usize,
    rng: &mut R,
) -> Option<Grid> {
    let mut grid = Grid::empty(size);
    for pos in grid.positions() {
        grid.set(pos, Some(random_tile(symbol_count, rng)));
    }
    (!has_matches(&grid)).then_some(grid)
}

/// Whether placing `tile` at `pos` would extend the two already placed cells
/// to its left, or the two above it, into a run of three.
fn completes_line(grid: &Grid, pos: Position, tile: Tile) -> bool {
    let Position { row, col } = pos;
    let left = col >= 2
        && grid.get(Position::new(row, col - 1)) == Some(tile)
        && grid.get(Position::new(row, col - 2)) == Some(tile);
    let up = row >= 2
        && grid.get(Position::new(row - 1, col)) == Some(tile)
        && grid.get(Position::new(row - 2, col)) == Some(tile);
    left || up
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SessionRng;

    #[test]
    fn completes_line_checks_left_and_up_pairs() {
        let g = Grid::from_rows(&["AA.", "B..", "B.."]).unwrap();
        assert!(completes_line(&g, Position::new(0, 2), Tile::new(0)));
        assert!(!completes_line(&g, Position::new(0, 2), Tile::new(1)));
        let g = Grid::from_rows(&["B..", "B..", "..."]).unwrap();
        assert!(completes_line(&g, Position::new(2, 0), Tile::new(1)));
        assert!(!completes_line(&g, Position::new(2, 0), Tile::new(0)));
    }

    #[test]
    fn look_back_never_fails_with_three_symbols() {
        let mut rng = SessionRng::new(99);
        for _ in 0..50 {
            let g = look_back_attempt(8, 3, &mut rng).expect("three symbols always leave a candidate");
            assert!(g.is_full());
            assert!(!has_matches(&g));
        }
    }

    #[test]
    fn look_back_with_two_symbols_can_dead_end() {
        // Two symbols: a cell whose left pair is AA and upper pair is BB has no legal tile.
        let mut rng = SessionRng::new(1);
        let dead_ends = (0..200)
            .filter(|_| look_back_attempt(6, 2, &mut rng).is_none())
            .count();
        assert!(dead_ends > 0);
    }

    #[test]
    fn reroll_attempt_only_returns_clean_boards() {
        let mut rng = SessionRng::new(4);
        let clean: Vec<Grid> = (0..500)
            .filter_map(|_| reroll_attempt(4, 4, &mut rng))
            .collect();
        assert!(!clean.is_empty());
        assert!(clean.iter().all(|g| !has_matches(g)));
    }
}
