use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, Position, Tile};
use crate::matches::{Run, find_runs, has_matches, matched_positions};
use crate::observe::{BoardObserver, NoopObserver};
use crate::scoring::{ScoringRule, cascade_step_score};

/// Where one resolution currently is. A step walks
/// `MatchesFound -> Scoring -> Clearing -> Gravity -> Refill` and then either
/// finds new matches or settles back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadePhase {
    Idle,
    MatchesFound,
    Scoring,
    Clearing,
    Gravity,
    Refill,
}

impl CascadePhase {
    /// The phases every completed step passes through, in order.
    pub const STEP: [CascadePhase; 5] = [
        CascadePhase::MatchesFound,
        CascadePhase::Scoring,
        CascadePhase::Clearing,
        CascadePhase::Gravity,
        CascadePhase::Refill,
    ];

    /// `found_matches` is only consulted when leaving `Idle` or `Refill`.
    pub fn next(self, found_matches: bool) -> CascadePhase {
        match self {
            CascadePhase::Idle | CascadePhase::Refill => {
                if found_matches {
                    CascadePhase::MatchesFound
                } else {
                    CascadePhase::Idle
                }
            }
            CascadePhase::MatchesFound => CascadePhase::Scoring,
            CascadePhase::Scoring => CascadePhase::Clearing,
            CascadePhase::Clearing => CascadePhase::Gravity,
            CascadePhase::Gravity => CascadePhase::Refill,
        }
    }
}

/// One detect -> clear -> drop -> refill cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStep {
    /// 1 for the step triggered by the swap itself.
    pub depth: usize,
    pub runs: Vec<Run>,
    pub matched: BTreeSet<Position>,
    pub base_score: u64,
    /// `base_score` times `depth`.
    pub score: u64,
    /// The board right after clearing, with matched cells empty.
    pub cleared: Grid,
    /// The board after gravity and refill.
    pub settled: Grid,
    pub refilled: usize,
}

impl CascadeStep {
    /// The phases this step walked through, followed by the phase the
    /// settled board leaves the machine in: `MatchesFound` when the refill
    /// lined up another run, `Idle` otherwise.
    pub fn phases(&self) -> Vec<CascadePhase> {
        let mut phases = CascadePhase::STEP.to_vec();
        phases.push(CascadePhase::Refill.next(has_matches(&self.settled)));
        phases
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub total_score: u64,
    pub cascade_count: usize,
    pub steps: Vec<CascadeStep>,
    /// Stopped by the cascade cap while matches were still on the board.
    pub capped: bool,
}

/// Lazily resolves a board one step per `next()`, mutating the grid in place.
///
/// The iterator ends when no match remains or the cascade cap is reached.
/// Built through [`crate::BoardEngine::cascade`], which checks the engine
/// and the grid first.
pub struct Cascade<'a, R: ?Sized> {
    grid: &'a mut Grid,
    rng: &'a mut R,
    symbol_count: usize,
    scoring: ScoringRule,
    max_cascades: Option<usize>,
    depth: usize,
    finished: bool,
}

impl<'a, R: Rng + ?Sized> Cascade<'a, R> {
    pub(crate) fn new(
        grid: &'a mut Grid,
        rng: &'a mut R,
        symbol_count: usize,
        scoring: ScoringRule,
        max_cascades: Option<usize>,
    ) -> Self {
        Self {
            grid,
            rng,
            symbol_count,
            scoring,
            max_cascades,
            depth: 0,
            finished: false,
        }
    }

    pub fn cascade_count(&self) -> usize {
        self.depth
    }

    pub fn reached_cap(&self) -> bool {
        self.max_cascades.is_some_and(|cap| self.depth >= cap)
    }

    /// Drains the remaining steps into a report.
    pub fn into_report(self) -> CascadeReport {
        self.into_report_observed(&mut NoopObserver)
    }

    /// Like [`Cascade::into_report`], handing each step to `observer` as it
    /// is produced.
    pub fn into_report_observed<O: BoardObserver + ?Sized>(
        mut self,
        observer: &mut O,
    ) -> CascadeReport {
        let mut steps = Vec::new();
        for step in self.by_ref() {
            observer.on_cascade_step(&step);
            steps.push(step);
        }
        let capped = self.reached_cap() && has_matches(&*self.grid);
        CascadeReport {
            total_score: steps.iter().map(|s| s.score).sum(),
            cascade_count: self.cascade_count(),
            steps,
            capped,
        }
    }
}

impl<R: Rng + ?Sized> Iterator for Cascade<'_, R> {
    type Item = CascadeStep;

    fn next(&mut self) -> Option<CascadeStep> {
        if self.finished || self.reached_cap() {
            self.finished = true;
            return None;
        }

        let runs = find_runs(&*self.grid);
        if runs.is_empty() {
            self.finished = true;
            return None;
        }

        self.depth += 1;
        let matched = matched_positions(&runs);
        let base_score = self.scoring.base_score(&runs, &matched);
        let score = cascade_step_score(base_score, self.depth);

        for &pos in &matched {
            self.grid.set(pos, None);
        }
        let cleared = self.grid.clone();

        apply_gravity(&mut *self.grid);
        let refilled = refill(&mut *self.grid, self.symbol_count, &mut *self.rng);

        Some(CascadeStep {
            depth: self.depth,
            runs,
            matched,
            base_score,
            score,
            cleared,
            settled: self.grid.clone(),
            refilled,
        })
    }
}

/// Compacts every column toward the bottom, keeping the tiles' order, and
/// leaves the empty cells at the top.
pub fn apply_gravity(grid: &mut Grid) {
    let n = grid.size();
    for col in 0..n {
        let mut write = n;
        for row in (0..n).rev() {
            let pos = Position::new(row, col);
            if let Some(tile) = grid.get(pos) {
                write -= 1;
                if write != row {
                    grid.set(Position::new(write, col), Some(tile));
                    grid.set(pos, None);
                }
            }
        }
    }
}

/// Fills every empty cell with an independent uniform pick, row-major.
/// New matches may appear; the caller is expected to look again.
pub fn refill<R: Rng + ?Sized>(grid: &mut Grid, symbol_count: usize, rng: &mut R) -> usize {
    let mut filled = 0;
    for pos in grid.positions() {
        if grid.get(pos).is_none() {
            grid.set(pos, Some(random_tile(symbol_count, rng)));
            filled += 1;
        }
    }
    filled
}

pub(crate) fn random_tile<R: Rng + ?Sized>(symbol_count: usize, rng: &mut R) -> Tile {
    Tile::new(rng.gen_range(0..symbol_count) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SessionRng;

    fn grid(rows: &[&str]) -> Grid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn gravity_keeps_column_order_and_lifts_gaps() {
        let mut g = grid(&["AB.", ".CA", "D.B"]);
        apply_gravity(&mut g);
        assert_eq!(g.to_glyph_rows(), ["...", "ABA", "DCB"]);
    }

    #[test]
    fn gravity_on_a_full_grid_is_a_no_op() {
        let mut g = grid(&["AB", "CD"]);
        let before = g.clone();
        apply_gravity(&mut g);
        assert_eq!(g, before);
    }

    #[test]
    fn refill_fills_exactly_the_gaps() {
        let mut g = grid(&["A..", "BCA", ".DB"]);
        let mut rng = SessionRng::new(5);
        assert_eq!(refill(&mut g, 4, &mut rng), 3);
        assert!(g.is_full());
        assert_eq!(g.get(Position::new(1, 1)), Some(Tile::new(2)));
        assert!(g.cells().iter().flatten().all(|t| t.symbol() < 4));
    }

    #[test]
    fn phase_machine_cycles_through_a_step() {
        let mut phase = CascadePhase::Idle.next(true);
        let mut walked = vec![phase];
        while phase != CascadePhase::Refill {
            phase = phase.next(true);
            walked.push(phase);
        }
        assert_eq!(walked, CascadePhase::STEP);
        assert_eq!(phase.next(false), CascadePhase::Idle);
        assert_eq!(phase.next(true), CascadePhase::MatchesFound);
        assert_eq!(CascadePhase::Idle.next(false), CascadePhase::Idle);
    }

    #[test]
    fn step_phases_end_on_what_the_settled_board_holds() {
        let mut g = grid(&["AAA", "AAA", "AAA"]);
        let mut rng = SessionRng::new(1);
        let step = Cascade::new(&mut g, &mut rng, 1, ScoringRule::PerRun, Some(1))
            .next()
            .expect("full board matches");
        let phases = step.phases();
        assert_eq!(phases[..5], CascadePhase::STEP);
        assert_eq!(phases[5], CascadePhase::MatchesFound);
    }

    #[test]
    fn single_symbol_board_keeps_cascading_until_capped() {
        // With one symbol every refill rebuilds the same full match.
        let mut g = grid(&["AAA", "AAA", "AAA"]);
        let mut rng = SessionRng::new(1);
        let report = Cascade::new(&mut g, &mut rng, 1, ScoringRule::PerRun, Some(4)).into_report();
        assert_eq!(report.cascade_count, 4);
        assert!(report.capped);
        // 6 runs of 3 per step, depth 1..=4.
        assert_eq!(report.total_score, 600 * (1 + 2 + 3 + 4));
    }

    #[test]
    fn settled_board_yields_no_steps() {
        let mut g = grid(&["ABA", "BAB", "ABA"]);
        let mut rng = SessionRng::new(1);
        let mut cascade = Cascade::new(&mut g, &mut rng, 4, ScoringRule::PerRun, None);
        assert!(cascade.next().is_none());
        assert!(cascade.next().is_none());
        assert_eq!(cascade.cascade_count(), 0);
    }
}
