use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cascade::{Cascade, CascadeReport, CascadeStep};
use crate::config::GameConfig;
use crate::error::BoardError;
use crate::generate::{
    DEFAULT_GENERATION_ATTEMPTS, GenerationMode, look_back_attempt, reroll_attempt,
};
use crate::grid::{
    DEFAULT_GRID_SIZE, DEFAULT_SYMBOL_COUNT, Grid, MAX_GRID_SIZE, MAX_SYMBOLS, Position,
};
use crate::matches::has_matches;
use crate::observe::{BoardObserver, NoopObserver};
use crate::scoring::ScoringRule;

/// Result of a structurally valid swap. A swap that creates no match comes
/// back with `accepted == false` and the grid as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub accepted: bool,
    /// The board after the swap and every cascade it triggered.
    pub grid: Grid,
    pub score_delta: u64,
    pub cascade_count: usize,
    /// One entry per cascade step, for callers that animate the chain.
    pub steps: Vec<CascadeStep>,
    pub capped: bool,
}

impl SwapOutcome {
    fn rejected(grid: Grid) -> Self {
        Self {
            accepted: false,
            grid,
            score_delta: 0,
            cascade_count: 0,
            steps: Vec::new(),
            capped: false,
        }
    }

    pub fn steps(&self) -> std::slice::Iter<'_, CascadeStep> {
        self.steps.iter()
    }
}

/// The match-3 rules for one board shape. Holds no board state: every call
/// takes the grid and the random source it should work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEngine {
    size: usize,
    symbol_count: usize,
    max_cascades: Option<usize>,
    scoring: ScoringRule,
    generation: GenerationMode,
    generation_attempts: usize,
}

impl Default for BoardEngine {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE, DEFAULT_SYMBOL_COUNT)
    }
}

impl BoardEngine {
    pub fn new(size: usize, symbol_count: usize) -> Self {
        Self {
            size,
            symbol_count,
            max_cascades: None,
            scoring: ScoringRule::default(),
            generation: GenerationMode::default(),
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.grid_size, config.symbol_count)
            .with_max_cascades(config.max_cascades)
            .with_scoring(config.scoring)
            .with_generation(config.generation, config.generation_attempts)
    }

    pub fn with_max_cascades(mut self, max_cascades: Option<usize>) -> Self {
        self.max_cascades = max_cascades;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringRule) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_generation(mut self, mode: GenerationMode, attempts: usize) -> Self {
        self.generation = mode;
        self.generation_attempts = attempts;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn max_cascades(&self) -> Option<usize> {
        self.max_cascades
    }

    pub fn scoring(&self) -> ScoringRule {
        self.scoring
    }

    pub fn generation(&self) -> GenerationMode {
        self.generation
    }

    pub fn generation_attempts(&self) -> usize {
        self.generation_attempts
    }

    /// Rejects shapes no generator can fill without a match.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.size == 0 || self.size > MAX_GRID_SIZE {
            return Err(BoardError::Configuration(format!(
                "grid size must be between 1 and {MAX_GRID_SIZE}, got {}",
                self.size
            )));
        }
        if self.symbol_count == 0 || self.symbol_count > MAX_SYMBOLS {
            return Err(BoardError::Configuration(format!(
                "symbol count must be between 1 and {MAX_SYMBOLS}, got {}",
                self.symbol_count
            )));
        }
        if self.size >= 3 && self.symbol_count < 3 {
            return Err(BoardError::Configuration(format!(
                "{} symbols cannot fill a {n}x{n} board without matches; at least 3 are needed",
                self.symbol_count,
                n = self.size
            )));
        }
        if self.generation_attempts == 0 {
            return Err(BoardError::Configuration(
                "generation attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Grid, BoardError> {
        self.generate_observed(rng, &mut NoopObserver)
    }

    pub fn generate_observed<R, O>(&self, rng: &mut R, observer: &mut O) -> Result<Grid, BoardError>
    where
        R: Rng + ?Sized,
        O: BoardObserver + ?Sized,
    {
        self.validate()?;
        for attempt in 1..=self.generation_attempts {
            let grid = match self.generation {
                GenerationMode::LookBack => look_back_attempt(self.size, self.symbol_count, rng),
                GenerationMode::Reroll => reroll_attempt(self.size, self.symbol_count, rng),
            };
            if let Some(grid) = grid {
                observer.on_board_generated(attempt);
                return Ok(grid);
            }
        }
        Err(BoardError::GenerationFailed {
            attempts: self.generation_attempts,
        })
    }

    /// Rejects a grid whose shape differs from the one this engine was
    /// configured for.
    pub fn check_grid(&self, grid: &Grid) -> Result<(), BoardError> {
        if grid.size() != self.size {
            return Err(BoardError::Configuration(format!(
                "engine is set up for a {n}x{n} board, got {m}x{m}",
                n = self.size,
                m = grid.size()
            )));
        }
        Ok(())
    }

    /// Step-by-step resolution of `grid`; see [`Cascade`].
    pub fn cascade<'a, R: Rng + ?Sized>(
        &self,
        grid: &'a mut Grid,
        rng: &'a mut R,
    ) -> Result<Cascade<'a, R>, BoardError> {
        self.validate()?;
        self.check_grid(grid)?;
        Ok(Cascade::new(
            grid,
            rng,
            self.symbol_count,
            self.scoring,
            self.max_cascades,
        ))
    }

    pub fn resolve_cascades<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<CascadeReport, BoardError> {
        self.resolve_cascades_observed(grid, rng, &mut NoopObserver)
    }

    pub fn resolve_cascades_observed<R, O>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<CascadeReport, BoardError>
    where
        R: Rng + ?Sized,
        O: BoardObserver + ?Sized,
    {
        Ok(self.cascade(grid, rng)?.into_report_observed(observer))
    }

    pub fn try_swap<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        a: Position,
        b: Position,
        rng: &mut R,
    ) -> Result<SwapOutcome, BoardError> {
        self.try_swap_observed(grid, a, b, rng, &mut NoopObserver)
    }

    /// Swaps `a` and `b` and resolves the resulting chain.
    ///
    /// Engine settings that could never settle a board, a grid of another
    /// size, out-of-bounds and non-adjacent pairs are all errors. A legal swap
    /// that forms no match is undone and reported as not accepted.
    pub fn try_swap_observed<R, O>(
        &self,
        grid: &mut Grid,
        a: Position,
        b: Position,
        rng: &mut R,
        observer: &mut O,
    ) -> Result<SwapOutcome, BoardError>
    where
        R: Rng + ?Sized,
        O: BoardObserver + ?Sized,
    {
        self.validate()?;
        self.check_grid(grid)?;
        grid.check(a)?;
        grid.check(b)?;
        if !a.is_adjacent(b) {
            return Err(BoardError::NotAdjacent { a, b });
        }

        grid.swap(a, b);
        if !has_matches(grid) {
            grid.swap(a, b);
            observer.on_swap_rejected(a, b);
            return Ok(SwapOutcome::rejected(grid.clone()));
        }

        let report = self.resolve_cascades_observed(grid, rng, observer)?;
        Ok(SwapOutcome {
            accepted: true,
            grid: grid.clone(),
            score_delta: report.total_score,
            cascade_count: report.cascade_count,
            steps: report.steps,
            capped: report.capped,
        })
    }
}
