use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{BoardEngine, SwapOutcome};
use crate::config::GameConfig;
use crate::error::{BoardError, SessionError};
use crate::grid::{Grid, Position};
use crate::observe::{BoardObserver, NoopObserver};
use crate::rng::SessionRng;
use crate::round_timer::RoundTimer;

/// What a click on the board did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// First click: the tile is now under the cursor.
    Selected(Position),
    /// The click dropped the cursor without swapping (same tile again, or a
    /// tile that is not a neighbour of the selected one).
    Cleared,
    /// Second click on a neighbour: the swap was attempted.
    Swapped(SwapOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub score: u64,
    pub swaps_accepted: u32,
    pub swaps_rejected: u32,
    /// Deepest cascade any single swap produced.
    pub longest_chain: usize,
}

/// One game: the board, its random stream, the score and the round clock.
///
/// Everything that influences the next move lives in here, so a session
/// serialized mid-round resumes exactly where it left off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    config: GameConfig,
    engine: BoardEngine,
    grid: Grid,
    rng: SessionRng,
    score: u64,
    round_timer: RoundTimer,
    playing: bool,
    finished: bool,
    selection: Option<Position>,
    swaps_accepted: u32,
    swaps_rejected: u32,
    longest_chain: usize,
}

impl Session {
    pub fn new_game(config: GameConfig, seed: u64) -> Result<Self, BoardError> {
        Self::new_game_observed(config, seed, &mut NoopObserver)
    }

    pub fn new_game_observed<O: BoardObserver + ?Sized>(
        config: GameConfig,
        seed: u64,
        observer: &mut O,
    ) -> Result<Self, BoardError> {
        let engine = BoardEngine::from_config(&config);
        let mut rng = SessionRng::new(seed);
        let grid = engine.generate_observed(&mut rng, observer)?;
        Ok(Self {
            round_timer: RoundTimer::new(config.time_limit()),
            config,
            engine,
            grid,
            rng,
            score: 0,
            playing: true,
            finished: false,
            selection: None,
            swaps_accepted: 0,
            swaps_rejected: 0,
            longest_chain: 0,
        })
    }

    pub fn current_grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn engine(&self) -> &BoardEngine {
        &self.engine
    }

    pub fn round_timer(&self) -> &RoundTimer {
        &self.round_timer
    }

    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    pub fn is_over(&self) -> bool {
        self.finished || self.round_timer.is_up()
    }

    pub fn is_playing(&self) -> bool {
        self.playing && !self.is_over()
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// No effect once the round is over.
    pub fn resume(&mut self) {
        if !self.is_over() {
            self.playing = true;
        }
    }

    /// Advances the round clock by `dt` if the session is playing. Returns
    /// whether the round is over afterwards.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let running = self.is_playing();
        self.round_timer.tick_if_running(dt, running);
        if self.round_timer.is_up() {
            self.selection = None;
        }
        self.is_over()
    }

    pub fn attempt_swap(&mut self, a: Position, b: Position) -> Result<SwapOutcome, SessionError> {
        self.attempt_swap_observed(a, b, &mut NoopObserver)
    }

    pub fn attempt_swap_observed<O: BoardObserver + ?Sized>(
        &mut self,
        a: Position,
        b: Position,
        observer: &mut O,
    ) -> Result<SwapOutcome, SessionError> {
        self.ensure_playing()?;
        let outcome = self
            .engine
            .try_swap_observed(&mut self.grid, a, b, &mut self.rng, observer)?;
        if outcome.accepted {
            self.score = self.score.saturating_add(outcome.score_delta);
            self.swaps_accepted += 1;
            self.longest_chain = self.longest_chain.max(outcome.cascade_count);
        } else {
            self.swaps_rejected += 1;
        }
        Ok(outcome)
    }

    pub fn select(&mut self, pos: Position) -> Result<Selection, SessionError> {
        self.select_observed(pos, &mut NoopObserver)
    }

    /// Click-to-select, click-again-to-swap. The cursor is cleared after any
    /// second click, whether or not a swap happened.
    pub fn select_observed<O: BoardObserver + ?Sized>(
        &mut self,
        pos: Position,
        observer: &mut O,
    ) -> Result<Selection, SessionError> {
        self.ensure_playing()?;
        self.grid.check(pos)?;
        let Some(first) = self.selection.take() else {
            self.selection = Some(pos);
            return Ok(Selection::Selected(pos));
        };
        if !first.is_adjacent(pos) {
            return Ok(Selection::Cleared);
        }
        self.attempt_swap_observed(first, pos, observer)
            .map(Selection::Swapped)
    }

    /// Ends the round now and reports how it went. Calling it again returns
    /// the same summary.
    pub fn finish(&mut self) -> RoundSummary {
        self.finished = true;
        self.playing = false;
        self.selection = None;
        self.summary()
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            score: self.score,
            swaps_accepted: self.swaps_accepted,
            swaps_rejected: self.swaps_rejected,
            longest_chain: self.longest_chain,
        }
    }

    fn ensure_playing(&self) -> Result<(), SessionError> {
        if self.is_over() {
            return Err(SessionError::RoundOver);
        }
        if !self.playing {
            return Err(SessionError::Paused);
        }
        Ok(())
    }
}
