use crate::cascade::CascadeStep;
use crate::grid::Position;

/// Optional hooks into board operations, for logging and diagnostics.
///
/// Every hook defaults to a no-op so callers only override what they need.
pub trait BoardObserver {
    fn on_board_generated(&mut self, _attempts: usize) {}
    fn on_swap_rejected(&mut self, _a: Position, _b: Position) {}
    fn on_cascade_step(&mut self, _step: &CascadeStep) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BoardObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Generated { attempts: usize },
    SwapRejected { a: Position, b: Position },
    CascadeStep { depth: usize, score: u64, cleared: usize },
}

/// Keeps every event in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Vec<BoardEvent>,
}

impl BoardObserver for RecordingObserver {
    fn on_board_generated(&mut self, attempts: usize) {
        self.events.push(BoardEvent::Generated { attempts });
    }

    fn on_swap_rejected(&mut self, a: Position, b: Position) {
        self.events.push(BoardEvent::SwapRejected { a, b });
    }

    fn on_cascade_step(&mut self, step: &CascadeStep) {
        self.events.push(BoardEvent::CascadeStep {
            depth: step.depth,
            score: step.score,
            cleared: step.matched.len(),
        });
    }
}
