use std::time::Duration;

use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::BoardError;
use crate::grid::Position;
use crate::session::Session;

/// Everything a player (or a script) can do to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BloomAction {
    Swap { a: Position, b: Position },
    Select(Position),
    Tick { millis: u64 },
    Pause,
    Resume,
    Finish,
    Noop,
}

/// [`GameLogic`] view of a seeded game, for headless replays and history.
#[derive(Debug, Clone)]
pub struct BloomGame {
    initial: Session,
}

impl BloomGame {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, BoardError> {
        Ok(Self {
            initial: Session::new_game(config, seed)?,
        })
    }

    pub fn standard(seed: u64) -> Result<Self, BoardError> {
        Self::new(GameConfig::default(), seed)
    }
}

impl GameLogic for BloomGame {
    type State = Session;
    type Input = BloomAction;

    fn initial_state(&self) -> Self::State {
        self.initial.clone()
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        apply_action(&mut next, input);
        next
    }
}

/// Actions that the session refuses (bad positions, paused, round over)
/// leave it as it was.
pub fn apply_action(session: &mut Session, action: BloomAction) {
    match action {
        BloomAction::Swap { a, b } => {
            let _ = session.attempt_swap(a, b);
        }
        BloomAction::Select(pos) => {
            let _ = session.select(pos);
        }
        BloomAction::Tick { millis } => {
            session.tick(Duration::from_millis(millis));
        }
        BloomAction::Pause => session.pause(),
        BloomAction::Resume => session.resume(),
        BloomAction::Finish => {
            session.finish();
        }
        BloomAction::Noop => {}
    }
}
