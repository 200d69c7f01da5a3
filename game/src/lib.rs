//! Match-3 board simulation: a square grid of symbol tiles, adjacent swaps,
//! and chained clear/drop/refill cascades with depth-multiplied scoring.

pub mod agent;
pub mod board;
pub mod cascade;
pub mod config;
pub mod error;
pub mod generate;
pub mod grid;
pub mod matches;
pub mod observe;
pub mod rng;
pub mod round_timer;
pub mod scoring;
pub mod serde_duration;
pub mod session;

pub use agent::{BloomAction, BloomGame};
pub use board::{BoardEngine, SwapOutcome};
pub use cascade::{Cascade, CascadePhase, CascadeReport, CascadeStep};
pub use config::GameConfig;
pub use error::{BoardError, ConfigError, SessionError};
pub use generate::{GenerationMode, generate};
pub use grid::{Grid, Position, Tile};
pub use matches::{Run, find_matches, find_runs};
pub use observe::{BoardEvent, BoardObserver, NoopObserver, RecordingObserver};
pub use rng::SessionRng;
pub use round_timer::RoundTimer;
pub use scoring::ScoringRule;
pub use session::{RoundSummary, Selection, Session};
