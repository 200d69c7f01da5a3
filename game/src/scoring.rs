use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::matches::{MIN_RUN_LEN, Run};

pub const POINTS_PER_STEP: u64 = 100;

/// How a cascade step's matches turn into base points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoringRule {
    /// `100 * (len - 2)` for every run; crossing runs each count in full.
    #[default]
    PerRun,
    /// `100` for every distinct matched tile.
    MatchedSet,
}

impl ScoringRule {
    pub fn base_score(self, runs: &[Run], matched: &BTreeSet<Position>) -> u64 {
        match self {
            ScoringRule::PerRun => runs.iter().map(|run| run_points(run.len)).sum(),
            ScoringRule::MatchedSet => POINTS_PER_STEP.saturating_mul(matched.len() as u64),
        }
    }
}

/// 3 -> 100, 4 -> 200, 5 -> 300, and so on. Shorter lines score nothing.
pub fn run_points(len: usize) -> u64 {
    if len < MIN_RUN_LEN {
        return 0;
    }
    POINTS_PER_STEP.saturating_mul((len - 2) as u64)
}

/// Chains pay more the deeper they go: the step triggered directly by the
/// player's swap has depth 1.
pub fn cascade_step_score(base: u64, depth: usize) -> u64 {
    base.saturating_mul(depth as u64)
}
