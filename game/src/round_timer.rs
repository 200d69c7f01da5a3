use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TIME_LIMIT_SECONDS;

/// Countdown for one timed round. Time only advances through explicit ticks,
/// so a session replays identically no matter how fast it is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
    #[serde(with = "crate::serde_duration")]
    limit: Duration,
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIME_LIMIT_SECONDS))
    }
}

impl RoundTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    pub fn is_up(&self) -> bool {
        self.elapsed >= self.limit
    }

    pub fn tick_if_running(&mut self, dt: Duration, running: bool) {
        if !running || self.is_up() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_is_forty_five_seconds() {
        let t = RoundTimer::default();
        assert_eq!(t.limit(), Duration::from_secs(45));
        assert_eq!(t.remaining(), Duration::from_secs(45));
    }

    #[test]
    fn paused_ticks_do_not_count() {
        let mut t = RoundTimer::new(Duration::from_secs(10));
        t.tick_if_running(Duration::from_millis(1500), false);
        assert_eq!(t.elapsed(), Duration::ZERO);

        t.tick_if_running(Duration::from_millis(2500), true);
        assert_eq!(t.elapsed(), Duration::from_millis(2500));
        assert_eq!(t.remaining(), Duration::from_millis(7500));
    }

    #[test]
    fn overshooting_tick_clamps_to_the_limit() {
        let mut t = RoundTimer::new(Duration::from_secs(3));
        t.tick_if_running(Duration::from_secs(7), true);
        assert!(t.is_up());
        assert_eq!(t.elapsed(), Duration::from_secs(3));
        assert_eq!(t.remaining(), Duration::ZERO);

        t.tick_if_running(Duration::from_secs(1), true);
        assert_eq!(t.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn serializes_durations_as_millis() {
        let mut t = RoundTimer::new(Duration::from_secs(2));
        t.tick_if_running(Duration::from_millis(250), true);
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json["elapsed"], 250);
        assert_eq!(json["limit"], 2000);
    }
}
