use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bloom::Session;
use chrono::{DateTime, Utc};
use engine::TimeMachine;
use serde::{Deserialize, Serialize};

pub const STATE_PATH_ENV: &str = "BLOOM_STATE_PATH";
const DEFAULT_STATE_PATH: &str = ".bloom/session.json";

/// The saved game between `bloomctl` invocations: every session state so far,
/// plus enough wall-clock bookkeeping to run the round timer for timed games.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStore {
    pub seed: u64,
    /// When set, real time between commands counts against the round.
    pub timed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: TimeMachine<Session>,
}

impl SessionStore {
    pub fn new(session: Session, seed: u64, timed: bool, now: DateTime<Utc>) -> Self {
        Self {
            seed,
            timed,
            created_at: now,
            updated_at: now,
            history: TimeMachine::new(session),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "No session at {} (start one with `bloomctl new`)",
                path.display()
            );
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let store: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if store.history.frame() >= store.history.len() {
            bail!("Corrupt session history in {}", path.display());
        }
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        self.history.state()
    }

    /// Applies `f` to a copy of the current session and records the result
    /// as a new frame, dropping any frames ahead of the cursor. Nothing is
    /// recorded when `f` fails.
    pub fn apply<T>(
        &mut self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<T> {
        let mut next = self.session().clone();
        if self.timed {
            next.tick(self.elapsed_since_update(now));
        }
        let out = f(&mut next);
        if out.is_ok() || next != *self.session() {
            self.history.record(next);
            self.updated_at = now;
        }
        out
    }

    pub fn elapsed_since_update(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Round time left as of `now`, without recording anything.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let timer = self.session().round_timer();
        if self.timed && self.session().is_playing() {
            timer.remaining().saturating_sub(self.elapsed_since_update(now))
        } else {
            timer.remaining()
        }
    }
}

/// `$BLOOM_STATE_PATH`, or `./.bloom/session.json` when unset or empty.
pub fn state_path() -> PathBuf {
    std::env::var_os(STATE_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom::{GameConfig, Position};
    use chrono::TimeDelta;

    fn store(timed: bool, now: DateTime<Utc>) -> SessionStore {
        let session = Session::new_game(GameConfig::default(), 4).unwrap();
        SessionStore::new(session, 4, timed, now)
    }

    #[test]
    fn save_then_load_keeps_history() {
        let path = std::env::temp_dir()
            .join(format!("bloomctl_state_{}", std::process::id()))
            .join("session.json");
        let now = Utc::now();
        let mut s = store(false, now);
        s.apply(now, |session| {
            session.pause();
            Ok(())
        })
        .unwrap();
        s.save(&path).unwrap();

        let loaded = SessionStore::load(&path).unwrap();
        assert_eq!(loaded.history, s.history);
        assert_eq!(loaded.created_at, s.created_at);
        assert!(!loaded.session().is_playing());

        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("bloomctl_state_missing_nope.json");
        let err = SessionStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("bloomctl new"));
    }

    #[test]
    fn failed_action_records_nothing() {
        let now = Utc::now();
        let mut s = store(false, now);
        let res = s.apply(now, |session| {
            session.attempt_swap(Position::new(0, 0), Position::new(0, 9))?;
            Ok(())
        });
        assert!(res.is_err());
        assert_eq!(s.history.len(), 1);
    }

    #[test]
    fn timed_store_charges_wall_clock_between_commands() {
        let start = Utc::now();
        let mut s = store(true, start);
        let later = start + TimeDelta::seconds(10);
        assert_eq!(s.remaining(later), Duration::from_secs(35));

        s.apply(later, |_| Ok(())).unwrap();
        assert_eq!(s.session().round_timer().elapsed(), Duration::from_secs(10));

        let too_late = later + TimeDelta::seconds(60);
        let res = s.apply(too_late, |session| {
            session.attempt_swap(Position::new(0, 0), Position::new(0, 1))?;
            Ok(())
        });
        assert!(res.is_err());
        assert!(s.session().is_over());
    }

    #[test]
    fn untimed_store_ignores_wall_clock() {
        let start = Utc::now();
        let mut s = store(false, start);
        s.apply(start + TimeDelta::minutes(5), |_| Ok(())).unwrap();
        assert_eq!(s.session().round_timer().elapsed(), Duration::ZERO);
    }
}
