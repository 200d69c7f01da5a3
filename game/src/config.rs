use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generate::{DEFAULT_GENERATION_ATTEMPTS, GenerationMode};
use crate::grid::{DEFAULT_GRID_SIZE, DEFAULT_SYMBOL_COUNT, MAX_GRID_SIZE, MAX_SYMBOLS};
use crate::scoring::ScoringRule;

pub const DEFAULT_TIME_LIMIT_SECONDS: u64 = 45;

/// Everything needed to start a game. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub grid_size: usize,
    pub symbol_count: usize,
    /// `None` lets chains run until the board settles.
    pub max_cascades: Option<usize>,
    /// Owned by the session's round timer; the board rules never look at it.
    pub time_limit_seconds: u64,
    pub scoring: ScoringRule,
    pub generation: GenerationMode,
    pub generation_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            symbol_count: DEFAULT_SYMBOL_COUNT,
            max_cascades: None,
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            scoring: ScoringRule::default(),
            generation: GenerationMode::default(),
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
        }
    }
}

impl GameConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    /// Shape checks only. Whether a shape admits a match-free board is the
    /// board engine's call, surfaced when a game starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Validation(format!(
                "gridSize must be in 1..={MAX_GRID_SIZE}"
            )));
        }
        if self.symbol_count == 0 || self.symbol_count > MAX_SYMBOLS {
            return Err(ConfigError::Validation(format!(
                "symbolCount must be in 1..={MAX_SYMBOLS}"
            )));
        }
        if self.generation_attempts == 0 {
            return Err(ConfigError::Validation(
                "generationAttempts must be > 0".into(),
            ));
        }
        if self.max_cascades == Some(0) {
            return Err(ConfigError::Validation(
                "maxCascades must be > 0 (omit it for no cap)".into(),
            ));
        }
        Ok(())
    }

    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source: std::io::Error| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(write_err)
    }
}
