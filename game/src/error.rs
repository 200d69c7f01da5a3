use crate::grid::Position;

/// Errors from board operations. None of them leave the grid modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("position {position} is outside the {size}x{size} grid")]
    InvalidPosition { position: Position, size: usize },

    #[error("{a} and {b} are not adjacent")]
    NotAdjacent { a: Position, b: Position },

    #[error("invalid board configuration: {0}")]
    Configuration(String),

    #[error("could not generate a board without matches after {attempts} attempts")]
    GenerationFailed { attempts: usize },
}

/// Errors from driving a [`crate::session::Session`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("the round is over")]
    RoundOver,

    #[error("the session is paused")]
    Paused,
}

/// Errors that can occur when loading a game configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    FileWrite {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_error_display() {
        let err = BoardError::InvalidPosition {
            position: Position::new(7, 1),
            size: 6,
        };
        assert_eq!(err.to_string(), "position (7, 1) is outside the 6x6 grid");

        let err = BoardError::NotAdjacent {
            a: Position::new(0, 0),
            b: Position::new(1, 1),
        };
        assert_eq!(err.to_string(), "(0, 0) and (1, 1) are not adjacent");
    }

    #[test]
    fn session_error_is_transparent_over_board_errors() {
        let err: SessionError = BoardError::GenerationFailed { attempts: 100 }.into();
        assert_eq!(
            err.to_string(),
            "could not generate a board without matches after 100 attempts"
        );
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::Validation("gridSize must be > 0".to_string());
        assert_eq!(err.to_string(), "config validation error: gridSize must be > 0");
    }
}
