//! Replay error types.

use std::path::PathBuf;

use huddle_app::AppError;
use thiserror::Error;

/// Errors from loading or replaying a script.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Script file could not be read.
    #[error("cannot read script {path}: {source}")]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A script line is not a valid step.
    #[error("script line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The stream channel rejected a batch.
    #[error("stream: {0}")]
    Stream(#[from] AppError),

    /// Persistence is switched off for this replay.
    #[error("persistence unavailable")]
    PersistenceUnavailable,

    /// The final view could not be written.
    #[error("cannot write view: {0}")]
    Output(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReplayError::Parse { line: 7, source };

        assert!(err.to_string().starts_with("script line 7:"));
    }

    #[test]
    fn stream_error_wraps_app_error() {
        let err = ReplayError::from(AppError::ChannelFull);
        assert!(matches!(err, ReplayError::Stream(AppError::ChannelFull)));
    }
}
