//! Error types for the PLADS coordinator.
//!
//! Recoverable conditions (no file yet, missing artifact, empty series) are
//! modeled with `Option`/empty `Vec` at the call site rather than as
//! `PladsError` variants — only conditions that should terminate the
//! process appear here. See SPEC_FULL.md §7.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PladsError {
    #[error("config file not found: {0}")]
    ConfigMissing(PathBuf),

    #[error("config key '{key}' is missing or empty")]
    ConfigKeyMissing { key: String },

    #[error("config key '{key}' has an invalid value '{value}': {reason}")]
    ConfigValueInvalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to move '{name}' from {src:?} to {dst:?}: {source}")]
    MoveFailed {
        name: String,
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("external process '{program}' exited with status {status}")]
    ProcessFailed { program: String, status: i32 },

    #[error("external process '{program}' failed to start: {source}")]
    ProcessSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("expected miner artifact '{0}' was never produced")]
    ArtifactMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PladsError>;

impl From<crate::metrics::MetricComputeError> for PladsError {
    fn from(e: crate::metrics::MetricComputeError) -> Self {
        use crate::metrics::MetricComputeError as M;
        match e {
            M::NoExecutable(metric) => PladsError::ConfigKeyMissing {
                key: format!("{}_EXECUTABLE", metric.to_uppercase()),
            },
            M::SpawnFailed { program, source } => PladsError::ProcessSpawnFailed { program, source },
            M::NonZeroExit { program, status } => PladsError::ProcessFailed { program, status },
            M::UnreadableOutput(path) => PladsError::ArtifactMissing(PathBuf::from(path)),
            M::Io(source) => PladsError::Io(source),
        }
    }
}
