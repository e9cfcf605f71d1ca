//! Error types.
//!
//! `EvalError` is structural: it aborts the whole run. `CompareError` is
//! per item and never leaves the bounded executor; it is folded into an
//! [`Outcome`](crate::model::Outcome) there.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("model output at position {position} declares index {declared}")]
    IndexMismatch { position: usize, declared: usize },

    #[error("metadata has {metadata} entries but model output has {outputs} records")]
    CountMismatch { metadata: usize, outputs: usize },

    #[error("database for item {index} not found: {path}")]
    MissingDatabase { index: usize, path: PathBuf },

    #[error("unknown difficulty '{label}' for item {index} (expected simple, moderate or challenging)")]
    UnknownDifficulty { index: usize, label: String },
}

impl EvalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EvalError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        EvalError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("cannot open database {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("ground truth query failed: {0}")]
    GroundTruth(String),

    #[error("predicted query failed: {0}")]
    Predicted(String),

    #[error("execution interrupted")]
    Interrupted,
}

impl CompareError {
    /// Ground truth and open failures mean the benchmark itself is broken,
    /// not the model.
    pub fn is_benchmark_fault(&self) -> bool {
        matches!(self, CompareError::GroundTruth(_) | CompareError::Open { .. })
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
