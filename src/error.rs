//! Error types and process exit codes shared by both gates

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a convergence or acceptance run
///
/// Every variant is fatal: there is no per-line recovery and no retry.
/// Expected outcomes (a metric that has not converged, a detected
/// regression) are reported as verdict values instead.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Malformed measurement on line {line}: {reason} ({content:?})")]
    InputFormat {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("Malformed baseline {} line {line}: {reason}", .path.display())]
    BaselineFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Baseline file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Refusing to persist an empty baseline to {}", .0.display())]
    EmptyBaseline(PathBuf),

    #[error("Metric name {0:?} cannot be written to a baseline file")]
    InvalidMetricName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Process exit statuses, one convention for both tools
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | converged and written / accepted and rewritten |
/// | 1 | fatal error (malformed input, missing file, I/O, config) |
/// | 2 | measurements have not converged |
/// | 3 | regression detected |
/// | 4 | empty baseline, nothing persisted |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Fatal,
    NotConverged,
    RegressionDetected,
    EmptyBaseline,
}

impl ExitStatus {
    /// Numeric process exit code
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Fatal => 1,
            ExitStatus::NotConverged => 2,
            ExitStatus::RegressionDetected => 3,
            ExitStatus::EmptyBaseline => 4,
        }
    }

    /// Classify a fatal error chain into an exit status
    ///
    /// An `EmptyBaseline` anywhere in the chain keeps its own code; every other
    /// error is a plain fatal failure.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let empty = err
            .chain()
            .filter_map(|cause| cause.downcast_ref::<GateError>())
            .any(|gate| matches!(gate, GateError::EmptyBaseline(_)));
        if empty {
            ExitStatus::EmptyBaseline
        } else {
            ExitStatus::Fatal
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}
