use std::path::PathBuf;
use thiserror::Error;

/// Error kinds surfaced by the core engines.
///
/// Per-item failures (an unparseable file, an unreadable commit's stats, a
/// non-OO language encountered by the cohesion engine) are *not* represented
/// here — those are absorbed silently and tracked as `skipped` counters on
/// the relevant report, per the fail-fast-only-on-input-and-invariant policy.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("repository not found at {path}")]
    RepositoryNotFound { path: PathBuf },

    #[error("invalid repository at {path}: {source}")]
    RepositoryOpen {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
