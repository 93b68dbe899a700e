//! Error types for the container-loading harness.

use crate::verify::Violations;
use thiserror::Error;

/// Result type alias using the harness error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while generating, solving or verifying an instance.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing input parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The generator would produce more items than the configured limit.
    #[error("instance exceeds the item limit of {limit}")]
    CapacityExceeded { limit: usize },

    /// The returned placement broke one or more packing invariants.
    #[error("invalid solution:\n{0}")]
    Verification(Violations),

    /// The solver failed or returned malformed output.
    #[error("solver error: {0}")]
    Solver(String),

    /// The solver did not return within its time limit.
    #[error("solver timed out after {limit_ms} ms")]
    SolverTimeout { limit_ms: u64 },

    /// A single trial failed; wraps the underlying cause.
    #[error("trial {trial} failed: {source}")]
    Trial {
        trial: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Wraps this error as the failure of the given trial.
    pub fn in_trial(self, trial: u32) -> Self {
        Error::Trial {
            trial,
            source: Box::new(self),
        }
    }

    /// Returns true if this error (or the trial error it wraps) is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::SolverTimeout { .. } => true,
            Error::Trial { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

impl From<Violations> for Error {
    fn from(violations: Violations) -> Self {
        Error::Verification(violations)
    }
}
