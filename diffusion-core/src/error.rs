//! Error types for the diffusion engine.
//!
//! Every fallible operation returns `StencilResult<T>`. Nothing here is
//! retried: a run that fails is abandoned together with its buffers.

use std::collections::TryReserveError;

use thiserror::Error;

/// Failure of the parallel-work substrate while executing a pass.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker pool could not be created.
    #[cfg(feature = "rayon")]
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// The requested backend is not compiled into this build.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// An OS thread could not be spawned.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        source: std::io::Error,
    },

    /// A worker panicked before finishing its range.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
}

/// Unified error type for grid setup and time stepping.
#[derive(Debug, Error)]
pub enum StencilError {
    /// The grid has no interior point.
    #[error("grid of {intervals} intervals has no interior (need at least 3)")]
    InvalidSize { intervals: usize },

    /// Run parameters make no sense.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The executor failed. `step` is set when the failure happened inside
    /// the time-stepping loop of a run.
    #[error("dispatch failed{}: {source}", describe_step(.step))]
    Dispatch {
        step: Option<usize>,
        source: DispatchError,
    },

    /// The two grid buffers could not be allocated.
    #[error("failed to allocate two buffers of {intervals} values: {source}")]
    Allocation {
        intervals: usize,
        source: TryReserveError,
    },
}

fn describe_step(step: &Option<usize>) -> String {
    match step {
        Some(s) => format!(" at step {s}"),
        None => String::new(),
    }
}

/// Convenience alias for `Result<T, StencilError>`.
pub type StencilResult<T> = Result<T, StencilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_message_names_the_step() {
        let err = StencilError::Dispatch {
            step: Some(7),
            source: DispatchError::WorkerPanicked {
                worker: 2,
                message: "boom".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "dispatch failed at step 7: worker 2 panicked: boom"
        );

        let err = StencilError::Dispatch {
            step: None,
            source: DispatchError::WorkerPanicked {
                worker: 0,
                message: "boom".into(),
            },
        };
        assert_eq!(err.to_string(), "dispatch failed: worker 0 panicked: boom");
    }
}
