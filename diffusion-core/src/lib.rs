//! # diffusion-core
//!
//! One-dimensional explicit diffusion on a fixed grid:
//!
//! ```text
//! next[i] = cur[i] + k * (cur[i-1] - 2*cur[i] + cur[i+1])    1 <= i < n-1
//! ```
//!
//! The grid is double-buffered ([`GridState`]), each step is split across
//! workers by contiguous disjoint ranges ([`partition`]) and executed on an
//! [`Executor`] that joins all workers before the buffers swap roles.
//!
//! ```
//! use diffusion_core::{BackendKind, SimulationParams, run};
//!
//! let params = SimulationParams::new(5, 2, 0.1, 2).unwrap();
//! let out = run(&params, BackendKind::Inline).unwrap();
//! assert!((out.get(1).unwrap() - 0.18).abs() < 1e-12);
//! ```

pub mod engine;
pub mod error;
pub mod executor;
pub mod grid;
pub mod params;
pub mod partition;
pub mod result;

pub use engine::StencilEngine;
pub use error::{DispatchError, StencilError, StencilResult};
pub use executor::{BackendKind, Executor, InlineExecutor, ScopedThreadExecutor, create_executor};
#[cfg(feature = "rayon")]
pub use executor::RayonExecutor;
pub use grid::GridState;
pub use params::SimulationParams;
pub use partition::partition;
pub use result::FinalBuffer;

/// Run a simulation from a zero interior with the configured boundaries.
pub fn run(params: &SimulationParams, backend: BackendKind) -> StencilResult<FinalBuffer> {
    params.validate()?;
    let state = GridState::initialize(params.intervals, params.boundary_low, params.boundary_high)?;
    run_with_state(params, state, backend)
}

/// Run a simulation from a caller-prepared grid.
///
/// The grid's length must match `params.intervals`; its boundaries win
/// over the ones in `params`.
pub fn run_with_state(
    params: &SimulationParams,
    mut state: GridState,
    backend: BackendKind,
) -> StencilResult<FinalBuffer> {
    params.validate()?;
    if state.intervals() != params.intervals {
        return Err(StencilError::InvalidConfiguration(format!(
            "grid has {} intervals but parameters ask for {}",
            state.intervals(),
            params.intervals
        )));
    }

    let engine = StencilEngine::with_backend(backend, params.worker_count)?;
    engine.run(&mut state, params.time_steps, params.coefficient)?;

    let (low, high) = state.boundaries();
    let params = params.clone().with_boundaries(low, high);
    Ok(FinalBuffer::new(params, backend, state.into_current()))
}
