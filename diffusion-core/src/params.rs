use serde::Serialize;

use crate::error::{StencilError, StencilResult};

/// Grid length of the reference run.
pub const DEFAULT_INTERVALS: usize = 10_000_000;
/// Number of steps of the reference run.
pub const DEFAULT_TIME_STEPS: usize = 100;
/// Diffusion coefficient the reference run was validated with.
pub const DEFAULT_COEFFICIENT: f64 = 0.1;

/// Immutable parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationParams {
    pub intervals: usize,
    pub time_steps: usize,
    pub coefficient: f64,
    pub worker_count: usize,
    pub boundary_low: f64,
    pub boundary_high: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS,
            time_steps: DEFAULT_TIME_STEPS,
            coefficient: DEFAULT_COEFFICIENT,
            worker_count: default_worker_count(),
            boundary_low: 1.0,
            boundary_high: 0.0,
        }
    }
}

impl SimulationParams {
    /// Build parameters from user-facing values, where step and worker
    /// counts may arrive signed.
    pub fn new(
        intervals: usize,
        time_steps: i64,
        coefficient: f64,
        worker_count: i64,
    ) -> StencilResult<Self> {
        if time_steps < 0 {
            return Err(StencilError::InvalidConfiguration(format!(
                "time_steps must be >= 0, got {time_steps}"
            )));
        }
        if worker_count <= 0 {
            return Err(StencilError::InvalidConfiguration(format!(
                "worker_count must be >= 1, got {worker_count}"
            )));
        }
        let params = Self {
            intervals,
            time_steps: to_usize(time_steps, "time_steps")?,
            coefficient,
            worker_count: to_usize(worker_count, "worker_count")?,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_boundaries(mut self, low: f64, high: f64) -> Self {
        self.boundary_low = low;
        self.boundary_high = high;
        self
    }

    /// Check the invariants a run relies on.
    pub fn validate(&self) -> StencilResult<()> {
        if self.intervals < 3 {
            return Err(StencilError::InvalidSize {
                intervals: self.intervals,
            });
        }
        if self.worker_count == 0 {
            return Err(StencilError::InvalidConfiguration(
                "worker_count must be >= 1, got 0".into(),
            ));
        }
        if !self.coefficient.is_finite() {
            return Err(StencilError::InvalidConfiguration(format!(
                "coefficient must be finite, got {}",
                self.coefficient
            )));
        }
        if !self.boundary_low.is_finite() || !self.boundary_high.is_finite() {
            return Err(StencilError::InvalidConfiguration(format!(
                "boundary values must be finite, got {} / {}",
                self.boundary_low, self.boundary_high
            )));
        }
        Ok(())
    }

    /// Number of interior points, `intervals - 2`.
    pub fn interior_len(&self) -> usize {
        self.intervals.saturating_sub(2)
    }
}

fn to_usize(value: i64, name: &str) -> StencilResult<usize> {
    usize::try_from(value).map_err(|_| {
        StencilError::InvalidConfiguration(format!("{name} out of range: {value}"))
    })
}

/// Worker count used when none is given: the machine's available parallelism.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
