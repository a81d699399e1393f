//! Explicit three-point stencil time stepping.
//!
//! Each pass splits the interior of the "next" buffer into one disjoint
//! window per worker and hands the windows to the executor. Kernels only
//! read the "current" buffer, so a step never observes its own writes.
//! Roles are swapped once per step, after the executor has joined.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, trace};

use crate::error::{StencilError, StencilResult};
use crate::executor::{BackendKind, Executor, Job, create_executor};
use crate::grid::GridState;
use crate::partition::partition;

pub struct StencilEngine {
    executor: Arc<dyn Executor>,
    workers: usize,
}

impl StencilEngine {
    /// Engine over an existing executor, splitting every pass `workers` ways.
    pub fn new(executor: Arc<dyn Executor>, workers: usize) -> StencilResult<Self> {
        if workers == 0 {
            return Err(StencilError::InvalidConfiguration(
                "worker_count must be >= 1, got 0".into(),
            ));
        }
        Ok(Self { executor, workers })
    }

    /// Engine over a freshly built executor of the given kind.
    pub fn with_backend(kind: BackendKind, workers: usize) -> StencilResult<Self> {
        if workers == 0 {
            return Err(StencilError::InvalidConfiguration(
                "worker_count must be >= 1, got 0".into(),
            ));
        }
        let executor = create_executor(kind, workers)
            .map_err(|source| StencilError::Dispatch { step: None, source })?;
        Self::new(executor, workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn backend(&self) -> &str {
        self.executor.name()
    }

    /// Zero every interior index of the "next" buffer.
    ///
    /// Touches exactly `1..intervals-1`; boundary cells keep their values.
    pub fn fill_interior(&self, state: &mut GridState) -> StencilResult<()> {
        let interior = interior_range(state);
        let (_, next) = state.roles_mut();
        let jobs = split_jobs(next, interior, self.workers);

        self.executor
            .dispatch(jobs, &|_, out: &mut [f64]| out.fill(0.0))
            .map_err(|source| StencilError::Dispatch { step: None, source })
    }

    /// Advance one time step and swap roles.
    pub fn step(&self, state: &mut GridState, coefficient: f64) -> StencilResult<()> {
        self.advance(state, coefficient, None)
    }

    /// Fill once, then take `time_steps` steps in order. Returns the buffer
    /// left in the "current" role.
    pub fn run<'s>(
        &self,
        state: &'s mut GridState,
        time_steps: usize,
        coefficient: f64,
    ) -> StencilResult<&'s [f64]> {
        if !coefficient.is_finite() {
            return Err(StencilError::InvalidConfiguration(format!(
                "coefficient must be finite, got {coefficient}"
            )));
        }

        info!(
            intervals = state.intervals(),
            time_steps,
            coefficient,
            workers = self.workers,
            backend = self.backend(),
            "starting stencil run"
        );
        let started = Instant::now();

        self.fill_interior(state)?;
        for t in 0..time_steps {
            trace!(step = t, "dispatching step");
            self.advance(state, coefficient, Some(t))?;
        }

        info!(
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "stencil run finished"
        );
        Ok(state.current())
    }

    fn advance(
        &self,
        state: &mut GridState,
        coefficient: f64,
        step: Option<usize>,
    ) -> StencilResult<()> {
        let interior = interior_range(state);
        let (current, next) = state.roles_mut();
        let jobs = split_jobs(next, interior, self.workers);

        let kernel = |start: usize, out: &mut [f64]| {
            apply_stencil(current, start, out, coefficient);
        };
        self.executor
            .dispatch(jobs, &kernel)
            .map_err(|source| StencilError::Dispatch { step, source })?;

        // Every worker has joined; nothing still reads `current`.
        state.swap_roles();
        Ok(())
    }
}

/// Compute `out[j]` for grid index `start + j` from `current` alone.
///
/// `out` must not cover a boundary index.
pub fn apply_stencil(current: &[f64], start: usize, out: &mut [f64], k: f64) {
    if out.is_empty() {
        return;
    }
    let src = &current[start - 1..start + out.len() + 1];
    for (slot, w) in out.iter_mut().zip(src.windows(3)) {
        *slot = w[1] + k * (w[0] - 2.0 * w[1] + w[2]);
    }
}

fn interior_range(state: &GridState) -> Range<usize> {
    1..state.intervals() - 1
}

/// Cut `buf[range]` into one mutable window per partition chunk.
fn split_jobs(buf: &mut [f64], range: Range<usize>, workers: usize) -> Vec<Job<'_>> {
    let chunks = partition(range.clone(), workers);
    let mut rest = &mut buf[range];
    let mut jobs = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk.len());
        jobs.push(Job {
            start: chunk.start,
            out: head,
        });
        rest = tail;
    }
    jobs
}
