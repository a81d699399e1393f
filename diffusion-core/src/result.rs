use serde::Serialize;

use crate::error::StencilResult;
use crate::executor::BackendKind;
use crate::grid::GridState;
use crate::params::SimulationParams;

/// The buffer left in the "current" role at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalBuffer {
    params: SimulationParams,
    backend: BackendKind,
    values: Vec<f64>,
}

impl FinalBuffer {
    pub(crate) fn new(params: SimulationParams, backend: BackendKind, values: Vec<f64>) -> Self {
        Self {
            params,
            backend,
            values,
        }
    }

    /// Value at grid index `i`, or `None` past the end.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values strictly between the two boundaries.
    pub fn interior(&self) -> &[f64] {
        &self.values[1..self.values.len() - 1]
    }

    pub fn boundaries(&self) -> (f64, f64) {
        (self.values[0], self.values[self.values.len() - 1])
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Fresh grid whose current buffer holds these values, for chaining runs.
    pub fn to_state(&self) -> StencilResult<GridState> {
        let (low, high) = self.boundaries();
        let mut state = GridState::initialize(self.values.len(), low, high)?;
        state.set_interior(self.interior())?;
        Ok(state)
    }
}
