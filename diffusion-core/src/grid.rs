//! Double-buffered grid state.
//!
//! Both buffers live in a two-slot arena; which one is "current" is a
//! single index. Callers only ever see role-qualified views, so the
//! engine's `swap_roles` is the one place roles change.

use crate::error::{StencilError, StencilResult};

#[derive(Debug, Clone)]
pub struct GridState {
    buffers: [Vec<f64>; 2],
    current: usize,
    intervals: usize,
}

impl GridState {
    /// Allocate both buffers zero-filled with identical boundary values.
    pub fn initialize(
        intervals: usize,
        boundary_low: f64,
        boundary_high: f64,
    ) -> StencilResult<Self> {
        if intervals < 3 {
            return Err(StencilError::InvalidSize { intervals });
        }

        let a = allocate(intervals, boundary_low, boundary_high)?;
        let b = allocate(intervals, boundary_low, boundary_high)?;

        Ok(Self {
            buffers: [a, b],
            current: 0,
            intervals,
        })
    }

    pub fn intervals(&self) -> usize {
        self.intervals
    }

    /// `(grid[0], grid[intervals-1])`, identical in both buffers.
    pub fn boundaries(&self) -> (f64, f64) {
        let cur = self.current();
        (cur[0], cur[self.intervals - 1])
    }

    pub fn current(&self) -> &[f64] {
        &self.buffers[self.current]
    }

    pub fn next(&self) -> &[f64] {
        &self.buffers[1 - self.current]
    }

    /// Borrow the current buffer for reading and the next one for writing.
    pub fn roles_mut(&mut self) -> (&[f64], &mut [f64]) {
        let (a, b) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (a[0].as_slice(), b[0].as_mut_slice())
        } else {
            (b[0].as_slice(), a[0].as_mut_slice())
        }
    }

    /// Exchange the buffer roles. No data moves.
    pub fn swap_roles(&mut self) {
        self.current = 1 - self.current;
    }

    /// Write an initial value into the current buffer at an interior index.
    pub fn set(&mut self, index: usize, value: f64) -> StencilResult<()> {
        if index == 0 || index >= self.intervals - 1 {
            return Err(StencilError::InvalidConfiguration(format!(
                "index {index} is not interior for a grid of {} intervals",
                self.intervals
            )));
        }
        self.buffers[self.current][index] = value;
        Ok(())
    }

    /// Load the whole interior (`intervals - 2` values) into the current buffer.
    pub fn set_interior(&mut self, values: &[f64]) -> StencilResult<()> {
        let interior = self.intervals - 2;
        if values.len() != interior {
            return Err(StencilError::InvalidConfiguration(format!(
                "expected {interior} interior values, got {}",
                values.len()
            )));
        }
        let last = self.intervals - 1;
        self.buffers[self.current][1..last].copy_from_slice(values);
        Ok(())
    }

    /// Consume the state, keeping only the buffer in the current role.
    pub fn into_current(self) -> Vec<f64> {
        let [a, b] = self.buffers;
        if self.current == 0 { a } else { b }
    }
}

fn allocate(intervals: usize, low: f64, high: f64) -> StencilResult<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(intervals)
        .map_err(|source| StencilError::Allocation { intervals, source })?;
    buf.resize(intervals, 0.0);
    buf[0] = low;
    buf[intervals - 1] = high;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_sets_boundaries_in_both_buffers() {
        let g = GridState::initialize(6, 1.0, 0.5).unwrap();
        assert_eq!(g.current(), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.5]);
        assert_eq!(g.next(), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.5]);
        assert_eq!(g.boundaries(), (1.0, 0.5));
    }

    #[test]
    fn initialize_rejects_grids_without_interior() {
        for n in 0..3 {
            let err = GridState::initialize(n, 1.0, 0.0).unwrap_err();
            assert!(matches!(err, StencilError::InvalidSize { intervals } if intervals == n));
        }
    }

    #[test]
    fn swap_roles_exchanges_views_without_copying() {
        let mut g = GridState::initialize(4, 1.0, 0.0).unwrap();
        g.set(1, 0.25).unwrap();
        let cur_ptr = g.current().as_ptr();
        let next_ptr = g.next().as_ptr();

        g.swap_roles();
        assert_eq!(g.current().as_ptr(), next_ptr);
        assert_eq!(g.next().as_ptr(), cur_ptr);
        assert_eq!(g.next()[1], 0.25);
        assert_eq!(g.current()[1], 0.0);

        g.swap_roles();
        assert_eq!(g.current()[1], 0.25);
    }

    #[test]
    fn roles_mut_follows_the_role_index() {
        let mut g = GridState::initialize(4, 1.0, 0.0).unwrap();
        g.swap_roles();
        {
            let (cur, next) = g.roles_mut();
            assert_ne!(cur.as_ptr(), next.as_ptr());
            next[2] = 9.0;
        }
        assert_eq!(g.next()[2], 9.0);
        assert_eq!(g.current()[2], 0.0);
    }

    #[test]
    fn set_rejects_boundary_and_out_of_range() {
        let mut g = GridState::initialize(5, 1.0, 0.0).unwrap();
        assert!(g.set(0, 3.0).is_err());
        assert!(g.set(4, 3.0).is_err());
        assert!(g.set(99, 3.0).is_err());
        assert!(g.set(3, 3.0).is_ok());
        assert_eq!(g.current()[3], 3.0);
    }

    #[test]
    fn set_interior_checks_length() {
        let mut g = GridState::initialize(5, 1.0, 0.0).unwrap();
        assert!(g.set_interior(&[0.1, 0.2]).is_err());
        g.set_interior(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(g.current(), &[1.0, 0.1, 0.2, 0.3, 0.0]);
        assert_eq!(g.clone().into_current(), g.current().to_vec());
    }

    #[test]
    fn oversized_grid_is_an_allocation_error() {
        let err = GridState::initialize(usize::MAX, 1.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            StencilError::Allocation { intervals: usize::MAX, .. }
        ));
    }
}
