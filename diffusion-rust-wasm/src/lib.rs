use std::sync::Arc;

use diffusion_core::{GridState, InlineExecutor, StencilEngine, StencilError};
use wasm_bindgen::prelude::*;

/// Interactive 1D diffusion for the browser. Runs on the calling thread.
#[wasm_bindgen]
pub struct Simulation {
    state: GridState,
    engine: StencilEngine,
    coefficient: f64,
    steps_done: u32,
    filled: bool,
}

#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(constructor)]
    pub fn new(
        intervals: usize,
        boundary_low: f64,
        boundary_high: f64,
        coefficient: f64,
    ) -> Result<Simulation, JsValue> {
        if !coefficient.is_finite() {
            return Err(JsValue::from_str("coefficient must be finite"));
        }
        let state = GridState::initialize(intervals, boundary_low, boundary_high).map_err(to_js)?;
        let engine = StencilEngine::new(Arc::new(InlineExecutor), 1).map_err(to_js)?;
        Ok(Simulation {
            state,
            engine,
            coefficient,
            steps_done: 0,
            filled: false,
        })
    }

    /// Set an interior value of the current field.
    pub fn set_value(&mut self, index: usize, value: f64) -> Result<(), JsValue> {
        self.state.set(index, value).map_err(to_js)
    }

    pub fn intervals(&self) -> usize { self.state.intervals() }
    pub fn steps_done(&self) -> u32 { self.steps_done }

    pub fn value(&self, index: usize) -> Option<f64> {
        self.state.current().get(index).copied()
    }

    // Copy-based JS access
    pub fn get_field(&self) -> Vec<f64> {
        self.state.current().to_vec()
    }

    // Step + timing (WASM-only)
    pub fn step(&mut self, n: u32) -> Result<StepInfo, JsValue> {
        let t0 = now_ms();
        if !self.filled {
            self.engine.fill_interior(&mut self.state).map_err(to_js)?;
            self.filled = true;
        }
        for _ in 0..n {
            self.engine.step(&mut self.state, self.coefficient).map_err(to_js)?;
            self.steps_done += 1;
        }
        let t1 = now_ms();
        Ok(StepInfo { steps: n, compute_ms: t1 - t0 })
    }
}

#[wasm_bindgen]
pub struct StepInfo {
    steps: u32,
    compute_ms: f64,
}

#[wasm_bindgen]
impl StepInfo {
    pub fn steps(&self) -> u32 { self.steps }
    pub fn compute_ms(&self) -> f64 { self.compute_ms }
}

fn to_js(e: StencilError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
