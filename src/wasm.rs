//! WASM bindings for MDoF Core.
//!
//! This module provides JavaScript-friendly bindings for use in web pages
//! that collect the system in a form and plot the response.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmMdofSolver } from 'mdof_core';
//!
//! await init();
//!
//! const systemJson = JSON.stringify({
//!   mass: [5, 5],
//!   stiffness: [[200, -100], [-100, 100]],
//!   alpha: 0.1,
//!   beta: 0.01,
//!   x0: [10, 10],
//! });
//!
//! const solver = new WasmMdofSolver(systemJson);
//! const response = JSON.parse(solver.solve(20.0));
//! plot(response.time, response.displacement);
//! ```

use wasm_bindgen::prelude::*;

use crate::error::MdofError;
use crate::solver::{Solver, SolverConfig};
use crate::system::SystemDescription;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: MdofError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-compatible MDoF solver.
///
/// Wraps the native [`Solver`]; the modal decomposition is computed once in
/// the constructor and reused by every `solve` call.
#[wasm_bindgen]
pub struct WasmMdofSolver {
    solver: Solver,
    horizon: f64,
}

#[wasm_bindgen]
impl WasmMdofSolver {
    /// Create a solver from a JSON system description.
    ///
    /// # Arguments
    /// * `system_json` - The system description as JSON
    ///
    /// # Returns
    /// A new `WasmMdofSolver` or an error if the system is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(system_json: &str) -> Result<WasmMdofSolver, JsValue> {
        Self::with_config(system_json, crate::solver::DEFAULT_INTEGRATION_STEP, 1)
    }

    /// Create a solver with a custom integration step and output stride.
    ///
    /// # Arguments
    /// * `system_json` - The system description as JSON
    /// * `dt` - Integration step in seconds (default: 1e-4)
    /// * `stride` - Emit every n-th integration step (default: 1)
    #[wasm_bindgen]
    pub fn with_config(system_json: &str, dt: f64, stride: usize) -> Result<WasmMdofSolver, JsValue> {
        let description = SystemDescription::from_json(system_json).map_err(to_js)?;
        let system = description.to_system().map_err(to_js)?;

        let config = SolverConfig::new().with_dt(dt).with_output_stride(stride);
        let solver = Solver::with_config(system, config).map_err(to_js)?;

        Ok(WasmMdofSolver {
            solver,
            horizon: description.horizon(),
        })
    }

    /// Number of degrees of freedom.
    #[wasm_bindgen(getter)]
    pub fn dof(&self) -> usize {
        self.solver.system().dof()
    }

    /// Horizon from the system description (seconds).
    #[wasm_bindgen(getter)]
    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Undamped natural frequencies in rad/s, ascending.
    #[wasm_bindgen]
    pub fn natural_frequencies(&self) -> Vec<f64> {
        self.solver
            .decomposition()
            .natural_frequencies()
            .iter()
            .copied()
            .collect()
    }

    /// Simulate up to `horizon` seconds and return the response as JSON
    /// (`{ time, displacement, velocity, trimmed }`).
    #[wasm_bindgen]
    pub fn solve(&self, horizon: f64) -> Result<String, JsValue> {
        let response = self.solver.solve(horizon).map_err(to_js)?;
        serde_json::to_string(&response).map_err(|e| {
            to_js(MdofError::WasmError {
                message: e.to_string(),
            })
        })
    }
}
