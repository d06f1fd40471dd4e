//! Modal vibration solver.
//!
//! This module provides the numerical engine for the simulation.
//!
//! ## Modal superposition
//!
//! A linear system `M x'' + C x' + K x = 0` with diagonal `M` and Rayleigh
//! damping `C = αM + βK` is solved in three stages:
//!
//! 1. [`decompose`] builds the transform `S` (and `S⁻¹`) that turns the
//!    coupled equations into N independent oscillators
//!    `u_i'' = -2·c_i·ω_i·u_i' - ω_i²·u_i`
//! 2. [`ModalIntegrator`] advances each oscillator with fixed-step
//!    symplectic Euler, starting from `u(0) = S⁻¹·x0`, `u'(0) = S⁻¹·v0`
//! 3. [`Solver`] stacks the modal histories and maps them back with
//!    `x(t) = S·u(t)`, then drops the trailing samples where the system has
//!    come to rest
//!
//! Modes share no state, so step 2 may run one mode per thread (see the
//! `parallel` feature).

mod composer;
mod config;
mod decompose;
mod integrator;

pub use composer::{
    solve, solve_matrices, solve_with_config, trailing_rest_len, PhysicalResponse, Solver,
};
pub use config::{ModalDampingFormula, SolverConfig, StiffnessScaling};
pub use decompose::{decompose, modal_damping, ModalDecomposition, ModalState};
pub use integrator::{ModalIntegrator, TimeHistory};

/// Default integration micro-step in seconds.
pub const DEFAULT_INTEGRATION_STEP: f64 = 1e-4;

/// Default relative amplitude below which trailing samples are at rest.
pub const DEFAULT_REST_THRESHOLD: f64 = 0.005;

/// Default relative eigenvalue size treated as a rigid-body mode.
pub const DEFAULT_RIGID_BODY_TOLERANCE: f64 = 1e-9;

/// Default relative tolerance for the symmetry check.
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Largest number of integration steps for one solve.
pub const MAX_INTEGRATION_STEPS: u64 = 10_000_000_000;

/// Largest number of samples kept per mode.
pub const MAX_OUTPUT_SAMPLES: usize = 50_000_000;

/// `ω·dt` above which a mode is reported as under-resolved.
pub const RESOLUTION_LIMIT: f64 = 0.5;
