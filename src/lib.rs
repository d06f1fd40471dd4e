//! # MDoF Core
//!
//! A modal solver for multi-degree-of-freedom linear vibration systems.
//!
//! This library provides:
//! - Validated system descriptions (diagonal mass, stiffness, Rayleigh damping, initial conditions)
//! - Modal decomposition by simultaneous diagonalization of mass and stiffness
//! - Fixed-step symplectic Euler integration of each decoupled mode
//! - Recomposition of physical displacement histories, trimmed once the system is at rest
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`system`] - System representation, JSON descriptions and validation
//! - [`linalg`] - Dense linear-algebra primitives (diagonal roots, symmetric eigen-decomposition)
//! - [`solver`] - Modal decomposition, integration and response composition
//! - [`output`] - CSV / JSON export of responses (CLI only)
//!
//! ## Usage
//!
//! ### Library
//!
//! ```
//! use mdof_core::{solve, System};
//!
//! let system = System::from_masses(
//!     &[1.0, 1.0],
//!     &[vec![2.0, -1.0], vec![-1.0, 2.0]],
//!     0.0,
//!     0.0,
//!     &[1.0, 0.0],
//!     &[0.0, 0.0],
//! )?;
//! let response = solve(&system, 5.0)?;
//! assert_eq!(response.dof(), 2);
//! # Ok::<(), mdof_core::MdofError>(())
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! mdof system.json --horizon 20 --stride 100 > response.csv
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmMdofSolver } from 'mdof_core';
//!
//! const solver = new WasmMdofSolver(systemJson);
//! const response = JSON.parse(solver.solve(20.0));
//! ```

pub mod error;
pub mod linalg;
pub mod solver;
pub mod system;

#[cfg(feature = "cli")]
pub mod output;

// Re-export main types for convenience
pub use error::{ErrorKind, MdofError, Result};
pub use solver::{solve, solve_matrices, solve_with_config, PhysicalResponse, Solver, SolverConfig};
pub use system::{System, SystemDescription};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmMdofSolver;
