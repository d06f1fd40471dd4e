//! Serializable system descriptions.
//!
//! Front-ends (the CLI, the WASM bindings) collect user input as plain
//! numbers and hand it over as a [`SystemDescription`]. Converting it into a
//! [`System`] performs all of the usual validation.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{MdofError, Result};

use super::{matrix_from_rows, System};

/// Mass input: either the diagonal entries or a full (diagonal) matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MassDescription {
    /// Per-DOF masses
    Diagonal(Vec<f64>),
    /// Full matrix rows; off-diagonal entries must be zero
    Matrix(Vec<Vec<f64>>),
}

/// A system as supplied by a caller, before validation.
///
/// ```json
/// {
///   "mass": [5, 5],
///   "stiffness": [[200, -100], [-100, 100]],
///   "alpha": 0.1,
///   "beta": 0.01,
///   "x0": [10, 10],
///   "v0": [0, 0],
///   "horizon": 50
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDescription {
    /// Mass matrix (diagonal)
    pub mass: MassDescription,
    /// Stiffness matrix rows
    pub stiffness: Vec<Vec<f64>>,
    /// Mass-proportional Rayleigh coefficient
    #[serde(default)]
    pub alpha: f64,
    /// Stiffness-proportional Rayleigh coefficient
    #[serde(default)]
    pub beta: f64,
    /// Initial displacement per DOF
    pub x0: Vec<f64>,
    /// Initial velocity per DOF (zero if omitted)
    #[serde(default)]
    pub v0: Option<Vec<f64>>,
    /// Simulation horizon in seconds
    #[serde(default)]
    pub horizon: Option<f64>,
}

impl SystemDescription {
    /// Default horizon in seconds when none is given.
    pub const DEFAULT_HORIZON: f64 = 50.0;

    /// The default two-DOF setup: equal masses of 5, no stiffness, both
    /// masses displaced by 10 and at rest.
    pub fn default_two_dof() -> Self {
        Self {
            mass: MassDescription::Diagonal(vec![5.0, 5.0]),
            stiffness: vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            alpha: 0.0,
            beta: 0.0,
            x0: vec![10.0, 10.0],
            v0: Some(vec![0.0, 0.0]),
            horizon: Some(Self::DEFAULT_HORIZON),
        }
    }

    /// Decode a description from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MdofError::InputFormatError {
            message: e.to_string(),
        })
    }

    /// Horizon to simulate, falling back to the default.
    pub fn horizon(&self) -> f64 {
        self.horizon.unwrap_or(Self::DEFAULT_HORIZON)
    }

    /// Validate and build the [`System`].
    pub fn to_system(&self) -> Result<System> {
        let mass = match &self.mass {
            MassDescription::Diagonal(masses) => {
                DMatrix::from_diagonal(&DVector::from_column_slice(masses))
            }
            MassDescription::Matrix(rows) => matrix_from_rows("mass matrix", rows)?,
        };
        let stiffness = matrix_from_rows("stiffness matrix", &self.stiffness)?;
        let x0 = DVector::from_column_slice(&self.x0);
        let v0 = match &self.v0 {
            Some(v0) => DVector::from_column_slice(v0),
            None => DVector::zeros(self.x0.len()),
        };

        System::new(mass, stiffness, self.alpha, self.beta, x0, v0)
    }
}

impl Default for SystemDescription {
    fn default() -> Self {
        Self::default_two_dof()
    }
}
