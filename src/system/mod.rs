//! Physical system description.
//!
//! A [`System`] holds the diagonal mass matrix, the symmetric stiffness
//! matrix, the Rayleigh damping coefficients and the initial conditions of a
//! linear multi-degree-of-freedom oscillator. Dimensions and mass positivity
//! are checked when the system is constructed, so every `System` that exists
//! is well-formed; it is read-only afterwards.

mod description;
mod validate;

use nalgebra::{DMatrix, DVector};

use crate::error::Result;

pub use description::{MassDescription, SystemDescription};
pub use validate::{matrix_from_rows, validate_horizon, validate_inputs};

/// A linear mass-spring-damper system with its initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    mass: DMatrix<f64>,
    stiffness: DMatrix<f64>,
    alpha: f64,
    beta: f64,
    x0: DVector<f64>,
    v0: DVector<f64>,
}

impl System {
    /// Create a system from its matrices, Rayleigh coefficients and initial
    /// conditions.
    ///
    /// # Arguments
    /// * `mass` - N×N diagonal mass matrix with positive entries
    /// * `stiffness` - N×N stiffness matrix
    /// * `alpha` - Mass-proportional Rayleigh coefficient
    /// * `beta` - Stiffness-proportional Rayleigh coefficient
    /// * `x0` - Initial displacement per DOF
    /// * `v0` - Initial velocity per DOF
    pub fn new(
        mass: DMatrix<f64>,
        stiffness: DMatrix<f64>,
        alpha: f64,
        beta: f64,
        x0: DVector<f64>,
        v0: DVector<f64>,
    ) -> Result<Self> {
        validate_inputs(&mass, &stiffness, alpha, beta, &x0, &v0)?;
        Ok(Self {
            mass,
            stiffness,
            alpha,
            beta,
            x0,
            v0,
        })
    }

    /// Create a system from per-DOF masses and nested stiffness rows.
    pub fn from_masses(
        masses: &[f64],
        stiffness: &[Vec<f64>],
        alpha: f64,
        beta: f64,
        x0: &[f64],
        v0: &[f64],
    ) -> Result<Self> {
        let mass = DMatrix::from_diagonal(&DVector::from_column_slice(masses));
        let stiffness = matrix_from_rows("stiffness matrix", stiffness)?;
        Self::new(
            mass,
            stiffness,
            alpha,
            beta,
            DVector::from_column_slice(x0),
            DVector::from_column_slice(v0),
        )
    }

    /// Number of degrees of freedom.
    pub fn dof(&self) -> usize {
        self.mass.nrows()
    }

    /// The diagonal mass matrix.
    pub fn mass(&self) -> &DMatrix<f64> {
        &self.mass
    }

    /// The stiffness matrix.
    pub fn stiffness(&self) -> &DMatrix<f64> {
        &self.stiffness
    }

    /// Mass-proportional Rayleigh coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Stiffness-proportional Rayleigh coefficient.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Initial displacement vector.
    pub fn initial_displacement(&self) -> &DVector<f64> {
        &self.x0
    }

    /// Initial velocity vector.
    pub fn initial_velocity(&self) -> &DVector<f64> {
        &self.v0
    }

    /// The Rayleigh damping matrix `C = αM + βK`.
    ///
    /// The solver works with modal damping directly and never needs this;
    /// it is provided for display.
    pub fn damping_matrix(&self) -> DMatrix<f64> {
        &self.mass * self.alpha + &self.stiffness * self.beta
    }
}
