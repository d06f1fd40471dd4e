//! Modal decomposition of a coupled system.
//!
//! The coupled equations `M x'' + C x' + K x = 0` are diagonalized by a
//! similarity transform built from the mass square roots and the
//! eigenvectors of the scaled stiffness operator:
//!
//! ```text
//! W    = M^½ · K · M^½          (see StiffnessScaling)
//! W    = P · Λ · Pᵗ
//! S    = M^-½ · P               modal -> physical
//! S⁻¹  = Pᵗ · M^½               physical -> modal
//! ```

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::error::{MdofError, Result};
use crate::linalg::{self, all_finite};
use crate::system::System;

use super::{ModalDampingFormula, SolverConfig, StiffnessScaling, RESOLUTION_LIMIT};

/// Initial state of a single decoupled mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalState {
    /// Mode index (ascending eigenvalue order)
    pub mode: usize,
    /// Initial modal displacement
    pub displacement: f64,
    /// Initial modal velocity
    pub velocity: f64,
    /// Undamped natural frequency ω (rad/s)
    pub omega: f64,
    /// Modal damping coefficient
    pub damping: f64,
}

/// The transform that decouples a [`System`], plus per-mode parameters.
#[derive(Debug, Clone)]
pub struct ModalDecomposition {
    sqrt_mass: DMatrix<f64>,
    inv_sqrt_mass: DMatrix<f64>,
    operator: DMatrix<f64>,
    eigenvalues: DVector<f64>,
    shapes: DMatrix<f64>,
    to_physical: DMatrix<f64>,
    to_modal: DMatrix<f64>,
    frequencies: DVector<f64>,
    damping: DVector<f64>,
    rigid: Vec<bool>,
}

/// Decompose a system into independent modal oscillators.
pub fn decompose(system: &System, config: &SolverConfig) -> Result<ModalDecomposition> {
    config.validate()?;

    let sqrt_mass = linalg::diag_sqrt(system.mass())?;
    let inv_sqrt_mass = linalg::diag_inv_sqrt(system.mass())?;

    let operator = match config.stiffness_scaling {
        StiffnessScaling::Source => &sqrt_mass * system.stiffness() * &sqrt_mass,
        StiffnessScaling::MassNormalized => &inv_sqrt_mass * system.stiffness() * &inv_sqrt_mass,
    };

    let eigen = linalg::symmetric_eigendecompose(&operator, config.symmetry_tolerance)?;
    let shapes = eigen.eigenvectors;
    let (eigenvalues, rigid) = classify_eigenvalues(eigen.eigenvalues, config.rigid_body_tolerance)?;

    let to_physical = &inv_sqrt_mass * &shapes;
    let to_modal = shapes.transpose() * &sqrt_mass;

    let frequencies = eigenvalues.map(f64::sqrt);
    let damping = DVector::from_iterator(
        eigenvalues.len(),
        (0..eigenvalues.len()).map(|i| {
            modal_damping(
                config.damping_formula,
                system.alpha(),
                system.beta(),
                eigenvalues[i],
                rigid[i],
            )
        }),
    );

    if !all_finite(to_physical.as_slice())
        || !all_finite(to_modal.as_slice())
        || !all_finite(damping.as_slice())
    {
        return Err(MdofError::non_finite("modal decomposition"));
    }

    for (mode, &is_rigid) in rigid.iter().enumerate() {
        if is_rigid {
            warn!(mode, "rigid-body mode detected, treating as undamped free motion");
        }
        let resolution = frequencies[mode] * config.dt_int;
        if resolution > RESOLUTION_LIMIT {
            warn!(
                mode,
                omega = frequencies[mode],
                dt = config.dt_int,
                "mode is under-resolved by the integration step"
            );
        }
    }

    debug!(
        dof = system.dof(),
        eigenvalues = ?eigenvalues.as_slice(),
        damping = ?damping.as_slice(),
        "modal decomposition complete"
    );

    Ok(ModalDecomposition {
        sqrt_mass,
        inv_sqrt_mass,
        operator,
        eigenvalues,
        shapes,
        to_physical,
        to_modal,
        frequencies,
        damping,
        rigid,
    })
}

/// Clamp near-zero eigenvalues to zero and reject negative ones.
///
/// An eigenvalue is rigid-body when `|λ| ≤ tolerance · max(1, max|λ|)`, so
/// the cutoff never drops below `tolerance` itself. An all-zero spectrum is
/// entirely rigid-body.
fn classify_eigenvalues(
    mut eigenvalues: DVector<f64>,
    tolerance: f64,
) -> Result<(DVector<f64>, Vec<bool>)> {
    let cutoff = tolerance * eigenvalues.amax().max(1.0);
    let mut rigid = vec![false; eigenvalues.len()];

    for (mode, value) in eigenvalues.iter_mut().enumerate() {
        if value.abs() <= cutoff {
            *value = 0.0;
            rigid[mode] = true;
        } else if *value < 0.0 {
            return Err(MdofError::NegativeEigenvalue { mode, value: *value });
        }
    }

    Ok((eigenvalues, rigid))
}

/// Damping coefficient of one mode from the Rayleigh coefficients.
///
/// Rigid-body modes are undamped.
pub fn modal_damping(
    formula: ModalDampingFormula,
    alpha: f64,
    beta: f64,
    eigenvalue: f64,
    rigid: bool,
) -> f64 {
    if rigid {
        return 0.0;
    }
    let omega = eigenvalue.sqrt();
    match formula {
        ModalDampingFormula::Source => alpha / (2.0 * eigenvalue) + beta * omega / 2.0,
        ModalDampingFormula::RayleighRatio => alpha / (2.0 * omega) + beta * omega / 2.0,
    }
}

impl ModalDecomposition {
    /// Number of modes (equals the number of DOFs).
    pub fn dof(&self) -> usize {
        self.eigenvalues.len()
    }

    /// `M^½`.
    pub fn sqrt_mass(&self) -> &DMatrix<f64> {
        &self.sqrt_mass
    }

    /// `M^-½`, zero where the mass is zero.
    pub fn inv_sqrt_mass(&self) -> &DMatrix<f64> {
        &self.inv_sqrt_mass
    }

    /// The scaled stiffness operator `W`.
    pub fn operator(&self) -> &DMatrix<f64> {
        &self.operator
    }

    /// Eigenvalues of `W` (squared natural frequencies), ascending.
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    /// Unit-norm eigenvectors of `W` as columns (`P`).
    pub fn eigenvectors(&self) -> &DMatrix<f64> {
        &self.shapes
    }

    /// Modal-to-physical transform `S`; its columns are the mode shapes.
    pub fn to_physical(&self) -> &DMatrix<f64> {
        &self.to_physical
    }

    /// Physical-to-modal transform `S⁻¹`.
    pub fn to_modal(&self) -> &DMatrix<f64> {
        &self.to_modal
    }

    /// Mode shapes in physical coordinates, one per mode.
    pub fn mode_shapes(&self) -> Vec<DVector<f64>> {
        self.to_physical
            .column_iter()
            .map(|column| column.into_owned())
            .collect()
    }

    /// Undamped natural frequencies `ω_i` (rad/s).
    pub fn natural_frequencies(&self) -> &DVector<f64> {
        &self.frequencies
    }

    /// Modal damping coefficients.
    pub fn modal_damping(&self) -> &DVector<f64> {
        &self.damping
    }

    /// True if mode `i` has zero frequency.
    pub fn is_rigid_body(&self, mode: usize) -> bool {
        self.rigid.get(mode).copied().unwrap_or(false)
    }

    /// Map a physical vector into modal coordinates.
    pub fn project(&self, physical: &DVector<f64>) -> Result<DVector<f64>> {
        if physical.len() != self.dof() {
            return Err(MdofError::dimension("physical vector", self.dof(), physical.len()));
        }
        Ok(&self.to_modal * physical)
    }

    /// Map a modal vector back into physical coordinates.
    pub fn recompose(&self, modal: &DVector<f64>) -> Result<DVector<f64>> {
        if modal.len() != self.dof() {
            return Err(MdofError::dimension("modal vector", self.dof(), modal.len()));
        }
        Ok(&self.to_physical * modal)
    }

    /// Modal initial states for physical initial conditions.
    pub fn modal_states(&self, x0: &DVector<f64>, v0: &DVector<f64>) -> Result<Vec<ModalState>> {
        let r0 = self.project(x0)?;
        let rv0 = self.project(v0)?;

        Ok((0..self.dof())
            .map(|mode| ModalState {
                mode,
                displacement: r0[mode],
                velocity: rv0[mode],
                omega: self.frequencies[mode],
                damping: self.damping[mode],
            })
            .collect())
    }

    /// Largest deviation from identity of `S·S⁻¹` and `S⁻¹·S`.
    pub fn roundtrip_error(&self) -> f64 {
        let forward = &self.to_physical * &self.to_modal;
        let backward = &self.to_modal * &self.to_physical;
        linalg::identity_deviation(&forward).max(linalg::identity_deviation(&backward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chain(masses: &[f64], k: f64, alpha: f64, beta: f64) -> System {
        let n = masses.len();
        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            rows[i][i] = if i + 1 < n { 2.0 * k } else { k };
            if i + 1 < n {
                rows[i][i + 1] = -k;
                rows[i + 1][i] = -k;
            }
        }
        System::from_masses(masses, &rows, alpha, beta, &vec![1.0; n], &vec![0.0; n]).unwrap()
    }

    #[test]
    fn test_single_dof_frequency() {
        let system = System::from_masses(&[1.0], &[vec![4.0]], 0.0, 0.0, &[1.0], &[0.0]).unwrap();
        let modes = decompose(&system, &SolverConfig::default()).unwrap();

        assert_relative_eq!(modes.eigenvalues()[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(modes.natural_frequencies()[0], 2.0, epsilon = 1e-12);
        assert!(!modes.is_rigid_body(0));
    }

    #[test]
    fn test_source_scaling_operator() {
        let system = chain(&[4.0, 1.0], 1.0, 0.0, 0.0);
        let modes = decompose(&system, &SolverConfig::default()).unwrap();

        // W = M^½ K M^½ with M^½ = diag(2, 1)
        assert_relative_eq!(modes.operator()[(0, 0)], 2.0 * 2.0 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(modes.operator()[(0, 1)], -2.0, epsilon = 1e-12);
        assert_relative_eq!(modes.operator()[(1, 1)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform_roundtrip() {
        let system = chain(&[3.0, 1.0, 7.0, 2.0], 5.0, 0.1, 0.01);
        for scaling in [StiffnessScaling::Source, StiffnessScaling::MassNormalized] {
            let config = SolverConfig::default().with_stiffness_scaling(scaling);
            let modes = decompose(&system, &config).unwrap();
            assert!(modes.roundtrip_error() < 1e-10);
        }
    }

    #[test]
    fn test_mass_normalized_decouples() {
        let system = chain(&[3.0, 1.0, 7.0], 5.0, 0.0, 0.0);
        let config = SolverConfig::default().with_stiffness_scaling(StiffnessScaling::MassNormalized);
        let modes = decompose(&system, &config).unwrap();

        let s = modes.to_physical();
        let modal_mass = s.transpose() * system.mass() * s;
        let modal_stiffness = s.transpose() * system.stiffness() * s;
        for i in 0..3 {
            for j in 0..3 {
                let expected_m = if i == j { 1.0 } else { 0.0 };
                let expected_k = if i == j { modes.eigenvalues()[i] } else { 0.0 };
                assert_relative_eq!(modal_mass[(i, j)], expected_m, epsilon = 1e-10);
                assert_relative_eq!(modal_stiffness[(i, j)], expected_k, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_stiffness_is_rigid() {
        let system = System::from_masses(
            &[5.0, 5.0],
            &[vec![0.0, 0.0], vec![0.0, 0.0]],
            1.0,
            1.0,
            &[10.0, 10.0],
            &[0.0, 0.0],
        )
        .unwrap();
        let modes = decompose(&system, &SolverConfig::default()).unwrap();

        assert!(modes.is_rigid_body(0));
        assert!(modes.is_rigid_body(1));
        assert_eq!(modes.modal_damping().as_slice(), &[0.0, 0.0]);
        assert_eq!(modes.natural_frequencies().as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn test_tiny_stiffness_is_rigid() {
        let system =
            System::from_masses(&[1.0], &[vec![1e-10]], 0.5, 0.0, &[1.0], &[0.0]).unwrap();
        let modes = decompose(&system, &SolverConfig::default()).unwrap();

        assert!(modes.is_rigid_body(0));
        assert_eq!(modes.eigenvalues()[0], 0.0);
        assert_eq!(modes.modal_damping()[0], 0.0);

        // A tolerance below the eigenvalue keeps the mode elastic
        let config = SolverConfig::default().with_rigid_body_tolerance(1e-12);
        let modes = decompose(&system, &config).unwrap();
        assert!(!modes.is_rigid_body(0));
        assert!(modes.modal_damping()[0].is_finite());
    }

    #[test]
    fn test_free_chain_has_one_rigid_mode() {
        // Two masses joined by a single spring, nothing to ground
        let system = System::from_masses(
            &[1.0, 1.0],
            &[vec![1.0, -1.0], vec![-1.0, 1.0]],
            0.0,
            0.0,
            &[1.0, 0.0],
            &[0.0, 0.0],
        )
        .unwrap();
        let modes = decompose(&system, &SolverConfig::default()).unwrap();

        assert!(modes.is_rigid_body(0));
        assert!(!modes.is_rigid_body(1));
        assert_relative_eq!(modes.eigenvalues()[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_eigenvalue_rejected() {
        let system =
            System::from_masses(&[1.0], &[vec![-4.0]], 0.0, 0.0, &[1.0], &[0.0]).unwrap();
        let err = decompose(&system, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, MdofError::NegativeEigenvalue { mode: 0, .. }));
        assert!(err.is_domain());
    }

    #[test]
    fn test_asymmetric_stiffness_is_domain_error() {
        let system = System::from_masses(
            &[1.0, 1.0],
            &[vec![2.0, -1.0], vec![0.0, 2.0]],
            0.0,
            0.0,
            &[1.0, 0.0],
            &[0.0, 0.0],
        )
        .unwrap();
        let err = decompose(&system, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, MdofError::AsymmetricMatrix { .. }));
    }

    #[test]
    fn test_damping_formulas() {
        // λ = 4, ω = 2
        let source = modal_damping(ModalDampingFormula::Source, 0.8, 0.1, 4.0, false);
        assert_relative_eq!(source, 0.8 / 8.0 + 0.1 * 2.0 / 2.0);

        let ratio = modal_damping(ModalDampingFormula::RayleighRatio, 0.8, 0.1, 4.0, false);
        assert_relative_eq!(ratio, 0.8 / 4.0 + 0.1 * 2.0 / 2.0);

        assert_eq!(modal_damping(ModalDampingFormula::Source, 0.8, 0.1, 0.0, true), 0.0);
    }

    #[test]
    fn test_modal_states_project_initial_conditions() {
        let system = chain(&[2.0, 3.0], 4.0, 0.0, 0.0);
        let modes = decompose(&system, &SolverConfig::default()).unwrap();
        let states = modes
            .modal_states(system.initial_displacement(), system.initial_velocity())
            .unwrap();

        assert_eq!(states.len(), 2);
        let r0 = DVector::from_iterator(2, states.iter().map(|s| s.displacement));
        let x0 = modes.recompose(&r0).unwrap();
        assert_relative_eq!(x0[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x0[1], 1.0, epsilon = 1e-12);
        assert!(states.iter().all(|s| s.velocity == 0.0));
    }

    #[test]
    fn test_project_dimension_checked() {
        let system = chain(&[2.0, 3.0], 4.0, 0.0, 0.0);
        let modes = decompose(&system, &SolverConfig::default()).unwrap();
        let err = modes.project(&DVector::zeros(3)).unwrap_err();
        assert!(err.is_configuration());
    }
}
