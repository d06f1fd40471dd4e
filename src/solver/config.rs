//! Solver configuration.

use std::str::FromStr;

use crate::error::{MdofError, Result};

use super::{
    DEFAULT_INTEGRATION_STEP, DEFAULT_REST_THRESHOLD, DEFAULT_RIGID_BODY_TOLERANCE,
    DEFAULT_SYMMETRY_TOLERANCE,
};

/// How modal damping is derived from the Rayleigh coefficients.
///
/// With `λ = ω²` the eigenvalue of a mode:
/// - `Source`: `c = α / (2λ) + β·ω / 2`
/// - `RayleighRatio`: `ζ = α / (2ω) + β·ω / 2`, the textbook damping ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalDampingFormula {
    #[default]
    Source,
    RayleighRatio,
}

impl FromStr for ModalDampingFormula {
    type Err = MdofError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "rayleigh" | "rayleigh-ratio" | "ratio" => Ok(Self::RayleighRatio),
            _ => Err(MdofError::invalid_param(format!("unknown damping formula '{s}'"))),
        }
    }
}

/// How the stiffness operator `W` is scaled by the masses before the
/// eigen-decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StiffnessScaling {
    /// `W = M^½ · K · M^½`
    #[default]
    Source,
    /// `W = M^-½ · K · M^-½`; eigenvalues are the squared natural
    /// frequencies of `M x'' + K x = 0` for any positive masses
    MassNormalized,
}

impl FromStr for StiffnessScaling {
    type Err = MdofError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "source" => Ok(Self::Source),
            "mass-normalized" | "normalized" => Ok(Self::MassNormalized),
            _ => Err(MdofError::invalid_param(format!("unknown stiffness scaling '{s}'"))),
        }
    }
}

/// Configuration for the modal solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Integration micro-step in seconds.
    pub dt_int: f64,
    /// Relative amplitude below which trailing samples count as at rest.
    pub rest_threshold: f64,
    /// Keep every n-th micro-step in the response.
    pub output_stride: usize,
    /// Relative size below which an eigenvalue is treated as zero.
    pub rigid_body_tolerance: f64,
    /// Relative tolerance of the symmetry check on the stiffness operator.
    pub symmetry_tolerance: f64,
    /// Modal damping formula.
    pub damping_formula: ModalDampingFormula,
    /// Mass scaling of the stiffness operator.
    pub stiffness_scaling: StiffnessScaling,
    /// Integrate modes concurrently (requires the `parallel` feature).
    pub parallel: bool,
    /// Drop the trailing at-rest samples from the response.
    pub trim: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            dt_int: DEFAULT_INTEGRATION_STEP,
            rest_threshold: DEFAULT_REST_THRESHOLD,
            output_stride: 1,
            rigid_body_tolerance: DEFAULT_RIGID_BODY_TOLERANCE,
            symmetry_tolerance: DEFAULT_SYMMETRY_TOLERANCE,
            damping_formula: ModalDampingFormula::default(),
            stiffness_scaling: StiffnessScaling::default(),
            parallel: false,
            trim: true,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the integration micro-step (seconds).
    ///
    /// The symplectic Euler scheme is stable for `ω·dt < 2`; keep
    /// `ω·dt` well below that for the highest mode.
    pub fn with_dt(mut self, dt_int: f64) -> Self {
        self.dt_int = dt_int;
        self
    }

    /// Set the relative rest threshold used for trimming.
    pub fn with_rest_threshold(mut self, rest_threshold: f64) -> Self {
        self.rest_threshold = rest_threshold;
        self
    }

    /// Keep only every `stride`-th micro-step in the response.
    pub fn with_output_stride(mut self, stride: usize) -> Self {
        self.output_stride = stride;
        self
    }

    /// Set the relative rigid-body eigenvalue tolerance.
    pub fn with_rigid_body_tolerance(mut self, tolerance: f64) -> Self {
        self.rigid_body_tolerance = tolerance;
        self
    }

    /// Set the relative symmetry tolerance.
    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }

    /// Select the modal damping formula.
    pub fn with_damping_formula(mut self, formula: ModalDampingFormula) -> Self {
        self.damping_formula = formula;
        self
    }

    /// Select the stiffness scaling.
    pub fn with_stiffness_scaling(mut self, scaling: StiffnessScaling) -> Self {
        self.stiffness_scaling = scaling;
        self
    }

    /// Integrate modes concurrently.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable trailing-rest trimming.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.dt_int.is_finite() && self.dt_int > 0.0) {
            return Err(MdofError::invalid_param(format!(
                "integration step must be positive, got {}",
                self.dt_int
            )));
        }
        if !(self.rest_threshold.is_finite() && (0.0..1.0).contains(&self.rest_threshold)) {
            return Err(MdofError::invalid_param(format!(
                "rest threshold must be in [0, 1), got {}",
                self.rest_threshold
            )));
        }
        if self.output_stride == 0 {
            return Err(MdofError::invalid_param("output stride must be at least 1"));
        }
        for (name, value) in [
            ("rigid-body tolerance", self.rigid_body_tolerance),
            ("symmetry tolerance", self.symmetry_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MdofError::invalid_param(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.dt_int, 1e-4);
        assert_eq!(config.rest_threshold, 0.005);
        assert_eq!(config.damping_formula, ModalDampingFormula::Source);
        assert_eq!(config.stiffness_scaling, StiffnessScaling::Source);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_validation() {
        let config = SolverConfig::new().with_dt(0.0);
        assert!(config.validate().unwrap_err().is_configuration());

        let config = SolverConfig::new().with_output_stride(0);
        assert!(config.validate().is_err());

        let config = SolverConfig::new().with_rest_threshold(1.5);
        assert!(config.validate().is_err());

        let config = SolverConfig::new()
            .with_dt(1e-3)
            .with_output_stride(10)
            .with_trim(false);
        assert!(config.validate().is_ok());
        assert!(!config.trim);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "Rayleigh".parse::<ModalDampingFormula>().unwrap(),
            ModalDampingFormula::RayleighRatio
        );
        assert_eq!(
            "mass-normalized".parse::<StiffnessScaling>().unwrap(),
            StiffnessScaling::MassNormalized
        );
        let err = "bogus".parse::<StiffnessScaling>().unwrap_err();
        assert!(err.is_configuration());
        assert!("bogus".parse::<ModalDampingFormula>().is_err());
    }
}
