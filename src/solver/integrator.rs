//! Fixed-step symplectic Euler integration of a single modal oscillator.
//!
//! Each decoupled mode obeys
//!
//! ```text
//! u'' = -2·c·ω·u' - ω²·u
//! ```
//!
//! and is advanced with the semi-implicit scheme
//!
//! ```text
//! v[n+1] = v[n] + dt · f(v[n], u[n])
//! u[n+1] = u[n] + dt · v[n+1]
//! ```
//!
//! Velocity is updated first and the new velocity drives the position
//! update. Swapping the two lines turns this into explicit Euler, which
//! gains energy on an undamped oscillator.

use tracing::trace;

use crate::error::{MdofError, Result};
use crate::system::validate_horizon;

use super::{ModalState, MAX_INTEGRATION_STEPS, MAX_OUTPUT_SAMPLES};

/// Sampled trajectory of one mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeHistory {
    /// Sample times, starting at 0
    pub time: Vec<f64>,
    /// Modal displacement at each sample
    pub displacement: Vec<f64>,
    /// Modal velocity at each sample
    pub velocity: Vec<f64>,
}

impl TimeHistory {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            time: Vec::with_capacity(capacity),
            displacement: Vec::with_capacity(capacity),
            velocity: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, t: f64, u: f64, v: f64) {
        self.time.push(t);
        self.displacement.push(u);
        self.velocity.push(v);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Iterate over `(t, u, v)` samples.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.time
            .iter()
            .zip(&self.displacement)
            .zip(&self.velocity)
            .map(|((&t, &u), &v)| (t, u, v))
    }

    /// Oscillator energy `½v² + ½ω²u²` at each sample.
    pub fn energy(&self, omega: f64) -> Vec<f64> {
        self.samples()
            .map(|(_, u, v)| 0.5 * v * v + 0.5 * omega * omega * u * u)
            .collect()
    }
}

/// Symplectic Euler integrator with a fixed micro-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModalIntegrator {
    dt: f64,
}

impl ModalIntegrator {
    /// Create an integrator with step `dt` (seconds).
    pub fn new(dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(MdofError::invalid_param(format!(
                "integration step must be positive, got {dt}"
            )));
        }
        Ok(Self { dt })
    }

    /// The integration step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of steps needed to reach `horizon`: `ceil(horizon / dt)`.
    ///
    /// Ratios within rounding noise of an integer are not bumped up. More than
    /// [`MAX_INTEGRATION_STEPS`] steps is an error.
    pub fn step_count(&self, horizon: f64) -> Result<usize> {
        let ratio = horizon / self.dt;
        let nearest = ratio.round();
        let steps = if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest
        } else {
            ratio.ceil()
        };
        let too_many = || {
            MdofError::invalid_param(format!(
                "horizon {horizon} needs {ratio:e} steps of {}, more than the limit of {MAX_INTEGRATION_STEPS}",
                self.dt
            ))
        };
        if !(steps.is_finite() && steps <= MAX_INTEGRATION_STEPS as f64) {
            return Err(too_many());
        }
        usize::try_from(steps as u64).map_err(|_| too_many())
    }

    /// Number of samples `integrate_sampled` emits for `steps` steps.
    fn sample_count(steps: usize, stride: usize) -> Result<usize> {
        let extra = usize::from(steps % stride != 0);
        let samples = (steps / stride)
            .checked_add(1 + extra)
            .filter(|&n| n <= MAX_OUTPUT_SAMPLES)
            .ok_or_else(|| {
                MdofError::invalid_param(format!(
                    "{steps} steps at stride {stride} exceed {MAX_OUTPUT_SAMPLES} output samples; raise the stride"
                ))
            })?;
        Ok(samples)
    }

    /// Advance `(u, v)` by one step.
    #[inline]
    pub fn step(&self, u: f64, v: f64, damping: f64, omega: f64) -> (f64, f64) {
        let accel = -2.0 * damping * omega * v - omega * omega * u;
        let v_next = v + self.dt * accel;
        let u_next = u + self.dt * v_next;
        (u_next, v_next)
    }

    /// Integrate a mode from `t = 0` to `horizon`, keeping every step.
    pub fn integrate(&self, state: &ModalState, horizon: f64) -> Result<TimeHistory> {
        self.integrate_sampled(state, horizon, 1)
    }

    /// Integrate a mode from `t = 0` to `horizon`, keeping steps
    /// `0, stride, 2·stride, ...` and always the final step.
    pub fn integrate_sampled(
        &self,
        state: &ModalState,
        horizon: f64,
        stride: usize,
    ) -> Result<TimeHistory> {
        validate_horizon(horizon)?;
        if stride == 0 {
            return Err(MdofError::invalid_param("output stride must be at least 1"));
        }
        let inputs = [state.displacement, state.velocity, state.omega, state.damping];
        if !inputs.iter().all(|v| v.is_finite()) {
            return Err(MdofError::non_finite("modal integration input"));
        }

        let steps = self.step_count(horizon)?;
        let samples = Self::sample_count(steps, stride)?;
        let mut history = TimeHistory::with_capacity(samples);

        trace!(mode = state.mode, steps, omega = state.omega, "integrating mode");

        let (mut u, mut v) = (state.displacement, state.velocity);
        history.push(0.0, u, v);
        for n in 1..=steps {
            (u, v) = self.step(u, v, state.damping, state.omega);
            if n % stride == 0 || n == steps {
                history.push(n as f64 * self.dt, u, v);
            }
        }

        if !(u.is_finite() && v.is_finite()) {
            return Err(MdofError::non_finite("modal integration"));
        }

        trace!(mode = state.mode, samples = history.len(), "mode integrated");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn state(u: f64, v: f64, omega: f64, damping: f64) -> ModalState {
        ModalState {
            mode: 0,
            displacement: u,
            velocity: v,
            omega,
            damping,
        }
    }

    #[test]
    fn test_rejects_bad_step() {
        assert!(ModalIntegrator::new(0.0).is_err());
        assert!(ModalIntegrator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_step_count() {
        let integrator = ModalIntegrator::new(1e-4).unwrap();
        assert_eq!(integrator.step_count(1.0).unwrap(), 10_000);
        assert_eq!(integrator.step_count(0.00025).unwrap(), 3);
        assert_eq!(integrator.step_count(2.0 * PI).unwrap(), 62_832);
    }

    #[test]
    fn test_huge_horizon_rejected() {
        let integrator = ModalIntegrator::new(1e-4).unwrap();
        let unit = state(1.0, 0.0, 1.0, 0.0);

        let err = integrator.integrate(&unit, 1e300).unwrap_err();
        assert!(err.is_configuration());
        assert!(integrator.step_count(f64::MAX).is_err());

        // Within the step limit but too many samples to keep at stride 1
        let horizon = (MAX_OUTPUT_SAMPLES as f64) * 1e-4 * 10.0;
        let err = integrator.integrate(&unit, horizon).unwrap_err();
        assert!(matches!(err, MdofError::InvalidSimulationParam { .. }));
    }

    #[test]
    fn test_sample_count_matches_history() {
        let integrator = ModalIntegrator::new(0.01).unwrap();
        for stride in [1, 3, 5, 10, 20] {
            let history = integrator
                .integrate_sampled(&state(1.0, 0.0, 1.0, 0.0), 0.1, stride)
                .unwrap();
            assert_eq!(ModalIntegrator::sample_count(10, stride).unwrap(), history.len());
        }
    }

    #[test]
    fn test_velocity_updated_before_position() {
        let integrator = ModalIntegrator::new(0.1).unwrap();
        let (u, v) = integrator.step(1.0, 0.0, 0.0, 1.0);
        // v1 = 0 + 0.1 * (-1) = -0.1, u1 = 1 + 0.1 * v1
        assert_abs_diff_eq!(v, -0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(u, 0.99, epsilon = 1e-15);
    }

    #[test]
    fn test_sample_grid() {
        let integrator = ModalIntegrator::new(0.01).unwrap();
        let history = integrator.integrate(&state(1.0, 0.0, 1.0, 0.0), 0.1).unwrap();

        assert_eq!(history.len(), 11);
        assert_eq!(history.time[0], 0.0);
        assert_eq!(history.displacement[0], 1.0);
        assert_abs_diff_eq!(history.time[10], 0.1, epsilon = 1e-15);
        assert!(history.time.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_stride_keeps_final_sample() {
        let integrator = ModalIntegrator::new(0.01).unwrap();
        let history = integrator
            .integrate_sampled(&state(1.0, 0.0, 1.0, 0.0), 0.1, 3)
            .unwrap();

        // steps 0, 3, 6, 9, 10
        assert_eq!(history.len(), 5);
        assert_abs_diff_eq!(history.time[3], 0.09, epsilon = 1e-15);
        assert_abs_diff_eq!(history.time[4], 0.1, epsilon = 1e-15);
    }

    #[test]
    fn test_unit_oscillator_period() {
        let integrator = ModalIntegrator::new(1e-4).unwrap();
        let history = integrator
            .integrate(&state(1.0, 0.0, 1.0, 0.0), 2.0 * PI)
            .unwrap();

        let last = history.len() - 1;
        assert_abs_diff_eq!(history.displacement[last], 1.0, epsilon = 1e-3);

        // Half a period later the mode is at the opposite extreme
        let half = history.len() / 2;
        assert_abs_diff_eq!(history.displacement[half], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_frequency_is_free_motion() {
        let integrator = ModalIntegrator::new(1e-3).unwrap();
        let history = integrator.integrate(&state(2.0, 0.5, 0.0, 0.0), 1.0).unwrap();

        let last = history.len() - 1;
        assert_abs_diff_eq!(history.velocity[last], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(history.displacement[last], 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let integrator = ModalIntegrator::new(1e-3).unwrap();
        let err = integrator
            .integrate(&state(1.0, 0.0, f64::INFINITY, 0.0), 1.0)
            .unwrap_err();
        assert!(err.is_domain());

        let err = integrator
            .integrate(&state(1.0, 0.0, 1.0, f64::NAN), 1.0)
            .unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn test_invalid_horizon() {
        let integrator = ModalIntegrator::new(1e-3).unwrap();
        let err = integrator.integrate(&state(1.0, 0.0, 1.0, 0.0), -1.0).unwrap_err();
        assert!(matches!(err, MdofError::InvalidHorizon { .. }));
    }

    #[test]
    fn test_unstable_step_reports_non_finite() {
        // ω·dt far beyond the stability limit of 2
        let integrator = ModalIntegrator::new(1.0).unwrap();
        let err = integrator
            .integrate(&state(1.0, 0.0, 100.0, 0.0), 1000.0)
            .unwrap_err();
        assert!(matches!(err, MdofError::NonFinite { .. }));
    }
}
