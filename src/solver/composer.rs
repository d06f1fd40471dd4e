//! Response composition: physical initial conditions in, physical
//! displacement histories out.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{MdofError, Result};
use crate::linalg::all_finite;
use crate::system::{validate_horizon, System};

use super::decompose::{decompose, ModalDecomposition, ModalState};
use super::integrator::{ModalIntegrator, TimeHistory};
use super::SolverConfig;

/// Physical response of every DOF on a shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalResponse {
    /// Sample times, strictly increasing from 0
    pub time: Vec<f64>,
    /// Displacement series, one per DOF
    pub displacement: Vec<Vec<f64>>,
    /// Velocity series, one per DOF
    pub velocity: Vec<Vec<f64>>,
    /// Number of trailing at-rest samples that were dropped
    pub trimmed: usize,
}

impl PhysicalResponse {
    /// Number of degrees of freedom.
    pub fn dof(&self) -> usize {
        self.displacement.len()
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Displacement series of one DOF.
    pub fn dof_displacement(&self, dof: usize) -> Option<&[f64]> {
        self.displacement.get(dof).map(Vec::as_slice)
    }

    /// Velocity series of one DOF.
    pub fn dof_velocity(&self, dof: usize) -> Option<&[f64]> {
        self.velocity.get(dof).map(Vec::as_slice)
    }

    /// Displacement of every DOF at sample `index`.
    pub fn displacement_at(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.displacement.iter().map(|x| x[index]).collect())
    }

    /// Iterate over `(t, [x_1, ..., x_N])` samples.
    pub fn samples(&self) -> impl Iterator<Item = (f64, Vec<f64>)> + '_ {
        self.time
            .iter()
            .enumerate()
            .map(|(n, &t)| (t, self.displacement.iter().map(|x| x[n]).collect()))
    }

    /// Largest absolute displacement of one DOF.
    pub fn peak(&self, dof: usize) -> Option<f64> {
        self.displacement.get(dof).map(Vec::as_slice).map(peak)
    }

    /// Time of the last sample.
    pub fn end_time(&self) -> f64 {
        self.time.last().copied().unwrap_or(0.0)
    }
}

/// Solver for one [`System`], caching its modal decomposition so that
/// several horizons can be simulated without decomposing again.
#[derive(Debug, Clone)]
pub struct Solver {
    system: System,
    config: SolverConfig,
    modes: ModalDecomposition,
    integrator: ModalIntegrator,
}

impl Solver {
    /// Create a solver with default configuration.
    pub fn new(system: System) -> Result<Self> {
        Self::with_config(system, SolverConfig::default())
    }

    /// Create a solver with custom configuration.
    pub fn with_config(system: System, config: SolverConfig) -> Result<Self> {
        let modes = decompose(&system, &config)?;
        let integrator = ModalIntegrator::new(config.dt_int)?;
        Ok(Self {
            system,
            config,
            modes,
            integrator,
        })
    }

    /// The system being solved.
    pub fn system(&self) -> &System {
        &self.system
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The cached modal decomposition.
    pub fn decomposition(&self) -> &ModalDecomposition {
        &self.modes
    }

    /// Initial state of each mode.
    pub fn modal_states(&self) -> Result<Vec<ModalState>> {
        self.modes.modal_states(
            self.system.initial_displacement(),
            self.system.initial_velocity(),
        )
    }

    /// Integrate every mode up to `horizon`.
    pub fn modal_histories(&self, horizon: f64) -> Result<Vec<TimeHistory>> {
        validate_horizon(horizon)?;
        let states = self.modal_states()?;
        integrate_modes(
            &self.integrator,
            &states,
            horizon,
            self.config.output_stride,
            self.config.parallel,
        )
    }

    /// Simulate the system from `t = 0` to `horizon`.
    pub fn solve(&self, horizon: f64) -> Result<PhysicalResponse> {
        let histories = self.modal_histories(horizon)?;
        let time = histories
            .first()
            .map(|h| h.time.clone())
            .ok_or(MdofError::EmptySystem)?;

        let transform = self.modes.to_physical();
        let displacement = recompose(transform, &histories, |h| &h.displacement)?;
        let velocity = recompose(transform, &histories, |h| &h.velocity)?;

        let mut response = PhysicalResponse {
            time,
            displacement,
            velocity,
            trimmed: 0,
        };

        if self.config.trim {
            let drop = trailing_rest_len(&response.displacement, self.config.rest_threshold);
            truncate(&mut response, drop);
        }

        info!(
            dof = response.dof(),
            samples = response.len(),
            trimmed = response.trimmed,
            end_time = response.end_time(),
            "solve complete"
        );
        Ok(response)
    }
}

/// Simulate `system` from `t = 0` to `horizon` with default configuration.
pub fn solve(system: &System, horizon: f64) -> Result<PhysicalResponse> {
    solve_with_config(system, horizon, &SolverConfig::default())
}

/// Simulate `system` from `t = 0` to `horizon`.
pub fn solve_with_config(
    system: &System,
    horizon: f64,
    config: &SolverConfig,
) -> Result<PhysicalResponse> {
    validate_horizon(horizon)?;
    Solver::with_config(system.clone(), config.clone())?.solve(horizon)
}

/// Simulate directly from matrices and initial conditions.
///
/// Equivalent to building a [`System`] and calling [`solve`].
pub fn solve_matrices(
    mass: DMatrix<f64>,
    stiffness: DMatrix<f64>,
    alpha: f64,
    beta: f64,
    x0: DVector<f64>,
    v0: DVector<f64>,
    horizon: f64,
) -> Result<PhysicalResponse> {
    validate_horizon(horizon)?;
    let system = System::new(mass, stiffness, alpha, beta, x0, v0)?;
    solve(&system, horizon)
}

#[cfg(feature = "parallel")]
fn integrate_modes(
    integrator: &ModalIntegrator,
    states: &[ModalState],
    horizon: f64,
    stride: usize,
    parallel: bool,
) -> Result<Vec<TimeHistory>> {
    use rayon::prelude::*;

    if parallel {
        debug!(modes = states.len(), "integrating modes in parallel");
        return states
            .par_iter()
            .map(|state| integrator.integrate_sampled(state, horizon, stride))
            .collect();
    }
    states
        .iter()
        .map(|state| integrator.integrate_sampled(state, horizon, stride))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn integrate_modes(
    integrator: &ModalIntegrator,
    states: &[ModalState],
    horizon: f64,
    stride: usize,
    parallel: bool,
) -> Result<Vec<TimeHistory>> {
    if parallel {
        debug!("built without the `parallel` feature, integrating modes sequentially");
    }
    states
        .iter()
        .map(|state| integrator.integrate_sampled(state, horizon, stride))
        .collect()
}

/// Stack one field of the modal histories as rows and map them to physical
/// coordinates with `transform`. Returns one series per physical DOF.
fn recompose<F>(
    transform: &DMatrix<f64>,
    histories: &[TimeHistory],
    field: F,
) -> Result<Vec<Vec<f64>>>
where
    F: Fn(&TimeHistory) -> &Vec<f64>,
{
    let modes = histories.len();
    let samples = histories.first().map_or(0, TimeHistory::len);
    let modal = DMatrix::from_fn(modes, samples, |i, n| field(&histories[i])[n]);

    let physical = transform * modal;
    if !all_finite(physical.as_slice()) {
        return Err(MdofError::non_finite("recomposition"));
    }

    Ok(physical
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect())
}

/// Largest absolute value in a series.
fn peak(series: &[f64]) -> f64 {
    series.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// Length of the trailing run of samples where every series is below
/// `ratio` times its own peak magnitude.
///
/// The first sample is never counted, so trimming always leaves at least one
/// sample. A series that is identically zero has a zero threshold and
/// therefore never counts as at rest.
pub fn trailing_rest_len(series: &[Vec<f64>], ratio: f64) -> usize {
    let len = series.first().map_or(0, Vec::len);
    let thresholds: Vec<f64> = series.iter().map(|x| ratio * peak(x)).collect();

    (1..len)
        .rev()
        .take_while(|&n| {
            series
                .iter()
                .zip(&thresholds)
                .all(|(x, &threshold)| x[n].abs() < threshold)
        })
        .count()
}

fn truncate(response: &mut PhysicalResponse, drop: usize) {
    if drop == 0 {
        return;
    }
    let keep = response.time.len() - drop;
    response.time.truncate(keep);
    for series in response
        .displacement
        .iter_mut()
        .chain(response.velocity.iter_mut())
    {
        series.truncate(keep);
    }
    response.trimmed = drop;
    debug!(dropped = drop, kept = keep, "trimmed trailing rest samples");
}
