//! Entry point for consumers: sample a field over a time span.

use crate::adaptive::{integrate, AdaptiveSettings};
use crate::error::{ensure_dimension, ensure_finite_state, Result, SimulationError};
use crate::fields::{Advancer, FieldKind};
use crate::params::Parameters;
use crate::solvers::Euler;
use crate::traits::{DynamicalSystem, Steppable};
use crate::trajectory::{time_grid, TimeSpan, Trajectory};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Overrides the field's own advancer choice.
    pub advancer: Option<Advancer>,
    /// Euler steps taken per grid interval.
    pub euler_substeps: usize,
    pub adaptive: AdaptiveSettings,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            advancer: None,
            euler_substeps: 1,
            adaptive: AdaptiveSettings::default(),
        }
    }
}

/// Samples a built-in field at `n_points` evenly spaced times across `span`.
pub fn run(
    field: FieldKind,
    params: &Parameters,
    initial_state: &[f64],
    span: TimeSpan,
    n_points: usize,
) -> Result<Trajectory> {
    run_with(
        field,
        params,
        initial_state,
        span,
        n_points,
        &SamplerSettings::default(),
    )
}

pub fn run_with(
    field: FieldKind,
    params: &Parameters,
    initial_state: &[f64],
    span: TimeSpan,
    n_points: usize,
    settings: &SamplerSettings,
) -> Result<Trajectory> {
    let system = field.build(params)?;
    let advancer = settings.advancer.unwrap_or_else(|| field.advancer());
    debug!(
        "sampling {} with {:?} over [{}, {}] at {} points",
        field, advancer, span.start, span.end, n_points
    );
    sample(&system, advancer, initial_state, span, n_points, settings)
}

/// Samples any derivative field; `run` is this with a built-in field.
pub fn sample<S>(
    system: &S,
    advancer: Advancer,
    initial_state: &[f64],
    span: TimeSpan,
    n_points: usize,
    settings: &SamplerSettings,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    check_state(system, initial_state)?;
    let grid = time_grid(span, n_points)?;

    match advancer {
        Advancer::Euler => euler_on_grid(system, initial_state, &grid, settings.euler_substeps),
        Advancer::Adaptive => integrate(system, initial_state, span, &grid, &settings.adaptive),
    }
}

/// Accepts a state only if it has the field's dimension, is finite and
/// already satisfies the field's constraint. Caller input is never
/// rewritten to make it fit.
pub fn check_state<S>(system: &S, state: &[f64]) -> Result<()>
where
    S: DynamicalSystem<f64>,
{
    ensure_dimension(system.dimension(), state.len())?;
    ensure_finite_state(state)?;
    let mut constrained = state.to_vec();
    system.constrain(&mut constrained);
    if constrained != state {
        return Err(SimulationError::InvalidParameter(format!(
            "initial state {:?} lies outside the field's admissible region",
            state
        )));
    }
    Ok(())
}

fn euler_on_grid<S>(
    system: &S,
    initial_state: &[f64],
    grid: &[f64],
    substeps: usize,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    if substeps == 0 {
        return Err(SimulationError::InvalidParameter(
            "euler_substeps must be at least 1".to_string(),
        ));
    }

    let dim = initial_state.len();
    let mut solver = Euler::new(dim);
    let mut trajectory = Trajectory::with_capacity(dim, grid.len());
    let mut state = initial_state.to_vec();
    trajectory.push(grid[0], &state);

    let mut step = 0usize;
    for window in grid.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        let h = (t1 - t0) / substeps as f64;
        let mut t = t0;
        for _ in 0..substeps {
            solver.step(system, &mut t, &mut state, h);
            step += 1;
            if !solver.slope().iter().chain(&state).all(|v| v.is_finite()) {
                return Err(SimulationError::NumericOverflow {
                    step,
                    time: t,
                    state,
                });
            }
        }
        trajectory.push(t1, &state);
    }

    Ok(trajectory)
}
