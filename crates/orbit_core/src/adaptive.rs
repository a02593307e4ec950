//! Error-controlled integration on top of the Tsit5 pair.
//!
//! Steps are shortened so that every requested evaluation time is hit
//! exactly; the output is never interpolated.

use crate::error::{ensure_dimension, ensure_finite_state, Result, SimulationError};
use crate::solvers::Tsit5;
use crate::traits::DynamicalSystem;
use crate::trajectory::{TimeSpan, Trajectory};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    pub rtol: f64,
    pub atol: f64,
    /// First trial step. Estimated from the initial slope when absent.
    pub initial_step: Option<f64>,
    pub min_step: f64,
    pub max_step: f64,
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    /// Cap on accepted plus rejected steps for one run.
    pub max_attempts: usize,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            initial_step: None,
            min_step: 1e-12,
            max_step: 1.0,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
            max_attempts: 1_000_000,
        }
    }
}

impl AdaptiveSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(SimulationError::InvalidParameter(msg)) };
        if !(self.rtol >= 0.0 && self.atol >= 0.0) || self.rtol + self.atol <= 0.0 {
            return invalid(format!(
                "tolerances must be non-negative and not both zero (rtol = {}, atol = {})",
                self.rtol, self.atol
            ));
        }
        if !(self.min_step > 0.0 && self.min_step <= self.max_step && self.max_step.is_finite()) {
            return invalid(format!(
                "step bounds must satisfy 0 < min_step <= max_step < inf (got {} and {})",
                self.min_step, self.max_step
            ));
        }
        if let Some(h0) = self.initial_step {
            if !(h0 > 0.0 && h0.is_finite()) {
                return invalid(format!("initial_step must be positive (got {})", h0));
            }
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return invalid(format!("safety must be in (0, 1] (got {})", self.safety));
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0 && self.max_factor > 1.0) {
            return invalid(format!(
                "step factors must satisfy 0 < min_factor < 1 < max_factor (got {} and {})",
                self.min_factor, self.max_factor
            ));
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Integrates `system` from `initial_state` at `span.start`, recording the
/// state at every time in `eval_points`.
///
/// `eval_points` must be non-decreasing and lie inside `span`. The
/// system's `constrain` policy is applied to every accepted step.
pub fn integrate<S>(
    system: &S,
    initial_state: &[f64],
    span: TimeSpan,
    eval_points: &[f64],
    settings: &AdaptiveSettings,
) -> Result<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    settings.validate()?;
    span.validate()?;
    let dim = system.dimension();
    if dim == 0 {
        return Err(SimulationError::InvalidParameter(
            "system has zero dimension".to_string(),
        ));
    }
    ensure_dimension(dim, initial_state.len())?;
    ensure_finite_state(initial_state)?;
    validate_eval_points(span, eval_points)?;

    let mut solver = Tsit5::new(dim);
    let mut trajectory = Trajectory::with_capacity(dim, eval_points.len());
    let mut t = span.start;
    let mut state = initial_state.to_vec();
    let mut next = vec![0.0; dim];
    let mut error = vec![0.0; dim];

    let mut h = match settings.initial_step {
        Some(h0) => h0,
        None => estimate_initial_step(system, t, &state, settings)?,
    };
    h = h.clamp(settings.min_step, settings.max_step);

    let mut attempts = 0usize;
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    for &target in eval_points {
        while t < target {
            if attempts >= settings.max_attempts {
                warn!(
                    "adaptive integration gave up at t = {} after {} attempts",
                    t, attempts
                );
                return Err(SimulationError::Integration {
                    time: t,
                    state,
                    reason: format!("exceeded {} step attempts", settings.max_attempts),
                });
            }
            attempts += 1;

            let remaining = target - t;
            let clipped = h >= remaining;
            let dt = if clipped { remaining } else { h };
            if !clipped && t + dt == t {
                return Err(SimulationError::Integration {
                    time: t,
                    state,
                    reason: format!("step size {:e} vanishes relative to t", dt),
                });
            }

            solver.attempt(system, t, &state, dt, &mut next, &mut error);
            if !all_finite(solver.slope()) {
                return Err(SimulationError::NumericOverflow {
                    step: accepted,
                    time: t,
                    state,
                });
            }

            let err = error_norm(&state, &next, &error, settings);
            let factor = step_factor(err, settings);

            if err <= 1.0 {
                t = if clipped { target } else { t + dt };
                accepted += 1;
                // Checked before the clamp, which would floor -inf to zero.
                if !all_finite(&next) {
                    return Err(SimulationError::NumericOverflow {
                        step: accepted,
                        time: t,
                        state: next,
                    });
                }
                system.constrain(&mut next);
                std::mem::swap(&mut state, &mut next);

                let proposal = dt * factor;
                // A step shortened to land on an eval point says nothing
                // about the step size the dynamics allow.
                h = if clipped { proposal.max(h) } else { proposal };
                h = h.min(settings.max_step);
            } else {
                rejected += 1;
                h = dt * factor;
                if h < settings.min_step {
                    warn!(
                        "adaptive step underflow at t = {}: {:e} < {:e}",
                        t, h, settings.min_step
                    );
                    return Err(SimulationError::Integration {
                        time: t,
                        state,
                        reason: format!(
                            "step size {:e} fell below minimum {:e}",
                            h, settings.min_step
                        ),
                    });
                }
            }
        }
        trajectory.push(target, &state);
    }

    debug!(
        "adaptive integration over [{}, {}]: {} accepted, {} rejected steps",
        span.start, span.end, accepted, rejected
    );
    Ok(trajectory)
}

fn validate_eval_points(span: TimeSpan, eval_points: &[f64]) -> Result<()> {
    if eval_points.is_empty() {
        return Err(SimulationError::InvalidParameter(
            "at least one evaluation point is required".to_string(),
        ));
    }
    for (i, &p) in eval_points.iter().enumerate() {
        if !p.is_finite() || p < span.start || p > span.end {
            return Err(SimulationError::InvalidParameter(format!(
                "evaluation point {} ({}) lies outside [{}, {}]",
                i, p, span.start, span.end
            )));
        }
        if i > 0 && p < eval_points[i - 1] {
            return Err(SimulationError::InvalidParameter(format!(
                "evaluation points must be non-decreasing ({} follows {})",
                p,
                eval_points[i - 1]
            )));
        }
    }
    Ok(())
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Scaled RMS norm of the local error estimate; <= 1 means acceptable.
fn error_norm(state: &[f64], next: &[f64], error: &[f64], settings: &AdaptiveSettings) -> f64 {
    let sum: f64 = state
        .iter()
        .zip(next)
        .zip(error)
        .map(|((y0, y1), e)| {
            let scale = settings.atol + settings.rtol * y0.abs().max(y1.abs());
            let ratio = e / scale;
            ratio * ratio
        })
        .sum();
    (sum / state.len() as f64).sqrt()
}

fn step_factor(err: f64, settings: &AdaptiveSettings) -> f64 {
    if err == 0.0 {
        settings.max_factor
    } else if err.is_finite() {
        (settings.safety * err.powf(-0.2)).clamp(settings.min_factor, settings.max_factor)
    } else {
        settings.min_factor
    }
}

/// Hairer's starting-step heuristic: a hundredth of the ratio between the
/// scaled state and scaled slope norms.
fn estimate_initial_step<S>(
    system: &S,
    t: f64,
    state: &[f64],
    settings: &AdaptiveSettings,
) -> Result<f64>
where
    S: DynamicalSystem<f64>,
{
    let mut slope = vec![0.0; state.len()];
    system.apply(t, state, &mut slope);
    if !all_finite(&slope) {
        return Err(SimulationError::NumericOverflow {
            step: 0,
            time: t,
            state: state.to_vec(),
        });
    }

    let n = state.len() as f64;
    let (mut d0, mut d1) = (0.0, 0.0);
    for (y, f) in state.iter().zip(&slope) {
        let scale = settings.atol + settings.rtol * y.abs();
        d0 += (y / scale).powi(2);
        d1 += (f / scale).powi(2);
    }
    let (d0, d1) = ((d0 / n).sqrt(), (d1 / n).sqrt());

    Ok(if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    })
}
