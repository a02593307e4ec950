//! Stateless helpers: defaults, pendulum sampling and trajectory comparison.

use crate::system::to_js_error;
use anyhow::{bail, Context, Result};
use js_sys::Float64Array;
use orbit_core::analysis::separation;
use orbit_core::fields::FieldKind;
use orbit_core::pendulum::{sample_pendulum, PendulumModel};
use orbit_core::trajectory::{TimeSpan, Trajectory};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub(crate) fn pendulum_model(
    model: &str,
    amplitude: f64,
    length: f64,
    gravity: f64,
    damping: f64,
    angular_speed: f64,
) -> Result<PendulumModel> {
    let model = match model {
        "ideal" => PendulumModel::Ideal {
            amplitude,
            angular_speed,
        },
        "damped" => PendulumModel::Damped {
            amplitude,
            length,
            gravity,
            damping,
        },
        other => bail!("Unknown pendulum model `{}`", other),
    };
    model.validate().context("Invalid pendulum parameters")?;
    Ok(model)
}

/// Default parameters of a built-in field, as a `{ name: value }` object.
#[wasm_bindgen]
pub fn default_parameters(field_name: &str) -> Result<JsValue, JsValue> {
    let kind: FieldKind = field_name
        .parse()
        .map_err(|e: orbit_core::SimulationError| JsValue::from_str(&e.to_string()))?;
    to_value(&kind.default_parameters()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Pendulum angles (radians) at `n_points` evenly spaced times.
#[wasm_bindgen]
pub fn pendulum_angles(
    model: &str,
    amplitude: f64,
    length: f64,
    gravity: f64,
    damping: f64,
    angular_speed: f64,
    t_start: f64,
    t_end: f64,
    n_points: u32,
) -> Result<Float64Array, JsValue> {
    let trajectory = pendulum_model(model, amplitude, length, gravity, damping, angular_speed)
        .and_then(|m| {
            sample_pendulum(&m, TimeSpan::new(t_start, t_end), n_points as usize)
                .context("Pendulum sampling failed")
        })
        .map_err(to_js_error)?;
    Ok(Float64Array::from(trajectory.states.as_slice()))
}

/// Pointwise distance between two trajectories returned by `run`.
#[wasm_bindgen]
pub fn trajectory_separation(a: JsValue, b: JsValue) -> Result<Float64Array, JsValue> {
    let a: Trajectory = from_value(a).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let b: Trajectory = from_value(b).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let distances = separation(&a, &b)
        .context("Cannot compare trajectories")
        .map_err(to_js_error)?;
    Ok(Float64Array::from(distances.as_slice()))
}
