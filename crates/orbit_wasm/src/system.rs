//! Core WASM simulation wrapper and low-level utilities.

use anyhow::{bail, Context, Result};
use js_sys::Float64Array;
use orbit_core::fields::{Field, FieldKind};
use orbit_core::params::Parameters;
use orbit_core::sampler::{check_state, run_with, SamplerSettings};
use orbit_core::solvers::Euler;
use orbit_core::traits::{DynamicalSystem, Steppable};
use orbit_core::trajectory::{TimeSpan, Trajectory};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSimulation {
    pub(crate) kind: FieldKind,
    pub(crate) params: Parameters,
    pub(crate) field: Field,
    state: Vec<f64>,
    t: f64,
    solver: Euler<f64>,
}

pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

pub(crate) fn build_field(
    field_name: &str,
    params: &[f64],
    param_names: &[String],
) -> Result<(FieldKind, Parameters, Field)> {
    let kind: FieldKind = field_name
        .parse()
        .with_context(|| format!("Cannot build field `{}`", field_name))?;
    let params = Parameters::from_pairs(param_names, params).context("Invalid parameter list")?;
    let field = kind
        .build(&params)
        .with_context(|| format!("Invalid parameters for {}", kind))?;
    Ok((kind, params, field))
}

pub(crate) fn checked_state(field: &Field, state: &[f64]) -> Result<Vec<f64>> {
    check_state(field, state).with_context(|| format!("Invalid state for {}", field.kind()))?;
    Ok(state.to_vec())
}

/// Advances a copy of `state`; nothing is returned if the step overflows.
pub(crate) fn euler_step(
    solver: &mut Euler<f64>,
    field: &Field,
    t: f64,
    state: &[f64],
    dt: f64,
) -> Result<(f64, Vec<f64>)> {
    let mut t = t;
    let mut next = state.to_vec();
    solver.step(field, &mut t, &mut next, dt);
    if !next.iter().chain(solver.slope()).all(|v| v.is_finite()) {
        bail!("Euler step of size {} from t = {} overflowed", dt, t - dt);
    }
    Ok((t, next))
}

pub(crate) fn sample_field(
    kind: FieldKind,
    params: &Parameters,
    initial_state: &[f64],
    t_start: f64,
    t_end: f64,
    n_points: usize,
    settings: &SamplerSettings,
) -> Result<Trajectory> {
    run_with(
        kind,
        params,
        initial_state,
        TimeSpan::new(t_start, t_end),
        n_points,
        settings,
    )
    .with_context(|| format!("Simulation of {} over [{}, {}] failed", kind, t_start, t_end))
}

#[wasm_bindgen]
impl WasmSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(
        field_name: &str,
        params: Vec<f64>,
        param_names: Vec<String>,
    ) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();

        let (kind, params, field) =
            build_field(field_name, &params, &param_names).map_err(to_js_error)?;
        let dim = kind.dimension();

        Ok(WasmSimulation {
            kind,
            params,
            field,
            state: kind.default_initial_state(),
            t: 0.0,
            solver: Euler::new(dim),
        })
    }

    pub fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        self.state = checked_state(&self.field, state).map_err(to_js_error)?;
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    /// One explicit Euler step, for renderers that advance frame by frame.
    /// On overflow the state and time are left as they were.
    pub fn step(&mut self, dt: f64) -> Result<(), JsValue> {
        let (t, state) = euler_step(&mut self.solver, &self.field, self.t, &self.state, dt)
            .map_err(to_js_error)?;
        self.t = t;
        self.state = state;
        Ok(())
    }

    pub fn derivative(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.kind.dimension()];
        self.field.apply(self.t, &self.state, &mut out);
        out
    }

    /// Samples the whole trajectory. `settings` is an optional
    /// `SamplerSettings` object; missing fields take their defaults.
    pub fn run(
        &self,
        initial_state: Vec<f64>,
        t_start: f64,
        t_end: f64,
        n_points: u32,
        settings: JsValue,
    ) -> Result<JsValue, JsValue> {
        let settings: SamplerSettings = if settings.is_undefined() || settings.is_null() {
            SamplerSettings::default()
        } else {
            from_value(settings)
                .map_err(|e| JsValue::from_str(&format!("Invalid sampler settings: {}", e)))?
        };
        let trajectory = sample_field(
            self.kind,
            &self.params,
            &initial_state,
            t_start,
            t_end,
            n_points as usize,
            &settings,
        )
        .map_err(to_js_error)?;
        to_value(&trajectory).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Same as `run` with default settings, returning only the flat
    /// row-major state buffer.
    pub fn run_states(
        &self,
        initial_state: Vec<f64>,
        t_start: f64,
        t_end: f64,
        n_points: u32,
    ) -> Result<Float64Array, JsValue> {
        let trajectory = sample_field(
            self.kind,
            &self.params,
            &initial_state,
            t_start,
            t_end,
            n_points as usize,
            &SamplerSettings::default(),
        )
        .map_err(to_js_error)?;
        Ok(Float64Array::from(trajectory.states.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::{build_field, checked_state, euler_step, sample_field};
    use orbit_core::fields::FieldKind;
    use orbit_core::sampler::SamplerSettings;
    use orbit_core::solvers::Euler;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_lorenz_from_parallel_vectors() {
        let (kind, params, _) = build_field(
            "lorenz",
            &[10.0, 28.0, 8.0 / 3.0],
            &names(&["sigma", "rho", "beta"]),
        )
        .expect("field");
        assert_eq!(kind, FieldKind::Lorenz);
        assert_eq!(params.get("rho"), Some(28.0));
    }

    #[test]
    fn errors_carry_context() {
        let err = build_field("lorenz", &[10.0, 28.0], &names(&["sigma", "rho"])).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid parameters for lorenz"), "{}", message);
        assert!(message.contains("beta"), "{}", message);

        let err = build_field("duffing", &[], &[]).unwrap_err();
        assert!(format!("{:#}", err).contains("duffing"));
    }

    #[test]
    fn sample_field_reports_dimension_mismatch() {
        let (kind, params, _) = build_field(
            "lotka_volterra",
            &[0.3, 0.15, 0.05, 0.3],
            &names(&["alpha", "beta", "delta", "gamma"]),
        )
        .expect("field");
        let settings = SamplerSettings::default();
        let ok = sample_field(kind, &params, &[5.0, 3.0], 0.0, 40.0, 400, &settings)
            .expect("trajectory");
        assert_eq!(ok.len(), 400);

        let err = sample_field(kind, &params, &[5.0], 0.0, 40.0, 400, &settings).unwrap_err();
        assert!(format!("{:#}", err).contains("expected 2, got 1"));
    }

    #[test]
    fn checked_state_matches_run_validation() {
        let (_, _, field) = build_field(
            "lotka_volterra",
            &[0.3, 0.15, 0.05, 0.3],
            &names(&["alpha", "beta", "delta", "gamma"]),
        )
        .expect("field");
        assert_eq!(checked_state(&field, &[5.0, 3.0]).expect("state"), vec![5.0, 3.0]);

        let err = checked_state(&field, &[-1.0, 3.0]).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid state for lotka_volterra"));
        assert!(checked_state(&field, &[f64::INFINITY, 3.0]).is_err());
        assert!(checked_state(&field, &[5.0]).is_err());
    }

    #[test]
    fn euler_step_refuses_to_commit_overflow() {
        let (_, _, field) = build_field(
            "lotka_volterra",
            &[0.3, 0.15, 1e-10, 0.3],
            &names(&["alpha", "beta", "delta", "gamma"]),
        )
        .expect("field");
        let mut solver = Euler::new(2);

        let (t, next) = euler_step(&mut solver, &field, 0.0, &[5.0, 3.0], 0.1).expect("step");
        assert!((t - 0.1).abs() < 1e-15);
        assert!(next.iter().all(|&v| v >= 0.0));

        let err = euler_step(&mut solver, &field, 0.0, &[1e154, 1e154], 100.0).unwrap_err();
        assert!(err.to_string().contains("overflowed"));
    }
}
