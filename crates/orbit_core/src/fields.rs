//! Derivative fields for the systems the animations show.

use crate::error::{Result, SimulationError};
use crate::params::Parameters;
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn lift<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

impl LorenzParams {
    pub const NAMES: [&'static str; 3] = ["sigma", "rho", "beta"];

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        params.ensure_only(&Self::NAMES)?;
        Ok(Self {
            sigma: params.require("sigma")?,
            rho: params.require("rho")?,
            beta: params.require("beta")?,
        })
    }

    /// Equilibria of the field: the origin, plus the two symmetric
    /// convection points once rho > 1.
    pub fn fixed_points(&self) -> Vec<[f64; 3]> {
        let mut points = vec![[0.0, 0.0, 0.0]];
        let radial = self.beta * (self.rho - 1.0);
        if self.rho > 1.0 && radial > 0.0 {
            let r = radial.sqrt();
            points.push([r, r, self.rho - 1.0]);
            points.push([-r, -r, self.rho - 1.0]);
        }
        points
    }
}

impl From<LorenzParams> for Parameters {
    fn from(p: LorenzParams) -> Self {
        Parameters::new()
            .with("sigma", p.sigma)
            .with("rho", p.rho)
            .with("beta", p.beta)
    }
}

/// dx = sigma(y - x), dy = x(rho - z) - y, dz = xy - beta z
pub fn lorenz_derivative(state: [f64; 3], params: &LorenzParams) -> [f64; 3] {
    let [x, y, z] = state;
    [
        params.sigma * (y - x),
        x * (params.rho - z) - y,
        x * y - params.beta * z,
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LorenzField {
    pub params: LorenzParams,
}

impl LorenzField {
    pub fn new(params: LorenzParams) -> Self {
        Self { params }
    }
}

impl<T: Scalar> DynamicalSystem<T> for LorenzField {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let sigma: T = lift(self.params.sigma);
        let rho: T = lift(self.params.rho);
        let beta: T = lift(self.params.beta);
        out[0] = sigma * (x[1] - x[0]);
        out[1] = x[0] * (rho - x[2]) - x[1];
        out[2] = x[0] * x[1] - beta * x[2];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LotkaVolterraParams {
    /// Prey (rabbit) growth rate.
    pub alpha: f64,
    /// Predation rate.
    pub beta: f64,
    /// Predator growth per prey eaten.
    pub delta: f64,
    /// Predator death rate.
    pub gamma: f64,
}

impl Default for LotkaVolterraParams {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.15,
            delta: 0.05,
            gamma: 0.3,
        }
    }
}

impl LotkaVolterraParams {
    pub const NAMES: [&'static str; 4] = ["alpha", "beta", "delta", "gamma"];

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        params.ensure_only(&Self::NAMES)?;
        Ok(Self {
            alpha: params.require("alpha")?,
            beta: params.require("beta")?,
            delta: params.require("delta")?,
            gamma: params.require("gamma")?,
        })
    }

    /// Coexistence equilibrium `[gamma / delta, alpha / beta]`.
    pub fn equilibrium(&self) -> [f64; 2] {
        [self.gamma / self.delta, self.alpha / self.beta]
    }
}

impl From<LotkaVolterraParams> for Parameters {
    fn from(p: LotkaVolterraParams) -> Self {
        Parameters::new()
            .with("alpha", p.alpha)
            .with("beta", p.beta)
            .with("delta", p.delta)
            .with("gamma", p.gamma)
    }
}

/// dR = alpha R - beta R F, dF = delta R F - gamma F
pub fn lotka_volterra_derivative(state: [f64; 2], params: &LotkaVolterraParams) -> [f64; 2] {
    let [r, f] = state;
    [
        params.alpha * r - params.beta * r * f,
        params.delta * r * f - params.gamma * f,
    ]
}

/// Predator-prey field. `apply` is the raw ODE; populations are floored at
/// zero through `constrain` after each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotkaVolterraField {
    pub params: LotkaVolterraParams,
}

impl LotkaVolterraField {
    pub fn new(params: LotkaVolterraParams) -> Self {
        Self { params }
    }
}

impl<T: Scalar> DynamicalSystem<T> for LotkaVolterraField {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let alpha: T = lift(self.params.alpha);
        let beta: T = lift(self.params.beta);
        let delta: T = lift(self.params.delta);
        let gamma: T = lift(self.params.gamma);
        out[0] = alpha * x[0] - beta * x[0] * x[1];
        out[1] = delta * x[0] * x[1] - gamma * x[1];
    }

    fn constrain(&self, state: &mut [T]) {
        for value in state.iter_mut() {
            // NaN stays NaN so the overflow check downstream still sees it.
            if *value < T::zero() {
                *value = T::zero();
            }
        }
    }
}

/// Which advancer a field is integrated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advancer {
    /// Fixed-step explicit Euler on the sampling grid.
    Euler,
    /// Error-controlled Tsitouras 5(4) landing on every grid point.
    Adaptive,
}

/// Identifies one of the built-in derivative fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Lorenz,
    LotkaVolterra,
}

impl FieldKind {
    pub fn dimension(self) -> usize {
        match self {
            FieldKind::Lorenz => 3,
            FieldKind::LotkaVolterra => 2,
        }
    }

    pub fn advancer(self) -> Advancer {
        match self {
            FieldKind::Lorenz => Advancer::Adaptive,
            FieldKind::LotkaVolterra => Advancer::Euler,
        }
    }

    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            FieldKind::Lorenz => &LorenzParams::NAMES,
            FieldKind::LotkaVolterra => &LotkaVolterraParams::NAMES,
        }
    }

    pub fn default_parameters(self) -> Parameters {
        match self {
            FieldKind::Lorenz => LorenzParams::default().into(),
            FieldKind::LotkaVolterra => LotkaVolterraParams::default().into(),
        }
    }

    /// The initial state the animations start from.
    pub fn default_initial_state(self) -> Vec<f64> {
        match self {
            FieldKind::Lorenz => vec![1.0, 1.0, 1.0],
            FieldKind::LotkaVolterra => vec![5.0, 3.0],
        }
    }

    pub fn build(self, params: &Parameters) -> Result<Field> {
        Ok(match self {
            FieldKind::Lorenz => Field::Lorenz(LorenzField::new(LorenzParams::from_parameters(
                params,
            )?)),
            FieldKind::LotkaVolterra => Field::LotkaVolterra(LotkaVolterraField::new(
                LotkaVolterraParams::from_parameters(params)?,
            )),
        })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Lorenz => "lorenz",
            FieldKind::LotkaVolterra => "lotka_volterra",
        })
    }
}

impl FromStr for FieldKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lorenz" => Ok(FieldKind::Lorenz),
            "lotka_volterra" | "lotka-volterra" => Ok(FieldKind::LotkaVolterra),
            other => Err(SimulationError::InvalidParameter(format!(
                "unknown field `{}`",
                other
            ))),
        }
    }
}

/// A built-in field with its parameters resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Lorenz(LorenzField),
    LotkaVolterra(LotkaVolterraField),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Lorenz(_) => FieldKind::Lorenz,
            Field::LotkaVolterra(_) => FieldKind::LotkaVolterra,
        }
    }
}

impl<T: Scalar> DynamicalSystem<T> for Field {
    fn dimension(&self) -> usize {
        self.kind().dimension()
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        match self {
            Field::Lorenz(f) => f.apply(t, x, out),
            Field::LotkaVolterra(f) => f.apply(t, x, out),
        }
    }

    fn constrain(&self, state: &mut [T]) {
        match self {
            Field::Lorenz(f) => DynamicalSystem::<T>::constrain(f, state),
            Field::LotkaVolterra(f) => DynamicalSystem::<T>::constrain(f, state),
        }
    }
}
