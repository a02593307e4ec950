pub mod adaptive;
pub mod analysis;
pub mod error;
pub mod fields;
pub mod params;
pub mod pendulum;
pub mod sampler;
pub mod solvers;
pub mod trajectory;
/// The `orbit_core` crate is the numerical layer behind the Orbit animations.
/// It produces arrays of time-sampled state; drawing them is someone else's job.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (derivative fields),
///   `Steppable` (fixed-step solvers).
/// - **Fields**: Lorenz and Lotka-Volterra derivative fields with typed parameters.
/// - **Solvers**: explicit Euler and the Tsit5 trial step; `adaptive` wraps the latter in
///   step-size control.
/// - **Sampler**: `run` turns a field, parameters and a time span into a `Trajectory`.
/// - **Pendulum**: closed-form ideal and damped angle laws.
pub mod traits;

pub use error::{Result, SimulationError};
pub use fields::{Advancer, FieldKind};
pub use params::Parameters;
pub use sampler::{run, run_with, SamplerSettings};
pub use trajectory::{TimeSpan, Trajectory};
