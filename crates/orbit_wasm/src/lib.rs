//! WebAssembly bridge exposing the Orbit core to a JavaScript renderer.

mod analysis;
mod system;

pub use analysis::{default_parameters, pendulum_angles, trajectory_separation};
pub use system::WasmSimulation;
