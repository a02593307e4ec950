use thiserror::Error;

/// Everything that can go wrong while producing a trajectory.
///
/// Every variant is terminal for the run that raised it: callers never
/// receive a partially filled trajectory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("state dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The adaptive advancer could not keep its step size within bounds.
    /// `time` and `state` are the last successfully reached point.
    #[error("integration failed at t = {time}: {reason}")]
    Integration {
        time: f64,
        state: Vec<f64>,
        reason: String,
    },

    /// A derivative evaluation or a freshly stepped state contained NaN or infinity.
    #[error("non-finite value at step {step} (t = {time}): {state:?}")]
    NumericOverflow {
        step: usize,
        time: f64,
        state: Vec<f64>,
    },
}

impl SimulationError {
    /// True for errors detected while validating inputs, before any stepping.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            SimulationError::MissingParameter(_)
                | SimulationError::UnknownParameter(_)
                | SimulationError::InvalidParameter(_)
                | SimulationError::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

pub(crate) fn ensure_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SimulationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

pub(crate) fn ensure_finite_state(state: &[f64]) -> Result<()> {
    if let Some(idx) = state.iter().position(|v| !v.is_finite()) {
        return Err(SimulationError::InvalidParameter(format!(
            "initial state component {} is not finite ({})",
            idx, state[idx]
        )));
    }
    Ok(())
}
