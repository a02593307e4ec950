//! Closed-form pendulum angle laws, evaluated pointwise rather than integrated.

use crate::error::{Result, SimulationError};
use crate::trajectory::{time_grid, TimeSpan, Trajectory};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const STANDARD_GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendulumModel {
    /// Small-angle motion without losses: theta(t) = A cos(w t).
    Ideal { amplitude: f64, angular_speed: f64 },
    /// Exponentially damped motion: theta(t) = A exp(-b t) cos(w_d t).
    Damped {
        amplitude: f64,
        length: f64,
        gravity: f64,
        damping: f64,
    },
}

impl PendulumModel {
    pub fn ideal() -> Self {
        PendulumModel::Ideal {
            amplitude: 0.8 * PI / 2.0,
            angular_speed: PI / 2.0,
        }
    }

    pub fn damped() -> Self {
        PendulumModel::Damped {
            amplitude: 0.8 * PI / 2.0,
            length: 6.0,
            gravity: STANDARD_GRAVITY,
            damping: 0.25,
        }
    }

    pub fn amplitude(&self) -> f64 {
        match *self {
            PendulumModel::Ideal { amplitude, .. } | PendulumModel::Damped { amplitude, .. } => {
                amplitude
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let check = |name: &str, value: f64, positive: bool| {
            if !value.is_finite() || (positive && value <= 0.0) || value < 0.0 {
                Err(SimulationError::InvalidParameter(format!(
                    "pendulum {} must be {} (got {})",
                    name,
                    if positive { "positive" } else { "non-negative" },
                    value
                )))
            } else {
                Ok(())
            }
        };
        match *self {
            PendulumModel::Ideal {
                amplitude,
                angular_speed,
            } => {
                check("amplitude", amplitude, false)?;
                check("angular_speed", angular_speed, false)
            }
            PendulumModel::Damped {
                amplitude,
                length,
                gravity,
                damping,
            } => {
                check("amplitude", amplitude, false)?;
                check("length", length, true)?;
                check("gravity", gravity, true)?;
                check("damping", damping, false)
            }
        }
    }

    /// Oscillation frequency: the given speed for the ideal law,
    /// sqrt(max(0, g/L - b^2)) for the damped one (0 once overdamped).
    pub fn damped_frequency(&self) -> f64 {
        match *self {
            PendulumModel::Ideal { angular_speed, .. } => angular_speed,
            PendulumModel::Damped {
                length,
                gravity,
                damping,
                ..
            } => (gravity / length - damping * damping).max(0.0).sqrt(),
        }
    }

    /// Angle from the vertical, in radians.
    pub fn angle(&self, t: f64) -> f64 {
        match *self {
            PendulumModel::Ideal {
                amplitude,
                angular_speed,
            } => amplitude * (angular_speed * t).cos(),
            PendulumModel::Damped {
                amplitude, damping, ..
            } => amplitude * (-damping * t).exp() * (self.damped_frequency() * t).cos(),
        }
    }

    pub fn angle_degrees(&self, t: f64) -> f64 {
        self.angle(t).to_degrees()
    }
}

/// Bob position relative to the pivot, y pointing up.
pub fn bob_position(theta: f64, length: f64) -> [f64; 2] {
    [length * theta.sin(), -length * theta.cos()]
}

/// Evaluates `model` on an evenly spaced grid; the state is the angle alone.
pub fn sample_pendulum(
    model: &PendulumModel,
    span: TimeSpan,
    n_points: usize,
) -> Result<Trajectory> {
    model.validate()?;
    let grid = time_grid(span, n_points)?;
    let mut trajectory = Trajectory::with_capacity(1, grid.len());
    for t in grid {
        trajectory.push(t, &[model.angle(t)]);
    }
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_amplitude() {
        for model in [PendulumModel::ideal(), PendulumModel::damped()] {
            assert_eq!(model.angle(0.0), model.amplitude());
            assert!((model.angle_degrees(0.0) - 72.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ideal_pendulum_is_periodic() {
        let model = PendulumModel::ideal();
        // w = pi / 2, so the period is 4.
        for t in [0.3, 1.1, 2.7] {
            assert!((model.angle(t) - model.angle(t + 4.0)).abs() < 1e-12);
        }
        assert!(model.angle(1.0).abs() < 1e-12);
    }

    #[test]
    fn damped_pendulum_stays_inside_envelope() {
        let model = PendulumModel::damped();
        let traj = sample_pendulum(&model, TimeSpan::new(0.0, 20.0), 401).expect("pendulum");
        for (t, state) in traj.iter() {
            let envelope = model.amplitude() * (-0.25 * t).exp();
            assert!(state[0].abs() <= envelope + 1e-12);
        }
        let expected = (STANDARD_GRAVITY / 6.0 - 0.0625f64).sqrt();
        assert!((model.damped_frequency() - expected).abs() < 1e-12);
    }

    #[test]
    fn overdamped_pendulum_decays_without_oscillating() {
        let model = PendulumModel::Damped {
            amplitude: 1.0,
            length: 1.0,
            gravity: 1.0,
            damping: 2.0,
        };
        assert_eq!(model.damped_frequency(), 0.0);
        let traj = sample_pendulum(&model, TimeSpan::new(0.0, 5.0), 11).expect("pendulum");
        let angles: Vec<f64> = traj.component(0).collect();
        assert!(angles.iter().all(|&a| a > 0.0));
        assert!(angles.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn bob_stays_on_circle() {
        let model = PendulumModel::damped();
        for i in 0..20 {
            let [x, y] = bob_position(model.angle(i as f64 * 0.37), 6.0);
            assert!((x.hypot(y) - 6.0).abs() < 1e-12);
            assert!(y < 0.0);
        }
        assert_eq!(bob_position(0.0, 2.0), [0.0, -2.0]);
    }

    #[test]
    fn rejects_non_physical_models() {
        let model = PendulumModel::Damped {
            amplitude: 1.0,
            length: 0.0,
            gravity: 9.81,
            damping: 0.1,
        };
        assert!(model.validate().unwrap_err().is_invalid_parameter());
        assert!(sample_pendulum(&model, TimeSpan::new(0.0, 1.0), 5).is_err());
    }

    #[test]
    fn model_serializes_with_kind_tag() {
        let json = serde_json::to_string(&PendulumModel::ideal()).expect("json");
        assert!(json.contains(r#""kind":"ideal""#));

        let parsed: PendulumModel = serde_json::from_str(
            r#"{"kind":"damped","amplitude":1.0,"length":2.0,"gravity":10.0,"damping":0.5}"#,
        )
        .expect("parse");
        assert_eq!(
            parsed,
            PendulumModel::Damped {
                amplitude: 1.0,
                length: 2.0,
                gravity: 10.0,
                damping: 0.5,
            }
        );
    }
}
