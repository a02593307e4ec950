use crate::error::{ensure_dimension, Result, SimulationError};
use crate::trajectory::Trajectory;
use nalgebra::DVector;

/// Euclidean distance between two trajectories at each shared sample time.
///
/// Both runs must have the same dimension and the same time grid, as two
/// `run` calls with equal span and point count do.
pub fn separation(a: &Trajectory, b: &Trajectory) -> Result<Vec<f64>> {
    a.validate()?;
    b.validate()?;
    ensure_dimension(a.dimension, b.dimension)?;
    if a.times != b.times {
        return Err(SimulationError::InvalidParameter(format!(
            "trajectories are sampled on different time grids ({} vs {} points)",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|((_, x), (_, y))| {
            DVector::from_column_slice(x).metric_distance(&DVector::from_column_slice(y))
        })
        .collect())
}

/// Minimum and maximum of one component across the trajectory.
pub fn component_range(trajectory: &Trajectory, index: usize) -> Option<(f64, f64)> {
    if index >= trajectory.dimension {
        return None;
    }
    trajectory.component(index).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::{component_range, separation};
    use crate::fields::FieldKind;
    use crate::sampler::run;
    use crate::trajectory::{TimeSpan, Trajectory};

    fn line(points: &[(f64, [f64; 2])]) -> Trajectory {
        let mut traj = Trajectory::with_capacity(2, points.len());
        for (t, s) in points {
            traj.push(*t, s);
        }
        traj
    }

    #[test]
    fn separation_is_pointwise_euclidean() {
        let a = line(&[(0.0, [0.0, 0.0]), (1.0, [1.0, 1.0])]);
        let b = line(&[(0.0, [3.0, 4.0]), (1.0, [1.0, 1.0])]);
        let d = separation(&a, &b).expect("separation");
        assert!((d[0] - 5.0).abs() < 1e-12);
        assert_eq!(d[1], 0.0);
    }

    #[test]
    fn separation_needs_matching_grids() {
        let a = line(&[(0.0, [0.0, 0.0]), (1.0, [1.0, 1.0])]);
        let b = line(&[(0.0, [0.0, 0.0]), (2.0, [1.0, 1.0])]);
        assert!(separation(&a, &b).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn separation_rejects_zero_dimension_input() {
        let degenerate = Trajectory {
            dimension: 0,
            times: vec![0.0],
            states: vec![],
        };
        assert!(separation(&degenerate, &degenerate)
            .unwrap_err()
            .is_invalid_parameter());
    }

    #[test]
    fn perturbed_lorenz_runs_grow_apart() {
        let field = FieldKind::Lorenz;
        let params = field.default_parameters();
        let span = TimeSpan::new(0.0, 25.0);
        let a = run(field, &params, &[1.0, 1.0, 1.0], span, 501).expect("a");
        let b = run(field, &params, &[1.1, 1.1, 0.9], span, 501).expect("b");
        let d = separation(&a, &b).expect("separation");
        assert_eq!(d.len(), 501);
        let peak = d.iter().cloned().fold(0.0, f64::max);
        assert!(peak > 50.0 * d[0], "start {} peak {}", d[0], peak);
    }

    #[test]
    fn population_extrema() {
        let field = FieldKind::LotkaVolterra;
        let traj = run(
            field,
            &field.default_parameters(),
            &[5.0, 3.0],
            TimeSpan::new(0.0, 40.0),
            401,
        )
        .expect("lv");
        let (r_min, r_max) = component_range(&traj, 0).expect("rabbits");
        let (f_min, f_max) = component_range(&traj, 1).expect("foxes");
        assert!(r_min >= 0.0 && r_min < 5.0 && r_max > 6.0);
        assert!(f_min >= 0.0 && f_max > 2.0);
        assert_eq!(component_range(&traj, 2), None);
    }
}
