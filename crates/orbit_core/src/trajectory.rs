use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "time span bounds must be finite (got [{}, {}])",
                self.start, self.end
            )));
        }
        if self.start > self.end {
            return Err(SimulationError::InvalidParameter(format!(
                "time span start {} exceeds end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// `n_points` evenly spaced times covering `span`, both endpoints included.
///
/// The last value is pinned to `span.end` so rounding in the spacing never
/// leaves the grid short of the requested end time.
pub fn time_grid(span: TimeSpan, n_points: usize) -> Result<Vec<f64>> {
    span.validate()?;
    if n_points < 2 {
        return Err(SimulationError::InvalidParameter(format!(
            "n_points must be at least 2 (got {})",
            n_points
        )));
    }
    let step = span.duration() / (n_points - 1) as f64;
    let mut grid: Vec<f64> = (0..n_points)
        .map(|i| span.start + step * i as f64)
        .collect();
    grid[n_points - 1] = span.end;
    Ok(grid)
}

/// Time-ordered samples of a simulated state.
///
/// States are stored row-major: sample `i` occupies
/// `states[i * dimension..(i + 1) * dimension]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub dimension: usize,
    pub times: Vec<f64>,
    pub states: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(dimension: usize, samples: usize) -> Self {
        Self {
            dimension,
            times: Vec::with_capacity(samples),
            states: Vec::with_capacity(samples * dimension),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: &[f64]) {
        debug_assert_eq!(state.len(), self.dimension);
        self.times.push(t);
        self.states.extend_from_slice(state);
    }

    /// Checks the flat layout of a trajectory that arrived from outside,
    /// e.g. through serde, before its rows are sliced.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(SimulationError::InvalidParameter(
                "trajectory has zero dimension".to_string(),
            ));
        }
        if self.states.len() != self.times.len() * self.dimension {
            return Err(SimulationError::InvalidParameter(format!(
                "{} state values do not fill {} samples of dimension {}",
                self.states.len(),
                self.times.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn state(&self, index: usize) -> &[f64] {
        &self.states[index * self.dimension..(index + 1) * self.dimension]
    }

    pub fn initial_state(&self) -> Option<&[f64]> {
        (!self.is_empty()).then(|| self.state(0))
    }

    pub fn final_state(&self) -> Option<&[f64]> {
        (!self.is_empty()).then(|| self.state(self.len() - 1))
    }

    /// Values of one state component over time.
    pub fn component(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        assert!(index < self.dimension, "component index out of range");
        self.states
            .chunks_exact(self.dimension)
            .map(move |row| row[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.states.chunks_exact(self.dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_malformed_layouts() {
        let empty_rows = Trajectory {
            dimension: 0,
            times: vec![0.0],
            states: vec![],
        };
        assert!(empty_rows.validate().unwrap_err().is_invalid_parameter());

        let short = Trajectory {
            dimension: 2,
            times: vec![0.0, 1.0],
            states: vec![1.0, 2.0, 3.0],
        };
        assert!(short.validate().unwrap_err().is_invalid_parameter());

        let ok = Trajectory {
            dimension: 2,
            times: vec![0.0, 1.0],
            states: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(ok.validate(), Ok(()));
    }

    #[test]
    fn grid_includes_both_endpoints() {
        let grid = time_grid(TimeSpan::new(0.0, 30.0), 7).expect("grid");
        assert_eq!(grid.len(), 7);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[6], 30.0);
        assert!((grid[1] - 5.0).abs() < 1e-12);
        assert!(grid.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn two_points_are_just_the_endpoints() {
        let grid = time_grid(TimeSpan::new(-1.0, 2.5), 2).expect("grid");
        assert_eq!(grid, vec![-1.0, 2.5]);
    }

    #[test]
    fn degenerate_span_repeats_start() {
        let grid = time_grid(TimeSpan::new(3.0, 3.0), 4).expect("grid");
        assert_eq!(grid, vec![3.0; 4]);
    }

    #[test]
    fn rejects_bad_grids() {
        assert!(time_grid(TimeSpan::new(0.0, 1.0), 1).is_err());
        assert!(time_grid(TimeSpan::new(1.0, 0.0), 5).is_err());
        assert!(time_grid(TimeSpan::new(0.0, f64::INFINITY), 5).is_err());
    }

    #[test]
    fn accessors_slice_rows() {
        let mut traj = Trajectory::with_capacity(2, 3);
        traj.push(0.0, &[1.0, 2.0]);
        traj.push(0.5, &[3.0, 4.0]);
        traj.push(1.0, &[5.0, 6.0]);

        assert_eq!(traj.len(), 3);
        assert_eq!(traj.state(1), &[3.0, 4.0]);
        assert_eq!(traj.initial_state(), Some(&[1.0, 2.0][..]));
        assert_eq!(traj.final_state(), Some(&[5.0, 6.0][..]));
        assert_eq!(traj.component(1).collect::<Vec<_>>(), vec![2.0, 4.0, 6.0]);
        let times: Vec<f64> = traj.iter().map(|(t, _)| t).collect();
        assert_eq!(times, traj.times);
    }
}
