use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Explicit (forward) Euler solver.
///
/// First order and single pass: `x_{n+1} = x_n + dt * f(t_n, x_n)`, followed
/// by the system's `constrain` policy. A step that overflows skips the
/// constraint and leaves the non-finite values in place for the caller.
pub struct Euler<T: Scalar> {
    slope: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            slope: vec![T::zero(); dim],
        }
    }

    /// Derivative evaluated during the most recent step.
    pub fn slope(&self) -> &[T] {
        &self.slope
    }

    /// Returns the next state without touching `state`.
    pub fn advance(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
    ) -> Vec<T> {
        let mut next = state.to_vec();
        let mut t = t;
        self.step(system, &mut t, &mut next, dt);
        next
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        system.apply(*t, state, &mut self.slope);

        for i in 0..state.len() {
            state[i] = state[i] + self.slope[i] * dt;
        }
        if state.iter().all(|v| v.is_finite()) {
            system.constrain(state);
        }

        *t = *t + dt;
    }
}

/// Tsitouras 5/4 Runge-Kutta pair.
///
/// Only the trial step lives here; step-size control is in
/// [`crate::adaptive`].
pub struct Tsit5<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    k5: Vec<T>,
    k6: Vec<T>,
    k7: Vec<T>,
    tmp: Vec<T>,
}

fn c<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            k5: vec![z; dim],
            k6: vec![z; dim],
            k7: vec![z; dim],
            tmp: vec![z; dim],
        }
    }

    /// Derivative at the start of the most recent attempt.
    pub fn slope(&self) -> &[T] {
        &self.k1
    }

    /// Derivative at the end of the most recent attempt.
    pub fn end_slope(&self) -> &[T] {
        &self.k7
    }

    /// Takes one trial step of size dt from (t, state).
    /// next: receives the 5th order solution
    /// error: receives the embedded local error estimate (5th minus 4th order)
    pub fn attempt(
        &mut self,
        system: &impl DynamicalSystem<T>,
        t: T,
        state: &[T],
        dt: T,
        next: &mut [T],
        error: &mut [T],
    ) {
        // Tsit5 Coefficients
        let c2 = c::<T>(0.161);
        let c3 = c::<T>(0.327);
        let c4 = c::<T>(0.9);
        let c5 = c::<T>(0.9800255409045097);

        let a21 = c::<T>(0.161);

        let a31 = c::<T>(-0.008480655492356989);
        let a32 = c::<T>(0.335480655492357);

        let a41 = c::<T>(2.898);
        let a42 = c::<T>(-6.359447987781783);
        let a43 = c::<T>(4.361447987781783);

        let a51 = c::<T>(5.325864858437957);
        let a52 = c::<T>(-11.748883564062828);
        let a53 = c::<T>(7.495539342889693);
        let a54 = c::<T>(-0.09249506636030195);

        let a61 = c::<T>(5.86145544294642);
        let a62 = c::<T>(-12.92096931784711);
        let a63 = c::<T>(8.159367898576159);
        let a64 = c::<T>(-0.071584973281401);
        let a65 = c::<T>(-0.02826857949054663);

        // b coefficients (5th order), also the 7th stage row (FSAL)
        let b1 = c::<T>(0.09646076681806523);
        let b2 = c::<T>(0.01);
        let b3 = c::<T>(0.4798896504144996);
        let b4 = c::<T>(1.379008574103742);
        let b5 = c::<T>(-3.290069515436099);
        let b6 = c::<T>(2.324710524099774);

        // 5th minus embedded 4th order weights
        let e1 = c::<T>(-0.00178001105222577714);
        let e2 = c::<T>(-0.0008164344596567469);
        let e3 = c::<T>(0.007880878010261995);
        let e4 = c::<T>(-0.1447110071732629);
        let e5 = c::<T>(0.5823571654525552);
        let e6 = c::<T>(-0.45808210592918697);
        let e7 = c::<T>(1.0 / 66.0);

        let n = state.len();

        // k1
        system.apply(t, state, &mut self.k1);

        // k2
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a21 * self.k1[i]);
        }
        system.apply(t + c2 * dt, &self.tmp, &mut self.k2);

        // k3
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a31 * self.k1[i] + a32 * self.k2[i]);
        }
        system.apply(t + c3 * dt, &self.tmp, &mut self.k3);

        // k4
        for i in 0..n {
            self.tmp[i] = state[i] + dt * (a41 * self.k1[i] + a42 * self.k2[i] + a43 * self.k3[i]);
        }
        system.apply(t + c4 * dt, &self.tmp, &mut self.k4);

        // k5
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a51 * self.k1[i] + a52 * self.k2[i] + a53 * self.k3[i] + a54 * self.k4[i]);
        }
        system.apply(t + c5 * dt, &self.tmp, &mut self.k5);

        // k6
        for i in 0..n {
            self.tmp[i] = state[i]
                + dt * (a61 * self.k1[i]
                    + a62 * self.k2[i]
                    + a63 * self.k3[i]
                    + a64 * self.k4[i]
                    + a65 * self.k5[i]);
        }
        system.apply(t + dt, &self.tmp, &mut self.k6);

        // 5th order solution
        for i in 0..n {
            next[i] = state[i]
                + dt * (b1 * self.k1[i]
                    + b2 * self.k2[i]
                    + b3 * self.k3[i]
                    + b4 * self.k4[i]
                    + b5 * self.k5[i]
                    + b6 * self.k6[i]);
        }

        // k7
        system.apply(t + dt, next, &mut self.k7);

        for i in 0..n {
            error[i] = dt
                * (e1 * self.k1[i]
                    + e2 * self.k2[i]
                    + e3 * self.k3[i]
                    + e4 * self.k4[i]
                    + e5 * self.k5[i]
                    + e6 * self.k6[i]
                    + e7 * self.k7[i]);
        }
    }
}
