//! Cash–Karp adaptive Runge-Kutta 4(5)
//!
//! # Mathematical Background
//!
//! The Cash–Karp method is an embedded Runge-Kutta pair: six stage slopes
//! are combined twice, once with fifth-order weights and once with
//! fourth-order weights, for the system
//!
//! ```text
//! dy/dt = f(y, t)
//! ```
//!
//! The difference between the two combinations is a free estimate of the
//! local truncation error, which drives the step-size controller:
//!
//! ```text
//! k₁ = f(yₙ, tₙ)
//! kᵢ = f(yₙ + h·Σⱼ aᵢⱼ·kⱼ, tₙ + cᵢ·h)      i = 2..6
//!
//! yₙ₊₁  = yₙ + h·Σ bᵢ·kᵢ      (5th order)
//! ŷₙ₊₁ = yₙ + h·Σ b̂ᵢ·kᵢ      (4th order)
//! eₙ₊₁  = yₙ₊₁ - ŷₙ₊₁
//! ```
//!
//! # Characteristics
//!
//! - **Order**: fifth-order accurate with a fourth-order error estimate
//! - **Cost**: 6 function evaluations per attempted step
//! - **Adaptivity**: step size grows and shrinks with the error estimate
//!
//! # When to Use
//!
//! - Non-stiff to moderately stiff systems (the default method)
//! - Smooth kinetics between scheduled discontinuities
//!
//! # When NOT to Use
//!
//! - Stiff systems → the step controller shrinks `h` for stability rather
//!   than accuracy and progress collapses; use [`ImplicitEuler`] instead
//!
//! [`ImplicitEuler`]: crate::solver::ImplicitEuler

use nalgebra::DVector;

use crate::error::SimulationError;
use crate::solver::methods::{error_ratio, Integrator, Rhs, Segment, StepControl};

// Cash-Karp Butcher tableau.
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0],
    [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0],
    [
        1631.0 / 55296.0,
        175.0 / 512.0,
        575.0 / 13824.0,
        44275.0 / 110592.0,
        253.0 / 4096.0,
    ],
];
const B5: [f64; 6] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];
const B4: [f64; 6] = [
    2825.0 / 27648.0,
    0.0,
    18575.0 / 48384.0,
    13525.0 / 55296.0,
    277.0 / 14336.0,
    1.0 / 4.0,
];

// Step controller constants: safety factor and growth/shrink clamps.
const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MAX_SHRINK: f64 = 0.1;

// =================================================================================================
// Cash-Karp Integrator
// =================================================================================================

/// Adaptive embedded Runge-Kutta 4(5) stepper.
///
/// Stateless; every [`integrate`](Integrator::integrate) call starts a fresh
/// step-size history, so discontinuities at window boundaries never leak a
/// stale step into the next window.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashKarp;

impl CashKarp {
    /// Create a new Cash–Karp stepper.
    pub fn new() -> Self {
        Self
    }

    /// One attempted step: the six stages and both weightings.
    fn attempt(
        rhs: &Rhs<'_>,
        y: &DVector<f64>,
        t: f64,
        h: f64,
    ) -> (DVector<f64>, DVector<f64>) {
        let mut stages: Vec<DVector<f64>> = Vec::with_capacity(6);
        stages.push(rhs(y, t));

        for i in 1..6 {
            let mut trial = y.clone();
            for (j, stage) in stages.iter().enumerate() {
                trial.axpy(h * A[i][j], stage, 1.0);
            }
            stages.push(rhs(&trial, t + C[i] * h));
        }

        let mut y_next = y.clone();
        let mut error = DVector::zeros(y.len());
        for (i, stage) in stages.iter().enumerate() {
            y_next.axpy(h * B5[i], stage, 1.0);
            error.axpy(h * (B5[i] - B4[i]), stage, 1.0);
        }
        (y_next, error)
    }
}

impl Integrator for CashKarp {
    fn integrate(
        &self,
        rhs: &Rhs<'_>,
        y0: &DVector<f64>,
        t0: f64,
        t1: f64,
        control: &StepControl,
    ) -> Result<Segment, SimulationError> {
        let window = t1 - t0;
        if window <= 0.0 {
            return Err(SimulationError::Integration {
                time: t0,
                message: format!("window [{t0}, {t1}] is empty or reversed"),
                last_state: y0.clone(),
            });
        }
        let min_step = window * control.min_step_fraction;

        let mut t = t0;
        let mut y = y0.clone();
        let mut h = window / 16.0;

        let mut times = vec![t0];
        let mut states = vec![y0.clone()];

        for _ in 0..control.max_steps {
            if t >= t1 {
                return Ok(Segment { times, states });
            }
            // Never step past the window end; the final step lands on t1.
            h = h.min(t1 - t);

            let (y_next, error) = Self::attempt(rhs, &y, t, h);

            if y_next.iter().any(|v| !v.is_finite()) {
                // A non-finite trial state: shrink hard and retry.
                h *= MAX_SHRINK;
                if h < min_step {
                    return Err(SimulationError::Integration {
                        time: t,
                        message: "state became non-finite and the step floor was reached"
                            .to_string(),
                        last_state: y,
                    });
                }
                continue;
            }

            let ratio = error_ratio(&error, &y, control.tolerance);
            if ratio <= 1.0 {
                // Accept. Snap to t1 when the remainder is roundoff noise.
                t += h;
                if t1 - t < min_step {
                    t = t1;
                }
                y = y_next;
                times.push(t);
                states.push(y.clone());

                // Fifth-order growth: h_new = SAFETY * h * ratio^(-1/5).
                let growth = if ratio > 0.0 {
                    (SAFETY * ratio.powf(-0.2)).min(MAX_GROWTH)
                } else {
                    MAX_GROWTH
                };
                h *= growth;
            } else {
                // Reject: fourth-order shrink, clamped.
                h *= (SAFETY * ratio.powf(-0.25)).max(MAX_SHRINK);
                if h < min_step {
                    return Err(SimulationError::Integration {
                        time: t,
                        message: format!(
                            "step size collapsed below {min_step:.3e} (error ratio {ratio:.3e})"
                        ),
                        last_state: y,
                    });
                }
            }
        }

        if t >= t1 {
            return Ok(Segment { times, states });
        }
        Err(SimulationError::Integration {
            time: t,
            message: format!("step budget of {} exhausted", control.max_steps),
            last_state: y,
        })
    }

    fn name(&self) -> &str {
        "Cash-Karp 4(5)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> StepControl {
        StepControl::from_tolerance(1e-8)
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        // dy/dt = -y, y(0) = 1 → y(t) = e^{-t}.
        let rhs = |y: &DVector<f64>, _t: f64| -y;
        let y0 = DVector::from_vec(vec![1.0]);

        let segment = CashKarp::new()
            .integrate(&rhs, &y0, 0.0, 2.0, &control())
            .unwrap();

        let exact = (-2.0f64).exp();
        assert!((segment.final_state()[0] - exact).abs() < 1e-6);
    }

    #[test]
    fn test_lands_exactly_on_window_end() {
        let rhs = |y: &DVector<f64>, _t: f64| y * 0.5;
        let y0 = DVector::from_vec(vec![1.0]);

        let segment = CashKarp::new()
            .integrate(&rhs, &y0, 0.0, 1.7, &control())
            .unwrap();

        assert_eq!(segment.times[0], 0.0);
        assert_eq!(*segment.times.last().unwrap(), 1.7);
        for pair in segment.times.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_time_dependent_rhs() {
        // dy/dt = t, y(0) = 0 → y(t) = t²/2.
        let rhs = |_y: &DVector<f64>, t: f64| DVector::from_vec(vec![t]);
        let y0 = DVector::zeros(1);

        let segment = CashKarp::new()
            .integrate(&rhs, &y0, 0.0, 3.0, &control())
            .unwrap();
        assert!((segment.final_state()[0] - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rhs_is_constant() {
        let rhs = |y: &DVector<f64>, _t: f64| DVector::zeros(y.len());
        let y0 = DVector::from_vec(vec![3.0, -1.0]);

        let segment = CashKarp::new()
            .integrate(&rhs, &y0, 1.0, 4.0, &control())
            .unwrap();
        assert_eq!(segment.final_state(), &y0);
    }

    #[test]
    fn test_blowup_reports_last_state() {
        // dy/dt = y² with y(0) = 1 blows up at t = 1.
        let rhs = |y: &DVector<f64>, _t: f64| y.component_mul(y);
        let y0 = DVector::from_vec(vec![1.0]);

        let result = CashKarp::new().integrate(&rhs, &y0, 0.0, 2.0, &control());
        match result {
            Err(SimulationError::Integration { time, last_state, .. }) => {
                assert!(time < 2.0);
                assert!(last_state[0].is_finite());
            }
            other => panic!("expected integration failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_window_rejected() {
        let rhs = |y: &DVector<f64>, _t: f64| -y;
        let y0 = DVector::from_vec(vec![1.0]);
        assert!(CashKarp::new()
            .integrate(&rhs, &y0, 2.0, 2.0, &control())
            .is_err());
    }
}
