//! Implicit (backward) Euler with a damped Newton corrector
//!
//! # Mathematical Background
//!
//! Backward Euler advances the system
//!
//! ```text
//! dy/dt = f(y, t)
//! ```
//!
//! by solving the implicit update for yₙ₊₁ at every step:
//!
//! ```text
//! yₙ₊₁ = yₙ + h·f(yₙ₊₁, tₙ₊₁)
//! ```
//!
//! The nonlinear system `g(y) = y - yₙ - h·f(y, tₙ₊₁) = 0` is solved by a
//! damped Newton iteration with a finite-difference Jacobian and an LU
//! factorization of `I - h·∂f/∂y`.
//!
//! Error control is step doubling: each step is taken once with `h` and
//! again as two half steps. For a first-order method the difference between
//! the two results estimates the local error, and the more accurate
//! two-half-step state is the one kept.
//!
//! # Characteristics
//!
//! - **Order**: first-order, A-stable (no stability limit on `h`)
//! - **Cost**: one Jacobian and LU factorization per Newton iteration,
//!   three implicit solves per attempted step
//! - **Use**: stiff systems, where explicit steppers would shrink their
//!   steps for stability rather than accuracy

use nalgebra::{DMatrix, DVector, LU};

use crate::error::SimulationError;
use crate::solver::methods::{error_ratio, Integrator, Rhs, Segment, StepControl};

const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 4.0;
const MAX_SHRINK: f64 = 0.2;
const NEWTON_MAX_ITERATIONS: usize = 25;
const NEWTON_MAX_DAMPINGS: usize = 4;

// =================================================================================================
// Implicit Euler Integrator
// =================================================================================================

/// Backward Euler stepper for stiff systems.
///
/// Stateless, like [`CashKarp`](crate::solver::CashKarp); the step-size
/// history restarts at every window boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImplicitEuler;

impl ImplicitEuler {
    /// Create a new backward Euler stepper.
    pub fn new() -> Self {
        Self
    }

    /// Forward-difference Jacobian of `f` at `(y, t)`.
    fn jacobian(rhs: &Rhs<'_>, y: &DVector<f64>, t: f64, f_y: &DVector<f64>) -> DMatrix<f64> {
        let n = y.len();
        let mut jac = DMatrix::zeros(n, n);
        for j in 0..n {
            let eps = f64::EPSILON.sqrt() * (1.0 + y[j].abs());
            let mut perturbed = y.clone();
            perturbed[j] += eps;
            let f_perturbed = rhs(&perturbed, t);
            for i in 0..n {
                jac[(i, j)] = (f_perturbed[i] - f_y[i]) / eps;
            }
        }
        jac
    }

    /// Solve `y = y_prev + h·f(y, t_next)` by damped Newton iteration.
    ///
    /// Returns `None` when the iteration fails to converge or the linearized
    /// system is singular; the caller responds by shrinking the step.
    fn solve_implicit(
        rhs: &Rhs<'_>,
        y_prev: &DVector<f64>,
        t_next: f64,
        h: f64,
        tolerance: f64,
    ) -> Option<DVector<f64>> {
        let n = y_prev.len();
        let newton_tolerance = 0.1 * tolerance;

        // Explicit Euler predictor as the starting guess.
        let f_prev = rhs(y_prev, t_next);
        let mut y = y_prev + &f_prev * h;

        for _ in 0..NEWTON_MAX_ITERATIONS {
            let f_y = rhs(&y, t_next);
            let residual = &y - y_prev - &f_y * h;
            if !residual.iter().all(|v| v.is_finite()) {
                return None;
            }

            let jac = DMatrix::identity(n, n) - Self::jacobian(rhs, &y, t_next, &f_y) * h;
            let delta = LU::new(jac).solve(&residual)?;

            // Damp the update until the residual actually shrinks.
            let residual_norm = residual.norm();
            let mut lambda = 1.0;
            let mut accepted = None;
            for _ in 0..=NEWTON_MAX_DAMPINGS {
                let trial = &y - &delta * lambda;
                let trial_residual = &trial - y_prev - rhs(&trial, t_next) * h;
                if trial_residual.norm() < residual_norm || residual_norm == 0.0 {
                    accepted = Some(trial);
                    break;
                }
                lambda *= 0.5;
            }
            let y_next = accepted?;

            let converged = error_ratio(&(&delta * lambda), &y_next, newton_tolerance) <= 1.0;
            y = y_next;
            if converged {
                return Some(y);
            }
        }
        None
    }
}

impl Integrator for ImplicitEuler {
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
            h = h.min(t1 - t);

            // ====== Step doubling ======
            // One full step and two half steps; their difference estimates
            // the local error of a first-order method.
            let full = Self::solve_implicit(rhs, &y, t + h, h, control.tolerance);
            let halves = Self::solve_implicit(rhs, &y, t + 0.5 * h, 0.5 * h, control.tolerance)
                .and_then(|mid| Self::solve_implicit(rhs, &mid, t + h, 0.5 * h, control.tolerance));

            let (y_full, y_half) = match (full, halves) {
                (Some(f), Some(hs)) => (f, hs),
                _ => {
                    // Newton did not converge; a smaller step is easier.
                    h *= 0.5;
                    if h < min_step {
                        return Err(SimulationError::Integration {
                            time: t,
                            message: "Newton corrector failed to converge at the step floor"
                                .to_string(),
                            last_state: y,
                        });
                    }
                    continue;
                }
            };

            let error = &y_half - &y_full;
            let ratio = error_ratio(&error, &y_half, control.tolerance);

            if ratio <= 1.0 {
                t += h;
                if t1 - t < min_step {
                    t = t1;
                }
                y = y_half;
                times.push(t);
                states.push(y.clone());

                // First-order controller: h_new = SAFETY * h * ratio^(-1/2).
                let growth = if ratio > 0.0 {
                    (SAFETY * ratio.powf(-0.5)).min(MAX_GROWTH)
                } else {
                    MAX_GROWTH
                };
                h *= growth;
            } else {
                h *= (SAFETY * ratio.powf(-0.5)).max(MAX_SHRINK);
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
        "Implicit Euler"
    }
}
