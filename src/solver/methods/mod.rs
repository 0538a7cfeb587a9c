//! Numerical integration methods
//!
//! This module contains the concrete time steppers behind the
//! [`Integrator`] trait.
//!
//! # Architecture
//!
//! The separation between the abstract stepper interface (this module's
//! [`Integrator`] trait) and the driver (`solver::driver`) follows the
//! Open-Closed Principle:
//! - **Open** for extension: add new methods without modifying existing code
//! - **Closed** for modification: the `Integrator` trait is stable
//!
//! A stepper integrates one *window* `[t0, t1]` between two scheduled stop
//! instants. It knows nothing about output periods or discontinuities; the
//! driver re-invokes it per window, which also restarts the step-size
//! machinery across every kinetics kink.
//!
//! # Available Methods
//!
//! - **[`CashKarp`]**: adaptive embedded Runge-Kutta 4(5)
//!   - Order: fifth-order with a fourth-order error estimate
//!   - Cost: 6 function evaluations per attempted step
//!   - Use: non-stiff to moderately stiff systems (the default)
//!
//! - **[`ImplicitEuler`]**: backward Euler with a damped Newton corrector
//!   - Order: first-order, A-stable
//!   - Cost: one Jacobian + LU factorization per Newton iteration
//!   - Use: stiff systems, selected by the `stiff` configuration hint

use nalgebra::DVector;

use crate::error::SimulationError;

mod cash_karp;
mod implicit_euler;

pub use cash_karp::CashKarp;
pub use implicit_euler::ImplicitEuler;

// =================================================================================================
// Step Control
// =================================================================================================

/// Accuracy and safety limits shared by every adaptive method.
#[derive(Debug, Clone, Copy)]
pub struct StepControl {
    /// Per-component error tolerance, used both absolutely and relatively:
    /// a step is accepted when `|e_i| <= tolerance * (1 + |y_i|)` for all i.
    pub tolerance: f64,
    /// Step floor as a fraction of the window length. Shrinking below it
    /// aborts the run instead of stalling.
    pub min_step_fraction: f64,
    /// Hard cap on attempted steps per window.
    pub max_steps: usize,
}

impl StepControl {
    /// Default limits for a given tolerance.
    pub fn from_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            min_step_fraction: 1e-12,
            max_steps: 1_000_000,
        }
    }
}

// =================================================================================================
// Segment
// =================================================================================================

/// The accepted steps of one integration window.
///
/// `times` and `states` run in lockstep; the first entry is `(t0, y0)` and
/// the last lands exactly on `t1`.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Accepted step times, `t0` through `t1` inclusive.
    pub times: Vec<f64>,
    /// State after each accepted step.
    pub states: Vec<DVector<f64>>,
}

impl Segment {
    /// State at the end of the window.
    pub fn final_state(&self) -> &DVector<f64> {
        &self.states[self.states.len() - 1]
    }
}

// =================================================================================================
// Integrator Trait
// =================================================================================================

/// Right-hand side of the ODE system, `f(y, t)`.
pub type Rhs<'a> = dyn Fn(&DVector<f64>, f64) -> DVector<f64> + 'a;

/// An adaptive time stepper over one window.
///
/// Implementations own their step-size control; each call starts fresh, so
/// no information crosses a window boundary. The returned segment must
/// include both endpoints and land on `t1` exactly, not merely nearby.
pub trait Integrator: Send + Sync {
    /// Advance `y0` from `t0` to `t1`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Integration`] when the step size collapses below
    /// the control floor, the step budget is exhausted, or the state stops
    /// being finite. The error carries the last accepted time and state.
    fn integrate(
        &self,
        rhs: &Rhs<'_>,
        y0: &DVector<f64>,
        t0: f64,
        t1: f64,
        control: &StepControl,
    ) -> Result<Segment, SimulationError>;

    /// Method name, used in logs.
    fn name(&self) -> &str;
}

/// Scaled max-norm of an error estimate: the largest `|e_i| / (tol * (1 + |y_i|))`.
///
/// A value of at most 1 means every component is within tolerance.
pub(crate) fn error_ratio(error: &DVector<f64>, y: &DVector<f64>, tolerance: f64) -> f64 {
    let mut worst: f64 = 0.0;
    for i in 0..error.len() {
        let scale = tolerance * (1.0 + y[i].abs());
        worst = worst.max(error[i].abs() / scale);
    }
    worst
}
