//! Mock kinetic models for testing
//!
//! These models have known analytical solutions, making them ideal for
//! validating driver behaviour and stepper accuracy.

use biofilm_rs::kinetics::{EvalContext, Kinetics};
use nalgebra::DVector;

// =================================================================================================
// Steady Film: dy/dt = 0
// =================================================================================================

/// Frozen system: every derivative is zero.
///
/// The state at every scheduled instant must equal the initial state
/// exactly, which pins down the packing, scheduling and dispatch plumbing
/// without any numerical error in the way.
pub struct SteadyFilm;

impl Kinetics for SteadyFilm {
    fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        DVector::zeros(state.len())
    }

    fn name(&self) -> &str {
        "SteadyFilm"
    }
}

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Uniform first-order decay of the whole state vector.
///
/// Analytical solution: `y(t) = y₀ * exp(-k*t)` componentwise.
pub struct ExponentialDecay {
    pub rate: f64,
}

impl ExponentialDecay {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Exact solution at time `t` for initial value `y0`.
    pub fn analytical_solution(&self, t: f64, y0: f64) -> f64 {
        y0 * (-self.rate * t).exp()
    }
}

impl Kinetics for ExponentialDecay {
    fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        state * -self.rate
    }

    fn name(&self) -> &str {
        "ExponentialDecay"
    }
}

// =================================================================================================
// Film Accretion: d(Lf)/dt = c, everything else frozen
// =================================================================================================

/// Linear film growth: only the thickness entry has a nonzero derivative.
///
/// Analytical solution: `Lf(t) = Lf₀ + c*t`; exact for every method.
pub struct FilmAccretion {
    pub growth_rate: f64,
}

impl FilmAccretion {
    pub fn new(growth_rate: f64) -> Self {
        Self { growth_rate }
    }

    pub fn analytical_thickness(&self, t: f64, lf0: f64) -> f64 {
        lf0 + self.growth_rate * t
    }
}

impl Kinetics for FilmAccretion {
    fn rhs(&self, state: &DVector<f64>, ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        let mut dy = DVector::zeros(state.len());
        dy[ctx.layout.thickness_index()] = self.growth_rate;
        dy
    }

    fn name(&self) -> &str {
        "FilmAccretion"
    }
}

// =================================================================================================
// Quadratic Blowup: dy/dt = y²
// =================================================================================================

/// Finite-time blowup: `y(t) = y₀ / (1 - y₀*t)` diverges at `t = 1/y₀`.
///
/// Used to verify that integration failures surface the last good state.
pub struct QuadraticBlowup;

impl Kinetics for QuadraticBlowup {
    fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        state.component_mul(state)
    }

    fn name(&self) -> &str {
        "QuadraticBlowup"
    }
}

// =================================================================================================
// Truncated Derivative: contract violation
// =================================================================================================

/// A broken model whose derivative has the wrong length.
///
/// Used to verify the driver rejects the contract violation up front
/// instead of panicking inside the stepper.
pub struct TruncatedDerivative;

impl Kinetics for TruncatedDerivative {
    fn rhs(&self, _state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
        DVector::zeros(2)
    }

    fn name(&self) -> &str {
        "TruncatedDerivative"
    }
}
