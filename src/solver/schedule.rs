//! Period scheduling
//!
//! The driver must halt the integrator exactly at every multiple of the
//! output period (to emit) and of the discontinuity period (to restart the
//! method across a kink in the kinetics). The schedule merges both ladders
//! into one strictly increasing list of stop instants over `[0, horizon]`.
//!
//! The merge step is the greatest common divisor of the two periods,
//! computed in exact rational arithmetic. Each instant is then a single
//! multiplication `k * step` from an integer tick, so the list carries no
//! accumulated floating-point drift and an instant that should be a multiple
//! of a period is one to machine precision.

use num::integer::gcd;
use num::rational::Ratio;
use num::ToPrimitive;

use crate::error::SimulationError;

// =================================================================================================
// Period Schedule
// =================================================================================================

/// The ordered stop instants of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSchedule {
    step: Ratio<i128>,
    instants: Vec<f64>,
}

impl PeriodSchedule {
    /// Merge the output and discontinuity ladders over `[0, horizon]`.
    ///
    /// The first instant is always `0`, the last always `horizon` — when the
    /// horizon is not itself a multiple of the merged step it is appended as
    /// a final partial interval.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when a period or the horizon is
    /// not positive, or cannot be represented as an exact rational (a NaN or
    /// infinity).
    pub fn build(
        output_period: f64,
        discontinuity_period: f64,
        horizon: f64,
    ) -> Result<Self, SimulationError> {
        for (name, value) in [
            ("output period", output_period),
            ("discontinuity period", discontinuity_period),
            ("horizon", horizon),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimulationError::config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        let a = to_ratio("output period", output_period)?;
        let b = to_ratio("discontinuity period", discontinuity_period)?;
        let end = to_ratio("horizon", horizon)?;

        // gcd(n1/d1, n2/d2) = gcd(n1*d2, n2*d1) / (d1*d2); Ratio::new reduces.
        let numer = gcd(a.numer() * b.denom(), b.numer() * a.denom());
        let step = Ratio::new(numer, a.denom() * b.denom());

        let full_steps = (end / step).to_integer();
        let mut instants = Vec::with_capacity(full_steps as usize + 2);
        for k in 0..=full_steps {
            let t = (step * k).to_f64().ok_or_else(|| {
                SimulationError::config("schedule instant overflows an f64".to_string())
            })?;
            instants.push(t);
        }
        if step * full_steps != end {
            instants.push(horizon);
        }

        Ok(Self { step, instants })
    }

    /// Merged step as a float, `gcd(output_period, discontinuity_period)`.
    pub fn step(&self) -> f64 {
        // Both components fit in an f64 by construction.
        self.step.to_f64().unwrap_or(f64::NAN)
    }

    /// The strictly increasing stop instants, from `0` to the horizon.
    pub fn instants(&self) -> &[f64] {
        &self.instants
    }

    /// Number of stop instants.
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    /// A schedule always contains at least `0` and the horizon.
    pub fn is_empty(&self) -> bool {
        false
    }
}

fn to_ratio(name: &str, value: f64) -> Result<Ratio<i128>, SimulationError> {
    Ratio::approximate_float(value).ok_or_else(|| {
        SimulationError::config(format!("{name} ({value}) has no exact rational form"))
    })
}
