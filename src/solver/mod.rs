//! Numerical integration
//!
//! This module turns a kinetic model into a completed run. It separates
//! concerns into three layers:
//!
//! 1. **Schedule** ([`PeriodSchedule`]) — WHEN to stop
//!    - The merged ladder of output and discontinuity instants
//!    - Exact rational arithmetic, no accumulated drift
//!
//! 2. **Methods** ([`Integrator`] trait) — HOW to step
//!    - [`CashKarp`]: adaptive explicit Runge-Kutta 4(5), the default
//!    - [`ImplicitEuler`]: backward Euler with damped Newton, for stiff
//!      systems
//!
//! 3. **Driver** ([`IntegrationDriver`]) — the orchestration
//!    - Validates, selects the method, integrates window by window,
//!      dispatches output at every stop instant
//!
//! This separation allows the same method to serve any kinetics, and a new
//! method to slot in through [`IntegrationDriver::with_integrator`] without
//! touching the driver.

use nalgebra::DVector;

use crate::error::SimulationError;

pub mod driver;
pub mod methods;
pub mod schedule;

pub use driver::{IntegrationDriver, SimulationRun};
pub use methods::{CashKarp, ImplicitEuler, Integrator, Segment, StepControl};
pub use schedule::PeriodSchedule;

/// Reject a state containing NaN or infinity.
///
/// Run after every integration window; a non-finite component means the
/// kinetics or the stepper diverged and the run must stop with context
/// rather than emit garbage.
pub fn validate_state(state: &DVector<f64>, time: f64) -> Result<(), SimulationError> {
    for (i, value) in state.iter().enumerate() {
        if !value.is_finite() {
            return Err(SimulationError::Integration {
                time,
                message: format!("state component {i} became {value}"),
                last_state: state.clone(),
            });
        }
    }
    Ok(())
}
