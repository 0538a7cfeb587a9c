//! Kinetic models
//!
//! This module defines the contract between a kinetic model and the rest of
//! the framework. A kinetic model encapsulates the reaction and transport
//! terms of a tank–biofilm system; the solver applies a numerical method to
//! advance them in time.
//!
//! # Core Concepts
//!
//! - **Kinetics** ([`Kinetics`]): computes the time derivative of the whole
//!   flat state vector (what to integrate)
//! - **Evaluation context** ([`EvalContext`]): read-only view of the run
//!   parameters and the state layout, handed to every derivative call
//! - **Diagnostic hooks** ([`GrowthRateEvaluator`], [`SourceTermEvaluator`]):
//!   optional evaluators invoked at output instants only, never on the
//!   integration path
//!
//! # Architecture
//!
//! Kinetic models are **separate from numerical solvers**:
//! - The model provides the **derivative** (kinetics)
//! - The solver provides the **method** to advance it (numerics)
//!
//! The same model therefore runs unchanged under the explicit and the
//! implicit method, and the same solver drives any model.
//!
//! # Implementing a Kinetic Model
//!
//! ```rust
//! use biofilm_rs::kinetics::{EvalContext, Kinetics};
//! use nalgebra::DVector;
//!
//! /// First-order washout of every tank substrate.
//! struct Washout {
//!     rate: f64,
//! }
//!
//! impl Kinetics for Washout {
//!     fn rhs(&self, state: &DVector<f64>, ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
//!         let mut dy = DVector::zeros(state.len());
//!         for i in ctx.layout.tank_substrates() {
//!             dy[i] = -self.rate * state[i];
//!         }
//!         dy
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Washout"
//!     }
//! }
//! ```

use nalgebra::DVector;

use crate::reactor::{ReactorParams, StateLayout};

pub mod evaluators;
pub mod monod;

pub use evaluators::{DiagnosticMode, GrowthRateEvaluator, SourceTermEvaluator};
pub use monod::MonodGrowthRate;

// =================================================================================================
// Evaluation Context
// =================================================================================================

/// Read-only view handed to every derivative evaluation.
///
/// Carries the run configuration and the state layout so a model can locate
/// its fields inside the flat vector without hard-coding offsets.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Immutable run configuration.
    pub params: &'a ReactorParams,
    /// Index ranges of every logical field.
    pub layout: &'a StateLayout,
}

impl<'a> EvalContext<'a> {
    /// Bundle the configuration and layout of one run.
    pub fn new(params: &'a ReactorParams, layout: &'a StateLayout) -> Self {
        Self { params, layout }
    }
}

// =================================================================================================
// Kinetics Trait
// =================================================================================================

/// The time derivative of a tank–biofilm system.
///
/// Implementations must be pure with respect to the state: calling [`rhs`]
/// twice with the same arguments must return the same vector, since adaptive
/// methods re-evaluate rejected steps. The derivative may be discontinuous
/// at multiples of the configured discontinuity period; the driver restarts
/// the method there so no step straddles such an instant.
///
/// `Send + Sync` so a model can be shared across worker threads.
///
/// [`rhs`]: Kinetics::rhs
pub trait Kinetics: Send + Sync {
    /// Compute `dy/dt` for the full flat state vector at time `t`.
    ///
    /// The returned vector must have the same length as `state`
    /// (`ctx.layout.n_vars()`); the driver checks this against the initial
    /// state before integrating.
    fn rhs(&self, state: &DVector<f64>, ctx: &EvalContext<'_>, t: f64) -> DVector<f64>;

    /// Human-readable model name, used in logs and exported metadata.
    fn name(&self) -> &str;
}
