//! biofilm-rs: Tank–Biofilm Reactor Simulation Framework
//!
//! Simulates the coupled dynamics of a well-mixed stirred tank and an
//! attached, depth-resolved biofilm. Tank particulates and substrates evolve
//! together with per-layer biofilm volume fractions, substrate concentrations
//! and the film thickness, all packed into one flat state vector that an
//! adaptive ODE method advances in time.
//!
//! # Architecture
//!
//! biofilm-rs is built on two core principles:
//!
//! 1. **Separation of Model and Numerics**
//!    - The [`kinetics::Kinetics`] trait supplies the right-hand side
//!      (what to integrate)
//!    - The [`solver`] module supplies the adaptive stepping and the
//!      period scheduling (how to integrate)
//!
//! 2. **One flat state vector, one layout**
//!    - [`reactor::StateLayout`] fixes the index ranges of every logical
//!      field once per run
//!    - [`reactor::pack`] / [`reactor::unpack`] are exact inverses; the
//!      integrator is the only mutator of the flat vector between
//!      scheduled output instants
//!
//! # Quick Start
//!
//! ```rust
//! use biofilm_rs::prelude::*;
//! use nalgebra::DVector;
//!
//! # struct SteadyFilm;
//! # impl Kinetics for SteadyFilm {
//! #     fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
//! #         DVector::zeros(state.len())
//! #     }
//! #     fn name(&self) -> &str { "SteadyFilm" }
//! # }
//! # fn main() -> Result<(), biofilm_rs::SimulationError> {
//! // 1. Configure the run
//! let params = ReactorParams::builder(1, 1, 3)
//!     .initial_thickness(10.0)
//!     .total_time(6.0)
//!     .output_period(2.0)
//!     .discontinuity_period(3.0)
//!     .build()?;
//!
//! // 2. Integrate with a quiet sink
//! let mut sink = NullSink;
//! let driver = IntegrationDriver::new(&params)?;
//! let run = driver.run(&SteadyFilm, &mut sink, DiagnosticMode::None)?;
//!
//! // 3. Access results
//! assert_eq!(run.times.first(), Some(&0.0));
//! assert_eq!(run.depth_midpoints.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`reactor`]: state layout, packing, depth grid, run configuration
//! - [`kinetics`]: right-hand-side and diagnostic hook contracts
//! - [`solver`]: period scheduling, integration methods, the driver
//! - [`output`]: output sinks, dispatch classification, CSV export

pub mod error;
pub mod kinetics;
pub mod output;
pub mod reactor;
pub mod solver;

pub use error::SimulationError;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use biofilm_rs::prelude::*;
    //! ```
    pub use crate::error::SimulationError;
    pub use crate::kinetics::{
        DiagnosticMode, EvalContext, GrowthRateEvaluator, Kinetics, SourceTermEvaluator,
    };
    pub use crate::output::{ConsoleSink, NullSink, OutputDispatcher, OutputSink};
    pub use crate::reactor::{pack, unpack, BiofilmGrid, ReactorParams, StateLayout, UnpackedState};
    pub use crate::solver::{
        CashKarp, ImplicitEuler, IntegrationDriver, Integrator, PeriodSchedule, SimulationRun,
    };
}
