//! Integration driver
//!
//! The driver ties the pieces together for one run: it validates the
//! configuration, builds the layout and the schedule, selects the stepping
//! method from the stiffness hint, and then integrates window by window
//! between consecutive scheduled instants.
//!
//! Re-invoking the stepper per window is what guarantees the discontinuity
//! contract: the method's step-size history restarts at every scheduled
//! instant, so no accepted step ever straddles a kinetics kink.

use log::{debug, info};
use nalgebra::DVector;

use crate::error::SimulationError;
use crate::kinetics::{DiagnosticMode, EvalContext, Kinetics};
use crate::output::{OutputDispatcher, OutputSink};
use crate::reactor::{
    pack, unpack, unpack_trajectory, BiofilmGrid, ReactorParams, StateLayout, UnpackedState,
    UnpackedTrajectory,
};
use crate::solver::methods::{CashKarp, ImplicitEuler, Integrator, StepControl};
use crate::solver::schedule::PeriodSchedule;
use crate::solver::validate_state;

// =================================================================================================
// Simulation Run
// =================================================================================================

/// Everything one completed run produced.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// The scheduled instants, `0` through the horizon.
    pub times: Vec<f64>,
    /// Flat state vector at each scheduled instant.
    pub states: Vec<DVector<f64>>,
    /// Every accepted step time: the stepper's internal samples plus the
    /// forced hits at each scheduled instant, strictly increasing.
    pub raw_times: Vec<f64>,
    /// Flat state vector at each entry of `raw_times`.
    pub raw_states: Vec<DVector<f64>>,
    /// Per-field view of the trajectory, time-major.
    pub trajectory: UnpackedTrajectory,
    /// Typed fields at the horizon.
    pub final_state: UnpackedState,
    /// Depth-cell midpoints of the final film, one per layer.
    pub depth_midpoints: DVector<f64>,
    /// Name of the stepping method that produced the run.
    pub method: String,
}

// =================================================================================================
// Integration Driver
// =================================================================================================

/// Orchestrates one simulation from configuration to [`SimulationRun`].
pub struct IntegrationDriver {
    params: ReactorParams,
    layout: StateLayout,
    schedule: PeriodSchedule,
    integrator: Box<dyn Integrator>,
    control: StepControl,
}

impl IntegrationDriver {
    /// Build a driver, selecting the method from the stiffness hint:
    /// [`ImplicitEuler`] when `params.stiff` is set, [`CashKarp`] otherwise.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the parameters fail
    /// validation or no schedule can be built from the periods.
    pub fn new(params: &ReactorParams) -> Result<Self, SimulationError> {
        let integrator: Box<dyn Integrator> = if params.stiff {
            Box::new(ImplicitEuler::new())
        } else {
            Box::new(CashKarp::new())
        };
        Self::with_integrator(params, integrator)
    }

    /// Build a driver around a caller-supplied stepping method.
    pub fn with_integrator(
        params: &ReactorParams,
        integrator: Box<dyn Integrator>,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        let layout = StateLayout::new(params.n_particulates, params.n_substrates, params.n_layers)?;
        let schedule = PeriodSchedule::build(
            params.output_period,
            params.discontinuity_period,
            params.total_time,
        )?;
        let control = StepControl::from_tolerance(params.tolerance);

        info!(
            "driver ready: {} variables, {} stop instants (step {}), method {}",
            layout.n_vars(),
            schedule.len(),
            schedule.step(),
            integrator.name()
        );

        Ok(Self {
            params: params.clone(),
            layout,
            schedule,
            integrator,
            control,
        })
    }

    /// The merged stop-instant schedule of this run.
    pub fn schedule(&self) -> &PeriodSchedule {
        &self.schedule
    }

    /// The state layout of this run.
    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Name of the selected stepping method.
    pub fn method_name(&self) -> &str {
        self.integrator.name()
    }

    /// Integrate the model over `[0, total_time]`.
    ///
    /// The dispatcher is invoked at every scheduled instant, including
    /// `t = 0` before the first window.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Configuration`] when the diagnostic mode does
    ///   not fit the configuration
    /// - [`SimulationError::LayoutMismatch`] when the model's derivative,
    ///   checked once against the initial state, has the wrong length
    /// - [`SimulationError::Integration`] when a window cannot be completed
    ///   or the state stops being finite
    pub fn run(
        &self,
        kinetics: &dyn Kinetics,
        sink: &mut dyn OutputSink,
        mode: DiagnosticMode,
    ) -> Result<SimulationRun, SimulationError> {
        let mut dispatcher = OutputDispatcher::new(&self.params, &self.layout, mode)?;
        let ctx = EvalContext::new(&self.params, &self.layout);
        let rhs = |y: &DVector<f64>, t: f64| kinetics.rhs(y, &ctx, t);

        info!(
            "integrating '{}' over [0, {}] with {}",
            kinetics.name(),
            self.params.total_time,
            self.integrator.name()
        );

        let mut state = pack(
            &self.params.tank_particulates_init,
            &self.params.tank_substrates_init,
            &self.params.film_particulates_init,
            &self.params.film_substrates_init,
            self.params.initial_thickness,
            &self.layout,
        )?;
        validate_state(&state, 0.0)?;

        // A wrong-length derivative would otherwise surface as a dimension
        // panic deep inside the stepper.
        let derivative = kinetics.rhs(&state, &ctx, 0.0);
        if derivative.len() != self.layout.n_vars() {
            return Err(SimulationError::LayoutMismatch {
                field: "kinetics derivative",
                expected: self.layout.n_vars(),
                actual: derivative.len(),
            });
        }

        let mut times = Vec::with_capacity(self.schedule.len());
        let mut states = Vec::with_capacity(self.schedule.len());
        let mut raw_times = vec![0.0];
        let mut raw_states = vec![state.clone()];
        times.push(0.0);
        states.push(state.clone());
        dispatcher.dispatch(0.0, &state, sink)?;

        for window in self.schedule.instants().windows(2) {
            let (t0, t1) = (window[0], window[1]);
            let segment = self.integrator.integrate(&rhs, &state, t0, t1, &self.control)?;
            debug!(
                "window [{t0}, {t1}] done in {} accepted steps",
                segment.times.len() - 1
            );

            // The segment's first sample is the window start, recorded when
            // the previous window ended.
            for (&t, y) in segment.times.iter().zip(&segment.states).skip(1) {
                raw_times.push(t);
                raw_states.push(y.clone());
            }

            state = segment.final_state().clone();
            validate_state(&state, t1)?;

            times.push(t1);
            states.push(state.clone());
            dispatcher.dispatch(t1, &state, sink)?;
        }

        let trajectory = unpack_trajectory(&times, &states, &self.layout)?;
        let final_state = unpack(&state, &self.layout)?;
        let grid = BiofilmGrid::build(final_state.thickness, self.params.n_layers)?;

        Ok(SimulationRun {
            times,
            states,
            raw_times,
            raw_states,
            trajectory,
            final_state,
            depth_midpoints: grid.midpoints().clone(),
            method: self.integrator.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NullSink;

    struct SteadyFilm;

    impl Kinetics for SteadyFilm {
        fn rhs(&self, state: &DVector<f64>, _ctx: &EvalContext<'_>, _t: f64) -> DVector<f64> {
            DVector::zeros(state.len())
        }

        fn name(&self) -> &str {
            "SteadyFilm"
        }
    }

    #[test]
    fn test_method_selection_follows_stiff_hint() {
        let relaxed = ReactorParams::builder(1, 1, 2).build().unwrap();
        let driver = IntegrationDriver::new(&relaxed).unwrap();
        assert_eq!(driver.method_name(), "Cash-Karp 4(5)");

        let stiff = ReactorParams::builder(1, 1, 2).stiff(true).build().unwrap();
        let driver = IntegrationDriver::new(&stiff).unwrap();
        assert_eq!(driver.method_name(), "Implicit Euler");
    }

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let mut params = ReactorParams::builder(1, 1, 2).build().unwrap();
        params.tolerance = -1.0;
        assert!(IntegrationDriver::new(&params).is_err());
    }

    #[test]
    fn test_run_visits_every_scheduled_instant() {
        let params = ReactorParams::builder(1, 1, 3)
            .initial_thickness(10.0)
            .total_time(6.0)
            .output_period(2.0)
            .discontinuity_period(3.0)
            .build()
            .unwrap();
        let driver = IntegrationDriver::new(&params).unwrap();

        let run = driver
            .run(&SteadyFilm, &mut NullSink, DiagnosticMode::None)
            .unwrap();
        assert_eq!(run.times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(run.states.len(), 7);
    }
}
