//! Output dispatch
//!
//! At every scheduled stop instant the dispatcher classifies the instant
//! against the configured periods and routes the matching emissions to the
//! sink:
//!
//! - a **values** emission at every multiple of the output period,
//!   preceded by a **title** emission on every tenth values instant;
//! - a **plot** emission at every multiple of the plot period.
//!
//! Multiples are recognized with an absolute tolerance of `1e-9`, which
//! absorbs the single-multiplication roundoff of the schedule while staying
//! far below any physically meaningful period.
//!
//! Failure policy: diagnostic evaluator and sink failures are recoverable —
//! logged, that one emission dropped, the run continues. A state that no
//! longer matches the layout is a driver bug and stays fatal.

use log::warn;
use nalgebra::{DMatrix, DVector};

use crate::error::SimulationError;
use crate::kinetics::DiagnosticMode;
use crate::output::sink::{OutputSink, PlotRecord, TitleRecord, ValueRecord};
use crate::reactor::{unpack, BiofilmGrid, ReactorParams, StateLayout, UnpackedState};

/// Absolute tolerance for recognizing a scheduled instant as a multiple of
/// a period.
pub const MULTIPLE_TOLERANCE: f64 = 1e-9;

/// True when `t` is a whole multiple of `period`, within tolerance.
pub fn is_multiple(t: f64, period: f64) -> bool {
    let k = (t / period).round();
    (t - k * period).abs() <= MULTIPLE_TOLERANCE
}

// =================================================================================================
// Output Dispatcher
// =================================================================================================

/// Classifies stop instants and routes emissions to a sink.
///
/// Created once per run; the values-instant counter that drives the title
/// cadence lives here, not in the sink.
pub struct OutputDispatcher<'a> {
    params: &'a ReactorParams,
    layout: &'a StateLayout,
    mode: DiagnosticMode,
    values_emitted: usize,
}

impl<'a> OutputDispatcher<'a> {
    /// Build a dispatcher for one run.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the diagnostic mode does not
    /// match the configuration (see [`DiagnosticMode::validate`]).
    pub fn new(
        params: &'a ReactorParams,
        layout: &'a StateLayout,
        mode: DiagnosticMode,
    ) -> Result<Self, SimulationError> {
        mode.validate(params)?;
        Ok(Self {
            params,
            layout,
            mode,
            values_emitted: 0,
        })
    }

    /// Classify one stop instant and perform its emissions.
    ///
    /// # Errors
    ///
    /// Only [`SimulationError::LayoutMismatch`] — the state vector no longer
    /// matches the run's layout. Evaluator and sink failures are absorbed
    /// here with a warning.
    pub fn dispatch(
        &mut self,
        t: f64,
        state: &DVector<f64>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), SimulationError> {
        let on_values = is_multiple(t, self.params.output_period);
        let on_plot = is_multiple(t, self.params.plot_period);
        if !on_values && !on_plot {
            return Ok(());
        }

        let fields = unpack(state, self.layout)?;
        let grid = match BiofilmGrid::build(fields.thickness, self.params.n_layers) {
            Ok(grid) => grid,
            Err(err) => {
                warn!("skipping emissions at t = {t}: {err}");
                return Ok(());
            }
        };

        if on_values {
            self.emit_values(t, &fields, &grid, sink);
        }
        if on_plot {
            let record = PlotRecord {
                time: t,
                state: &fields,
                grid: &grid,
            };
            if let Err(err) = sink.emit_plot(&record) {
                warn!("plot emission failed at t = {t}: {err}");
            }
        }
        Ok(())
    }

    fn emit_values(
        &mut self,
        t: f64,
        fields: &UnpackedState,
        grid: &BiofilmGrid,
        sink: &mut dyn OutputSink,
    ) {
        let diagnostics = match self.compute_diagnostics(t, fields, grid) {
            Ok(diagnostics) => diagnostics,
            Err(err) => {
                warn!("diagnostic evaluation failed at t = {t}, emission skipped: {err}");
                return;
            }
        };

        if self.values_emitted % 10 == 0 {
            let title = TitleRecord {
                time: t,
                particulate_labels: &self.params.particulate_labels,
                substrate_labels: &self.params.substrate_labels,
                diagnostic: self.diagnostic_name(),
            };
            if let Err(err) = sink.emit_title(&title) {
                warn!("title emission failed at t = {t}: {err}");
            }
        }

        let record = ValueRecord {
            time: t,
            state: fields,
            diagnostics: diagnostics.as_ref(),
        };
        if let Err(err) = sink.emit_values(&record) {
            warn!("values emission failed at t = {t}: {err}");
        }
        self.values_emitted += 1;
    }

    /// Density-scaled biomass grid: `rho[s] * volume_fraction[s][z]`.
    fn biomass_concentrations(&self, fields: &UnpackedState) -> DMatrix<f64> {
        DMatrix::from_fn(self.params.n_particulates, self.params.n_layers, |s, z| {
            self.params.density[s] * fields.film_particulates[(s, z)]
        })
    }

    fn compute_diagnostics(
        &self,
        t: f64,
        fields: &UnpackedState,
        grid: &BiofilmGrid,
    ) -> Result<Option<DMatrix<f64>>, SimulationError> {
        match &self.mode {
            DiagnosticMode::None => Ok(None),
            DiagnosticMode::GrowthRate(evaluator) => {
                let biomass = self.biomass_concentrations(fields);
                let rates = evaluator.evaluate(
                    &fields.film_substrates,
                    &biomass,
                    fields.thickness,
                    t,
                    self.params,
                    grid,
                )?;
                Ok(Some(rates))
            }
            DiagnosticMode::SourceTerms(evaluators) => {
                let biomass = self.biomass_concentrations(fields);
                let mut rates =
                    DMatrix::zeros(self.params.n_particulates, self.params.n_layers);
                for z in 0..self.params.n_layers {
                    let substrates: DVector<f64> = fields.film_substrates.column(z).into_owned();
                    let column: DVector<f64> = biomass.column(z).into_owned();
                    for (s, evaluator) in evaluators.iter().enumerate() {
                        rates[(s, z)] = evaluator.evaluate(&substrates, &column, t, self.params)?;
                    }
                }
                Ok(Some(rates))
            }
        }
    }

    fn diagnostic_name(&self) -> Option<&str> {
        match &self.mode {
            DiagnosticMode::None => None,
            DiagnosticMode::GrowthRate(evaluator) => Some(evaluator.name()),
            DiagnosticMode::SourceTerms(evaluators) => {
                evaluators.first().map(|evaluator| evaluator.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetics::SourceTermEvaluator;
    use crate::reactor::pack;
    use std::sync::Arc;

    /// Counts emissions instead of printing them.
    #[derive(Default)]
    struct CountingSink {
        titles: usize,
        values: usize,
        plots: usize,
        fail_values: bool,
    }

    impl OutputSink for CountingSink {
        fn emit_title(&mut self, _record: &TitleRecord<'_>) -> Result<(), SimulationError> {
            self.titles += 1;
            Ok(())
        }

        fn emit_values(&mut self, _record: &ValueRecord<'_>) -> Result<(), SimulationError> {
            if self.fail_values {
                return Err(SimulationError::config("sink unavailable"));
            }
            self.values += 1;
            Ok(())
        }

        fn emit_plot(&mut self, _record: &PlotRecord<'_>) -> Result<(), SimulationError> {
            self.plots += 1;
            Ok(())
        }
    }

    struct FailingEvaluator;

    impl SourceTermEvaluator for FailingEvaluator {
        fn evaluate(
            &self,
            _substrates: &DVector<f64>,
            _biomass: &DVector<f64>,
            _t: f64,
            _params: &ReactorParams,
        ) -> Result<f64, SimulationError> {
            Err(SimulationError::hook("no rate law configured"))
        }

        fn name(&self) -> &str {
            "Failing"
        }
    }

    fn setup() -> (ReactorParams, StateLayout, DVector<f64>) {
        let params = ReactorParams::builder(1, 1, 2)
            .initial_thickness(4.0)
            .total_time(20.0)
            .output_period(2.0)
            .discontinuity_period(2.0)
            .plot_period(5.0)
            .build()
            .unwrap();
        let layout = StateLayout::new(1, 1, 2).unwrap();
        let state = pack(
            &DVector::from_vec(vec![1.0]),
            &DVector::from_vec(vec![2.0]),
            &DMatrix::from_element(1, 2, 0.5),
            &DMatrix::from_element(1, 2, 3.0),
            4.0,
            &layout,
        )
        .unwrap();
        (params, layout, state)
    }

    #[test]
    fn test_multiple_recognition_tolerance() {
        assert!(is_multiple(0.0, 2.0));
        assert!(is_multiple(6.0, 2.0));
        assert!(is_multiple(6.0 + 5e-10, 2.0));
        assert!(!is_multiple(6.1, 2.0));
        // 3 * 0.2 in floats is not exactly 0.6; the tolerance absorbs it.
        assert!(is_multiple(3.0 * 0.2, 0.2));
    }

    #[test]
    fn test_values_and_plot_classification() {
        let (params, layout, state) = setup();
        let mut dispatcher =
            OutputDispatcher::new(&params, &layout, DiagnosticMode::None).unwrap();
        let mut sink = CountingSink::default();

        // t = 10 is a multiple of both the output and the plot period.
        dispatcher.dispatch(10.0, &state, &mut sink).unwrap();
        assert_eq!(sink.values, 1);
        assert_eq!(sink.plots, 1);

        // t = 3 is a multiple of neither.
        dispatcher.dispatch(3.0, &state, &mut sink).unwrap();
        assert_eq!(sink.values, 1);
        assert_eq!(sink.plots, 1);

        // t = 4 is a values instant only.
        dispatcher.dispatch(4.0, &state, &mut sink).unwrap();
        assert_eq!(sink.values, 2);
        assert_eq!(sink.plots, 1);
    }

    #[test]
    fn test_title_every_tenth_values_instant() {
        let (params, layout, state) = setup();
        let mut dispatcher =
            OutputDispatcher::new(&params, &layout, DiagnosticMode::None).unwrap();
        let mut sink = CountingSink::default();

        for k in 0..25 {
            dispatcher.dispatch(k as f64 * 2.0, &state, &mut sink).unwrap();
        }
        assert_eq!(sink.values, 25);
        // Titles at values instants 0, 10 and 20.
        assert_eq!(sink.titles, 3);
    }

    #[test]
    fn test_hook_failure_skips_emission_but_not_run() {
        let (params, layout, state) = setup();
        let mode =
            DiagnosticMode::SourceTerms(vec![Arc::new(FailingEvaluator) as Arc<dyn SourceTermEvaluator>]);
        let mut dispatcher = OutputDispatcher::new(&params, &layout, mode).unwrap();
        let mut sink = CountingSink::default();

        // Every evaluation fails; dispatch still succeeds and nothing is
        // emitted on the values channel.
        dispatcher.dispatch(2.0, &state, &mut sink).unwrap();
        assert_eq!(sink.values, 0);
        assert_eq!(sink.titles, 0);
    }

    #[test]
    fn test_sink_failure_is_absorbed() {
        let (params, layout, state) = setup();
        let mut dispatcher =
            OutputDispatcher::new(&params, &layout, DiagnosticMode::None).unwrap();
        let mut sink = CountingSink {
            fail_values: true,
            ..Default::default()
        };

        assert!(dispatcher.dispatch(2.0, &state, &mut sink).is_ok());
    }

    #[test]
    fn test_layout_mismatch_is_fatal() {
        let (params, layout, _) = setup();
        let mut dispatcher =
            OutputDispatcher::new(&params, &layout, DiagnosticMode::None).unwrap();
        let mut sink = CountingSink::default();

        let wrong = DVector::zeros(layout.n_vars() + 3);
        assert!(matches!(
            dispatcher.dispatch(2.0, &wrong, &mut sink),
            Err(SimulationError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_mismatched_source_term_count_rejected() {
        let (params, layout, _) = setup();
        let mode = DiagnosticMode::SourceTerms(vec![
            Arc::new(FailingEvaluator) as Arc<dyn SourceTermEvaluator>,
            Arc::new(FailingEvaluator) as Arc<dyn SourceTermEvaluator>,
        ]);
        assert!(OutputDispatcher::new(&params, &layout, mode).is_err());
    }
}
