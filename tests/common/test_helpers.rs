//! Helper functions and fixtures for integration tests

use biofilm_rs::error::SimulationError;
use biofilm_rs::output::{OutputSink, PlotRecord, TitleRecord, ValueRecord};
use biofilm_rs::reactor::{ReactorParams, ReactorParamsBuilder};
use nalgebra::{DMatrix, DVector};

/// A small but non-trivial configuration: one particulate, one substrate,
/// three depth layers, a 10 µm film over a 6 h horizon.
pub fn standard_params() -> ReactorParamsBuilder {
    ReactorParams::builder(1, 1, 3)
        .tank_particulates(DVector::from_vec(vec![1.0]))
        .tank_substrates(DVector::from_vec(vec![8.0]))
        .film_particulates(DMatrix::from_element(1, 3, 0.4))
        .film_substrates(DMatrix::from_element(1, 3, 2.0))
        .initial_thickness(10.0)
        .total_time(6.0)
        .output_period(2.0)
        .discontinuity_period(3.0)
        .plot_period(6.0)
}

/// Relative error with an absolute floor near zero.
pub fn relative_error(computed: f64, exact: f64) -> f64 {
    (computed - exact).abs() / exact.abs().max(1e-12)
}

// =================================================================================================
// Recording Sink
// =================================================================================================

/// Captures every emission so tests can assert on dispatch behaviour.
#[derive(Default)]
pub struct RecordingSink {
    /// Times of title emissions.
    pub titles: Vec<f64>,
    /// `(time, thickness, had_diagnostics)` of each values emission.
    pub values: Vec<(f64, f64, bool)>,
    /// Times of plot emissions.
    pub plots: Vec<f64>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for RecordingSink {
    fn emit_title(&mut self, record: &TitleRecord<'_>) -> Result<(), SimulationError> {
        self.titles.push(record.time);
        Ok(())
    }

    fn emit_values(&mut self, record: &ValueRecord<'_>) -> Result<(), SimulationError> {
        self.values.push((
            record.time,
            record.state.thickness,
            record.diagnostics.is_some(),
        ));
        Ok(())
    }

    fn emit_plot(&mut self, record: &PlotRecord<'_>) -> Result<(), SimulationError> {
        self.plots.push(record.time);
        Ok(())
    }
}
