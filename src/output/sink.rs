//! Output sinks
//!
//! A sink is the single destination object for everything a run emits. The
//! dispatcher decides *when* and *what* to emit; the sink decides *where* it
//! goes. Swapping the sink redirects a run's output without touching the
//! driver, and a recording sink makes emission behaviour testable.

use std::fmt::Write as _;

use nalgebra::DMatrix;

use crate::error::SimulationError;
use crate::reactor::{BiofilmGrid, UnpackedState};

// =================================================================================================
// Emission Records
// =================================================================================================

/// Header emission: column labels, sent every tenth values instant.
#[derive(Debug, Clone, Copy)]
pub struct TitleRecord<'a> {
    pub time: f64,
    pub particulate_labels: &'a [String],
    pub substrate_labels: &'a [String],
    /// Name of the active diagnostic evaluator family, if any.
    pub diagnostic: Option<&'a str>,
}

/// Values emission: the unpacked state and any diagnostic grid.
#[derive(Debug, Clone, Copy)]
pub struct ValueRecord<'a> {
    pub time: f64,
    pub state: &'a UnpackedState,
    /// Species × layer diagnostic values when a mode is active.
    pub diagnostics: Option<&'a DMatrix<f64>>,
}

/// Plot emission: the state together with its current depth grid.
#[derive(Debug, Clone, Copy)]
pub struct PlotRecord<'a> {
    pub time: f64,
    pub state: &'a UnpackedState,
    pub grid: &'a BiofilmGrid,
}

// =================================================================================================
// Sink Trait
// =================================================================================================

/// Destination for everything a run emits.
///
/// A sink failure is recoverable: the dispatcher logs it and drops that one
/// emission, so a full disk or broken pipe never aborts the integration.
pub trait OutputSink {
    fn emit_title(&mut self, record: &TitleRecord<'_>) -> Result<(), SimulationError>;
    fn emit_values(&mut self, record: &ValueRecord<'_>) -> Result<(), SimulationError>;
    fn emit_plot(&mut self, record: &PlotRecord<'_>) -> Result<(), SimulationError>;
}

// =================================================================================================
// Built-in Sinks
// =================================================================================================

/// Discards every emission. The sink for headless runs and benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit_title(&mut self, _record: &TitleRecord<'_>) -> Result<(), SimulationError> {
        Ok(())
    }

    fn emit_values(&mut self, _record: &ValueRecord<'_>) -> Result<(), SimulationError> {
        Ok(())
    }

    fn emit_plot(&mut self, _record: &PlotRecord<'_>) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Prints emissions to standard output in fixed-width columns.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    /// Decimal places for printed values (default: 4).
    pub precision: usize,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for ConsoleSink {
    fn emit_title(&mut self, record: &TitleRecord<'_>) -> Result<(), SimulationError> {
        let mut line = String::from("      time");
        for label in record.particulate_labels {
            let _ = write!(line, " {label:>12}");
        }
        for label in record.substrate_labels {
            let _ = write!(line, " {label:>12}");
        }
        let _ = write!(line, " {:>12}", "Lf");
        if let Some(name) = record.diagnostic {
            let _ = write!(line, "   [{name}]");
        }
        println!("{line}");
        Ok(())
    }

    fn emit_values(&mut self, record: &ValueRecord<'_>) -> Result<(), SimulationError> {
        let p = self.precision;
        let mut line = format!("{:10.prec$}", record.time, prec = p);
        for value in record.state.tank_particulates.iter() {
            let _ = write!(line, " {value:>12.p$}");
        }
        for value in record.state.tank_substrates.iter() {
            let _ = write!(line, " {value:>12.p$}");
        }
        let _ = write!(line, " {:>12.p$}", record.state.thickness);
        println!("{line}");

        if let Some(diagnostics) = record.diagnostics {
            for s in 0..diagnostics.nrows() {
                let mut row = format!("  rate[{s}]:");
                for z in 0..diagnostics.ncols() {
                    let _ = write!(row, " {:>12.p$}", diagnostics[(s, z)]);
                }
                println!("{row}");
            }
        }
        Ok(())
    }

    fn emit_plot(&mut self, record: &PlotRecord<'_>) -> Result<(), SimulationError> {
        println!(
            "plot @ t = {:.prec$}: Lf = {:.prec$}, {} layers",
            record.time,
            record.state.thickness,
            record.grid.n_layers(),
            prec = self.precision,
        );
        Ok(())
    }
}
