//! CSV export of simulation trajectories
//!
//! Writes the tank trajectory (time, tank particulates, tank substrates,
//! film thickness) as one CSV row per scheduled instant, optionally preceded
//! by `#`-prefixed metadata comments. The format opens directly in Excel,
//! pandas and MATLAB.
//!
//! **Output** (with metadata):
//! ```csv
//! # Tank-Biofilm Simulation Data
//! # Generated: 2026-08-29T10:00:00+00:00
//! # Model: Monod washout
//! # Method: Cash-Karp 4(5)
//! # Horizon: 24 h
//! time,X1,S1,Lf
//! 0.000000,1.000000,8.000000,10.000000
//! 2.000000,0.951229,7.612438,10.412000
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::reactor::{ReactorParams, UnpackedTrajectory};

/// Errors specific to CSV export.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nothing to export: {0}")]
    EmptyData(String),
}

// =================================================================================================
// CSV Exporter
// =================================================================================================

/// Trajectory-to-CSV writer.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    /// Column delimiter (default: ',').
    pub delimiter: char,
    /// Decimal places for floating-point values (default: 6).
    pub precision: usize,
    /// Write `#`-prefixed metadata comments before the header row.
    pub include_metadata: bool,
    /// Model name for the metadata block.
    pub model_name: Option<String>,
    /// Integration method name for the metadata block.
    pub method_name: Option<String>,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
            model_name: None,
            method_name: None,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the metadata block with model and method names.
    pub fn with_metadata(mut self, model: &str, method: &str) -> Self {
        self.include_metadata = true;
        self.model_name = Some(model.to_string());
        self.method_name = Some(method.to_string());
        self
    }

    /// Write the tank trajectory to `path`.
    ///
    /// Columns: `time`, one per particulate label, one per substrate label,
    /// then `Lf`.
    ///
    /// # Errors
    ///
    /// [`CsvError::EmptyData`] when the trajectory has no samples;
    /// [`CsvError::Io`] for any filesystem failure.
    pub fn export_trajectory(
        &self,
        trajectory: &UnpackedTrajectory,
        params: &ReactorParams,
        path: impl AsRef<Path>,
    ) -> Result<(), CsvError> {
        if trajectory.times.is_empty() {
            return Err(CsvError::EmptyData("trajectory has no samples".to_string()));
        }

        let file = File::create(path)?;
        let mut out = BufWriter::new(file);

        if self.include_metadata {
            self.write_metadata(&mut out, params)?;
        }

        // Header row.
        let mut header = String::from("time");
        for label in &params.particulate_labels {
            header.push(self.delimiter);
            header.push_str(label);
        }
        for label in &params.substrate_labels {
            header.push(self.delimiter);
            header.push_str(label);
        }
        header.push(self.delimiter);
        header.push_str("Lf");
        writeln!(out, "{header}")?;

        // One row per sample.
        let p = self.precision;
        let d = self.delimiter;
        for (row, &t) in trajectory.times.iter().enumerate() {
            let mut line = format!("{t:.p$}");
            for s in 0..params.n_particulates {
                let value = trajectory.tank_particulates[(row, s)];
                line.push(d);
                line.push_str(&format!("{value:.p$}"));
            }
            for s in 0..params.n_substrates {
                let value = trajectory.tank_substrates[(row, s)];
                line.push(d);
                line.push_str(&format!("{value:.p$}"));
            }
            line.push(d);
            line.push_str(&format!("{:.p$}", trajectory.thickness[row]));
            writeln!(out, "{line}")?;
        }

        out.flush()?;
        Ok(())
    }

    fn write_metadata(
        &self,
        out: &mut impl Write,
        params: &ReactorParams,
    ) -> Result<(), CsvError> {
        writeln!(out, "# Tank-Biofilm Simulation Data")?;
        writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;
        if let Some(model) = &self.model_name {
            writeln!(out, "# Model: {model}")?;
        }
        if let Some(method) = &self.method_name {
            writeln!(out, "# Method: {method}")?;
        }
        writeln!(out, "# Horizon: {} h", params.total_time)?;
        writeln!(out, "# Output Period: {} h", params.output_period)?;
        writeln!(
            out,
            "# Species: {} particulates, {} substrates, {} layers",
            params.n_particulates, params.n_substrates, params.n_layers
        )?;
        writeln!(out, "#")?;
        Ok(())
    }
}
