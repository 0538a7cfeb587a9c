//! Run configuration
//!
//! [`ReactorParams`] is the immutable `param` record: field counts, initial
//! values, per-species densities, solver tolerance, the simulation horizon
//! and the three output periods. It is created once at run start, validated
//! before any integration, and shared read-only by every component.

use nalgebra::{DMatrix, DVector};

use crate::error::SimulationError;

// =================================================================================================
// Reactor Parameters
// =================================================================================================

/// Immutable configuration of one simulation run.
///
/// Constructed through [`ReactorParams::builder`]; `build()` runs every
/// fail-fast configuration check, so a `ReactorParams` value in hand is
/// always internally consistent.
#[derive(Debug, Clone)]
pub struct ReactorParams {
    /// Number of particulate species (`Nx`).
    pub n_particulates: usize,
    /// Number of substrate species (`Ns`).
    pub n_substrates: usize,
    /// Number of biofilm depth layers (`Nz`).
    pub n_layers: usize,

    /// Initial tank particulate concentrations (`Xto`), length `Nx`.
    pub tank_particulates_init: DVector<f64>,
    /// Initial tank substrate concentrations (`Sto`), length `Ns`.
    pub tank_substrates_init: DVector<f64>,
    /// Initial biofilm particulate volume fractions (`Pbo`), `Nx` × `Nz`.
    pub film_particulates_init: DMatrix<f64>,
    /// Initial biofilm substrate concentrations (`Sbo`), `Ns` × `Nz`.
    pub film_substrates_init: DMatrix<f64>,
    /// Initial film thickness (`Lfo`).
    pub initial_thickness: f64,

    /// Per-particulate-species density (`rho`), length `Nx`. Converts a
    /// volume fraction into a concentration for the diagnostic hooks.
    pub density: DVector<f64>,

    /// Shared absolute/relative solver tolerance.
    pub tolerance: f64,
    /// Simulation horizon: integrate over `[0, total_time]`.
    pub total_time: f64,
    /// Period of the "values" diagnostic emission.
    pub output_period: f64,
    /// Period at which the kinetics may be non-smooth; the integrator is
    /// force-stopped at every multiple.
    pub discontinuity_period: f64,
    /// Period of the plot emission.
    pub plot_period: f64,

    /// Hint that the system is stiff; selects an implicit method.
    pub stiff: bool,

    /// Display names for the particulate species, length `Nx`.
    pub particulate_labels: Vec<String>,
    /// Display names for the substrate species, length `Ns`.
    pub substrate_labels: Vec<String>,
}

impl ReactorParams {
    /// Start building a configuration for `Nx` particulates, `Ns` substrates
    /// and `Nz` depth layers.
    pub fn builder(
        n_particulates: usize,
        n_substrates: usize,
        n_layers: usize,
    ) -> ReactorParamsBuilder {
        ReactorParamsBuilder::new(n_particulates, n_substrates, n_layers)
    }

    /// Run every fail-fast configuration check.
    ///
    /// Called by the builder and again by the driver before integration, so
    /// hand-assembled values get the same treatment as built ones.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.n_layers == 0 {
            return Err(SimulationError::config(
                "the biofilm must have at least one depth layer",
            ));
        }
        if self.tolerance <= 0.0 {
            return Err(SimulationError::config(format!(
                "solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !self.total_time.is_finite() || self.total_time <= 0.0 {
            return Err(SimulationError::config(format!(
                "total simulation time must be positive, got {}",
                self.total_time
            )));
        }
        for (name, period) in [
            ("output period", self.output_period),
            ("discontinuity period", self.discontinuity_period),
            ("plot period", self.plot_period),
        ] {
            if !period.is_finite() || period <= 0.0 {
                return Err(SimulationError::config(format!(
                    "{name} must be positive, got {period}"
                )));
            }
        }
        if !self.initial_thickness.is_finite() || self.initial_thickness < 0.0 {
            return Err(SimulationError::config(format!(
                "initial film thickness must be non-negative, got {}",
                self.initial_thickness
            )));
        }

        self.check_len(
            "tank particulate initial values",
            self.tank_particulates_init.len(),
            self.n_particulates,
        )?;
        self.check_len(
            "tank substrate initial values",
            self.tank_substrates_init.len(),
            self.n_substrates,
        )?;
        self.check_len("species densities", self.density.len(), self.n_particulates)?;
        self.check_len(
            "particulate labels",
            self.particulate_labels.len(),
            self.n_particulates,
        )?;
        self.check_len(
            "substrate labels",
            self.substrate_labels.len(),
            self.n_substrates,
        )?;

        if self.film_particulates_init.shape() != (self.n_particulates, self.n_layers) {
            return Err(SimulationError::config(format!(
                "biofilm particulate initial grid must be {} x {}, got {} x {}",
                self.n_particulates,
                self.n_layers,
                self.film_particulates_init.nrows(),
                self.film_particulates_init.ncols()
            )));
        }
        if self.film_substrates_init.shape() != (self.n_substrates, self.n_layers) {
            return Err(SimulationError::config(format!(
                "biofilm substrate initial grid must be {} x {}, got {} x {}",
                self.n_substrates,
                self.n_layers,
                self.film_substrates_init.nrows(),
                self.film_substrates_init.ncols()
            )));
        }

        Ok(())
    }

    fn check_len(
        &self,
        name: &str,
        actual: usize,
        expected: usize,
    ) -> Result<(), SimulationError> {
        if actual != expected {
            return Err(SimulationError::config(format!(
                "{name} must have length {expected}, got {actual}"
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Builder
// =================================================================================================

/// Builder for [`ReactorParams`] with sensible zero-state defaults.
///
/// # Example
///
/// ```rust
/// use biofilm_rs::reactor::ReactorParams;
///
/// let params = ReactorParams::builder(1, 2, 8)
///     .initial_thickness(50.0)
///     .total_time(12.0)
///     .output_period(1.0)
///     .discontinuity_period(1.5)
///     .plot_period(3.0)
///     .tolerance(1e-8)
///     .stiff(true)
///     .build()
///     .unwrap();
/// assert!(params.stiff);
/// ```
#[derive(Debug, Clone)]
pub struct ReactorParamsBuilder {
    params: ReactorParams,
}

impl ReactorParamsBuilder {
    fn new(n_particulates: usize, n_substrates: usize, n_layers: usize) -> Self {
        let particulate_labels = (1..=n_particulates).map(|i| format!("X{i}")).collect();
        let substrate_labels = (1..=n_substrates).map(|i| format!("S{i}")).collect();

        Self {
            params: ReactorParams {
                n_particulates,
                n_substrates,
                n_layers,
                tank_particulates_init: DVector::zeros(n_particulates),
                tank_substrates_init: DVector::zeros(n_substrates),
                film_particulates_init: DMatrix::zeros(n_particulates, n_layers),
                film_substrates_init: DMatrix::zeros(n_substrates, n_layers),
                initial_thickness: 0.0,
                density: DVector::from_element(n_particulates, 1.0),
                tolerance: 1e-6,
                total_time: 1.0,
                output_period: 1.0,
                discontinuity_period: 1.0,
                plot_period: 1.0,
                stiff: false,
                particulate_labels,
                substrate_labels,
            },
        }
    }

    /// Initial tank particulate concentrations (`Xto`).
    pub fn tank_particulates(mut self, values: DVector<f64>) -> Self {
        self.params.tank_particulates_init = values;
        self
    }

    /// Initial tank substrate concentrations (`Sto`).
    pub fn tank_substrates(mut self, values: DVector<f64>) -> Self {
        self.params.tank_substrates_init = values;
        self
    }

    /// Initial biofilm particulate volume fractions (`Pbo`), species × layer.
    pub fn film_particulates(mut self, values: DMatrix<f64>) -> Self {
        self.params.film_particulates_init = values;
        self
    }

    /// Initial biofilm substrate concentrations (`Sbo`), species × layer.
    pub fn film_substrates(mut self, values: DMatrix<f64>) -> Self {
        self.params.film_substrates_init = values;
        self
    }

    /// Initial film thickness (`Lfo`).
    pub fn initial_thickness(mut self, thickness: f64) -> Self {
        self.params.initial_thickness = thickness;
        self
    }

    /// Per-species densities (`rho`).
    pub fn density(mut self, density: DVector<f64>) -> Self {
        self.params.density = density;
        self
    }

    /// Shared solver tolerance (absolute and relative).
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.params.tolerance = tolerance;
        self
    }

    /// Simulation horizon.
    pub fn total_time(mut self, total_time: f64) -> Self {
        self.params.total_time = total_time;
        self
    }

    /// Values-emission period.
    pub fn output_period(mut self, period: f64) -> Self {
        self.params.output_period = period;
        self
    }

    /// Kinetics discontinuity period.
    pub fn discontinuity_period(mut self, period: f64) -> Self {
        self.params.discontinuity_period = period;
        self
    }

    /// Plot-emission period.
    pub fn plot_period(mut self, period: f64) -> Self {
        self.params.plot_period = period;
        self
    }

    /// Stiffness hint for method selection.
    pub fn stiff(mut self, stiff: bool) -> Self {
        self.params.stiff = stiff;
        self
    }

    /// Display names for the particulate species.
    pub fn particulate_labels(mut self, labels: Vec<String>) -> Self {
        self.params.particulate_labels = labels;
        self
    }

    /// Display names for the substrate species.
    pub fn substrate_labels(mut self, labels: Vec<String>) -> Self {
        self.params.substrate_labels = labels;
        self
    }

    /// Validate and produce the immutable configuration.
    pub fn build(self) -> Result<ReactorParams, SimulationError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
