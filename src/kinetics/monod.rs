//! Monod growth-rate diagnostic
//!
//! The standard saturating growth law: the specific rate rises linearly with
//! the limiting substrate at low concentration and plateaus at `mu_max`,
//! with the half-saturation constant marking the crossover.

use nalgebra::{DMatrix, DVector};

use crate::error::SimulationError;
use crate::kinetics::GrowthRateEvaluator;
use crate::reactor::{BiofilmGrid, ReactorParams};

// =================================================================================================
// Monod Growth Rate
// =================================================================================================

/// Monod kinetics on a single limiting substrate.
///
/// For species `s` in layer `z`:
///
/// ```text
/// rate[s][z] = mu_max[s] * S[z] / (Ks[s] + S[z]) * X[s][z]
/// ```
///
/// where `S` is the limiting substrate profile and `X` the density-scaled
/// biomass grid.
#[derive(Debug, Clone)]
pub struct MonodGrowthRate {
    /// Maximum specific growth rate per particulate species, length `Nx`.
    mu_max: DVector<f64>,
    /// Half-saturation constant per particulate species, length `Nx`.
    half_saturation: DVector<f64>,
    /// Index of the limiting substrate within the substrate block.
    limiting_substrate: usize,
}

impl MonodGrowthRate {
    /// Build the evaluator.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the two parameter vectors
    /// differ in length or any half-saturation constant is not positive.
    pub fn new(
        mu_max: DVector<f64>,
        half_saturation: DVector<f64>,
        limiting_substrate: usize,
    ) -> Result<Self, SimulationError> {
        if mu_max.len() != half_saturation.len() {
            return Err(SimulationError::config(format!(
                "monod parameter vectors must agree in length: {} mu_max vs {} Ks",
                mu_max.len(),
                half_saturation.len()
            )));
        }
        if half_saturation.iter().any(|&k| k <= 0.0) {
            return Err(SimulationError::config(
                "monod half-saturation constants must be positive",
            ));
        }
        Ok(Self {
            mu_max,
            half_saturation,
            limiting_substrate,
        })
    }
}

impl GrowthRateEvaluator for MonodGrowthRate {
    fn evaluate(
        &self,
        substrates: &DMatrix<f64>,
        biomass: &DMatrix<f64>,
        _thickness: f64,
        _t: f64,
        params: &ReactorParams,
        _grid: &BiofilmGrid,
    ) -> Result<DMatrix<f64>, SimulationError> {
        if self.mu_max.len() != params.n_particulates {
            return Err(SimulationError::hook(format!(
                "monod evaluator sized for {} species, run has {}",
                self.mu_max.len(),
                params.n_particulates
            )));
        }
        if self.limiting_substrate >= params.n_substrates {
            return Err(SimulationError::hook(format!(
                "limiting substrate index {} out of range for {} substrates",
                self.limiting_substrate, params.n_substrates
            )));
        }

        let n_layers = substrates.ncols();
        let rates = DMatrix::from_fn(params.n_particulates, n_layers, |s, z| {
            let conc = substrates[(self.limiting_substrate, z)].max(0.0);
            let specific = self.mu_max[s] * conc / (self.half_saturation[s] + conc);
            specific * biomass[(s, z)]
        });
        Ok(rates)
    }

    fn name(&self) -> &str {
        "Monod"
    }
}
