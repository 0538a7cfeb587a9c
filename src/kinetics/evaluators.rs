//! Diagnostic evaluator hooks
//!
//! Diagnostics run at scheduled output instants only; they never touch the
//! integration path. A growth-rate evaluator maps the biofilm fields to a
//! per-species, per-layer rate grid; a source-term evaluator reduces one
//! layer's substrate column to a scalar production rate for one particulate
//! species. [`DiagnosticMode`] selects which family (if any) a run uses.
//!
//! An evaluator failure is recoverable: the dispatcher logs it, skips that
//! instant's emission and lets the run continue.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::SimulationError;
use crate::reactor::{BiofilmGrid, ReactorParams};

// =================================================================================================
// Evaluator Traits
// =================================================================================================

/// Per-layer growth rates for every particulate species.
///
/// `substrates` and `biomass` are species × layer grids sampled at the cell
/// midpoints; `biomass` is already density-scaled (concentration, not volume
/// fraction). The result must be `Nx` × `Nz`.
pub trait GrowthRateEvaluator: Send + Sync {
    fn evaluate(
        &self,
        substrates: &DMatrix<f64>,
        biomass: &DMatrix<f64>,
        thickness: f64,
        t: f64,
        params: &ReactorParams,
        grid: &BiofilmGrid,
    ) -> Result<DMatrix<f64>, SimulationError>;

    /// Evaluator name for logs and emitted titles.
    fn name(&self) -> &str;
}

/// Scalar net production rate of one particulate species in one layer.
///
/// `substrates` is that layer's substrate column (length `Ns`) and `biomass`
/// the density-scaled particulate column (length `Nx`).
pub trait SourceTermEvaluator: Send + Sync {
    fn evaluate(
        &self,
        substrates: &DVector<f64>,
        biomass: &DVector<f64>,
        t: f64,
        params: &ReactorParams,
    ) -> Result<f64, SimulationError>;

    /// Evaluator name for logs and emitted titles.
    fn name(&self) -> &str;
}

// =================================================================================================
// Diagnostic Mode
// =================================================================================================

/// Which diagnostic family a run computes at output instants.
///
/// The two evaluator families are mutually exclusive; a tagged enum makes a
/// mixed configuration unrepresentable instead of relying on callers to pass
/// at most one non-empty collection.
#[derive(Clone, Default)]
pub enum DiagnosticMode {
    /// No diagnostics; value emissions carry state only.
    #[default]
    None,
    /// One evaluator producing the full species × layer growth-rate grid.
    GrowthRate(Arc<dyn GrowthRateEvaluator>),
    /// One evaluator per particulate species, applied layer by layer.
    SourceTerms(Vec<Arc<dyn SourceTermEvaluator>>),
}

impl DiagnosticMode {
    /// Check the mode against the run configuration.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when the source-term collection
    /// does not provide exactly one evaluator per particulate species.
    pub fn validate(&self, params: &ReactorParams) -> Result<(), SimulationError> {
        if let Self::SourceTerms(evaluators) = self {
            if evaluators.len() != params.n_particulates {
                return Err(SimulationError::config(format!(
                    "source-term diagnostics need one evaluator per particulate species: \
                     expected {}, got {}",
                    params.n_particulates,
                    evaluators.len()
                )));
            }
        }
        Ok(())
    }

    /// True when value emissions will carry diagnostic rows.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Debug for DiagnosticMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "DiagnosticMode::None"),
            Self::GrowthRate(e) => write!(f, "DiagnosticMode::GrowthRate({})", e.name()),
            Self::SourceTerms(evaluators) => {
                let names: Vec<&str> = evaluators.iter().map(|e| e.name()).collect();
                write!(f, "DiagnosticMode::SourceTerms({names:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRate(f64);

    impl SourceTermEvaluator for FixedRate {
        fn evaluate(
            &self,
            _substrates: &DVector<f64>,
            _biomass: &DVector<f64>,
            _t: f64,
            _params: &ReactorParams,
        ) -> Result<f64, SimulationError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "FixedRate"
        }
    }

    #[test]
    fn test_source_term_count_must_match_species() {
        let params = ReactorParams::builder(2, 1, 3).build().unwrap();

        let one: Vec<Arc<dyn SourceTermEvaluator>> = vec![Arc::new(FixedRate(1.0))];
        let mode = DiagnosticMode::SourceTerms(one);
        assert!(matches!(
            mode.validate(&params),
            Err(SimulationError::Configuration(_))
        ));

        let two: Vec<Arc<dyn SourceTermEvaluator>> =
            vec![Arc::new(FixedRate(1.0)), Arc::new(FixedRate(2.0))];
        assert!(DiagnosticMode::SourceTerms(two).validate(&params).is_ok());
    }

    #[test]
    fn test_none_mode_always_valid() {
        let params = ReactorParams::builder(3, 2, 2).build().unwrap();
        assert!(DiagnosticMode::None.validate(&params).is_ok());
        assert!(!DiagnosticMode::None.is_active());
    }
}
