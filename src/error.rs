//! Simulation error taxonomy
//!
//! Four failure classes with distinct propagation policies:
//!
//! - [`SimulationError::Configuration`]: invalid run parameters. Detected
//!   before integration starts, fatal, never retried.
//! - [`SimulationError::LayoutMismatch`]: a pack/unpack length disagreement.
//!   Indicates a caller bug; surfaced immediately, never silently truncated
//!   or padded.
//! - [`SimulationError::Integration`]: the underlying stepper cannot make
//!   progress. Fatal; carries the last successfully reached time and state
//!   for postmortem inspection.
//! - [`SimulationError::DiagnosticHook`]: a growth-rate or source-term
//!   evaluator failed. Recoverable at the dispatcher boundary — the emission
//!   for that instant is skipped and integration continues.

use nalgebra::DVector;
use thiserror::Error;

/// Errors produced while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid run configuration (counts, periods, tolerance, field shapes).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A packed or unpacked field does not match its layout range length.
    #[error("layout mismatch for {field}: expected length {expected}, got {actual}")]
    LayoutMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The integrator failed to advance (step-size collapse, Newton
    /// non-convergence, or a non-finite state).
    #[error("integration failed at t = {time}: {message}")]
    Integration {
        time: f64,
        message: String,
        /// Last state the integrator accepted before failing.
        last_state: DVector<f64>,
    },

    /// A diagnostic evaluator raised; the emission is skipped, the run
    /// continues.
    #[error("diagnostic hook failed: {0}")]
    DiagnosticHook(String),
}

impl SimulationError {
    /// Shorthand for a configuration failure.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Shorthand for a diagnostic hook failure.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::DiagnosticHook(message.into())
    }

    /// True when the error may be absorbed at the output boundary without
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DiagnosticHook(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = SimulationError::config("output period must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration: output period must be positive"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_layout_mismatch_display() {
        let err = SimulationError::LayoutMismatch {
            field: "tank particulates",
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains("tank particulates"));
        assert!(err.to_string().contains("expected length 3"));
    }

    #[test]
    fn test_hook_failures_are_recoverable() {
        assert!(SimulationError::hook("monod half-saturation is zero").is_recoverable());

        let fatal = SimulationError::Integration {
            time: 4.5,
            message: "step size collapsed below 1e-14".into(),
            last_state: DVector::zeros(3),
        };
        assert!(!fatal.is_recoverable());
    }
}
