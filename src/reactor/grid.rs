//! Biofilm depth grid
//!
//! The biofilm portion of the state vector is interpreted on a uniform
//! one-dimensional grid from the attachment surface (depth 0) to the current
//! film thickness. The grid is derived data: it is rebuilt whenever the
//! thickness changes, and never stored in the state vector itself.

use nalgebra::DVector;

use crate::error::SimulationError;

// =================================================================================================
// Biofilm Grid
// =================================================================================================

/// Uniform depth discretization of the biofilm.
///
/// Invariants for a positive thickness:
/// - boundaries are strictly increasing, `n_layers + 1` values from 0 to the
///   thickness;
/// - midpoint `i` lies strictly between boundaries `i` and `i + 1`;
/// - the cell width equals `thickness / n_layers`.
///
/// A zero thickness is a valid, trivial film (no growth yet): every boundary
/// and midpoint is 0 and the width is 0. Callers must not treat it as an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct BiofilmGrid {
    boundaries: DVector<f64>,
    midpoints: DVector<f64>,
    cell_width: f64,
}

impl BiofilmGrid {
    /// Build the grid for the given film thickness and layer count.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] when `n_layers` is zero or the
    /// thickness is negative or non-finite.
    pub fn build(thickness: f64, n_layers: usize) -> Result<Self, SimulationError> {
        if n_layers == 0 {
            return Err(SimulationError::config(
                "the biofilm grid needs at least one layer",
            ));
        }
        if !thickness.is_finite() || thickness < 0.0 {
            return Err(SimulationError::config(format!(
                "film thickness must be finite and non-negative, got {thickness}"
            )));
        }

        let cell_width = thickness / n_layers as f64;

        // Direct computation per index rather than repeated addition, so the
        // last boundary equals the thickness to machine precision.
        let boundaries =
            DVector::from_fn(n_layers + 1, |i, _| thickness * i as f64 / n_layers as f64);
        let midpoints = DVector::from_fn(n_layers, |i, _| {
            0.5 * (boundaries[i] + boundaries[i + 1])
        });

        Ok(Self {
            boundaries,
            midpoints,
            cell_width,
        })
    }

    /// Cell boundary coordinates, `n_layers + 1` values from 0 to the thickness.
    pub fn boundaries(&self) -> &DVector<f64> {
        &self.boundaries
    }

    /// Cell midpoint coordinates, one per layer.
    pub fn midpoints(&self) -> &DVector<f64> {
        &self.midpoints
    }

    /// Uniform cell width, `thickness / n_layers`.
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Number of depth layers.
    pub fn n_layers(&self) -> usize {
        self.midpoints.len()
    }

    /// Total film thickness (the last boundary).
    pub fn thickness(&self) -> f64 {
        self.boundaries[self.boundaries.len() - 1]
    }
}

// =================================================================================================
// Tests
// =================================================================================================
