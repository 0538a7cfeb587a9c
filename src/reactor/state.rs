//! State packing and unpacking
//!
//! The integrator sees one flat `DVector<f64>`; everything else in the crate
//! works with typed fields. [`pack`] and [`unpack`] convert between the two
//! representations using a [`StateLayout`], and are exact inverses for any
//! vector produced by `pack`.
//!
//! The two biofilm grids are species × layer matrices. Their flattening
//! order inside the vector is species-major (see [`StateLayout`]); `pack`
//! performs no reshaping beyond length checks, so callers must supply grids
//! in that convention.

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::SimulationError;
use crate::reactor::StateLayout;

// =================================================================================================
// Unpacked State
// =================================================================================================

/// The five logical fields of one state sample.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedState {
    /// Tank particulate concentrations, length `Nx`.
    pub tank_particulates: DVector<f64>,
    /// Tank substrate concentrations, length `Ns`.
    pub tank_substrates: DVector<f64>,
    /// Biofilm particulate volume fractions, `Nx` × `Nz`.
    pub film_particulates: DMatrix<f64>,
    /// Biofilm substrate concentrations, `Ns` × `Nz`.
    pub film_substrates: DMatrix<f64>,
    /// Film thickness.
    pub thickness: f64,
}

// =================================================================================================
// Pack / Unpack
// =================================================================================================

/// Concatenate the five fields into a flat state vector in layout order.
///
/// # Errors
///
/// [`SimulationError::LayoutMismatch`] when any input length or shape
/// disagrees with the layout. Nothing is ever truncated or padded.
pub fn pack(
    tank_particulates: &DVector<f64>,
    tank_substrates: &DVector<f64>,
    film_particulates: &DMatrix<f64>,
    film_substrates: &DMatrix<f64>,
    thickness: f64,
    layout: &StateLayout,
) -> Result<DVector<f64>, SimulationError> {
    check_len(
        "tank particulates",
        tank_particulates.len(),
        layout.n_particulates(),
    )?;
    check_len(
        "tank substrates",
        tank_substrates.len(),
        layout.n_substrates(),
    )?;
    check_grid(
        "biofilm particulates",
        film_particulates,
        layout.n_particulates(),
        layout.n_layers(),
    )?;
    check_grid(
        "biofilm substrates",
        film_substrates,
        layout.n_substrates(),
        layout.n_layers(),
    )?;

    let mut flat = DVector::zeros(layout.n_vars());

    flat.rows_mut(layout.tank_particulates().start, layout.n_particulates())
        .copy_from(tank_particulates);
    flat.rows_mut(layout.tank_substrates().start, layout.n_substrates())
        .copy_from(tank_substrates);

    for species in 0..layout.n_particulates() {
        for layer in 0..layout.n_layers() {
            flat[layout.film_particulate_index(species, layer)] =
                film_particulates[(species, layer)];
        }
    }
    for species in 0..layout.n_substrates() {
        for layer in 0..layout.n_layers() {
            flat[layout.film_substrate_index(species, layer)] = film_substrates[(species, layer)];
        }
    }

    flat[layout.thickness_index()] = thickness;
    Ok(flat)
}

/// Slice a flat state vector back into its five typed fields.
///
/// Pure; the exact inverse of [`pack`] for any vector `pack` produced.
///
/// # Errors
///
/// [`SimulationError::LayoutMismatch`] when the vector length does not equal
/// `layout.n_vars()`.
pub fn unpack(flat: &DVector<f64>, layout: &StateLayout) -> Result<UnpackedState, SimulationError> {
    check_len("flat state vector", flat.len(), layout.n_vars())?;

    let tank_particulates = flat
        .rows(layout.tank_particulates().start, layout.n_particulates())
        .into_owned();
    let tank_substrates = flat
        .rows(layout.tank_substrates().start, layout.n_substrates())
        .into_owned();

    let film_particulates = DMatrix::from_fn(layout.n_particulates(), layout.n_layers(), |s, z| {
        flat[layout.film_particulate_index(s, z)]
    });
    let film_substrates = DMatrix::from_fn(layout.n_substrates(), layout.n_layers(), |s, z| {
        flat[layout.film_substrate_index(s, z)]
    });

    Ok(UnpackedState {
        tank_particulates,
        tank_substrates,
        film_particulates,
        film_substrates,
        thickness: flat[layout.thickness_index()],
    })
}

fn check_len(field: &'static str, actual: usize, expected: usize) -> Result<(), SimulationError> {
    if actual != expected {
        return Err(SimulationError::LayoutMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_grid(
    field: &'static str,
    grid: &DMatrix<f64>,
    rows: usize,
    cols: usize,
) -> Result<(), SimulationError> {
    if grid.shape() != (rows, cols) {
        return Err(SimulationError::LayoutMismatch {
            field,
            expected: rows * cols,
            actual: grid.len(),
        });
    }
    Ok(())
}

// =================================================================================================
// Trajectory Unpacking
// =================================================================================================

/// Per-field view of a whole trajectory, time-major.
#[derive(Debug, Clone)]
pub struct UnpackedTrajectory {
    /// Sample times.
    pub times: Vec<f64>,
    /// Tank particulates, one row per sample (`nt` × `Nx`).
    pub tank_particulates: DMatrix<f64>,
    /// Tank substrates, one row per sample (`nt` × `Ns`).
    pub tank_substrates: DMatrix<f64>,
    /// Biofilm particulate grids, one species × layer matrix per sample.
    pub film_particulates: Vec<DMatrix<f64>>,
    /// Biofilm substrate grids, one species × layer matrix per sample.
    pub film_substrates: Vec<DMatrix<f64>>,
    /// Film thickness per sample.
    pub thickness: DVector<f64>,
}

/// Unpack every sample of a trajectory with one shared layout.
///
/// # Errors
///
/// [`SimulationError::LayoutMismatch`] when `times` and `states` disagree in
/// length, or when any sample has a length other than `layout.n_vars()` —
/// the trajectory was produced under a different layout.
pub fn unpack_trajectory(
    times: &[f64],
    states: &[DVector<f64>],
    layout: &StateLayout,
) -> Result<UnpackedTrajectory, SimulationError> {
    check_len("trajectory time stamps", times.len(), states.len())?;

    #[cfg(feature = "parallel")]
    let samples: Result<Vec<UnpackedState>, SimulationError> =
        states.par_iter().map(|flat| unpack(flat, layout)).collect();
    #[cfg(not(feature = "parallel"))]
    let samples: Result<Vec<UnpackedState>, SimulationError> =
        states.iter().map(|flat| unpack(flat, layout)).collect();
    let samples = samples?;

    let nt = samples.len();
    let tank_particulates = DMatrix::from_fn(nt, layout.n_particulates(), |t, s| {
        samples[t].tank_particulates[s]
    });
    let tank_substrates =
        DMatrix::from_fn(nt, layout.n_substrates(), |t, s| samples[t].tank_substrates[s]);
    let thickness = DVector::from_fn(nt, |t, _| samples[t].thickness);

    let mut film_particulates = Vec::with_capacity(nt);
    let mut film_substrates = Vec::with_capacity(nt);
    for sample in samples {
        film_particulates.push(sample.film_particulates);
        film_substrates.push(sample.film_substrates);
    }

    Ok(UnpackedTrajectory {
        times: times.to_vec(),
        tank_particulates,
        tank_substrates,
        film_particulates,
        film_substrates,
        thickness,
    })
}

// =================================================================================================
// Tests
// =================================================================================================
