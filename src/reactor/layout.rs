//! Flat state vector layout
//!
//! The integrator advances one contiguous vector of reals. This module fixes,
//! once per run, where each logical field lives inside that vector:
//!
//! ```text
//! [ tank particulates | tank substrates | biofilm particulates | biofilm substrates | Lf ]
//!        Nx                  Ns                 Nx * Nz                Ns * Nz          1
//! ```
//!
//! The five ranges partition `0..n_vars` exactly — contiguous, disjoint, in
//! the fixed order above. Within each biofilm block the flattening is
//! species-major: species `s` occupies the contiguous run
//! `s * Nz .. (s + 1) * Nz`, so one species' depth profile is a single slice.

use std::ops::Range;

use crate::error::SimulationError;

// =================================================================================================
// State Layout
// =================================================================================================

/// Index ranges of every logical field within the flat state vector.
///
/// Computed once from the field counts and shared read-only by the packer,
/// the unpacker and the kinetics context. Immutable after construction.
///
/// # Example
///
/// ```rust
/// use biofilm_rs::reactor::StateLayout;
///
/// let layout = StateLayout::new(2, 3, 4).unwrap();
/// assert_eq!(layout.n_vars(), 2 + 3 + 2 * 4 + 3 * 4 + 1);
/// assert_eq!(layout.thickness_index(), layout.n_vars() - 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    n_particulates: usize,
    n_substrates: usize,
    n_layers: usize,

    tank_particulates: Range<usize>,
    tank_substrates: Range<usize>,
    film_particulates: Range<usize>,
    film_substrates: Range<usize>,
    thickness: usize,
}

impl StateLayout {
    /// Build the layout for `Nx` particulate species, `Ns` substrate species
    /// and `Nz` biofilm depth layers.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Configuration`] when `n_layers` is zero —
    /// the depth grid needs at least one cell.
    pub fn new(
        n_particulates: usize,
        n_substrates: usize,
        n_layers: usize,
    ) -> Result<Self, SimulationError> {
        if n_layers == 0 {
            return Err(SimulationError::config(
                "the biofilm must have at least one depth layer",
            ));
        }

        let tank_particulates = 0..n_particulates;
        let tank_substrates = tank_particulates.end..tank_particulates.end + n_substrates;
        let film_particulates =
            tank_substrates.end..tank_substrates.end + n_particulates * n_layers;
        let film_substrates = film_particulates.end..film_particulates.end + n_substrates * n_layers;
        let thickness = film_substrates.end;

        Ok(Self {
            n_particulates,
            n_substrates,
            n_layers,
            tank_particulates,
            tank_substrates,
            film_particulates,
            film_substrates,
            thickness,
        })
    }

    /// Number of particulate species (`Nx`).
    pub fn n_particulates(&self) -> usize {
        self.n_particulates
    }

    /// Number of substrate species (`Ns`).
    pub fn n_substrates(&self) -> usize {
        self.n_substrates
    }

    /// Number of biofilm depth layers (`Nz`).
    pub fn n_layers(&self) -> usize {
        self.n_layers
    }

    /// Total length of the flat state vector.
    pub fn n_vars(&self) -> usize {
        self.thickness + 1
    }

    /// Range of the tank particulate block.
    pub fn tank_particulates(&self) -> Range<usize> {
        self.tank_particulates.clone()
    }

    /// Range of the tank substrate block.
    pub fn tank_substrates(&self) -> Range<usize> {
        self.tank_substrates.clone()
    }

    /// Range of the biofilm particulate-fraction block (species-major).
    pub fn film_particulates(&self) -> Range<usize> {
        self.film_particulates.clone()
    }

    /// Range of the biofilm substrate block (species-major).
    pub fn film_substrates(&self) -> Range<usize> {
        self.film_substrates.clone()
    }

    /// Index of the film thickness entry (always the last slot).
    pub fn thickness_index(&self) -> usize {
        self.thickness
    }

    /// Flat index of `(species, layer)` within the biofilm particulate block.
    pub fn film_particulate_index(&self, species: usize, layer: usize) -> usize {
        debug_assert!(species < self.n_particulates && layer < self.n_layers);
        self.film_particulates.start + species * self.n_layers + layer
    }

    /// Flat index of `(species, layer)` within the biofilm substrate block.
    pub fn film_substrate_index(&self, species: usize, layer: usize) -> usize {
        debug_assert!(species < self.n_substrates && layer < self.n_layers);
        self.film_substrates.start + species * self.n_layers + layer
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_partition() {
        // Ranges must be contiguous, disjoint, ordered, and cover everything.
        for (nx, ns, nz) in [(1, 1, 1), (2, 3, 4), (0, 2, 5), (3, 0, 2), (0, 0, 1)] {
            let layout = StateLayout::new(nx, ns, nz).unwrap();

            assert_eq!(layout.tank_particulates().start, 0);
            assert_eq!(
                layout.tank_particulates().end,
                layout.tank_substrates().start
            );
            assert_eq!(
                layout.tank_substrates().end,
                layout.film_particulates().start
            );
            assert_eq!(
                layout.film_particulates().end,
                layout.film_substrates().start
            );
            assert_eq!(layout.film_substrates().end, layout.thickness_index());

            assert_eq!(layout.tank_particulates().len(), nx);
            assert_eq!(layout.tank_substrates().len(), ns);
            assert_eq!(layout.film_particulates().len(), nx * nz);
            assert_eq!(layout.film_substrates().len(), ns * nz);
            assert_eq!(layout.n_vars(), nx + ns + nx * nz + ns * nz + 1);
        }
    }

    #[test]
    fn test_zero_layers_rejected() {
        let result = StateLayout::new(1, 1, 0);
        assert!(matches!(
            result,
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn test_species_major_indexing() {
        let layout = StateLayout::new(2, 2, 3).unwrap();

        // Species 0 occupies a contiguous run of Nz slots, then species 1.
        let base = layout.film_particulates().start;
        assert_eq!(layout.film_particulate_index(0, 0), base);
        assert_eq!(layout.film_particulate_index(0, 2), base + 2);
        assert_eq!(layout.film_particulate_index(1, 0), base + 3);

        let base = layout.film_substrates().start;
        assert_eq!(layout.film_substrate_index(1, 2), base + 5);
    }

    #[test]
    fn test_thickness_is_last() {
        let layout = StateLayout::new(4, 2, 6).unwrap();
        assert_eq!(layout.thickness_index(), layout.n_vars() - 1);
    }
}
