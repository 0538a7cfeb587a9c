//! Reactor state representation
//!
//! This module owns everything about *what the state is*: the run
//! configuration, the flat-vector layout, the packing/unpacking between
//! flat and typed representations, and the biofilm depth grid.
//!
//! # Core Concepts
//!
//! - **Parameters** ([`ReactorParams`]): immutable run configuration,
//!   validated once before integration
//! - **Layout** ([`StateLayout`]): index ranges of every logical field
//!   inside the flat state vector
//! - **Packing** ([`pack`] / [`unpack`]): exact inverse conversions between
//!   the flat vector and the five typed fields
//! - **Grid** ([`BiofilmGrid`]): uniform depth discretization, rebuilt from
//!   the current thickness rather than stored in the state
//!
//! # The flat state vector
//!
//! ```text
//! [ tank particulates | tank substrates | biofilm particulates | biofilm substrates | Lf ]
//!        Nx                  Ns                 Nx * Nz                Ns * Nz          1
//! ```
//!
//! Kinetics implementations read and write this vector through the layout's
//! index ranges; nothing in the crate hard-codes an offset.
//!
//! # Example
//!
//! ```rust
//! use biofilm_rs::reactor::{pack, unpack, ReactorParams, StateLayout};
//! use nalgebra::{DMatrix, DVector};
//!
//! let layout = StateLayout::new(1, 2, 3).unwrap();
//! let flat = pack(
//!     &DVector::from_vec(vec![0.5]),
//!     &DVector::from_vec(vec![8.0, 2.0]),
//!     &DMatrix::from_element(1, 3, 0.1),
//!     &DMatrix::from_element(2, 3, 4.0),
//!     25.0,
//!     &layout,
//! )
//! .unwrap();
//!
//! let fields = unpack(&flat, &layout).unwrap();
//! assert_eq!(fields.thickness, 25.0);
//! assert_eq!(fields.film_substrates[(1, 2)], 4.0);
//! ```

pub mod grid;
pub mod layout;
pub mod parameters;
pub mod state;

pub use grid::BiofilmGrid;
pub use layout::StateLayout;
pub use parameters::{ReactorParams, ReactorParamsBuilder};
pub use state::{pack, unpack, unpack_trajectory, UnpackedState, UnpackedTrajectory};
