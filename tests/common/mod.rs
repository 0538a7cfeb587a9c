//! Common utilities for integration tests

pub mod mock_kinetics;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_kinetics::{
    ExponentialDecay, FilmAccretion, QuadraticBlowup, SteadyFilm, TruncatedDerivative,
};
pub use test_helpers::{relative_error, standard_params, RecordingSink};
