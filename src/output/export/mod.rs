//! Export of simulation results
//!
//! Each format is an independent implementation in its own sub-module, and
//! each format manages its own error type. Adding a new format means adding
//! a file, without modifying existing code.
//!
//! # Available formats
//!
//! | Format | Module  |
//! |--------|---------|
//! | CSV    | [`csv`] |

pub mod csv;

pub use csv::{CsvError, CsvExporter};
