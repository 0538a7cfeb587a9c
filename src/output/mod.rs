//! Output of simulation results
//!
//! This module owns the run's entire output surface:
//! - **Sinks** ([`sink`]): where emissions go (console, nowhere, tests)
//! - **Dispatch** ([`dispatch`]): when and what to emit at each scheduled
//!   instant
//! - **Export** ([`export`]): CSV trajectory files for external analysis
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs        ← This file
//! ├── sink.rs       ← OutputSink trait + built-in sinks
//! ├── dispatch.rs   ← period classification + emission routing
//! └── export/       ← data export
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! # Failure Policy
//!
//! Output is subordinate to integration: a sink or diagnostic failure is
//! logged and that one emission dropped, never aborting the run. Only a
//! state/layout mismatch — a programming error — propagates as fatal.

pub mod dispatch;
pub mod export;
pub mod sink;

pub use dispatch::{is_multiple, OutputDispatcher, MULTIPLE_TOLERANCE};
pub use export::{CsvError, CsvExporter};
pub use sink::{ConsoleSink, NullSink, OutputSink, PlotRecord, TitleRecord, ValueRecord};
