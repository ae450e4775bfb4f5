//! Application layer: drives the services against the ports.

pub mod sync_orchestrator;

pub use sync_orchestrator::{build_columns, search, ColumnReader, CycleReport, ReaderOptions};
