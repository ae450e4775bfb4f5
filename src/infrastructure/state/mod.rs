//! Prior column state and column output files
pub mod column_file;

pub use column_file::{ColumnFile, ColumnWriter};
