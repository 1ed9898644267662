//! Row sources consumed by the table reader.

mod delimited;
mod source;

pub use delimited::{CsvConfig, CsvSource};
pub use source::{InlineSource, RowSource};
