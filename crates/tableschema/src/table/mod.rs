//! Validated row streaming over a source and a schema.

mod integrity;
mod options;
mod relations;
#[allow(clippy::module_inception)]
mod table;
mod unique;

pub use integrity::IntegrityExpectation;
pub use options::{ErrorHandler, InferOptions, ReadOptions, Relations, Row, RowErrorReport};
pub use table::{Table, TableRows};
