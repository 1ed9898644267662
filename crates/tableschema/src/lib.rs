//! Tableschema: typed schemas for tabular data.
//!
//! A schema descriptor declares a table's fields, their types, formats and
//! constraints, plus primary and foreign keys. This crate loads and
//! validates descriptors, casts raw cells into typed values, infers
//! schemas from sample rows and streams validated rows out of a source.
//!
//! # Core Pieces
//!
//! - **Casting**: a finite table of pure casters, one per type and format
//! - **Schema**: descriptor loading, profile checks and row casting
//! - **Table**: lazy row streaming with uniqueness, foreign keys and
//!   integrity checks
//!
//! # Example
//!
//! ```no_run
//! use tableschema::{ReadOptions, Schema, Table};
//!
//! let schema = Schema::load("schema.json", true)?;
//! let mut table = Table::from_path("data.csv").with_schema(schema);
//! for row in table.iter(ReadOptions::default()) {
//!     println!("{:?}", row?.cells);
//! }
//! # Ok::<(), tableschema::TableSchemaError>(())
//! ```

pub mod config;
pub mod constraints;
pub mod error;
pub mod input;
pub mod schema;
pub mod storage;
pub mod table;
pub mod types;
pub mod value;

pub use constraints::{ConstraintCheck, ConstraintKind, Constraints};
pub use error::{Result, TableSchemaError};
pub use input::{CsvConfig, CsvSource, InlineSource, RowSource};
pub use schema::{
    DescriptorSource, DescriptorValidator, Field, FieldDescriptor, ForeignKey, Schema,
    SchemaDescriptor, TableSchemaProfile,
};
pub use storage::{MemoryStorage, Storage};
pub use table::{
    InferOptions, IntegrityExpectation, ReadOptions, Relations, Row, RowErrorReport, Table,
};
pub use types::{CastOptions, FieldType, Format, IsoDuration};
pub use value::{Cell, FailedCast, Value};
