//! Read and inference options, rows and error reports.

use std::fmt;

use indexmap::IndexMap;

use crate::config::{DEFAULT_INFER_CONFIDENCE, DEFAULT_INFER_LIMIT};
use crate::error::TableSchemaError;
use crate::value::{Cell, Value};

use super::integrity::IntegrityExpectation;

/// Reference rows per resource name, supplied by the caller.
pub type Relations = IndexMap<String, Vec<IndexMap<String, Value>>>;

/// A table-level error handed to a continuation handler.
#[derive(Debug)]
pub struct RowErrorReport {
    pub error: TableSchemaError,
    /// Row the error belongs to; `None` for stream-level errors.
    pub row_number: Option<usize>,
    /// The raw row keyed by header (or field) name.
    pub row_data: IndexMap<String, Value>,
    /// Only the offending cells.
    pub error_data: IndexMap<String, Value>,
}

/// Continuation handler: receives each error and lets iteration go on.
pub type ErrorHandler<'a> = Box<dyn FnMut(&RowErrorReport) + 'a>;

/// Options for [`Table::iter`](super::Table::iter) and
/// [`Table::read`](super::Table::read).
pub struct ReadOptions<'a> {
    /// Cast rows through the schema (default true).
    pub cast: bool,
    /// Stop after this many emitted rows.
    pub limit: Option<usize>,
    /// Reference data for foreign keys; keys are not resolved without it.
    pub relations: Option<&'a Relations>,
    /// Expected size and hash of the consumed bytes.
    pub integrity: Option<IntegrityExpectation>,
    handler: Option<ErrorHandler<'a>>,
}

impl Default for ReadOptions<'_> {
    fn default() -> Self {
        Self {
            cast: true,
            limit: None,
            relations: None,
            integrity: None,
            handler: None,
        }
    }
}

impl fmt::Debug for ReadOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("cast", &self.cast)
            .field("limit", &self.limit)
            .field("relations", &self.relations.map(|r| r.len()))
            .field("integrity", &self.integrity)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl<'a> ReadOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cast(mut self, cast: bool) -> Self {
        self.cast = cast;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_relations(mut self, relations: &'a Relations) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn with_integrity(mut self, integrity: IntegrityExpectation) -> Self {
        self.integrity = Some(integrity);
        self
    }

    /// Install a continuation handler instead of failing fast.
    pub fn with_handler(mut self, handler: impl FnMut(&RowErrorReport) + 'a) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Report to the handler, or give the error back when there is none.
    pub(crate) fn report(&mut self, report: RowErrorReport) -> Result<(), TableSchemaError> {
        match self.handler.as_mut() {
            Some(handler) => {
                tracing::warn!(row = ?report.row_number, error = %report.error, "Row error reported to handler");
                handler(&report);
                Ok(())
            }
            None => Err(report.error),
        }
    }
}

/// Options for [`Table::infer`](super::Table::infer).
#[derive(Debug, Clone, PartialEq)]
pub struct InferOptions {
    /// Rows sampled from the source.
    pub limit: usize,
    /// Fraction of the leading vote a type needs to stay eligible.
    pub confidence: f64,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_INFER_LIMIT,
            confidence: DEFAULT_INFER_CONFIDENCE,
        }
    }
}

impl InferOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// An emitted row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Source row number; the header, when present, is row 1.
    pub number: usize,
    pub cells: Vec<Cell>,
}

impl Row {
    /// Cells keyed by the given names, positionally.
    pub fn keyed(&self, names: &[String]) -> IndexMap<String, Cell> {
        names.iter().cloned().zip(self.cells.iter().cloned()).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.cells.iter().any(Cell::is_failed)
    }

    /// Plain values; references and failures map to their JSON form.
    pub fn values(&self) -> Vec<Value> {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Value(v) | Cell::Unresolved(v) => v.clone(),
                other => Value::from(other.to_json()),
            })
            .collect()
    }
}
