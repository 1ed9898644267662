//! Streaming table reader: cast, uniqueness, foreign keys and integrity.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{Result, TableSchemaError};
use crate::input::{CsvSource, InlineSource, RowSource};
use crate::schema::Schema;
use crate::storage::Storage;
use crate::value::{Cell, FailedCast, Value};

use super::integrity::ByteTracker;
use super::options::{InferOptions, ReadOptions, Row, RowErrorReport};
use super::relations::{ForeignKeyPlan, Resolution};
use super::unique::UniqueTracker;

/// A row source paired with an optional schema.
///
/// # Example
///
/// ```no_run
/// use tableschema::{InferOptions, ReadOptions, Table};
///
/// let mut table = Table::from_path("data.csv");
/// table.infer(&InferOptions::default())?;
/// for row in table.iter(ReadOptions::default()) {
///     let row = row?;
///     println!("{}: {:?}", row.number, row.cells);
/// }
/// # Ok::<(), tableschema::TableSchemaError>(())
/// ```
pub struct Table {
    source: Box<dyn RowSource>,
    schema: Option<Schema>,
    headers: Option<Vec<String>>,
    size: Option<u64>,
    hash: Option<String>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.schema.as_ref().map(Schema::field_names))
            .field("headers", &self.headers)
            .field("size", &self.size)
            .field("hash", &self.hash)
            .finish()
    }
}

impl Table {
    pub fn new(source: impl RowSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            schema: None,
            headers: None,
            size: None,
            hash: None,
        }
    }

    /// Table over a delimited file, delimiter auto-detected.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::new(CsvSource::from_path(path))
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Header labels seen on the last open of the source.
    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    /// Bytes consumed by the last complete read.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// `sha256:`-prefixed digest from the last complete read.
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Infer and store a schema from the first `options.limit` rows.
    pub fn infer(&mut self, options: &InferOptions) -> Result<&Schema> {
        self.source.open()?;
        let headers = self.source.headers().map(<[String]>::to_vec);

        let mut sample = Vec::new();
        while sample.len() < options.limit {
            match self.source.read_row() {
                Ok(Some(row)) => sample.push(row),
                Ok(None) => break,
                Err(err) => {
                    self.source.close();
                    return Err(err);
                }
            }
        }
        self.source.close();

        let schema = match &headers {
            Some(headers) => Schema::infer_with_headers(headers, &sample, options.confidence)?,
            None => Schema::infer(&sample, 0, options.confidence)?,
        };
        info!(
            fields = schema.fields().len(),
            rows = sample.len(),
            "Inferred table schema"
        );
        self.headers = headers;
        Ok(self.schema.insert(schema))
    }

    /// Lazily stream rows. The source is opened on the first call to
    /// `next` and closed when the stream ends, fails or is dropped.
    pub fn iter<'a>(&'a mut self, options: ReadOptions<'a>) -> TableRows<'a> {
        TableRows {
            table: self,
            options,
            state: ReadState::default(),
        }
    }

    /// Collect every row, stopping at the first error.
    pub fn read(&mut self, options: ReadOptions<'_>) -> Result<Vec<Row>> {
        self.iter(options).collect()
    }

    /// Write the schema and cast rows to a storage bucket, replacing it.
    pub fn save(&mut self, storage: &mut dyn Storage, bucket: &str) -> Result<()> {
        let Some(descriptor) = self.schema.as_ref().map(|s| s.descriptor().clone()) else {
            return Err(TableSchemaError::Storage(format!(
                "table has no schema to save into bucket \"{bucket}\""
            )));
        };
        let rows: Vec<Vec<Value>> = self
            .read(ReadOptions::default())?
            .into_iter()
            .map(|row| row.values())
            .collect();
        let count = rows.len();
        storage.create(bucket, &descriptor, true)?;
        storage.write(bucket, rows)?;
        info!(bucket, rows = count, "Saved table to storage");
        Ok(())
    }

    /// Load a table previously saved to a bucket.
    pub fn from_storage(storage: &dyn Storage, bucket: &str) -> Result<Self> {
        let schema = Schema::from_descriptor(storage.describe(bucket)?, true)?;
        let rows = storage.read(bucket)?;
        let source = InlineSource::new(schema.field_names(), rows);
        Ok(Self::new(source).with_schema(schema))
    }
}

/// Per-read bookkeeping.
#[derive(Default)]
struct ReadState {
    opened: bool,
    finished: bool,
    row_number: usize,
    emitted: usize,
    labels: Vec<String>,
    field_names: Vec<String>,
    unique: UniqueTracker,
    foreign_keys: Vec<ForeignKeyPlan>,
    bytes: ByteTracker,
}

/// Iterator returned by [`Table::iter`].
pub struct TableRows<'a> {
    table: &'a mut Table,
    options: ReadOptions<'a>,
    state: ReadState,
}

impl TableRows<'_> {
    fn start(&mut self) -> Result<()> {
        self.state.opened = true;
        self.table.source.open()?;
        self.table.headers = self.table.source.headers().map(<[String]>::to_vec);
        self.state.row_number = usize::from(self.table.headers.is_some());

        if let Some(schema) = self.table.schema.as_ref().filter(|_| self.options.cast) {
            self.state.field_names = schema.field_names();
            self.state.unique = UniqueTracker::for_schema(schema);
            if self.options.relations.is_some() {
                self.state.foreign_keys = ForeignKeyPlan::for_schema(schema);
            }
            // Checked on open so a source with no data rows still reports it.
            if let Some(headers) = &self.table.headers {
                if *headers != self.state.field_names {
                    self.options.report(RowErrorReport {
                        error: TableSchemaError::HeaderMismatch {
                            headers: headers.clone(),
                            field_names: self.state.field_names.clone(),
                        },
                        row_number: None,
                        row_data: IndexMap::new(),
                        error_data: IndexMap::new(),
                    })?;
                }
            }
        }
        self.state.labels = match &self.table.headers {
            Some(headers) => headers.clone(),
            None => self.state.field_names.clone(),
        };

        if self.options.integrity.is_some() && !self.table.source.tracks_bytes() {
            warn!("Source does not track bytes; integrity will not be checked");
        }
        debug!(
            headers = ?self.table.headers,
            unique_keys = !self.state.unique.is_empty(),
            foreign_keys = self.state.foreign_keys.len(),
            "Started table read"
        );
        Ok(())
    }

    fn drain(&mut self) {
        let bytes = &mut self.state.bytes;
        self.table.source.drain_consumed(&mut |chunk| bytes.update(chunk));
    }

    fn finish(&mut self) {
        self.state.finished = true;
        self.table.source.close();
    }

    /// Record size and hash after the source was fully consumed.
    fn complete(&mut self) -> Result<()> {
        if !self.table.source.tracks_bytes() {
            return Ok(());
        }
        self.drain();
        let size = self.state.bytes.size();
        let hash = self.state.bytes.hash();
        debug!(size, hash = %hash, "Table read complete");

        let verdict = match &self.options.integrity {
            Some(expected) => expected.verify(size, &hash),
            None => Ok(()),
        };
        self.table.size = Some(size);
        self.table.hash = Some(hash);
        match verdict {
            Ok(()) => Ok(()),
            Err(error) => self.options.report(RowErrorReport {
                error,
                row_number: None,
                row_data: IndexMap::new(),
                error_data: IndexMap::new(),
            }),
        }
    }

    /// Turn one raw row into an emitted row, or `None` when it is skipped.
    fn process(&mut self, raw: Vec<Value>) -> Result<Option<Row>> {
        let number = self.state.row_number;
        let schema = match self.table.schema.as_ref() {
            Some(schema) if self.options.cast => schema,
            _ => {
                return Ok(Some(Row {
                    number,
                    cells: raw.into_iter().map(Cell::Value).collect(),
                }));
            }
        };

        let field_count = schema.fields().len();
        if raw.len() != field_count {
            self.options.report(RowErrorReport {
                error: TableSchemaError::RowShape {
                    row_number: Some(number),
                    row_len: raw.len(),
                    field_count,
                },
                row_number: Some(number),
                row_data: keyed(&self.state.labels, &raw),
                error_data: IndexMap::new(),
            })?;
            return Ok(None);
        }

        let mut cells = Vec::with_capacity(field_count);
        let mut failures = Vec::new();
        for (i, (field, value)) in schema.fields().iter().zip(&raw).enumerate() {
            match field.cast_value(value) {
                Ok(cast) => cells.push(Cell::Value(cast)),
                Err(err) => {
                    cells.push(Cell::Failed(FailedCast::new(value.clone())));
                    failures.push((err, i));
                }
            }
        }
        if !failures.is_empty() {
            if !self.options.has_handler() {
                let errors: Vec<TableSchemaError> = failures.into_iter().map(|(e, _)| e).collect();
                return Err(TableSchemaError::Cast {
                    message: format!(
                        "There are {} cast errors in row {} (see 'errors')",
                        errors.len(),
                        number
                    ),
                    errors,
                });
            }
            let row_data = keyed(&self.state.labels, &raw);
            for (error, i) in failures {
                self.options.report(RowErrorReport {
                    error,
                    row_number: Some(number),
                    row_data: row_data.clone(),
                    error_data: pick(&self.state.field_names, &raw, &[i]),
                })?;
            }
        }

        for (error, indices) in self.state.unique.check(number, &cells) {
            self.options.report(RowErrorReport {
                error,
                row_number: Some(number),
                row_data: keyed(&self.state.labels, &raw),
                error_data: pick(&self.state.field_names, &raw, &indices),
            })?;
        }

        if let Some(relations) = self.options.relations {
            let original = cells.clone();
            for plan in &self.state.foreign_keys {
                let error = match plan.resolve(&original, relations) {
                    Ok(Resolution::Skipped) => continue,
                    Ok(Resolution::Resolved(found)) => {
                        for &i in &plan.indices {
                            cells[i] = Cell::Reference(found.clone());
                        }
                        continue;
                    }
                    Ok(Resolution::Unresolved(values)) => {
                        let shown: Vec<String> = values.iter().map(ToString::to_string).collect();
                        for (&i, value) in plan.indices.iter().zip(values) {
                            cells[i] = Cell::Unresolved(value);
                        }
                        TableSchemaError::UnresolvedForeignKey {
                            row_number: number,
                            fields: plan.field_list(),
                            resource: plan.resource().to_string(),
                            values: shown.join(", "),
                        }
                    }
                    Err(error) => error,
                };
                self.options.report(RowErrorReport {
                    error,
                    row_number: Some(number),
                    row_data: keyed(&self.state.labels, &raw),
                    error_data: pick(&self.state.field_names, &raw, &plan.indices),
                })?;
            }
        }

        Ok(Some(Row { number, cells }))
    }
}

impl Iterator for TableRows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.finished {
            return None;
        }
        if !self.state.opened {
            if let Err(err) = self.start() {
                self.finish();
                return Some(Err(err));
            }
        }

        loop {
            if self.options.limit.is_some_and(|limit| self.state.emitted >= limit) {
                self.finish();
                return None;
            }

            let raw = match self.table.source.read_row() {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    let outcome = self.complete();
                    self.finish();
                    return outcome.err().map(Err);
                }
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            };
            self.drain();
            self.state.row_number += 1;

            match self.process(raw) {
                Ok(Some(row)) => {
                    self.state.emitted += 1;
                    return Some(Ok(row));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.finish();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl Drop for TableRows<'_> {
    fn drop(&mut self) {
        if !self.state.finished {
            self.table.source.close();
        }
    }
}

fn keyed(labels: &[String], values: &[Value]) -> IndexMap<String, Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let label = labels.get(i).cloned().unwrap_or_else(|| format!("field{}", i + 1));
            (label, value.clone())
        })
        .collect()
}

fn pick(names: &[String], values: &[Value], indices: &[usize]) -> IndexMap<String, Value> {
    indices
        .iter()
        .filter_map(|&i| Some((names.get(i)?.clone(), values.get(i)?.clone())))
        .collect()
}
