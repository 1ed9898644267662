//! Row source abstraction and an in-memory implementation.

use crate::error::Result;
use crate::value::Value;

/// A reopenable stream of raw rows.
///
/// The table reader drives a source through `open`, repeated `read_row`
/// and `close`; opening again restarts from the first row.
pub trait RowSource {
    /// Open or reopen the source at its first data row.
    fn open(&mut self) -> Result<()>;

    /// Header labels, available once the source is open. `None` when the
    /// source has no header row.
    fn headers(&self) -> Option<&[String]>;

    /// Next raw row, `None` once the source is exhausted.
    fn read_row(&mut self) -> Result<Option<Vec<Value>>>;

    /// Release any underlying resource. Closing twice is harmless.
    fn close(&mut self);

    /// Whether the source reads from a byte stream that can be measured.
    fn tracks_bytes(&self) -> bool {
        false
    }

    /// Pass bytes consumed since the last call to `sink`.
    fn drain_consumed(&mut self, _sink: &mut dyn FnMut(&[u8])) {}
}

/// Rows held in memory, with an optional header row.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    headers: Option<Vec<String>>,
    rows: Vec<Vec<Value>>,
    cursor: usize,
    open: bool,
}

impl InlineSource {
    /// Rows with a header row.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            headers: Some(headers),
            rows,
            cursor: 0,
            open: false,
        }
    }

    /// Rows without a header row.
    pub fn without_headers(rows: Vec<Vec<Value>>) -> Self {
        Self {
            headers: None,
            rows,
            cursor: 0,
            open: false,
        }
    }

    /// Build from string cells.
    pub fn from_strings(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| Value::from(*v)).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl RowSource for InlineSource {
    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        self.open = true;
        Ok(())
    }

    fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    fn read_row(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.open {
            return Ok(None);
        }
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        Ok(row)
    }

    fn close(&mut self) {
        self.open = false;
    }
}
