//! CSV/TSV row source with delimiter detection and byte tracking.

use std::fs::File;
use std::io::{self, BufRead, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::StringRecord;
use tracing::debug;

use crate::error::{Result, TableSchemaError};
use crate::value::Value;

use super::source::RowSource;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Bytes read ahead for delimiter detection.
const SNIFF_BYTES: usize = 16 * 1024;

/// CSV source configuration.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the first record is a header row.
    pub has_header: bool,
    /// Quote character.
    pub quote: u8,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            quote: b'"',
        }
    }
}

impl CsvConfig {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }
}

/// Reader that keeps a copy of everything read through it.
struct TapReader<R> {
    inner: R,
    consumed: Vec<u8>,
}

impl<R: Read> Read for TapReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

type Input = io::Chain<Cursor<Vec<u8>>, TapReader<Box<dyn Read>>>;

#[derive(Debug, Clone)]
enum Location {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Delimited text read from a file or an in-memory buffer.
pub struct CsvSource {
    location: Location,
    config: CsvConfig,
    reader: Option<csv::Reader<Input>>,
    headers: Option<Vec<String>>,
    delimiter: Option<u8>,
    record: StringRecord,
}

impl CsvSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::at(Location::Path(path.as_ref().to_path_buf()))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self::at(Location::Bytes(Arc::from(bytes)))
    }

    fn at(location: Location) -> Self {
        Self {
            location,
            config: CsvConfig::default(),
            reader: None,
            headers: None,
            delimiter: None,
            record: StringRecord::new(),
        }
    }

    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Delimiter in use, known once the source has been opened.
    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn open_raw(&self) -> Result<Box<dyn Read>> {
        match &self.location {
            Location::Path(path) => {
                let file = File::open(path).map_err(|e| TableSchemaError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                Ok(Box::new(file))
            }
            Location::Bytes(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
        }
    }

    fn io_error(&self, source: io::Error) -> TableSchemaError {
        let path = match &self.location {
            Location::Path(path) => path.clone(),
            Location::Bytes(_) => PathBuf::from("<memory>"),
        };
        TableSchemaError::Io { path, source }
    }
}

impl RowSource for CsvSource {
    fn open(&mut self) -> Result<()> {
        self.close();
        let mut tap = TapReader {
            inner: self.open_raw()?,
            consumed: Vec::new(),
        };

        let mut prefix = Vec::with_capacity(SNIFF_BYTES);
        (&mut tap)
            .take(SNIFF_BYTES as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| self.io_error(e))?;

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&prefix),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(Cursor::new(prefix).chain(tap));

        self.headers = if self.config.has_header {
            Some(reader.headers()?.iter().map(|s| s.to_string()).collect())
        } else {
            None
        };
        debug!(
            delimiter = %(delimiter as char).escape_debug(),
            headers = ?self.headers,
            "Opened delimited source"
        );
        self.delimiter = Some(delimiter);
        self.reader = Some(reader);
        Ok(())
    }

    fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    fn read_row(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        if !reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        Ok(Some(self.record.iter().map(Value::from).collect()))
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn tracks_bytes(&self) -> bool {
        true
    }

    fn drain_consumed(&mut self, sink: &mut dyn FnMut(&[u8])) {
        if let Some(reader) = self.reader.as_mut() {
            let (_, tap) = reader.get_mut().get_mut();
            sink(&tap.consumed);
            tap.consumed.clear();
        }
    }
}

/// Detect the delimiter by analyzing the first few lines.
///
/// Falls back to a comma when nothing scores.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let lines: Vec<String> = bytes
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let Some(&first_count) = counts.first() else {
            continue;
        };
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Consistent counts dominate; tabs get a small bonus.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    best_delimiter
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(source: &mut CsvSource) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        while let Some(row) = source.read_row().unwrap() {
            rows.push(row);
        }
        rows
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"a,b,c\n1,2,3\n4,5,6"), b',');
        assert_eq!(detect_delimiter(b"a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(detect_delimiter(b"a;b\n1;2"), b';');
        assert_eq!(detect_delimiter(b""), b',');
    }

    #[test]
    fn test_read_csv_bytes() {
        let mut source = CsvSource::from_bytes("name,age\nAlice,30\nBob,25\n");
        source.open().unwrap();
        assert_eq!(
            source.headers(),
            Some(&["name".to_string(), "age".to_string()][..])
        );
        let rows = read_all(&mut source);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Value::from("Bob"), Value::from("25")]);
        assert_eq!(source.delimiter(), Some(b','));
    }

    #[test]
    fn test_ragged_rows_are_not_padded() {
        let mut source = CsvSource::from_bytes("a,b\n1\n1,2,3\n");
        source.open().unwrap();
        let rows = read_all(&mut source);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_without_header() {
        let mut source =
            CsvSource::from_bytes("1;2\n3;4\n").with_config(CsvConfig::default().with_header(false));
        source.open().unwrap();
        assert!(source.headers().is_none());
        assert_eq!(read_all(&mut source).len(), 2);
    }

    #[test]
    fn test_consumed_bytes_cover_the_whole_input() {
        let data = "id\n".to_string() + &"1234567890\n".repeat(5_000);
        let mut source = CsvSource::from_bytes(data.clone());
        source.open().unwrap();
        let mut total = Vec::new();
        while source.read_row().unwrap().is_some() {
            source.drain_consumed(&mut |bytes| total.extend_from_slice(bytes));
        }
        source.drain_consumed(&mut |bytes| total.extend_from_slice(bytes));
        assert_eq!(total, data.as_bytes());
    }

    #[test]
    fn test_reopen_restarts() {
        let mut source = CsvSource::from_bytes("a\n1\n2\n");
        source.open().unwrap();
        assert_eq!(read_all(&mut source).len(), 2);
        source.open().unwrap();
        assert_eq!(read_all(&mut source).len(), 2);
        source.close();
        assert!(!source.is_open());
        assert!(source.read_row().unwrap().is_none());
    }

    #[test]
    fn test_missing_file() {
        let mut source = CsvSource::from_path("/nonexistent/data.csv");
        assert!(matches!(source.open(), Err(TableSchemaError::Io { .. })));
    }
}
