//! Fuzz target for delimiter detection, inference and table reading.
//!
//! This fuzzer tests that the table reader:
//! 1. Never panics on malformed delimited input
//! 2. Infers a schema for any sample it can read
//! 3. Reports cast failures to the handler instead of stopping

#![no_main]

use libfuzzer_sys::fuzz_target;
use tableschema::{CsvSource, InferOptions, ReadOptions, Table};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs
    if data.len() > 10_000 {
        return;
    }

    let mut table = Table::new(CsvSource::from_bytes(data.to_vec()));
    if table.infer(&InferOptions::default().with_limit(20)).is_err() {
        return;
    }
    let _ = table.read(ReadOptions::default().with_handler(|_| {}));
});
