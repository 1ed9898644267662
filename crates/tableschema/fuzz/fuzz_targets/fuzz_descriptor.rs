//! Fuzz target for descriptor loading.
//!
//! Arbitrary JSON must either load into a schema or produce errors; the
//! profile checks and field building must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tableschema::Schema;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = Schema::load(json, false);
    }
});
