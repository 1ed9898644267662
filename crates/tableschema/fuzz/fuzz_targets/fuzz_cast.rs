//! Fuzz target for the cast table.
//!
//! This fuzzer tests that every caster:
//! 1. Never panics on any input value
//! 2. Returns a value that casts to itself

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tableschema::types::cast;
use tableschema::{CastOptions, FieldType, Format, Value};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    type_index: u8,
    format_index: u8,
    text: &'a str,
    group_char: bool,
}

const FORMATS: &[&str] = &[
    "default", "any", "email", "uri", "uuid", "binary", "array", "object", "topojson",
    "%d/%m/%Y", "%H:%M", "fmt:%Y-%m-%d",
];

fuzz_target!(|input: Input| {
    if input.text.len() > 10_000 {
        return;
    }

    let field_type = FieldType::ALL[input.type_index as usize % FieldType::ALL.len()];
    let raw_format = FORMATS[input.format_index as usize % FORMATS.len()];
    let Some(format) = Format::resolve(field_type, raw_format) else {
        return;
    };
    let mut options = CastOptions::default();
    if input.group_char {
        options = options.with_group_char(",");
    }

    if let Ok(value) = cast(field_type, &format, &Value::from(input.text), &options) {
        assert_eq!(cast(field_type, &format, &value, &options), Ok(value));
    }
});
