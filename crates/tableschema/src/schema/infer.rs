//! Type inference from sampled rows.

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{CastOptions, FieldType, Format, cast};
use crate::value::Value;

use super::descriptor::{FieldDescriptor, SchemaDescriptor};

/// Candidate types, most specific first.
pub const INFER_PRIORITY: [FieldType; 13] = [
    FieldType::Duration,
    FieldType::Geojson,
    FieldType::Geopoint,
    FieldType::Object,
    FieldType::Array,
    FieldType::Datetime,
    FieldType::Time,
    FieldType::Date,
    FieldType::Integer,
    FieldType::Number,
    FieldType::Boolean,
    FieldType::String,
    FieldType::Any,
];

fn priority(field_type: FieldType) -> usize {
    INFER_PRIORITY
        .iter()
        .position(|t| *t == field_type)
        .unwrap_or(INFER_PRIORITY.len())
}

// =============================================================================
// VOTE TALLY
// =============================================================================
// Every candidate that can cast a value gets a vote, not only the first one.

/// Per-column vote tally, in first-seen order.
#[derive(Debug, Clone, Default)]
struct TypeVotes {
    votes: IndexMap<FieldType, usize>,
}

impl TypeVotes {
    fn add(&mut self, value: &Value, options: &CastOptions) {
        for field_type in INFER_PRIORITY {
            if cast(field_type, &Format::Default, value, options).is_ok() {
                *self.votes.entry(field_type).or_insert(0) += 1;
            }
        }
    }

    /// Resolve the winning type.
    ///
    /// A single candidate wins outright. Otherwise candidates reaching
    /// `confidence` of the top count survive and the most specific one
    /// wins; equal priority falls back to first-seen order.
    fn resolve(&self, confidence: f64) -> FieldType {
        if self.votes.len() == 1 {
            if let Some((field_type, _)) = self.votes.first() {
                return *field_type;
            }
        }
        let Some(max) = self.votes.values().copied().max() else {
            return FieldType::String;
        };
        let threshold = confidence * max as f64;
        self.votes
            .iter()
            .filter(|(_, count)| **count as f64 >= threshold)
            .min_by_key(|(field_type, _)| priority(**field_type))
            .map(|(field_type, _)| *field_type)
            .unwrap_or(FieldType::String)
    }
}

/// Infer field descriptors for `headers` from data rows.
///
/// Short rows count as null-padded and long rows are truncated; missing
/// values cast no votes.
pub fn infer_fields(
    headers: &[String],
    rows: &[Vec<Value>],
    missing_values: &[String],
    confidence: f64,
) -> Vec<FieldDescriptor> {
    let options = CastOptions::default();
    let mut tallies = vec![TypeVotes::default(); headers.len()];

    for row in rows {
        for (tally, value) in tallies.iter_mut().zip(row.iter()) {
            let missing = match value {
                Value::Null => true,
                Value::String(s) => missing_values.iter().any(|m| m == s),
                _ => false,
            };
            if !missing {
                tally.add(value, &options);
            }
        }
    }

    headers
        .iter()
        .zip(tallies.iter())
        .map(|(name, tally)| {
            let field_type = tally.resolve(confidence);
            debug!(field = %name, field_type = %field_type, votes = ?tally.votes, "Inferred field type");
            FieldDescriptor::new(name.clone(), field_type)
        })
        .collect()
}

/// Infer a descriptor from sample rows whose first `header_rows` rows are
/// headers.
///
/// Field names come from the last header row; without a header they are
/// `field1`, `field2`, ... sized by the first data row.
pub fn infer_descriptor(
    rows: &[Vec<Value>],
    header_rows: usize,
    missing_values: &[String],
    confidence: f64,
) -> SchemaDescriptor {
    let header_rows = header_rows.min(rows.len());
    let (header_part, data) = rows.split_at(header_rows);

    let headers: Vec<String> = match header_part.last() {
        Some(header) => header.iter().map(|v| v.to_string()).collect(),
        None => {
            let width = data.first().map(Vec::len).unwrap_or(0);
            (1..=width).map(|i| format!("field{}", i)).collect()
        }
    };

    let fields = infer_fields(&headers, data, missing_values, confidence);
    SchemaDescriptor {
        fields,
        missing_values: missing_values.to_vec(),
        ..SchemaDescriptor::default()
    }
}
