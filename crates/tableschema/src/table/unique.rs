//! Uniqueness tracking for unique fields and the primary key.

use std::collections::HashSet;

use crate::error::TableSchemaError;
use crate::schema::Schema;
use crate::value::{Cell, Value};

/// One group of columns whose value tuple must not repeat.
#[derive(Debug)]
struct KeyGroup {
    indices: Vec<usize>,
    names: Vec<String>,
    seen: HashSet<Vec<String>>,
}

/// Remembers every key seen during one read.
#[derive(Debug, Default)]
pub(crate) struct UniqueTracker {
    groups: Vec<KeyGroup>,
}

impl UniqueTracker {
    pub(crate) fn for_schema(schema: &Schema) -> Self {
        let mut groups: Vec<KeyGroup> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.unique())
            .map(|(i, field)| KeyGroup {
                indices: vec![i],
                names: vec![field.name().to_string()],
                seen: HashSet::new(),
            })
            .collect();

        let primary_key = schema.primary_key();
        let indices: Option<Vec<usize>> = primary_key
            .iter()
            .map(|name| schema.fields().iter().position(|f| f.name() == name))
            .collect();
        if let Some(indices) = indices.filter(|i| !i.is_empty()) {
            // A single-field key that is also declared unique is tracked once.
            if !groups.iter().any(|g| g.indices == indices) {
                groups.push(KeyGroup {
                    indices,
                    names: primary_key,
                    seen: HashSet::new(),
                });
            }
        }

        Self { groups }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Record the row's keys, returning one error per repeated key along
    /// with the offending column indices.
    pub(crate) fn check(
        &mut self,
        row_number: usize,
        cells: &[Cell],
    ) -> Vec<(TableSchemaError, Vec<usize>)> {
        let mut violations = Vec::new();
        for group in &mut self.groups {
            let values: Option<Vec<&Value>> = group
                .indices
                .iter()
                .map(|&i| cells.get(i).and_then(Cell::as_value))
                .collect();
            // Failed cells were already reported by the caster.
            let Some(values) = values else {
                continue;
            };
            if values.iter().all(|v| v.is_null()) {
                continue;
            }
            let key: Vec<String> = values.iter().map(|v| v.canonical()).collect();
            if !group.seen.insert(key) {
                let shown: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                violations.push((
                    TableSchemaError::UniqueKey {
                        row_number,
                        fields: group.names.join(", "),
                        values: shown.join(", "),
                    },
                    group.indices.clone(),
                ));
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConstraintsDescriptor, FieldDescriptor, SchemaDescriptor};
    use crate::types::FieldType;
    use crate::value::FailedCast;

    fn schema() -> Schema {
        let unique = ConstraintsDescriptor {
            unique: Some(true),
            ..Default::default()
        };
        let descriptor = SchemaDescriptor::new()
            .with_field(FieldDescriptor::new("id", FieldType::Integer))
            .with_field(FieldDescriptor::new("code", FieldType::String).with_constraints(unique))
            .with_field(FieldDescriptor::new("name", FieldType::String))
            .with_primary_key(vec!["id", "name"]);
        Schema::from_descriptor(descriptor, true).unwrap()
    }

    fn cells(values: Vec<Value>) -> Vec<Cell> {
        values.into_iter().map(Cell::Value).collect()
    }

    #[test]
    fn test_detects_duplicate_unique_field() {
        let schema = schema();
        let mut tracker = UniqueTracker::for_schema(&schema);
        let first = cells(vec![Value::Integer(1), "a".into(), "x".into()]);
        let second = cells(vec![Value::Integer(2), "a".into(), "y".into()]);
        assert!(tracker.check(2, &first).is_empty());
        let violations = tracker.check(3, &second);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].1, vec![1]);
        assert!(matches!(
            violations[0].0,
            TableSchemaError::UniqueKey { row_number: 3, .. }
        ));
    }

    #[test]
    fn test_primary_key_tuple() {
        let schema = schema();
        let mut tracker = UniqueTracker::for_schema(&schema);
        let rows = [
            cells(vec![Value::Integer(1), Value::Null, "x".into()]),
            cells(vec![Value::Integer(1), Value::Null, "y".into()]),
            cells(vec![Value::Integer(1), Value::Null, "x".into()]),
        ];
        assert!(tracker.check(2, &rows[0]).is_empty());
        assert!(tracker.check(3, &rows[1]).is_empty());
        let violations = tracker.check(4, &rows[2]);
        assert_eq!(violations.len(), 1);
        match &violations[0].0 {
            TableSchemaError::UniqueKey { fields, values, .. } => {
                assert_eq!(fields, "id, name");
                assert_eq!(values, "1, x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nulls_and_failures_are_skipped() {
        let schema = schema();
        let mut tracker = UniqueTracker::for_schema(&schema);
        let null_row = cells(vec![Value::Integer(1), Value::Null, "x".into()]);
        assert!(tracker.check(2, &null_row).is_empty());
        assert!(tracker.check(3, &cells(vec![Value::Integer(2), Value::Null, "x".into()])).is_empty());

        let failed = vec![
            Cell::Failed(FailedCast::new("bad".into())),
            Cell::Value("b".into()),
            Cell::Value("x".into()),
        ];
        assert!(tracker.check(4, &failed).is_empty());
        assert!(tracker.check(5, &failed).len() == 1);
    }
}
