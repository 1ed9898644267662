//! Foreign key resolution against caller-supplied reference data.

use indexmap::IndexMap;

use crate::error::{Result, TableSchemaError};
use crate::schema::Schema;
use crate::value::{Cell, Value};

use super::options::Relations;

/// Outcome of resolving one foreign key for one row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution {
    /// Key was null or had failed cells.
    Skipped,
    /// First reference row whose fields match.
    Resolved(IndexMap<String, Value>),
    /// No reference row matched these values.
    Unresolved(Vec<Value>),
}

/// A foreign key with its local columns located in the schema.
#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyPlan {
    pub(crate) indices: Vec<usize>,
    pub(crate) fields: Vec<String>,
    resource: String,
    reference_fields: Vec<String>,
}

impl ForeignKeyPlan {
    /// Plans for every foreign key whose fields all exist in the schema.
    pub(crate) fn for_schema(schema: &Schema) -> Vec<Self> {
        schema
            .foreign_keys()
            .iter()
            .filter_map(|fk| {
                let fields = fk.fields.to_vec();
                let indices: Option<Vec<usize>> = fields
                    .iter()
                    .map(|name| schema.fields().iter().position(|f| f.name() == name))
                    .collect();
                Some(Self {
                    indices: indices?,
                    fields,
                    resource: fk.reference.resource.clone(),
                    reference_fields: fk.reference.fields.to_vec(),
                })
            })
            .collect()
    }

    pub(crate) fn field_list(&self) -> String {
        self.fields.join(", ")
    }

    pub(crate) fn resource(&self) -> &str {
        &self.resource
    }

    /// Look the row's key up in the referenced resource.
    ///
    /// `cells` must hold the row as cast, before any replacement.
    pub(crate) fn resolve(&self, cells: &[Cell], relations: &Relations) -> Result<Resolution> {
        let values: Option<Vec<&Value>> = self
            .indices
            .iter()
            .map(|&i| cells.get(i).and_then(Cell::as_value))
            .collect();
        let Some(values) = values else {
            return Ok(Resolution::Skipped);
        };
        if values.iter().all(|v| v.is_null()) {
            return Ok(Resolution::Skipped);
        }

        let rows = relations
            .get(&self.resource)
            .ok_or_else(|| TableSchemaError::Relation {
                resource: self.resource.clone(),
                fields: self.field_list(),
            })?;

        let found = rows.iter().find(|row| {
            self.reference_fields
                .iter()
                .zip(&values)
                .all(|(name, value)| row.get(name).is_some_and(|r| value.matches(r)))
        });

        Ok(match found {
            Some(row) => Resolution::Resolved(row.clone()),
            None => Resolution::Unresolved(values.into_iter().cloned().collect()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, ForeignKey, SchemaDescriptor};
    use crate::types::FieldType;

    fn schema() -> Schema {
        let descriptor = SchemaDescriptor::new()
            .with_field(FieldDescriptor::new("id", FieldType::Integer))
            .with_field(FieldDescriptor::new("name", FieldType::String))
            .with_field(FieldDescriptor::new("surname", FieldType::String))
            .with_foreign_key(ForeignKey::new(vec!["name", "surname"], "people", vec!["firstname", "surname"]));
        Schema::from_descriptor(descriptor, true).unwrap()
    }

    fn relations() -> Relations {
        let mut people = IndexMap::new();
        people.insert("firstname".to_string(), Value::from("Alex"));
        people.insert("surname".to_string(), Value::from("Martin"));
        let mut relations = Relations::new();
        relations.insert("people".to_string(), vec![people]);
        relations
    }

    fn row(name: Value, surname: Value) -> Vec<Cell> {
        vec![Cell::Value(Value::Integer(1)), Cell::Value(name), Cell::Value(surname)]
    }

    #[test]
    fn test_resolves_multi_field_key() {
        let plans = ForeignKeyPlan::for_schema(&schema());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].indices, vec![1, 2]);

        let resolution = plans[0]
            .resolve(&row("Alex".into(), "Martin".into()), &relations())
            .unwrap();
        match resolution {
            Resolution::Resolved(found) => assert_eq!(found["firstname"], Value::from("Alex")),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_and_null_keys() {
        let plan = &ForeignKeyPlan::for_schema(&schema())[0];
        let relations = relations();
        assert_eq!(
            plan.resolve(&row("Walter".into(), "White".into()), &relations).unwrap(),
            Resolution::Unresolved(vec!["Walter".into(), "White".into()])
        );
        assert_eq!(
            plan.resolve(&row(Value::Null, Value::Null), &relations).unwrap(),
            Resolution::Skipped
        );
    }

    #[test]
    fn test_missing_resource() {
        let plan = &ForeignKeyPlan::for_schema(&schema())[0];
        let err = plan
            .resolve(&row("Alex".into(), "Martin".into()), &Relations::new())
            .unwrap_err();
        assert!(matches!(err, TableSchemaError::Relation { .. }));
    }
}
