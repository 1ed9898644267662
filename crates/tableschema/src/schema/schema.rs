//! The schema: ordered fields plus key metadata.

use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::default_missing_values;
use crate::error::{Result, TableSchemaError};
use crate::value::{Cell, FailedCast, Value};

use super::descriptor::{FieldDescriptor, ForeignKey, SchemaDescriptor};
use super::field::Field;
use super::infer::{infer_descriptor, infer_fields};
use super::loader::{DescriptorSource, save_json};
use super::profile::{DescriptorValidator, TableSchemaProfile};

/// Cells of a row cast in continuation mode, with the per-cell errors.
pub type PartialCast = (Vec<Cell>, Vec<TableSchemaError>);

/// A built table schema.
///
/// Fields are rebuilt from the descriptor on every edit; a schema never
/// changes behind a borrowed [`Field`].
#[derive(Debug)]
pub struct Schema {
    descriptor: SchemaDescriptor,
    fields: Vec<Field>,
    errors: Vec<TableSchemaError>,
}

impl Schema {
    /// Load and build a schema, validating with [`TableSchemaProfile`].
    ///
    /// With `strict` any validation problem is returned as
    /// [`TableSchemaError::Validation`]; otherwise problems are kept on the
    /// schema and exposed through [`Schema::valid`] and [`Schema::errors`].
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use tableschema::{Schema, Value};
    ///
    /// let schema = Schema::load(json!({"fields": [{"name": "id", "type": "integer"}]}), true)?;
    /// let row = schema.cast_row(&[Value::from("7")], true)?;
    /// assert_eq!(row, vec![Value::Integer(7)]);
    /// # Ok::<(), tableschema::TableSchemaError>(())
    /// ```
    pub fn load(source: impl Into<DescriptorSource>, strict: bool) -> Result<Self> {
        Self::load_with(source, strict, &TableSchemaProfile)
    }

    /// Load with a caller-supplied descriptor validator.
    pub fn load_with(
        source: impl Into<DescriptorSource>,
        strict: bool,
        validator: &dyn DescriptorValidator,
    ) -> Result<Self> {
        let json = source.into().retrieve()?;
        Self::build(&json, strict, validator)
    }

    /// Build from an already parsed descriptor.
    pub fn from_descriptor(descriptor: SchemaDescriptor, strict: bool) -> Result<Self> {
        let json = serde_json::to_value(&descriptor)?;
        Self::build(&json, strict, &TableSchemaProfile)
    }

    fn build(json: &JsonValue, strict: bool, validator: &dyn DescriptorValidator) -> Result<Self> {
        let descriptor = SchemaDescriptor::from_json_lossy(json);
        let mut errors = validator.validate(json);
        errors.extend(relational_errors(&descriptor));

        let primary_key = descriptor.primary_key_names();
        let mut fields = Vec::with_capacity(descriptor.fields.len());
        for (index, field_descriptor) in descriptor.fields.iter().enumerate() {
            match Field::new(field_descriptor.clone(), &descriptor.missing_values) {
                Ok(field) if primary_key.contains(&field_descriptor.name) => {
                    fields.push(field.into_required())
                }
                Ok(field) => fields.push(field),
                Err(err) => {
                    fields.push(Field::unbuilt(
                        field_descriptor.clone(),
                        &descriptor.missing_values,
                        &err,
                    ));
                    if !already_reported(&errors, index, &field_descriptor.name) {
                        errors.push(err);
                    }
                }
            }
        }

        if !errors.is_empty() {
            if strict {
                return Err(TableSchemaError::Validation { errors });
            }
            warn!(errors = errors.len(), "Schema descriptor is not valid");
        }
        debug!(fields = fields.len(), primary_key = ?primary_key, "Built schema");

        Ok(Self {
            descriptor,
            fields,
            errors,
        })
    }

    /// Infer a schema from sample rows, the first `header_rows` being
    /// headers.
    pub fn infer(rows: &[Vec<Value>], header_rows: usize, confidence: f64) -> Result<Self> {
        let descriptor = infer_descriptor(rows, header_rows, &default_missing_values(), confidence);
        Self::from_descriptor(descriptor, true)
    }

    /// Infer a schema for known headers from data rows.
    pub fn infer_with_headers(
        headers: &[String],
        rows: &[Vec<Value>],
        confidence: f64,
    ) -> Result<Self> {
        let missing_values = default_missing_values();
        let descriptor = SchemaDescriptor {
            fields: infer_fields(headers, rows, &missing_values, confidence),
            missing_values,
            ..SchemaDescriptor::default()
        };
        Self::from_descriptor(descriptor, true)
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TableSchemaError] {
        &self.errors
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Primary key field names, empty when none is declared.
    pub fn primary_key(&self) -> Vec<String> {
        self.descriptor.primary_key_names()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.descriptor.foreign_keys
    }

    pub fn missing_values(&self) -> &[String] {
        &self.descriptor.missing_values
    }

    fn check_shape(&self, row: &[Value]) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(TableSchemaError::RowShape {
                row_number: None,
                row_len: row.len(),
                field_count: self.fields.len(),
            });
        }
        Ok(())
    }

    /// Cast a row cell by cell.
    ///
    /// A length mismatch fails immediately. With `fail_fast` the first cell
    /// error is returned; otherwise every cell error is collected into one
    /// [`TableSchemaError::Cast`].
    pub fn cast_row(&self, row: &[Value], fail_fast: bool) -> Result<Vec<Value>> {
        self.check_shape(row)?;

        let mut values = Vec::with_capacity(row.len());
        let mut errors = Vec::new();
        for (field, raw) in self.fields.iter().zip(row) {
            match field.cast_value(raw) {
                Ok(value) => values.push(value),
                Err(err) if fail_fast => return Err(err),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(TableSchemaError::Cast {
                message: format!("There are {} cast errors (see 'errors')", errors.len()),
                errors,
            });
        }
        Ok(values)
    }

    /// Cast a row, replacing failed cells with [`Cell::Failed`] markers.
    ///
    /// Only a length mismatch is an error here.
    pub fn cast_row_partial(&self, row: &[Value]) -> Result<PartialCast> {
        self.check_shape(row)?;

        let mut cells = Vec::with_capacity(row.len());
        let mut errors = Vec::new();
        for (field, raw) in self.fields.iter().zip(row) {
            match field.cast_value(raw) {
                Ok(value) => cells.push(Cell::Value(value)),
                Err(err) => {
                    cells.push(Cell::Failed(FailedCast::new(raw.clone())));
                    errors.push(err);
                }
            }
        }
        Ok((cells, errors))
    }

    /// Append a field; the schema is unchanged if the result is invalid.
    pub fn add_field(&mut self, field: FieldDescriptor) -> Result<()> {
        let mut descriptor = self.descriptor.clone();
        descriptor.fields.push(field);
        self.rebuild(descriptor)
    }

    /// Edit a field's descriptor in place and rebuild.
    pub fn update_field(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut FieldDescriptor),
    ) -> Result<()> {
        let mut descriptor = self.descriptor.clone();
        let field = descriptor
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| unknown_field(name))?;
        update(field);
        self.rebuild(descriptor)
    }

    /// Remove a field and return its descriptor.
    pub fn remove_field(&mut self, name: &str) -> Result<FieldDescriptor> {
        let mut descriptor = self.descriptor.clone();
        let index = descriptor
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| unknown_field(name))?;
        let removed = descriptor.fields.remove(index);
        self.rebuild(descriptor)?;
        Ok(removed)
    }

    fn rebuild(&mut self, descriptor: SchemaDescriptor) -> Result<()> {
        *self = Self::from_descriptor(descriptor, true)?;
        Ok(())
    }

    /// Save the descriptor as 4-space indented JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_json(&self.descriptor, path.as_ref())
    }
}

fn unknown_field(name: &str) -> TableSchemaError {
    TableSchemaError::FieldBuild {
        field: name.to_string(),
        message: "no such field in the schema".to_string(),
    }
}

/// Field build errors repeat problems the profile already found for the
/// same field; keep only the first report.
fn already_reported(errors: &[TableSchemaError], index: usize, name: &str) -> bool {
    let prefix = format!("fields/{}/", index);
    errors.iter().any(|e| match e {
        TableSchemaError::Descriptor { path, .. } => path.starts_with(&prefix),
        TableSchemaError::ConstraintNotSupported { field, .. } => field == name,
        _ => false,
    })
}

/// Key names must exist and foreign keys must pair up positionally.
fn relational_errors(descriptor: &SchemaDescriptor) -> Vec<TableSchemaError> {
    let names: Vec<&str> = descriptor.fields.iter().map(|f| f.name.as_str()).collect();
    let mut errors = Vec::new();
    let mut missing = |path: String, name: &str| {
        errors.push(TableSchemaError::Descriptor {
            path,
            message: format!("field \"{}\" does not exist in the schema", name),
        })
    };

    for name in descriptor.primary_key_names() {
        if !names.contains(&name.as_str()) {
            missing("primaryKey".to_string(), &name);
        }
    }

    for (index, key) in descriptor.foreign_keys.iter().enumerate() {
        for name in key.fields.to_vec() {
            if !names.contains(&name.as_str()) {
                missing(format!("foreignKeys/{}/fields", index), &name);
            }
        }
        if key.reference.resource.is_empty() {
            for name in key.reference.fields.to_vec() {
                if !names.contains(&name.as_str()) {
                    missing(format!("foreignKeys/{}/reference/fields", index), &name);
                }
            }
        }
    }

    for (index, key) in descriptor.foreign_keys.iter().enumerate() {
        if key.fields.len() != key.reference.fields.len() {
            errors.push(TableSchemaError::Descriptor {
                path: format!("foreignKeys/{}", index),
                message: format!(
                    "{} fields reference {} fields",
                    key.fields.len(),
                    key.reference.fields.len()
                ),
            });
        }
    }
    errors
}
