//! Descriptor validation against the table schema profile.

use regex::Regex;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::constraints::{ConstraintKind, is_supported};
use crate::error::TableSchemaError;
use crate::types::{FieldType, Format};

/// Checks a raw descriptor and reports every problem found.
///
/// Implement this to plug in an external meta-schema validator; the
/// built-in [`TableSchemaProfile`] covers the structural rules.
pub trait DescriptorValidator {
    fn validate(&self, descriptor: &JsonValue) -> Vec<TableSchemaError>;
}

/// Structural rules of the table schema profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableSchemaProfile;

impl DescriptorValidator for TableSchemaProfile {
    fn validate(&self, descriptor: &JsonValue) -> Vec<TableSchemaError> {
        let mut errors = Vec::new();
        let Some(root) = descriptor.as_object() else {
            errors.push(problem("", "descriptor must be an object"));
            return errors;
        };

        match root.get("fields") {
            Some(JsonValue::Array(fields)) if !fields.is_empty() => {
                for (index, field) in fields.iter().enumerate() {
                    validate_field(index, field, &mut errors);
                }
            }
            Some(JsonValue::Array(_)) => errors.push(problem("fields", "must have at least 1 item")),
            Some(_) => errors.push(problem("fields", "must be an array")),
            None => errors.push(problem("fields", "is required")),
        }

        if let Some(key) = root.get("primaryKey") {
            if !is_field_names(key) {
                errors.push(problem("primaryKey", "must be a string or an array of strings"));
            }
        }

        match root.get("foreignKeys") {
            None => {}
            Some(JsonValue::Array(keys)) => {
                for (index, key) in keys.iter().enumerate() {
                    validate_foreign_key(index, key, &mut errors);
                }
            }
            Some(_) => errors.push(problem("foreignKeys", "must be an array")),
        }

        if let Some(values) = root.get("missingValues") {
            if !is_string_array(values) {
                errors.push(problem("missingValues", "must be an array of strings"));
            }
        }

        errors
    }
}

fn problem(path: impl Into<String>, message: impl Into<String>) -> TableSchemaError {
    TableSchemaError::Descriptor {
        path: path.into(),
        message: message.into(),
    }
}

fn is_string_array(json: &JsonValue) -> bool {
    json.as_array()
        .is_some_and(|items| items.iter().all(JsonValue::is_string))
}

fn is_field_names(json: &JsonValue) -> bool {
    json.is_string() || is_string_array(json)
}

fn validate_field(index: usize, field: &JsonValue, errors: &mut Vec<TableSchemaError>) {
    let path = format!("fields/{}", index);
    let Some(field) = field.as_object() else {
        errors.push(problem(path, "must be an object"));
        return;
    };

    let name = match field.get("name") {
        Some(JsonValue::String(name)) => name.as_str(),
        Some(_) => {
            errors.push(problem(format!("{}/name", path), "must be a string"));
            ""
        }
        None => {
            errors.push(problem(format!("{}/name", path), "is required"));
            ""
        }
    };

    let field_type = match field.get("type") {
        None => Some(FieldType::String),
        Some(JsonValue::String(raw)) => match raw.parse::<FieldType>() {
            Ok(field_type) => Some(field_type),
            Err(message) => {
                errors.push(problem(format!("{}/type", path), message));
                None
            }
        },
        Some(_) => {
            errors.push(problem(format!("{}/type", path), "must be a string"));
            None
        }
    };

    match field.get("format") {
        None => {}
        Some(JsonValue::String(raw)) => {
            if let Some(field_type) = field_type {
                if Format::resolve(field_type, raw).is_none() {
                    errors.push(problem(
                        format!("{}/format", path),
                        format!("format \"{}\" is not supported by type \"{}\"", raw, field_type),
                    ));
                }
            }
        }
        Some(_) => errors.push(problem(format!("{}/format", path), "must be a string")),
    }

    for key in ["decimalChar", "groupChar"] {
        if field.get(key).is_some_and(|v| !v.is_string()) {
            errors.push(problem(format!("{}/{}", path, key), "must be a string"));
        }
    }
    for key in ["bareNumber", "currency"] {
        if field.get(key).is_some_and(|v| !v.is_boolean()) {
            errors.push(problem(format!("{}/{}", path, key), "must be a boolean"));
        }
    }
    for key in ["trueValues", "falseValues"] {
        if field.get(key).is_some_and(|v| !is_string_array(v)) {
            errors.push(problem(format!("{}/{}", path, key), "must be an array of strings"));
        }
    }

    match field.get("constraints") {
        None => {}
        Some(JsonValue::Object(constraints)) => {
            validate_constraints(&path, name, field_type, constraints, errors)
        }
        Some(_) => errors.push(problem(format!("{}/constraints", path), "must be an object")),
    }
}

fn validate_constraints(
    field_path: &str,
    field_name: &str,
    field_type: Option<FieldType>,
    constraints: &JsonMap<String, JsonValue>,
    errors: &mut Vec<TableSchemaError>,
) {
    for (key, value) in constraints {
        // Unknown constraint keys are tolerated.
        let Ok(kind) = key.parse::<ConstraintKind>() else {
            continue;
        };
        let path = format!("{}/constraints/{}", field_path, key);
        let shape_error = match kind {
            ConstraintKind::Required | ConstraintKind::Unique => {
                (!value.is_boolean()).then_some("must be a boolean")
            }
            ConstraintKind::Pattern => match value.as_str() {
                Some(pattern) if Regex::new(pattern).is_ok() => None,
                Some(_) => Some("must be a valid regular expression"),
                None => Some("must be a string"),
            },
            ConstraintKind::Enum => match value.as_array() {
                Some(items) if !items.is_empty() => None,
                _ => Some("must be an array with at least 1 item"),
            },
            ConstraintKind::Minimum | ConstraintKind::Maximum => {
                let scalar = value.is_string() || value.is_number() || value.is_array();
                (!scalar).then_some("must be a string, number or array")
            }
            ConstraintKind::MinLength | ConstraintKind::MaxLength => {
                (!value.is_u64()).then_some("must be a non-negative integer")
            }
        };
        if let Some(message) = shape_error {
            errors.push(problem(path, message));
            continue;
        }
        if let Some(field_type) = field_type {
            if !is_supported(field_type, kind) {
                errors.push(TableSchemaError::ConstraintNotSupported {
                    field: field_name.to_string(),
                    constraint: kind.to_string(),
                    field_type: field_type.to_string(),
                });
            }
        }
    }
}

fn validate_foreign_key(index: usize, key: &JsonValue, errors: &mut Vec<TableSchemaError>) {
    let path = format!("foreignKeys/{}", index);
    let Some(key) = key.as_object() else {
        errors.push(problem(path, "must be an object"));
        return;
    };
    match key.get("fields") {
        Some(fields) if is_field_names(fields) => {}
        Some(_) => errors.push(problem(
            format!("{}/fields", path),
            "must be a string or an array of strings",
        )),
        None => errors.push(problem(format!("{}/fields", path), "is required")),
    }
    let Some(reference) = key.get("reference") else {
        errors.push(problem(format!("{}/reference", path), "is required"));
        return;
    };
    let Some(reference) = reference.as_object() else {
        errors.push(problem(format!("{}/reference", path), "must be an object"));
        return;
    };
    if reference.get("resource").is_some_and(|r| !r.is_string()) {
        errors.push(problem(format!("{}/reference/resource", path), "must be a string"));
    }
    match reference.get("fields") {
        Some(fields) if is_field_names(fields) => {}
        Some(_) => errors.push(problem(
            format!("{}/reference/fields", path),
            "must be a string or an array of strings",
        )),
        None => errors.push(problem(format!("{}/reference/fields", path), "is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(errors: &[TableSchemaError]) -> Vec<String> {
        errors
            .iter()
            .map(|e| match e {
                TableSchemaError::Descriptor { path, .. } => path.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_valid_descriptor() {
        let descriptor = json!({
            "fields": [
                {"name": "id", "type": "integer", "constraints": {"required": true, "minimum": 1}},
                {"name": "name", "type": "string", "format": "email"},
                {"name": "born", "type": "date", "format": "%d/%m/%Y"}
            ],
            "primaryKey": "id",
            "foreignKeys": [
                {"fields": "name", "reference": {"resource": "people", "fields": "email"}}
            ],
            "missingValues": ["", "NA"]
        });
        assert!(TableSchemaProfile.validate(&descriptor).is_empty());
    }

    #[test]
    fn test_structural_problems() {
        let descriptor = json!({
            "fields": [
                {"type": "integer"},
                {"name": "x", "type": "decimal"},
                {"name": "y", "type": "integer", "format": "email"}
            ],
            "primaryKey": 1,
            "missingValues": "NA"
        });
        let errors = TableSchemaProfile.validate(&descriptor);
        assert_eq!(
            paths(&errors),
            vec![
                "fields/0/name",
                "fields/1/type",
                "fields/2/format",
                "primaryKey",
                "missingValues"
            ]
        );
    }

    #[test]
    fn test_empty_fields() {
        let errors = TableSchemaProfile.validate(&json!({"fields": []}));
        assert_eq!(paths(&errors), vec!["fields"]);
        let errors = TableSchemaProfile.validate(&json!([]));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_constraint_not_supported() {
        let descriptor = json!({
            "fields": [{"name": "flag", "type": "boolean", "constraints": {"pattern": "t.*"}}]
        });
        let errors = TableSchemaProfile.validate(&descriptor);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            TableSchemaError::ConstraintNotSupported { field, constraint, .. }
                if field == "flag" && constraint == "pattern"
        ));
    }

    #[test]
    fn test_constraint_shapes() {
        let descriptor = json!({
            "fields": [{
                "name": "s",
                "constraints": {"required": "yes", "enum": [], "minLength": -1, "pattern": "("}
            }]
        });
        let errors = TableSchemaProfile.validate(&descriptor);
        assert_eq!(
            paths(&errors),
            vec![
                "fields/0/constraints/required",
                "fields/0/constraints/enum",
                "fields/0/constraints/minLength",
                "fields/0/constraints/pattern"
            ]
        );
    }

    #[test]
    fn test_foreign_key_shape() {
        let descriptor = json!({
            "fields": [{"name": "a"}],
            "foreignKeys": [{"fields": "a"}, 3]
        });
        let errors = TableSchemaProfile.validate(&descriptor);
        assert_eq!(paths(&errors), vec!["foreignKeys/0/reference", "foreignKeys/1"]);
    }
}
