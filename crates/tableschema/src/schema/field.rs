//! A field: one column's type, format and constraints bound to a caster.

use serde_json::Value as JsonValue;

use crate::constraints::{Check, ConstraintCheck, ConstraintKind, Constraints, is_supported};
use crate::error::{Result, TableSchemaError};
use crate::types::{CastFailure, CastFn, CastOptions, CastResult, FieldType, Format, caster};
use crate::value::Value;

use super::descriptor::FieldDescriptor;

/// A built field, immutable once constructed.
#[derive(Debug, Clone)]
pub struct Field {
    descriptor: FieldDescriptor,
    field_type: FieldType,
    format: Format,
    options: CastOptions,
    cast_fn: CastFn,
    constraints: Constraints,
    missing_values: Vec<String>,
    build_failure: Option<String>,
}

impl Field {
    /// Build a field from its descriptor.
    ///
    /// Fails when the type or format is unknown, a constraint is not
    /// allowed for the type, or an `enum`/`minimum`/`maximum` operand can't
    /// be cast with the field's own rules.
    pub fn new(descriptor: FieldDescriptor, missing_values: &[String]) -> Result<Self> {
        let build_error = |message: String| TableSchemaError::FieldBuild {
            field: descriptor.name.clone(),
            message,
        };

        let field_type = descriptor.field_type.parse::<FieldType>().map_err(build_error)?;
        let format = Format::resolve(field_type, &descriptor.format).ok_or_else(|| {
            build_error(format!(
                "format \"{}\" is not supported by type \"{}\"",
                descriptor.format, field_type
            ))
        })?;
        let cast_fn = caster(field_type, &format).ok_or_else(|| {
            build_error(format!("no caster for type \"{}\"", field_type))
        })?;
        let options = descriptor.cast_options();

        let mut field = Self {
            descriptor,
            field_type,
            format,
            options,
            cast_fn,
            constraints: Constraints::default(),
            missing_values: missing_values.to_vec(),
            build_failure: None,
        };
        field.constraints = field.compile_constraints()?;
        Ok(field)
    }

    /// Stand-in for a field that failed to build in a lenient schema.
    ///
    /// It holds the descriptor's position so later cells stay aligned, and
    /// every cast through it fails with the original build error.
    pub(crate) fn unbuilt(
        descriptor: FieldDescriptor,
        missing_values: &[String],
        error: &TableSchemaError,
    ) -> Self {
        let message = match error {
            TableSchemaError::FieldBuild { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            field_type: descriptor.field_type.parse().unwrap_or(FieldType::Any),
            format: Format::Default,
            options: descriptor.cast_options(),
            cast_fn: reject,
            constraints: Constraints::default(),
            missing_values: missing_values.to_vec(),
            build_failure: Some(message),
            descriptor,
        }
    }

    fn compile_constraints(&self) -> Result<Constraints> {
        let declared = &self.descriptor.constraints;
        let mut checks = Vec::new();

        for kind in declared.declared() {
            if !is_supported(self.field_type, kind) {
                return Err(TableSchemaError::ConstraintNotSupported {
                    field: self.name().to_string(),
                    constraint: kind.to_string(),
                    field_type: self.field_type.to_string(),
                });
            }
        }

        if declared.is_required() {
            checks.push(Check::Required);
        }
        if declared.is_unique() {
            checks.push(Check::Unique);
        }
        if let Some(pattern) = &declared.pattern {
            let check = Check::pattern(pattern).map_err(|e| self.build_error(e.to_string()))?;
            checks.push(check);
        }
        if let Some(members) = &declared.enum_values {
            let members = members
                .iter()
                .map(|m| self.cast_operand(ConstraintKind::Enum, m))
                .collect::<Result<Vec<_>>>()?;
            checks.push(Check::Enum(members));
        }
        if let Some(bound) = &declared.minimum {
            checks.push(Check::Minimum(self.cast_operand(ConstraintKind::Minimum, bound)?));
        }
        if let Some(bound) = &declared.maximum {
            checks.push(Check::Maximum(self.cast_operand(ConstraintKind::Maximum, bound)?));
        }
        if let Some(min) = declared.min_length {
            checks.push(Check::MinLength(min));
        }
        if let Some(max) = declared.max_length {
            checks.push(Check::MaxLength(max));
        }

        Ok(Constraints::new(checks))
    }

    fn cast_operand(&self, kind: ConstraintKind, operand: &JsonValue) -> Result<Value> {
        (self.cast_fn)(&self.format, &Value::from(operand), &self.options).map_err(|_| {
            self.build_error(format!(
                "{} operand {} can't be cast to \"{}\"",
                kind, operand, self.field_type
            ))
        })
    }

    fn build_error(&self, message: String) -> TableSchemaError {
        TableSchemaError::FieldBuild {
            field: self.name().to_string(),
            message,
        }
    }

    /// Mark the field required regardless of its descriptor.
    pub(crate) fn into_required(mut self) -> Self {
        if !self.constraints.has(ConstraintKind::Required) {
            let mut checks: Vec<Check> = self.constraints.iter().cloned().collect();
            checks.push(Check::Required);
            self.constraints = Constraints::new(checks);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn cast_options(&self) -> &CastOptions {
        &self.options
    }

    pub fn missing_values(&self) -> &[String] {
        &self.missing_values
    }

    /// False for a placeholder kept by a lenient schema.
    pub fn is_built(&self) -> bool {
        self.build_failure.is_none()
    }

    pub fn required(&self) -> bool {
        self.constraints.has(ConstraintKind::Required)
    }

    pub fn unique(&self) -> bool {
        self.constraints.has(ConstraintKind::Unique)
    }

    /// True when the raw value is null or one of the missing values.
    pub fn is_missing(&self, raw: &Value) -> bool {
        match raw {
            Value::Null => true,
            Value::String(s) => self.missing_values.iter().any(|m| m == s),
            _ => false,
        }
    }

    /// Cast a raw value and check every constraint.
    pub fn cast_value(&self, raw: &Value) -> Result<Value> {
        self.cast_value_with(raw, &ConstraintCheck::All)
    }

    /// Cast a raw value, checking only the selected constraints.
    pub fn cast_value_with(&self, raw: &Value, check: &ConstraintCheck) -> Result<Value> {
        if let Some(message) = &self.build_failure {
            return Err(self.build_error(message.clone()));
        }
        let value = if self.is_missing(raw) {
            Value::Null
        } else {
            (self.cast_fn)(&self.format, raw, &self.options).map_err(|_| {
                TableSchemaError::FieldCast {
                    field: self.name().to_string(),
                    value: raw.to_string(),
                    field_type: self.field_type.to_string(),
                    format: self.format.to_string(),
                }
            })?
        };

        if let Some(kind) = self.constraints.first_violation(&value, raw, check) {
            return Err(TableSchemaError::Constraint {
                field: self.name().to_string(),
                constraint: kind.to_string(),
                value: raw.to_string(),
            });
        }
        Ok(value)
    }

    /// Trial cast that only reports success.
    pub fn test_value(&self, raw: &Value) -> bool {
        self.cast_value(raw).is_ok()
    }
}

fn reject(_format: &Format, _value: &Value, _options: &CastOptions) -> CastResult {
    Err(CastFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::ConstraintsDescriptor;
    use bigdecimal::BigDecimal;
    use serde_json::json;

    fn missing() -> Vec<String> {
        vec![String::new()]
    }

    fn field(json: JsonValue) -> Result<Field> {
        let descriptor: FieldDescriptor = serde_json::from_value(json).unwrap();
        Field::new(descriptor, &missing())
    }

    #[test]
    fn test_cast_value() {
        let f = field(json!({"name": "id", "type": "integer"})).unwrap();
        assert_eq!(f.cast_value(&Value::from("42")).unwrap(), Value::Integer(42));
        assert_eq!(f.cast_value(&Value::from("")).unwrap(), Value::Null);

        let err = f.cast_value(&Value::from("3.14")).unwrap_err();
        match err {
            TableSchemaError::FieldCast {
                field,
                value,
                field_type,
                format,
            } => {
                assert_eq!(field, "id");
                assert_eq!(value, "3.14");
                assert_eq!(field_type, "integer");
                assert_eq!(format, "default");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            field(json!({"name": "x", "type": "decimal"})),
            Err(TableSchemaError::FieldBuild { .. })
        ));
        assert!(matches!(
            field(json!({"name": "x", "type": "integer", "format": "email"})),
            Err(TableSchemaError::FieldBuild { .. })
        ));
        assert!(matches!(
            field(json!({"name": "x", "type": "integer", "constraints": {"enum": ["a"]}})),
            Err(TableSchemaError::FieldBuild { .. })
        ));
        assert!(matches!(
            field(json!({"name": "x", "type": "integer", "constraints": {"pattern": "1"}})),
            Err(TableSchemaError::ConstraintNotSupported { .. })
        ));
    }

    #[test]
    fn test_required_with_missing_values() {
        let descriptor = FieldDescriptor::new("name", FieldType::String).with_required(true);
        let f = Field::new(descriptor, &["".to_string(), "NA".to_string()]).unwrap();
        let err = f.cast_value(&Value::from("NA")).unwrap_err();
        assert!(matches!(
            err,
            TableSchemaError::Constraint { ref constraint, .. } if constraint == "required"
        ));
        assert!(f.cast_value_with(&Value::from("NA"), &ConstraintCheck::None).is_ok());
    }

    #[test]
    fn test_constraints_skip_null() {
        let f = field(json!({
            "name": "n",
            "type": "integer",
            "constraints": {"minimum": 10, "enum": [10, 20]}
        }))
        .unwrap();
        assert_eq!(f.cast_value(&Value::from("")).unwrap(), Value::Null);
        assert!(f.cast_value(&Value::from("20")).is_ok());
        let err = f.cast_value(&Value::from("15")).unwrap_err();
        assert!(err.to_string().contains("\"enum\""));
        let err = f.cast_value(&Value::from("5")).unwrap_err();
        assert!(err.to_string().contains("\"enum\""));
        assert!(
            f.cast_value_with(
                &Value::from("5"),
                &ConstraintCheck::Only(vec![ConstraintKind::Minimum])
            )
            .unwrap_err()
            .to_string()
            .contains("\"minimum\"")
        );
    }

    #[test]
    fn test_bounds_cast_with_field_rules() {
        let f = field(json!({
            "name": "price",
            "type": "number",
            "groupChar": ",",
            "constraints": {"maximum": "1,000"}
        }))
        .unwrap();
        assert_eq!(
            f.cast_value(&Value::from("999.5")).unwrap(),
            Value::Number("999.5".parse::<BigDecimal>().unwrap())
        );
        assert!(f.cast_value(&Value::from("1,000.01")).is_err());
    }

    #[test]
    fn test_pattern_on_raw_string() {
        let constraints = ConstraintsDescriptor {
            pattern: Some("[A-Z]{3}".to_string()),
            ..Default::default()
        };
        let descriptor =
            FieldDescriptor::new("code", FieldType::String).with_constraints(constraints);
        let f = Field::new(descriptor, &missing()).unwrap();
        assert!(f.test_value(&Value::from("ABC")));
        assert!(!f.test_value(&Value::from("ABCD")));
        assert!(f.test_value(&Value::from("")));
    }

    #[test]
    fn test_into_required() {
        let f = field(json!({"name": "id", "type": "integer"}))
            .unwrap()
            .into_required();
        assert!(f.required());
        assert!(f.cast_value(&Value::from("")).is_err());
    }

    #[test]
    fn test_legacy_fmt_prefix() {
        let f = field(json!({"name": "d", "type": "date", "format": "fmt:%d/%m/%Y"})).unwrap();
        assert_eq!(f.format(), &Format::Pattern("%d/%m/%Y".to_string()));
        assert!(f.test_value(&Value::from("31/12/2020")));
    }
}
