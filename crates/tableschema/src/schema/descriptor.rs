//! Serde model of table schema descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::{DEFAULT_FIELD_FORMAT, DEFAULT_FIELD_TYPE, default_missing_values};
use crate::constraints::ConstraintKind;
use crate::types::{CastOptions, FieldType};

fn default_field_type() -> String {
    DEFAULT_FIELD_TYPE.to_string()
}

fn default_field_format() -> String {
    DEFAULT_FIELD_FORMAT.to_string()
}

/// Descriptor of a single field.
///
/// `type` and `format` are kept as strings so descriptors naming unknown
/// types still load and can be reported by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default = "default_field_format")]
    pub format: String,
    #[serde(default, skip_serializing_if = "ConstraintsDescriptor::is_empty")]
    pub constraints: ConstraintsDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_char: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_char: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bare_number: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_values: Option<Vec<String>>,
    /// Keys this library does not interpret (title, description, rdfType, ...).
    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.as_str().to_string(),
            format: default_field_format(),
            constraints: ConstraintsDescriptor::default(),
            decimal_char: None,
            group_char: None,
            bare_number: None,
            currency: None,
            true_values: None,
            false_values: None,
            extra: IndexMap::new(),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintsDescriptor) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.constraints.required = Some(required);
        self
    }

    pub fn with_group_char(mut self, group_char: impl Into<String>) -> Self {
        self.group_char = Some(group_char.into());
        self
    }

    pub fn with_decimal_char(mut self, decimal_char: impl Into<String>) -> Self {
        self.decimal_char = Some(decimal_char.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Best-effort parse used for descriptors that failed validation.
    pub fn from_json_lossy(json: &JsonValue) -> Self {
        if let Ok(descriptor) = serde_json::from_value::<FieldDescriptor>(json.clone()) {
            return descriptor;
        }
        let text = |key: &str| json.get(key).and_then(JsonValue::as_str).map(String::from);
        let mut descriptor = FieldDescriptor {
            field_type: text("type").unwrap_or_else(default_field_type),
            format: text("format").unwrap_or_else(default_field_format),
            ..FieldDescriptor::new(text("name").unwrap_or_default(), FieldType::String)
        };
        if let Some(constraints) = json.get("constraints") {
            descriptor.constraints = ConstraintsDescriptor::from_json_lossy(constraints);
        }
        descriptor
    }

    /// Options handed to the caster, falling back to library defaults.
    pub fn cast_options(&self) -> CastOptions {
        let mut options = CastOptions::default();
        if let Some(decimal_char) = &self.decimal_char {
            options.decimal_char = decimal_char.clone();
        }
        if let Some(group_char) = &self.group_char {
            options.group_char = group_char.clone();
        }
        if let Some(bare_number) = self.bare_number {
            options.bare_number = bare_number;
        }
        if let Some(currency) = self.currency {
            options.currency = currency;
        }
        if let Some(values) = &self.true_values {
            options.true_values = values.clone();
        }
        if let Some(values) = &self.false_values {
            options.false_values = values.clone();
        }
        options
    }
}

/// The `constraints` member of a field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl ConstraintsDescriptor {
    pub fn is_empty(&self) -> bool {
        self.declared().is_empty()
    }

    /// Constraint keys present in the descriptor.
    pub fn declared(&self) -> Vec<ConstraintKind> {
        let present = [
            (ConstraintKind::Required, self.required.is_some()),
            (ConstraintKind::Unique, self.unique.is_some()),
            (ConstraintKind::Pattern, self.pattern.is_some()),
            (ConstraintKind::Enum, self.enum_values.is_some()),
            (ConstraintKind::Minimum, self.minimum.is_some()),
            (ConstraintKind::Maximum, self.maximum.is_some()),
            (ConstraintKind::MinLength, self.min_length.is_some()),
            (ConstraintKind::MaxLength, self.max_length.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(kind, is_present)| is_present.then_some(kind))
            .collect()
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    /// Keep the members that parse, drop the rest.
    pub fn from_json_lossy(json: &JsonValue) -> Self {
        if let Ok(constraints) = serde_json::from_value::<ConstraintsDescriptor>(json.clone()) {
            return constraints;
        }
        let get = |key: &str| json.get(key);
        let length = |key: &str| {
            get(key)
                .and_then(JsonValue::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        ConstraintsDescriptor {
            required: get("required").and_then(JsonValue::as_bool),
            unique: get("unique").and_then(JsonValue::as_bool),
            pattern: get("pattern").and_then(JsonValue::as_str).map(String::from),
            enum_values: get("enum").and_then(JsonValue::as_array).cloned(),
            minimum: get("minimum").cloned(),
            maximum: get("maximum").cloned(),
            min_length: length("minLength"),
            max_length: length("maxLength"),
        }
    }
}

/// One field name or an ordered list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldNames {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldNames {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            FieldNames::Single(name) => vec![name.clone()],
            FieldNames::Multiple(names) => names.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldNames::Single(_) => 1,
            FieldNames::Multiple(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for FieldNames {
    fn from(name: &str) -> Self {
        FieldNames::Single(name.to_string())
    }
}

impl From<Vec<&str>> for FieldNames {
    fn from(names: Vec<&str>) -> Self {
        FieldNames::Multiple(names.into_iter().map(String::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// Referenced resource; empty for a self-reference.
    #[serde(default)]
    pub resource: String,
    pub fields: FieldNames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub fields: FieldNames,
    pub reference: ForeignKeyReference,
}

impl ForeignKey {
    pub fn new(
        fields: impl Into<FieldNames>,
        resource: impl Into<String>,
        reference_fields: impl Into<FieldNames>,
    ) -> Self {
        Self {
            fields: fields.into(),
            reference: ForeignKeyReference {
                resource: resource.into(),
                fields: reference_fields.into(),
            },
        }
    }
}

/// A whole table schema descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<FieldNames>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default = "default_missing_values")]
    pub missing_values: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            missing_values: default_missing_values(),
            extra: IndexMap::new(),
        }
    }
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<FieldNames>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    pub fn with_foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.push(key);
        self
    }

    pub fn with_missing_values(mut self, values: Vec<String>) -> Self {
        self.missing_values = values;
        self
    }

    /// Primary key field names, empty when none is declared.
    pub fn primary_key_names(&self) -> Vec<String> {
        self.primary_key
            .as_ref()
            .map(FieldNames::to_vec)
            .unwrap_or_default()
    }

    /// Best-effort parse: members that do not fit the model fall back to
    /// their defaults so the rest of the descriptor can still be used.
    pub fn from_json_lossy(json: &JsonValue) -> Self {
        if let Ok(descriptor) = serde_json::from_value::<SchemaDescriptor>(json.clone()) {
            return descriptor;
        }
        let mut descriptor = SchemaDescriptor::default();
        let Some(object) = json.as_object() else {
            return descriptor;
        };
        if let Some(fields) = object.get("fields").and_then(JsonValue::as_array) {
            descriptor.fields = fields
                .iter()
                .filter(|f| f.is_object())
                .map(FieldDescriptor::from_json_lossy)
                .collect();
        }
        descriptor.primary_key = object
            .get("primaryKey")
            .and_then(|k| serde_json::from_value(k.clone()).ok());
        if let Some(keys) = object.get("foreignKeys").and_then(JsonValue::as_array) {
            descriptor.foreign_keys = keys
                .iter()
                .filter_map(|k| serde_json::from_value(k.clone()).ok())
                .collect();
        }
        if let Some(values) = object
            .get("missingValues")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
        {
            descriptor.missing_values = values;
        }
        for (key, value) in object {
            if !matches!(
                key.as_str(),
                "fields" | "primaryKey" | "foreignKeys" | "missingValues"
            ) {
                descriptor.extra.insert(key.clone(), value.clone());
            }
        }
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_filled_on_parse() {
        let descriptor: SchemaDescriptor =
            serde_json::from_value(json!({"fields": [{"name": "id"}]})).unwrap();
        assert_eq!(descriptor.fields[0].field_type, "string");
        assert_eq!(descriptor.fields[0].format, "default");
        assert_eq!(descriptor.missing_values, vec![String::new()]);
    }

    #[test]
    fn test_extra_keys_round_trip() {
        let json = json!({
            "fields": [{"name": "id", "type": "integer", "title": "Identifier"}],
            "primaryKey": "id",
            "title": "People"
        });
        let descriptor: SchemaDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(descriptor.fields[0].extra["title"], json!("Identifier"));
        assert_eq!(descriptor.extra["title"], json!("People"));

        let out = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(out["fields"][0]["title"], json!("Identifier"));
        assert_eq!(out["primaryKey"], json!("id"));
        assert!(out.get("foreignKeys").is_none());
    }

    #[test]
    fn test_constraints_enum_key() {
        let json = json!({"required": true, "enum": ["a", "b"], "minLength": 1});
        let constraints: ConstraintsDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(
            constraints.declared(),
            vec![
                ConstraintKind::Required,
                ConstraintKind::Enum,
                ConstraintKind::MinLength
            ]
        );
        assert!(constraints.is_required());
    }

    #[test]
    fn test_field_names_forms() {
        let single: FieldNames = serde_json::from_value(json!("id")).unwrap();
        let multiple: FieldNames = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(single.to_vec(), vec!["id"]);
        assert_eq!(multiple.len(), 2);
    }

    #[test]
    fn test_lossy_parse_keeps_good_members() {
        let json = json!({
            "fields": [
                {"name": "id", "type": "integer", "constraints": {"minLength": "x"}},
                {"name": "when", "type": "date"}
            ],
            "primaryKey": 42,
            "missingValues": ["", "NA"]
        });
        let descriptor = SchemaDescriptor::from_json_lossy(&json);
        assert_eq!(descriptor.fields.len(), 2);
        assert_eq!(descriptor.fields[0].field_type, "integer");
        assert_eq!(descriptor.fields[0].constraints.min_length, None);
        assert_eq!(descriptor.primary_key, None);
        assert_eq!(descriptor.missing_values, vec!["", "NA"]);
    }

    #[test]
    fn test_cast_options_from_descriptor() {
        let field = FieldDescriptor::new("price", FieldType::Number).with_group_char(",");
        let options = field.cast_options();
        assert_eq!(options.group_char, ",");
        assert_eq!(options.decimal_char, ".");
    }
}
