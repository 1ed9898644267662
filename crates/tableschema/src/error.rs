//! Error types for the tableschema library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tableschema operations.
#[derive(Debug, Error)]
pub enum TableSchemaError {
    /// Descriptor could not be retrieved or parsed.
    #[error("Load error: {0}")]
    Load(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Descriptor failed profile or relational checks.
    #[error("There are {} validation errors (see 'errors')", .errors.len())]
    Validation { errors: Vec<TableSchemaError> },

    /// A single descriptor problem found while validating.
    #[error("Descriptor validation error: {message} at \"{path}\"")]
    Descriptor { path: String, message: String },

    /// A constraint was declared for a type that cannot carry it.
    #[error("Field \"{field}\" of type \"{field_type}\" does not support constraint \"{constraint}\"")]
    ConstraintNotSupported {
        field: String,
        constraint: String,
        field_type: String,
    },

    /// A field descriptor could not be turned into a field.
    #[error("Field \"{field}\" can't be built: {message}")]
    FieldBuild { field: String, message: String },

    /// A single cell failed to cast.
    #[error("Field \"{field}\" can't cast value \"{value}\" for type \"{field_type}\" with format \"{format}\"")]
    FieldCast {
        field: String,
        value: String,
        field_type: String,
        format: String,
    },

    /// A cast cell violates one of its field constraints.
    #[error("Field \"{field}\" has constraint \"{constraint}\" which is not satisfied for value \"{value}\"")]
    Constraint {
        field: String,
        constraint: String,
        value: String,
    },

    /// Row cell count differs from the schema's field count.
    #[error("Row length {row_len} doesn't match fields count {field_count}{}", fmt_row(.row_number))]
    RowShape {
        row_number: Option<usize>,
        row_len: usize,
        field_count: usize,
    },

    /// Source header labels differ from the schema's field names.
    #[error("Table headers {headers:?} don't match schema field names {field_names:?}")]
    HeaderMismatch {
        headers: Vec<String>,
        field_names: Vec<String>,
    },

    /// One or more cells of a row failed to cast.
    #[error("{message}")]
    Cast {
        message: String,
        errors: Vec<TableSchemaError>,
    },

    /// Duplicate value for a unique field or primary key.
    #[error("Field(s) \"{fields}\" duplicates in row {row_number} for values {values}")]
    UniqueKey {
        row_number: usize,
        fields: String,
        values: String,
    },

    /// Foreign key values have no match in the referenced resource.
    #[error("Foreign key \"{fields}\" violation in row {row_number}: values {values} not found in \"{resource}\"")]
    UnresolvedForeignKey {
        row_number: usize,
        fields: String,
        resource: String,
        values: String,
    },

    /// Referenced resource is missing from the relations map.
    #[error("Relation \"{resource}\" required by foreign key \"{fields}\" is not provided")]
    Relation { resource: String, fields: String },

    /// Consumed source differs from the declared size or hash.
    #[error("Calculated {what} \"{actual}\" differs from expected {what} \"{expected}\"")]
    Integrity {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

fn fmt_row(row_number: &Option<usize>) -> String {
    match row_number {
        Some(n) => format!(" in row {}", n),
        None => String::new(),
    }
}

impl TableSchemaError {
    /// Returns true for cast-kind failures (cell, row shape, headers).
    pub fn is_cast_error(&self) -> bool {
        matches!(
            self,
            TableSchemaError::FieldCast { .. }
                | TableSchemaError::Constraint { .. }
                | TableSchemaError::RowShape { .. }
                | TableSchemaError::HeaderMismatch { .. }
                | TableSchemaError::Cast { .. }
        )
    }

    /// Sub-errors carried by aggregate errors; empty otherwise.
    pub fn errors(&self) -> &[TableSchemaError] {
        match self {
            TableSchemaError::Validation { errors } | TableSchemaError::Cast { errors, .. } => {
                errors
            }
            _ => &[],
        }
    }
}

/// Result type alias for tableschema operations.
pub type Result<T> = std::result::Result<T, TableSchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_error_grouping() {
        let err = TableSchemaError::RowShape {
            row_number: Some(3),
            row_len: 2,
            field_count: 3,
        };
        assert!(err.is_cast_error());
        assert_eq!(err.to_string(), "Row length 2 doesn't match fields count 3 in row 3");

        let err = TableSchemaError::Relation {
            resource: "people".to_string(),
            fields: "name".to_string(),
        };
        assert!(!err.is_cast_error());
    }

    #[test]
    fn test_aggregate_errors() {
        let err = TableSchemaError::Validation {
            errors: vec![TableSchemaError::Load("x".to_string())],
        };
        assert_eq!(err.errors().len(), 1);
        assert!(err.to_string().contains("1 validation errors"));
    }
}
