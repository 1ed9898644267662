//! Which constraints each field type may declare.

use std::fmt;
use std::str::FromStr;

use crate::types::FieldType;

/// Named field constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    Required,
    Unique,
    Pattern,
    Enum,
    Minimum,
    Maximum,
    MinLength,
    MaxLength,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 8] = [
        ConstraintKind::Required,
        ConstraintKind::Unique,
        ConstraintKind::Pattern,
        ConstraintKind::Enum,
        ConstraintKind::Minimum,
        ConstraintKind::Maximum,
        ConstraintKind::MinLength,
        ConstraintKind::MaxLength,
    ];

    /// Descriptor key of the constraint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Unique => "unique",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::Enum => "enum",
            ConstraintKind::Minimum => "minimum",
            ConstraintKind::Maximum => "maximum",
            ConstraintKind::MinLength => "minLength",
            ConstraintKind::MaxLength => "maxLength",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown constraint \"{}\"", s))
    }
}

use ConstraintKind::*;

const STRING_CONSTRAINTS: &[ConstraintKind] =
    &[Required, Unique, Pattern, Enum, MinLength, MaxLength];
const ORDERED_CONSTRAINTS: &[ConstraintKind] = &[Required, Unique, Enum, Minimum, Maximum];
const COLLECTION_CONSTRAINTS: &[ConstraintKind] = &[Required, Unique, Enum, MinLength, MaxLength];
const BOOLEAN_CONSTRAINTS: &[ConstraintKind] = &[Required, Enum];
const OPAQUE_CONSTRAINTS: &[ConstraintKind] = &[Required, Unique, Enum];

/// Constraints a field of the given type may declare.
pub fn supported_constraints(field_type: FieldType) -> &'static [ConstraintKind] {
    match field_type {
        FieldType::String => STRING_CONSTRAINTS,
        FieldType::Integer
        | FieldType::Number
        | FieldType::Date
        | FieldType::Time
        | FieldType::Datetime
        | FieldType::Year
        | FieldType::Yearmonth
        | FieldType::Duration => ORDERED_CONSTRAINTS,
        FieldType::Array | FieldType::Object => COLLECTION_CONSTRAINTS,
        FieldType::Boolean => BOOLEAN_CONSTRAINTS,
        FieldType::Geopoint | FieldType::Geojson | FieldType::Any => OPAQUE_CONSTRAINTS,
    }
}

pub fn is_supported(field_type: FieldType, kind: ConstraintKind) -> bool {
    supported_constraints(field_type).contains(&kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_is_universal() {
        for field_type in FieldType::ALL {
            assert!(is_supported(field_type, ConstraintKind::Required));
        }
    }

    #[test]
    fn test_matrix_samples() {
        assert!(is_supported(FieldType::String, ConstraintKind::Pattern));
        assert!(!is_supported(FieldType::Integer, ConstraintKind::Pattern));
        assert!(is_supported(FieldType::Date, ConstraintKind::Minimum));
        assert!(!is_supported(FieldType::String, ConstraintKind::Minimum));
        assert!(!is_supported(FieldType::Boolean, ConstraintKind::Unique));
        assert!(is_supported(FieldType::Array, ConstraintKind::MaxLength));
        assert!(!is_supported(FieldType::Geopoint, ConstraintKind::MinLength));
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ConstraintKind::ALL {
            assert_eq!(kind.as_str().parse::<ConstraintKind>(), Ok(kind));
        }
    }
}
