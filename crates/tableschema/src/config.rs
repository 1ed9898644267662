//! Library-wide defaults.

/// Field type used when a descriptor omits `type`.
pub const DEFAULT_FIELD_TYPE: &str = "string";

/// Field format used when a descriptor omits `format`.
pub const DEFAULT_FIELD_FORMAT: &str = "default";

/// Raw values treated as null when a schema omits `missingValues`.
pub const DEFAULT_MISSING_VALUES: &[&str] = &[""];

pub const DEFAULT_DECIMAL_CHAR: &str = ".";
pub const DEFAULT_GROUP_CHAR: &str = "";
pub const DEFAULT_BARE_NUMBER: bool = true;

/// Case-insensitive literals accepted as `true` by boolean fields.
pub const DEFAULT_TRUE_VALUES: &[&str] = &["yes", "y", "true", "t", "1"];

/// Case-insensitive literals accepted as `false` by boolean fields.
pub const DEFAULT_FALSE_VALUES: &[&str] = &["no", "n", "false", "f", "0"];

/// Fraction of the leading vote a candidate type needs to stay eligible.
pub const DEFAULT_INFER_CONFIDENCE: f64 = 0.75;

/// Number of rows sampled by `Table::infer`.
pub const DEFAULT_INFER_LIMIT: usize = 100;

/// Prefix used when reporting content hashes.
pub const HASH_PREFIX: &str = "sha256:";

pub(crate) fn default_missing_values() -> Vec<String> {
    DEFAULT_MISSING_VALUES.iter().map(|s| s.to_string()).collect()
}
