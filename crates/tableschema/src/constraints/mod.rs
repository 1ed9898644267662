//! Field constraints: the applicability matrix and the predicates.

mod applicability;
mod checks;

pub use applicability::{ConstraintKind, is_supported, supported_constraints};
pub use checks::{
    Check, check_enum, check_max_length, check_maximum, check_min_length, check_minimum,
    check_pattern, check_required,
};

use crate::value::Value;

/// Which constraints a cast should evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConstraintCheck {
    #[default]
    All,
    None,
    Only(Vec<ConstraintKind>),
}

impl ConstraintCheck {
    pub fn includes(&self, kind: ConstraintKind) -> bool {
        match self {
            ConstraintCheck::All => true,
            ConstraintCheck::None => false,
            ConstraintCheck::Only(kinds) => kinds.contains(&kind),
        }
    }
}

/// The compiled constraints of one field, `required` first.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    checks: Vec<Check>,
}

impl Constraints {
    pub fn new(mut checks: Vec<Check>) -> Self {
        checks.sort_by_key(Check::kind);
        Self { checks }
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter()
    }

    pub fn has(&self, kind: ConstraintKind) -> bool {
        self.checks.iter().any(|c| c.kind() == kind)
    }

    /// First selected constraint the value violates.
    pub fn first_violation(
        &self,
        value: &Value,
        raw: &Value,
        selection: &ConstraintCheck,
    ) -> Option<ConstraintKind> {
        self.checks
            .iter()
            .filter(|c| selection.includes(c.kind()))
            .find(|c| !c.passes(value, raw))
            .map(Check::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> Constraints {
        Constraints::new(vec![
            Check::MaxLength(3),
            Check::pattern("[a-z]+").unwrap(),
            Check::Required,
        ])
    }

    #[test]
    fn test_required_checked_first() {
        let c = constraints();
        assert_eq!(
            c.first_violation(&Value::Null, &Value::from(""), &ConstraintCheck::All),
            Some(ConstraintKind::Required)
        );
    }

    #[test]
    fn test_selection() {
        let c = constraints();
        let value = Value::from("ABCD");
        assert_eq!(
            c.first_violation(&value, &value, &ConstraintCheck::All),
            Some(ConstraintKind::Pattern)
        );
        assert_eq!(
            c.first_violation(
                &value,
                &value,
                &ConstraintCheck::Only(vec![ConstraintKind::MaxLength])
            ),
            Some(ConstraintKind::MaxLength)
        );
        assert_eq!(c.first_violation(&value, &value, &ConstraintCheck::None), None);
        assert!(c.has(ConstraintKind::Required));
        assert!(!c.has(ConstraintKind::Unique));
    }
}
