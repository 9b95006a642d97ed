//! Проверка ограничений сущностей перед сохранением.
//!
//! Field constraints are declared with `validator` derives on the entity structs.
//! [`CheckConstraints`] runs them over a whole aggregate (root plus owned children)
//! and flattens the result into a list of [`Violation`]s with dotted paths, so a
//! caller sees every broken field at once.

use serde::Serialize;
use std::fmt;
use validator::{ValidationErrors, ValidationErrorsKind};

/// One broken constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Violation {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Every constraint violation found by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens the output of a `validator` derive.
    pub fn from_validation(result: Result<(), ValidationErrors>) -> Self {
        let mut violations = Self::default();
        if let Err(errors) = result {
            violations.collect("", &errors);
        }
        violations
    }

    fn collect(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = join_path(prefix, &field.to_string());
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| default_message(&error.code));
                        self.0.push(Violation {
                            field: path.clone(),
                            code: error.code.to_string(),
                            message,
                        });
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.collect(&path, inner),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.collect(&format!("{path}[{index}]"), inner);
                    }
                }
            }
        }
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.push(Violation {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        });
    }

    /// Appends violations of an owned child under `prefix`.
    pub fn nest(&mut self, prefix: &str, child: Violations) {
        for mut violation in child.0 {
            violation.field = join_path(prefix, &violation.field);
            self.0.push(violation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// `Ok(())` when nothing is broken, otherwise the sorted violations.
    pub fn into_result(mut self) -> Result<(), Violations> {
        if self.0.is_empty() {
            return Ok(());
        }
        self.0.sort();
        Err(self)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl Extend<Violation> for Violations {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Validation pass over an entity and everything it owns.
pub trait CheckConstraints {
    fn violations(&self) -> Violations;

    fn check(&self) -> Result<(), Violations> {
        self.violations().into_result()
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else if field.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn default_message(code: &str) -> String {
    match code {
        "required" => "must not be null".to_string(),
        "length" => "has an invalid length".to_string(),
        "range" => "is out of range".to_string(),
        "email" => "must be a well-formed email address".to_string(),
        other => format!("failed the `{other}` constraint"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1))]
        name: String,
        #[validate(required)]
        parent: Option<i64>,
    }

    #[test]
    fn collects_every_failing_field() {
        let probe = Probe {
            name: String::new(),
            parent: None,
        };
        let violations = Violations::from_validation(probe.validate());
        assert_eq!(violations.len(), 2);
        assert!(violations.contains_field("name"));
        assert!(violations.contains_field("parent"));
    }

    #[test]
    fn default_messages_fill_in_missing_ones() {
        let probe = Probe {
            name: "ok".into(),
            parent: None,
        };
        let violations = Violations::from_validation(probe.validate());
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.code, "required");
        assert_eq!(violation.message, "must not be null");
    }

    #[test]
    fn nested_paths_are_prefixed() {
        let mut child = Violations::new();
        child.push("name", "length", "must not be empty");

        let mut parent = Violations::new();
        parent.nest("sections[A]", child);
        assert!(parent.contains_field("sections[A].name"));
        assert_eq!(
            parent.to_string(),
            "sections[A].name: must not be empty"
        );
    }

    #[test]
    fn empty_set_is_ok() {
        assert!(Violations::new().into_result().is_ok());
    }
}
