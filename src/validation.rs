use std::{collections::BTreeMap, fmt};

use serde::Serialize;

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const MUST_EXIST: &str = "must exist";
pub const INVALID_DATE: &str = "is not a valid date";

/// Field-level validation failures, keyed by attribute name.
///
/// Serializes as `{"name": ["can't be blank"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn includes(&self, field: &str, message: &str) -> bool {
        self.get(field).iter().any(|m| m == message)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// `None`, empty and whitespace-only strings all count as blank.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("name", BLANK);
        errors.add("project", MUST_EXIST);
        errors.add("name", TAKEN);

        assert!(errors.includes("name", BLANK));
        assert!(errors.includes("name", TAKEN));
        assert!(errors.includes("project", MUST_EXIST));
        assert!(errors.get("message").is_empty());
        assert_eq!(
            errors.to_string(),
            "name can't be blank, name has already been taken, project must exist"
        );
    }

    #[test]
    fn serializes_as_a_field_map() {
        let errors = ValidationErrors::single("message", BLANK);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "message": ["can't be blank"] }));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("  \t")));
        assert!(!is_blank(Some("Test Project")));
    }
}
