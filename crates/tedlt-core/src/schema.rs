//! Declarative schema for resolved ticket properties
//!
//! A schema is data: it can be bundled with the tool ([`Schema::bundled`]),
//! declared in a configuration document, or built in code. Validation never
//! stops at the first problem; every violation is collected into one
//! [`ValidationReport`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ErrorKind;
use crate::value::{PropertyMap, PropertyValue};
use crate::{Error, Result};

/// Jira's built-in priority names
const JIRA_PRIORITIES: [&str; 5] = ["Highest", "High", "Medium", "Low", "Lowest"];

/// Value type a declared field accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    /// A list of values, such as Jira labels
    Array,
    /// An absolute URL with a host, such as a Jira base URL
    Url,
}

impl FieldType {
    /// Whether `value` is acceptable for this type.
    ///
    /// Strings holding a parseable number or boolean are accepted, since
    /// templates and overrides always produce strings.
    pub fn accepts(self, value: &PropertyValue) -> bool {
        match (self, value) {
            (FieldType::String, _) => true,
            (FieldType::Array, PropertyValue::List(_)) => true,
            (FieldType::Url, PropertyValue::String(s)) => {
                Url::parse(s.trim()).is_ok_and(|url| url.has_host())
            }
            (FieldType::Integer, PropertyValue::Integer(_)) => true,
            (FieldType::Integer, PropertyValue::String(s)) => s.trim().parse::<i64>().is_ok(),
            (FieldType::Float, PropertyValue::Float(_) | PropertyValue::Integer(_)) => true,
            (FieldType::Float, PropertyValue::String(s)) => s.trim().parse::<f64>().is_ok(),
            (FieldType::Boolean, PropertyValue::Bool(_)) => true,
            (FieldType::Boolean, PropertyValue::String(s)) => matches!(s.trim(), "true" | "false"),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Url => "url",
        };
        f.write_str(name)
    }
}

/// Declaration of a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldSpec {
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Closed set of allowed values; empty means open
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_allowed<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = allowed.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default(mut self, default: impl Into<PropertyValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Field declarations plus the strict-mode switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Schema {
    /// Reject resolved fields that are not declared
    pub strict: bool,
    pub fields: BTreeMap<String, FieldSpec>,
}

impl Schema {
    /// No declarations, unknown fields forwarded.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// The schema shipped with the tool, used when no document declares one.
    pub fn bundled() -> Self {
        Self::permissive()
            .with_field(
                "jira_url",
                FieldSpec::required()
                    .with_type(FieldType::Url)
                    .with_description("Base URL of the Jira instance"),
            )
            .with_field(
                "project_key",
                FieldSpec::required()
                    .with_description("Key of the project tickets are created in"),
            )
            .with_field(
                "issuetype.id",
                FieldSpec::optional().with_description("Numeric id of the issue type"),
            )
            .with_field(
                "priority.name",
                FieldSpec::optional().with_allowed(JIRA_PRIORITIES),
            )
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Validate a resolved property set.
    ///
    /// Returns the input with defaults injected for absent optional fields,
    /// or every violation found. Never a partial result.
    pub fn validate(&self, properties: &PropertyMap) -> Result<PropertyMap> {
        let mut violations = Vec::new();
        let mut validated = properties.clone();

        for (name, spec) in &self.fields {
            match properties.get(name) {
                None if spec.required => {
                    violations.push(Violation::MissingRequiredField {
                        field: name.clone(),
                    });
                }
                None => {
                    if let Some(default) = &spec.default {
                        tracing::debug!(
                            field = %name,
                            default = %default,
                            "Injecting schema default"
                        );
                        validated.insert(name.clone(), default.clone());
                    }
                }
                Some(value) if !spec.field_type.accepts(value) => {
                    violations.push(Violation::TypeMismatch {
                        field: name.clone(),
                        expected: spec.field_type,
                        value: value.to_string(),
                    });
                }
                Some(value) if !spec.allowed.is_empty() => {
                    let elements = match value {
                        PropertyValue::List(items) => items.as_slice(),
                        scalar => std::slice::from_ref(scalar),
                    };
                    violations.extend(
                        elements
                            .iter()
                            .map(ToString::to_string)
                            .filter(|rendered| !spec.allowed.contains(rendered))
                            .map(|rendered| Violation::InvalidValue {
                                field: name.clone(),
                                value: rendered,
                                allowed: spec.allowed.clone(),
                            }),
                    );
                }
                Some(_) => {}
            }
        }

        if self.strict {
            violations.extend(
                properties
                    .keys()
                    .filter(|key| !self.fields.contains_key(*key))
                    .map(|key| Violation::UnknownField { field: key.clone() }),
            );
        }

        if violations.is_empty() {
            Ok(validated)
        } else {
            tracing::debug!(count = violations.len(), "Schema validation failed");
            Err(Error::Validation(ValidationReport { violations }))
        }
    }
}

/// One schema rule broken by a resolved property set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingRequiredField {
        field: String,
    },
    UnknownField {
        field: String,
    },
    InvalidValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    TypeMismatch {
        field: String,
        expected: FieldType,
        value: String,
    },
}

impl Violation {
    pub fn field(&self) -> &str {
        match self {
            Violation::MissingRequiredField { field }
            | Violation::UnknownField { field }
            | Violation::InvalidValue { field, .. }
            | Violation::TypeMismatch { field, .. } => field,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Violation::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Violation::UnknownField { .. } => ErrorKind::UnknownField,
            Violation::InvalidValue { .. } => ErrorKind::InvalidValue,
            Violation::TypeMismatch { .. } => ErrorKind::TypeMismatch,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingRequiredField { field } => {
                write!(f, "Required field '{}' is missing", field)
            }
            Violation::UnknownField { field } => {
                write!(f, "Field '{}' is not declared in the schema", field)
            }
            Violation::InvalidValue {
                field,
                value,
                allowed,
            } => write!(
                f,
                "Field '{}' has value '{}', expected one of: {}",
                field,
                value,
                allowed.join(", ")
            ),
            Violation::TypeMismatch {
                field,
                expected,
                value,
            } => write!(f, "Field '{}' has value '{}', expected {}", field, value, expected),
        }
    }
}

/// Every violation found by one validation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema validation failed with {} violation{}",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "\n  {}: {}", violation.kind(), violation)?;
        }
        Ok(())
    }
}
