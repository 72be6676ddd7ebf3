//! Error types for tedlt-core

use std::fmt;

use crate::schema::ValidationReport;

/// Result type for tedlt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a ticket request
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A selected profile, or a parent named by `extends`, is not loaded
    #[error("{}", unknown_profile_message(.name, .referenced_by.as_deref()))]
    UnknownProfile {
        name: String,
        referenced_by: Option<String>,
    },

    /// The inheritance chain loops back on itself
    #[error("Cyclic profile inheritance: {}", .cycle.join(" -> "))]
    CyclicInheritance { cycle: Vec<String> },

    /// A placeholder names neither a property nor a context variable
    #[error("Unresolved reference '{{{{ {reference} }}}}' in property '{property}'")]
    UnresolvedReference { reference: String, property: String },

    /// Properties reference each other in a loop
    #[error("Cyclic template reference: {}", .cycle.join(" -> "))]
    CyclicTemplateReference { cycle: Vec<String> },

    /// A chain of template references is nested deeper than allowed
    #[error("Template references in property '{property}' nest deeper than {limit} levels")]
    TemplateRecursionLimit { property: String, limit: usize },

    /// The ticket title is missing or blank
    #[error("Ticket title is missing or empty")]
    MissingTitle,

    /// The resolved properties failed schema validation
    #[error("{0}")]
    Validation(ValidationReport),

    /// A configuration document could not be parsed
    #[error("Failed to parse {format} configuration: {message}")]
    Parse { format: String, message: String },

    /// A configuration document parsed but is not a valid tedlt document
    #[error("Invalid configuration: {message}")]
    InvalidDocument { message: String },

    /// A dotted field key collides with a scalar field of the same prefix
    #[error("Field '{key}' conflicts with another field when building the payload")]
    PayloadConflict { key: String },
}

fn unknown_profile_message(name: &str, referenced_by: Option<&str>) -> String {
    match referenced_by {
        Some(child) => format!("Unknown profile '{name}' (extended by '{child}')"),
        None => format!("Unknown profile '{name}'"),
    }
}

impl Error {
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Stable classification of this error, for display and exit handling
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownProfile { .. } => ErrorKind::UnknownProfile,
            Error::CyclicInheritance { .. } => ErrorKind::CyclicInheritance,
            Error::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Error::CyclicTemplateReference { .. } => ErrorKind::CyclicTemplateReference,
            Error::TemplateRecursionLimit { .. } => ErrorKind::TemplateRecursionLimit,
            Error::MissingTitle => ErrorKind::MissingTitle,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::InvalidDocument { .. } => ErrorKind::InvalidDocument,
            Error::PayloadConflict { .. } => ErrorKind::PayloadConflict,
        }
    }

    /// The profile name or property key the error is about, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            Error::UnknownProfile { name, .. } => Some(name),
            Error::CyclicInheritance { cycle } | Error::CyclicTemplateReference { cycle } => {
                cycle.first().map(String::as_str)
            }
            Error::UnresolvedReference { property, .. } => Some(property),
            Error::TemplateRecursionLimit { property, .. } => Some(property),
            Error::PayloadConflict { key } => Some(key),
            _ => None,
        }
    }
}

/// Error classification shared by engine errors and schema violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownProfile,
    CyclicInheritance,
    UnresolvedReference,
    CyclicTemplateReference,
    TemplateRecursionLimit,
    MissingRequiredField,
    UnknownField,
    InvalidValue,
    TypeMismatch,
    MissingTitle,
    Validation,
    Parse,
    InvalidDocument,
    PayloadConflict,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnknownProfile => "UnknownProfileError",
            ErrorKind::CyclicInheritance => "CyclicInheritanceError",
            ErrorKind::UnresolvedReference => "UnresolvedReferenceError",
            ErrorKind::CyclicTemplateReference => "CyclicTemplateReferenceError",
            ErrorKind::TemplateRecursionLimit => "TemplateRecursionLimitError",
            ErrorKind::MissingRequiredField => "MissingRequiredFieldError",
            ErrorKind::UnknownField => "UnknownFieldError",
            ErrorKind::InvalidValue => "InvalidValueError",
            ErrorKind::TypeMismatch => "TypeMismatchError",
            ErrorKind::MissingTitle => "MissingTitleError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::InvalidDocument => "InvalidDocumentError",
            ErrorKind::PayloadConflict => "PayloadConflictError",
        };
        f.write_str(name)
    }
}
