//! Configuration resolution engine for tedlt.
//!
//! Turns layered profile documents plus a ticket title into a validated,
//! ready-to-submit [`IssueRequest`]:
//!
//! 1. [`ProfileResolver`] merges a profile with its `extends` chain.
//! 2. [`TemplateEngine`] expands `{{ reference }}` placeholders.
//! 3. [`Schema`] checks the result and injects defaults.
//! 4. [`IssueRequest::build`] attaches the title.
//!
//! [`Engine`] runs all four steps. Resolution is a pure function of the
//! profiles, the schema, the [`InvocationContext`] and any [`Overrides`].

pub mod context;
pub mod document;
pub mod engine;
pub mod error;
pub mod profile;
pub mod request;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod value;

pub use context::InvocationContext;
pub use document::{ConfigDocument, Configuration, DocumentFormat};
pub use engine::{ENV_PREFIX, Engine, Overrides, Resolution, ResolvedProperties};
pub use error::{Error, ErrorKind, Result};
pub use profile::{DEFAULT_PROFILE, Profile, ProfileSet};
pub use request::IssueRequest;
pub use resolver::{MergedProperties, Origin, ProfileResolver};
pub use schema::{FieldSpec, FieldType, Schema, ValidationReport, Violation};
pub use template::{MAX_TEMPLATE_DEPTH, TemplateEngine};
pub use value::{PropertyMap, PropertyValue};
