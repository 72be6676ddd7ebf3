//! End-to-end resolution pipeline
//!
//! profiles → inheritance merge → overrides → templates → schema → request
//!
//! Base properties are template variables. They reach the request only when
//! the schema declares them, or when they are connection or project keys.
//!
//! [`Engine`] only borrows its inputs. Each call allocates its own working
//! state, so one `ProfileSet` and `Schema` can serve many concurrent
//! resolutions.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::InvocationContext;
use crate::profile::ProfileSet;
use crate::request::{CONNECTION_KEYS, IssueRequest, PROJECT_KEY};
use crate::resolver::{Origin, ProfileResolver};
use crate::schema::Schema;
use crate::template::TemplateEngine;
use crate::value::{PropertyMap, PropertyValue};
use crate::Result;

/// Prefix of environment variables treated as property overrides
pub const ENV_PREFIX: &str = "TEDLT_";

/// Ad hoc property layers applied after the inheritance merge.
///
/// Environment overrides are applied first, command-line overrides last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    env: PropertyMap,
    cli: PropertyMap,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `TEDLT_*` variables from an environment snapshot.
    ///
    /// The suffix is lower-cased and `__` becomes `.`, so
    /// `TEDLT_ISSUETYPE__ID` overrides `issuetype.id`.
    pub fn from_env<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = Self::new();
        for (name, value) in vars {
            if let Some(key) = env_override_key(name.as_ref()) {
                overrides.env.insert(key, PropertyValue::String(value.into()));
            }
        }
        overrides
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cli(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.cli.insert(key.into(), value.into());
        self
    }

    pub fn env(&self) -> &PropertyMap {
        &self.env
    }

    pub fn cli(&self) -> &PropertyMap {
        &self.cli
    }

    pub fn is_empty(&self) -> bool {
        self.env.is_empty() && self.cli.is_empty()
    }
}

fn env_override_key(name: &str) -> Option<String> {
    let suffix = name.strip_prefix(ENV_PREFIX)?;
    if suffix.is_empty() {
        return None;
    }
    Some(suffix.to_lowercase().replace("__", "."))
}

/// Fully templated properties, before schema validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProperties {
    pub properties: PropertyMap,
    /// Profiles applied, root first
    pub chain: Vec<String>,
    pub origins: BTreeMap<String, Origin>,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub request: IssueRequest,
    pub chain: Vec<String>,
    pub origins: BTreeMap<String, Origin>,
}

/// Runs the resolution pipeline against borrowed profiles and schema.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    profiles: &'a ProfileSet,
    schema: &'a Schema,
}

impl<'a> Engine<'a> {
    pub fn new(profiles: &'a ProfileSet, schema: &'a Schema) -> Self {
        Self { profiles, schema }
    }

    pub fn profiles(&self) -> &'a ProfileSet {
        self.profiles
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Merge and template-resolve properties without validating them.
    ///
    /// An empty `selected` falls back to the profile set's default selection.
    pub fn resolve_properties(
        &self,
        selected: &[String],
        context: &InvocationContext,
        overrides: &Overrides,
    ) -> Result<ResolvedProperties> {
        let selection = if selected.is_empty() {
            self.profiles.default_selection()
        } else {
            selected.to_vec()
        };

        let mut merged = ProfileResolver::new(self.profiles).resolve_many(&selection)?;
        if !overrides.env.is_empty() {
            tracing::debug!(
                keys = ?overrides.env.keys().collect::<Vec<_>>(),
                "Applying environment overrides"
            );
            merged.overlay(&overrides.env, Origin::Env);
        }
        if !overrides.cli.is_empty() {
            tracing::debug!(
                keys = ?overrides.cli.keys().collect::<Vec<_>>(),
                "Applying command-line overrides"
            );
            merged.overlay(&overrides.cli, Origin::Cli);
        }

        let scoped;
        let context = match (context.profile(), selection.last()) {
            (None, Some(last)) => {
                scoped = context.clone().with_profile(last.as_str());
                &scoped
            }
            _ => context,
        };

        let properties = TemplateEngine::new(context).resolve(merged.properties())?;
        let (_, chain, origins) = merged.into_parts();

        Ok(ResolvedProperties {
            properties,
            chain,
            origins,
        })
    }

    /// Run the whole pipeline and build the issue request.
    ///
    /// # Errors
    ///
    /// Any profile, template, or title error, or a `Validation` error
    /// carrying every schema violation at once.
    pub fn resolve(
        &self,
        selected: &[String],
        context: &InvocationContext,
        overrides: &Overrides,
    ) -> Result<Resolution> {
        let ResolvedProperties {
            properties,
            chain,
            mut origins,
        } = self.resolve_properties(selected, context, overrides)?;

        let submitted = self.submitted(properties, &origins);

        let validated = self.schema.validate(&submitted)?;
        for key in validated.keys() {
            if !submitted.contains_key(key) {
                origins.insert(key.clone(), Origin::SchemaDefault);
            }
        }

        let request = IssueRequest::build(context.title(), validated)?;
        tracing::debug!(fields = request.fields().len(), "Built issue request");

        Ok(Resolution {
            request,
            chain,
            origins,
        })
    }

    /// The resolved properties that become request fields.
    ///
    /// Keys that only came from the base layer are dropped unless the
    /// schema declares them or they are connection or project keys.
    pub fn submitted(
        &self,
        properties: PropertyMap,
        origins: &BTreeMap<String, Origin>,
    ) -> PropertyMap {
        properties
            .into_iter()
            .filter(|(key, _)| {
                origins.get(key) != Some(&Origin::Base)
                    || key == PROJECT_KEY
                    || CONNECTION_KEYS.contains(&key.as_str())
                    || self.schema.field(key).is_some()
            })
            .collect()
    }
}
