//! Configuration documents
//!
//! A document is TOML, JSON5 or YAML text holding base properties, named
//! profiles, an optional default profile and an optional schema. Documents
//! are combined in load order into one [`Configuration`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::profile::{Profile, ProfileSet};
use crate::schema::Schema;
use crate::value::{PropertyMap, flatten_properties};
use crate::{Error, Result};

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension, case-insensitively.
    ///
    /// - `toml` -> TOML
    /// - `json`, `jsonc`, `json5` -> JSON, read as JSON5 so comments and
    ///   trailing commas are accepted
    /// - `yaml`, `yml` -> YAML
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" | "jsonc" | "json5" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDocument {
    default_profile: Option<String>,
    properties: Map<String, Value>,
    profiles: BTreeMap<String, RawProfile>,
    schema: Option<Schema>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawProfile {
    #[serde(alias = "parent")]
    extends: Option<String>,
    #[serde(alias = "fields")]
    properties: Map<String, Value>,
}

/// One parsed configuration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    pub default_profile: Option<String>,
    pub properties: PropertyMap,
    pub profiles: Vec<Profile>,
    pub schema: Option<Schema>,
}

impl ConfigDocument {
    /// Parse document text in the given format.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self> {
        let parse_error = |message: String| Error::Parse {
            format: format.name().to_string(),
            message,
        };

        let raw: RawDocument = match format {
            DocumentFormat::Toml => {
                toml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            DocumentFormat::Json => {
                json5::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            DocumentFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDocument) -> Result<Self> {
        let properties = flatten_properties("properties", &raw.properties)?;

        let mut profiles = Vec::with_capacity(raw.profiles.len());
        for (name, raw_profile) in raw.profiles {
            let owner = format!("profile '{}'", name);
            let mut profile = Profile::new(name)?
                .with_properties(flatten_properties(&owner, &raw_profile.properties)?);
            if let Some(parent) = raw_profile.extends {
                if parent.trim().is_empty() {
                    return Err(Error::invalid_document(format!(
                        "{} extends an empty profile name",
                        owner
                    )));
                }
                profile = profile.with_parent(parent);
            }
            profiles.push(profile);
        }

        tracing::debug!(
            profiles = profiles.len(),
            base_properties = properties.len(),
            has_schema = raw.schema.is_some(),
            "Parsed configuration document"
        );

        Ok(Self {
            default_profile: raw.default_profile,
            properties,
            profiles,
            schema: raw.schema,
        })
    }
}

/// Profiles and schema assembled from every loaded document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub profiles: ProfileSet,
    pub schema: Option<Schema>,
}

impl Configuration {
    /// Combine documents in load order.
    ///
    /// Later documents replace same-named profiles, overlay base properties
    /// key by key, and replace the schema and default profile they declare.
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = ConfigDocument>,
    {
        let mut config = Self::default();
        for document in documents {
            config.merge(document);
        }
        config
    }

    pub fn merge(&mut self, document: ConfigDocument) {
        self.profiles.extend_base_properties(document.properties);
        for profile in document.profiles {
            if let Some(previous) = self.profiles.insert(profile) {
                tracing::debug!(profile = previous.name(), "Profile replaced by later document");
            }
        }
        if let Some(name) = document.default_profile {
            self.profiles.set_default_profile(name);
        }
        if document.schema.is_some() {
            self.schema = document.schema;
        }
    }

    /// Declared schema, or the bundled one. `force_strict` turns strict mode on.
    pub fn effective_schema(&self, force_strict: bool) -> Schema {
        let schema = self.schema.clone().unwrap_or_else(Schema::bundled);
        let strict = schema.strict || force_strict;
        schema.strict(strict)
    }
}
