//! Profile inheritance resolution
//!
//! A profile's chain is found by following `extends` references from the
//! target up to its root. Properties are then applied root-to-target on top
//! of the shared base layer, so the most specific profile wins. Scalars are
//! merged last-writer-wins; a list laid over a list is appended to it.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::profile::{Profile, ProfileSet};
use crate::value::{PropertyMap, PropertyValue};
use crate::{Error, Result};

/// The layer that supplied a property's final value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Origin {
    /// Document-level `[properties]`
    Base,
    /// A profile in the inheritance chain
    Profile(String),
    /// A `TEDLT_*` environment override
    Env,
    /// A `--set` command-line override
    Cli,
    /// A default injected by the schema validator
    SchemaDefault,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Base => write!(f, "base"),
            Origin::Profile(name) => write!(f, "profile:{}", name),
            Origin::Env => write!(f, "env"),
            Origin::Cli => write!(f, "cli"),
            Origin::SchemaDefault => write!(f, "schema-default"),
        }
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

/// Merged, still template-laden properties plus how they were assembled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedProperties {
    properties: PropertyMap,
    chain: Vec<String>,
    origins: BTreeMap<String, Origin>,
}

impl MergedProperties {
    /// Apply a layer on top of the current properties.
    ///
    /// Lists already present are extended by a list in `layer`. Any other
    /// value replaces what was there.
    pub fn overlay(&mut self, layer: &PropertyMap, origin: Origin) {
        for (key, value) in layer {
            self.properties
                .entry(key.clone())
                .and_modify(|current| current.merge(value))
                .or_insert_with(|| value.clone());
            self.origins.insert(key.clone(), origin.clone());
        }
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Profile names in the order they were applied (root first)
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn origins(&self) -> &BTreeMap<String, Origin> {
        &self.origins
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn into_parts(self) -> (PropertyMap, Vec<String>, BTreeMap<String, Origin>) {
        (self.properties, self.chain, self.origins)
    }
}

/// Walks inheritance chains over a borrowed [`ProfileSet`].
pub struct ProfileResolver<'a> {
    profiles: &'a ProfileSet,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(profiles: &'a ProfileSet) -> Self {
        Self { profiles }
    }

    /// The inheritance chain of `target`, ordered root first.
    ///
    /// # Errors
    ///
    /// - `UnknownProfile` if the target or any parent is not loaded
    /// - `CyclicInheritance` if a name reappears while walking
    pub fn chain(&self, target: &str) -> Result<Vec<&'a Profile>> {
        let mut chain: Vec<&'a Profile> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut next = Some(target);
        let mut referenced_by: Option<&str> = None;

        while let Some(name) = next {
            if !visited.insert(name) {
                let start = chain
                    .iter()
                    .position(|p| p.name() == name)
                    .unwrap_or_default();
                let mut cycle: Vec<String> =
                    chain[start..].iter().map(|p| p.name().to_string()).collect();
                cycle.push(name.to_string());
                return Err(Error::CyclicInheritance { cycle });
            }

            let profile = self
                .profiles
                .get(name)
                .ok_or_else(|| Error::UnknownProfile {
                    name: name.to_string(),
                    referenced_by: referenced_by.map(str::to_string),
                })?;

            chain.push(profile);
            referenced_by = Some(profile.name());
            next = profile.parent();
        }

        chain.reverse();
        tracing::debug!(
            target_profile = target,
            chain = ?chain.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Resolved inheritance chain"
        );
        Ok(chain)
    }

    /// Merge a single profile and its ancestors over the base layer.
    pub fn resolve(&self, target: &str) -> Result<MergedProperties> {
        self.resolve_many(&[target.to_string()])
    }

    /// Merge several selected profiles, left to right.
    ///
    /// Each selection contributes its whole chain; a profile reached by more
    /// than one chain is applied once, at its first position. An empty
    /// selection yields only the base layer.
    pub fn resolve_many(&self, targets: &[String]) -> Result<MergedProperties> {
        let mut merged = MergedProperties::default();
        merged.overlay(self.profiles.base_properties(), Origin::Base);

        let mut applied: HashSet<&str> = HashSet::new();
        for target in targets {
            for profile in self.chain(target)? {
                if !applied.insert(profile.name()) {
                    continue;
                }
                tracing::debug!(profile = profile.name(), "Applying profile properties");
                merged.overlay(profile.properties(), Origin::Profile(profile.name().to_string()));
                merged.chain.push(profile.name().to_string());
            }
        }

        match targets {
            [] => tracing::debug!("No profile selected, using base properties only"),
            [single] => tracing::info!("Using profile '{}'", single),
            many => tracing::info!("Merging profiles: {:?}", many),
        }

        Ok(merged)
    }

    /// Check that every loaded profile has a complete, acyclic chain.
    pub fn check_all(&self) -> Result<()> {
        for name in self.profiles.names() {
            self.chain(name)?;
        }
        Ok(())
    }
}
