//! Profile documents and the loaded profile set

use std::collections::BTreeMap;

use crate::value::{PropertyMap, PropertyValue};
use crate::{Error, Result};

/// Profile selected when none is given and no `default_profile` is declared
pub const DEFAULT_PROFILE: &str = "default";

/// A named bundle of ticket properties, optionally extending a parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    parent: Option<String>,
    properties: PropertyMap,
}

impl Profile {
    /// Create an empty root profile. The name must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_document("profile names must not be empty"));
        }
        Ok(Self {
            name,
            parent: None,
            properties: PropertyMap::new(),
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: PropertyMap) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }
}

/// Every profile available to one resolution, plus the shared base layer.
///
/// Read-only once built; resolutions borrow it and keep their own state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
    base: PropertyMap,
    default_profile: Option<String>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, replacing any profile with the same name.
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.insert(profile);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> + '_ {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Properties shared by every profile, applied below the root of each chain
    pub fn base_properties(&self) -> &PropertyMap {
        &self.base
    }

    pub fn set_base_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.base.insert(key.into(), value.into());
    }

    pub fn extend_base_properties(&mut self, properties: PropertyMap) {
        self.base.extend(properties);
    }

    pub fn default_profile(&self) -> Option<&str> {
        self.default_profile.as_deref()
    }

    pub fn set_default_profile(&mut self, name: impl Into<String>) {
        self.default_profile = Some(name.into());
    }

    /// Profiles to use when the caller selected none.
    ///
    /// The declared `default_profile` wins; otherwise a profile named
    /// `default` is used when present; otherwise nothing is selected.
    pub fn default_selection(&self) -> Vec<String> {
        if let Some(name) = &self.default_profile {
            return vec![name.clone()];
        }
        if self.contains(DEFAULT_PROFILE) {
            return vec![DEFAULT_PROFILE.to_string()];
        }
        Vec::new()
    }
}
