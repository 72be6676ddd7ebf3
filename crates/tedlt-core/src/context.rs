//! Invocation context available to property templates
//!
//! Context variables are looked up before property keys:
//! - `{{ title }}` - ticket title supplied on the command line
//! - `{{ profile }}` - last selected profile name (empty when none)
//! - `{{ date }}` - invocation date (YYYY-MM-DD, UTC)
//! - `{{ datetime }}` - invocation timestamp (RFC 3339, UTC)
//! - `{{ env.NAME }}` - environment variable snapshot
//! - `{{ vars.NAME }}` - ad hoc variables supplied by the caller

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

/// Runtime values captured once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    title: String,
    profile: Option<String>,
    now: DateTime<Utc>,
    env: BTreeMap<String, String>,
    vars: BTreeMap<String, String>,
}

impl InvocationContext {
    /// Create a context for a ticket title, timestamped now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            profile: None,
            now: Utc::now(),
            env: BTreeMap::new(),
            vars: BTreeMap::new(),
        }
    }

    /// Pin the timestamp used by `date` and `datetime`.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Snapshot a set of environment variables, e.g. `std::env::vars()`.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Resolve a context variable, or `None` if the name is not one.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name.split_once('.') {
            Some(("env", key)) => self.env.get(key).cloned(),
            Some(("vars", key)) => self.vars.get(key).cloned(),
            Some(_) => None,
            None => match name {
                "title" => Some(self.title.clone()),
                "profile" => Some(self.profile.clone().unwrap_or_default()),
                "date" => Some(self.now.format("%Y-%m-%d").to_string()),
                "datetime" => Some(self.now.to_rfc3339_opts(SecondsFormat::Secs, true)),
                _ => None,
            },
        }
    }

    /// Whether `name` is served by the context rather than by a property.
    pub fn provides(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
