//! Command implementations for tedlt-cli

pub mod explain;
pub mod profiles;
pub mod resolve;

pub use explain::run_explain;
pub use profiles::run_profiles;
pub use resolve::run_resolve;

use tedlt_core::{Configuration, InvocationContext, Overrides, Schema};

use crate::cli::SelectionArgs;

/// Everything a resolving command needs besides the configuration.
pub(crate) struct Invocation {
    pub context: InvocationContext,
    pub overrides: Overrides,
    pub schema: Schema,
}

impl Invocation {
    /// Snapshot the process environment and apply the command-line selection.
    pub fn prepare(config: &Configuration, title: &str, selection: &SelectionArgs) -> Self {
        Self::with_env(config, title, selection, std::env::vars())
    }

    pub fn with_env<I>(
        config: &Configuration,
        title: &str,
        selection: &SelectionArgs,
        env: I,
    ) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: Vec<(String, String)> = env.into_iter().collect();
        let mut overrides = Overrides::from_env(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        for (key, value) in &selection.set {
            overrides = overrides.with_cli(key.as_str(), value.as_str());
        }

        Self {
            context: InvocationContext::new(title).with_env(env),
            overrides,
            schema: config.effective_schema(selection.strict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tedlt_core::PropertyValue;

    #[test]
    fn prepare_collects_overrides_and_context() {
        let selection = SelectionArgs {
            profiles: vec![],
            set: vec![("priority.name".into(), "Low".into())],
            strict: true,
        };
        let env = vec![
            ("TEDLT_PROJECT_KEY".to_string(), "ENV".to_string()),
            ("USER".to_string(), "alice".to_string()),
        ];

        let invocation = Invocation::with_env(&Configuration::default(), "t", &selection, env);

        assert_eq!(invocation.overrides.env()["project_key"], PropertyValue::from("ENV"));
        assert_eq!(invocation.overrides.cli()["priority.name"], PropertyValue::from("Low"));
        assert_eq!(invocation.context.lookup("env.USER").as_deref(), Some("alice"));
        assert!(invocation.schema.strict);
    }
}
