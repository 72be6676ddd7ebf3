//! The explain command

use colored::Colorize;
use tedlt_core::{Configuration, Engine, Error, Origin, ResolvedProperties};

use super::Invocation;
use crate::cli::SelectionArgs;
use crate::error::Result;

/// Run the explain command
///
/// Prints every resolved property with its origin, base variables included.
/// Schema violations are printed as warnings and do not fail the command.
pub fn run_explain(config: &Configuration, title: &str, selection: &SelectionArgs) -> Result<()> {
    let invocation = Invocation::prepare(config, title, selection);
    let engine = Engine::new(&config.profiles, &invocation.schema);
    let mut resolved = engine.resolve_properties(
        &selection.profiles,
        &invocation.context,
        &invocation.overrides,
    )?;

    let submitted = engine.submitted(resolved.properties.clone(), &resolved.origins);
    let mut warnings = Vec::new();
    match invocation.schema.validate(&submitted) {
        Ok(validated) => {
            for (key, value) in validated {
                if !submitted.contains_key(&key) {
                    resolved.origins.insert(key.clone(), Origin::SchemaDefault);
                    resolved.properties.insert(key, value);
                }
            }
        }
        Err(Error::Validation(report)) => {
            warnings.extend(report.iter().map(|v| format!("{}: {}", v.kind(), v)));
        }
        Err(other) => return Err(other.into()),
    }

    print!("{}", render(&resolved));
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    Ok(())
}

fn render(resolved: &ResolvedProperties) -> String {
    let mut out = String::new();
    let chain = if resolved.chain.is_empty() {
        "(base properties only)".to_string()
    } else {
        resolved.chain.join(" -> ")
    };
    out.push_str(&format!("{} {}\n", "Chain:".bold(), chain.cyan()));

    let width = resolved.properties.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in &resolved.properties {
        let origin = resolved
            .origins
            .get(key)
            .map(ToString::to_string)
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<width$} = {}  {}\n",
            key.green(),
            value,
            format!("[{}]", origin).dimmed(),
            width = width
        ));
    }
    out
}
