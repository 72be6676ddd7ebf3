//! The resolve command

use colored::Colorize;
use tedlt_core::{Configuration, Engine, Resolution};

use super::Invocation;
use crate::cli::SelectionArgs;
use crate::error::Result;

/// Run the resolve command
pub fn run_resolve(
    config: &Configuration,
    title: &str,
    selection: &SelectionArgs,
    json: bool,
) -> Result<()> {
    let invocation = Invocation::prepare(config, title, selection);
    let resolution = Engine::new(&config.profiles, &invocation.schema).resolve(
        &selection.profiles,
        &invocation.context,
        &invocation.overrides,
    )?;

    if json {
        let payload = resolution.request.to_payload()?;
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", render(&resolution));
    }
    Ok(())
}

fn render(resolution: &Resolution) -> String {
    let request = &resolution.request;
    let mut out = String::new();

    out.push_str(&format!("{} {}\n", "Title:".bold(), request.title()));
    if !resolution.chain.is_empty() {
        out.push_str(&format!(
            "{} {}\n",
            "Profiles:".bold(),
            resolution.chain.join(" -> ").cyan()
        ));
    }
    if let Some(url) = request.jira_url() {
        out.push_str(&format!("{} {}\n", "Jira:".bold(), url));
    }
    out.push_str(&format!("{}\n", "Fields:".bold()));

    let width = request.fields().keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, value) in request.fields() {
        out.push_str(&format!("  {:<width$} = {}\n", key.green(), value, width = width));
    }
    out
}
