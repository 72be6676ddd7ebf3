//! The profiles command

use colored::Colorize;
use serde_json::json;
use tedlt_core::{Configuration, ProfileResolver};

use crate::error::Result;

/// Run the profiles command
pub fn run_profiles(config: &Configuration, json: bool) -> Result<()> {
    let profiles = &config.profiles;
    let resolver = ProfileResolver::new(profiles);
    let default_selection = profiles.default_selection();

    if json {
        let entries: Vec<serde_json::Value> = profiles
            .iter()
            .map(|profile| {
                let mut entry = json!({
                    "name": profile.name(),
                    "extends": profile.parent(),
                    "default": default_selection.iter().any(|d| d == profile.name()),
                    "properties": profile.properties().len(),
                });
                match resolver.chain(profile.name()) {
                    Ok(chain) => {
                        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
                        entry["chain"] = json!(names);
                    }
                    Err(e) => entry["error"] = json!(e.to_string()),
                }
                entry
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No profiles defined.");
        return Ok(());
    }

    println!("{}", "Profiles".bold());
    println!();
    for profile in profiles.iter() {
        let marker = if default_selection.iter().any(|d| d == profile.name()) {
            "*".yellow().bold().to_string()
        } else {
            " ".to_string()
        };
        match resolver.chain(profile.name()) {
            Ok(chain) => {
                let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
                println!(
                    "{} {:<16} {}",
                    marker,
                    profile.name().green(),
                    names.join(" -> ").dimmed()
                );
            }
            Err(e) => {
                println!(
                    "{} {:<16} {} {}",
                    marker,
                    profile.name().red(),
                    format!("{}:", e.kind()).red().bold(),
                    e
                );
            }
        }
    }
    Ok(())
}
