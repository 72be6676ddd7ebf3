//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// tedlt - Resolve ticket requests from layered profiles
#[derive(Parser, Debug)]
#[command(name = "tedlt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration document to load; repeat to layer several, later wins
    ///
    /// Defaults to <config dir>/tedlt/tedlt.toml and ./tedlt.toml.
    #[arg(short, long = "config", value_name = "PATH", global = true)]
    pub config: Vec<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Profile selection and ad hoc overrides shared by resolving commands
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionArgs {
    /// Profile to apply; repeat to merge several, later wins
    #[arg(short = 'p', long = "profile", value_name = "NAME")]
    pub profiles: Vec<String>,

    /// Override a property, applied after profiles and TEDLT_* variables
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Reject fields the schema does not declare
    #[arg(long)]
    pub strict: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve a ticket request and print it
    ///
    /// Examples:
    ///   tedlt resolve "Fix login timeout" -p bug
    ///   tedlt resolve "Spike" -p work -s story_points=3 --json
    Resolve {
        /// Ticket title
        title: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the issue-creation payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every resolved property and the layer it came from
    Explain {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Title used for {{ title }} references
        #[arg(long, default_value = "")]
        title: String,
    },

    /// List loaded profiles and their inheritance chains
    Profiles {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   tedlt completions bash > ~/.local/share/bash-completion/completions/tedlt
    ///   tedlt completions zsh > ~/.zfunc/_tedlt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse a `KEY=VALUE` override. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
