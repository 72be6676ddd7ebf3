//! tedlt CLI
//!
//! Resolves ticket requests from layered profile documents. Nothing is
//! submitted; the resolved request is printed for inspection or piping.

mod cli;
mod commands;
mod error;
mod loader;

use std::io;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        match e.kind() {
            Some(kind) => eprintln!("{}: {}: {}", "error".red().bold(), kind, e),
            None => eprintln!("{}: {}", "error".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "tedlt", &mut io::stdout());
            Ok(())
        }
        Commands::Profiles { json } => {
            let config = load(&cli.config)?;
            commands::run_profiles(&config, json)
        }
        Commands::Resolve {
            title,
            selection,
            json,
        } => {
            let config = load(&cli.config)?;
            commands::run_resolve(&config, &title, &selection, json)
        }
        Commands::Explain { selection, title } => {
            let config = load(&cli.config)?;
            commands::run_explain(&config, &title, &selection)
        }
    }
}

fn load(explicit: &[std::path::PathBuf]) -> Result<tedlt_core::Configuration> {
    let cwd = std::env::current_dir()?;
    loader::load_configuration(explicit, &cwd)
}

/// Log to stderr. `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbose)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    if verbose {
        tracing::debug!("Verbose mode enabled");
    }
}
