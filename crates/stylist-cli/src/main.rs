//! stylist CLI
//!
//! Checks and fixes a project's configuration files against shared styles.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::Options;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: could not set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let options = Options {
        project: match cli.project {
            Some(path) => path,
            None => std::env::current_dir()?,
        },
        offline: cli.offline,
        styles: cli.styles,
    };

    match cli.command {
        Some(Commands::Check) => commands::run_check(&options),
        Some(Commands::Fix { dry_run }) => commands::run_fix(&options, dry_run),
        Some(Commands::Ls) => commands::run_ls(&options),
        None => {
            println!("{} Configuration style checker", "stylist".green().bold());
            println!();
            println!("Run {} for available commands.", "stylist --help".cyan());
            Ok(())
        }
    }
}
