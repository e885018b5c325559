//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// stylist - Keep configuration files in line with a shared style
#[derive(Parser, Debug)]
#[command(name = "stylist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Never touch the network; remote styles come from the cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Project root (defaults to the current directory)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Style reference to use instead of the configured ones (repeatable)
    #[arg(short, long = "style", global = true, value_name = "REF")]
    pub styles: Vec<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Report every file that does not match the style
    Check,

    /// Apply the style to the project files
    Fix {
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the styles in use and the files they govern
    Ls,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_fix_dry_run() {
        let cli = Cli::parse_from(["stylist", "fix", "--dry-run"]);
        assert_eq!(cli.command, Some(Commands::Fix { dry_run: true }));
        assert!(!cli.offline);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "stylist", "check", "--offline", "-v", "--style", "gh://acme/styles/base",
            "--style", "./local",
        ]);
        assert_eq!(cli.command, Some(Commands::Check));
        assert!(cli.offline);
        assert!(cli.verbose);
        assert_eq!(cli.styles, vec!["gh://acme/styles/base", "./local"]);
    }

    #[test]
    fn project_flag() {
        let cli = Cli::parse_from(["stylist", "--project", "/tmp/app", "ls"]);
        assert_eq!(cli.project, Some(PathBuf::from("/tmp/app")));
        assert_eq!(cli.command, Some(Commands::Ls));
    }
}
