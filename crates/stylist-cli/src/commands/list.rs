//! The ls command: what the merged style governs

use colored::Colorize;

use stylist_core::Engine;

use super::{Options, load_context};
use crate::error::{CliError, Result};

/// Run the ls command
pub fn run_ls(options: &Options) -> Result<()> {
    let context = load_context(options)?;
    let style = Engine::new(&context).resolve();

    for violation in &style.violations {
        eprintln!(
            "{}: {} {}",
            violation.file.cyan(),
            violation.code.to_string().red().bold(),
            violation.message
        );
    }
    if style.aborted {
        return Err(CliError::user("Style could not be resolved"));
    }

    println!("{}", "Styles".bold());
    for source in &style.sources {
        println!("  {}", source.dimmed());
    }

    println!();
    println!("{}", "Files".bold());
    if style.files.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for file in style.files.keys() {
        let exists = context.root().join(file).exists();
        let marker = if exists { "OK".green() } else { "MISSING".yellow() };
        println!("  {:<32} {}", file.green(), marker);
    }

    let settings = &style.settings.files;
    if !settings.present.is_empty() || !settings.absent.is_empty() {
        println!();
        println!("{}", "Presence".bold());
        for (file, reason) in &settings.present {
            println!("  {} {:<30} {}", "+".green(), file, reason.dimmed());
        }
        for (file, reason) in &settings.absent {
            println!("  {} {:<30} {}", "-".red(), file, reason.dimmed());
        }
    }

    Ok(())
}
