//! Check and fix command implementations

use colored::Colorize;

use stylist_core::{Engine, Mode, Report, Violation};

use super::{Options, load_context};
use crate::error::{CliError, Result};

/// Run the check command
///
/// Reports every discrepancy without touching any file.
pub fn run_check(options: &Options) -> Result<()> {
    println!("{} Checking project files...", "=>".blue().bold());
    run_mode(options, Mode::Check)
}

/// Run the fix command
///
/// Patches the project files, or with `dry_run` only shows the diffs.
pub fn run_fix(options: &Options, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("{} Previewing fixes (dry run)...", "=>".blue().bold());
        run_mode(options, Mode::DryRun)
    } else {
        println!("{} Fixing project files...", "=>".blue().bold());
        run_mode(options, Mode::Fix)
    }
}

fn run_mode(options: &Options, mode: Mode) -> Result<()> {
    let context = load_context(options)?;
    let report = Engine::new(&context).run(mode)?;

    print_report(&report);

    if report.aborted {
        return Err(CliError::user("Style could not be resolved; no file was checked"));
    }
    let remaining = report.unfixed().count();
    if remaining > 0 {
        return Err(CliError::Violations { count: remaining });
    }
    Ok(())
}

fn print_report(report: &Report) {
    for violation in &report.violations {
        print_violation(violation);
    }

    if report.mode == Mode::DryRun {
        for change in &report.changes {
            println!();
            let action = if change.created { "create" } else { "modify" };
            println!(
                "{} {} ({}, +{} -{})",
                "~".yellow().bold(),
                change.file.cyan(),
                action,
                change.stats.added,
                change.stats.removed
            );
            for line in change.diff.lines() {
                if line.starts_with("+++") || line.starts_with("---") {
                    println!("{}", line.bold());
                } else if line.starts_with('+') {
                    println!("{}", line.green());
                } else if line.starts_with('-') {
                    println!("{}", line.red());
                } else if line.starts_with("@@") {
                    println!("{}", line.cyan());
                } else {
                    println!("{line}");
                }
            }
        }
    }

    println!();
    if report.aborted {
        println!("{} Style resolution failed.", "ABORTED".red().bold());
    } else if report.violations.is_empty() {
        println!("{} All files match the style.", "OK".green().bold());
    } else {
        let fixed = report.fixed_count();
        let remaining = report.violations.len() - fixed;
        if fixed > 0 {
            println!("{} {} violation(s) fixed.", "FIXED".green().bold(), fixed);
        }
        if remaining > 0 {
            println!(
                "{} {} violation(s) remaining.",
                "DRIFTED".yellow().bold(),
                remaining
            );
            if report.mode == Mode::Check {
                println!("Run {} to repair.", "stylist fix".cyan());
            }
        }
    }
}

fn print_violation(violation: &Violation) {
    let code = violation.code.to_string();
    let code = if violation.fixed {
        code.green().bold()
    } else if violation.code.is_style_problem() {
        code.red().bold()
    } else {
        code.yellow().bold()
    };

    print!("{}: {} {}", violation.file.cyan(), code, violation.message);
    if violation.fixed {
        print!(" {}", "(fixed)".green());
    }
    println!();

    if violation.fixed {
        return;
    }
    if let Some(suggestion) = violation.suggestion.as_deref() {
        for line in suggestion.lines() {
            println!("    {}", line.dimmed());
        }
    }
}
