//! Command implementations for stylist CLI

pub mod check;
pub mod list;

use std::path::PathBuf;

use stylist_core::Context;
use stylist_fs::NormalizedPath;

use crate::error::{CliError, Result};

pub use check::{run_check, run_fix};
pub use list::run_ls;

/// Flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub project: PathBuf,
    pub offline: bool,
    pub styles: Vec<String>,
}

/// Build the run context: `stylist.toml` and the environment first, then
/// command-line overrides on top.
pub fn load_context(options: &Options) -> Result<Context> {
    if !options.project.is_dir() {
        return Err(CliError::user(format!(
            "Project directory not found: {}",
            options.project.display()
        )));
    }

    let mut context = Context::load(NormalizedPath::new(&options.project))?;
    if options.offline {
        context = context.with_offline(true);
    }
    if !options.styles.is_empty() {
        context = context.with_styles(options.styles.clone());
    }
    Ok(context)
}
