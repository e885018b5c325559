//! Enforcement of a resolved style on a project
//!
//! - **check**: report every discrepancy as a [`Violation`](crate::Violation)
//! - **fix**: patch target files in place, preserving untouched content
//! - **dry-run**: compute the patches and their diffs without writing

mod engine;
mod report;

pub use engine::Engine;
pub use report::{FileChange, Mode, Report};
