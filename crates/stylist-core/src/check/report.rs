//! Run modes and what a run reports

use std::fmt;

use stylist_content::DiffStats;

use crate::violation::{Violation, ViolationCode};

/// What a run does with the discrepancies it finds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Report only
    #[default]
    Check,
    /// Patch target files on disk
    Fix,
    /// Compute patches and their diffs without writing
    DryRun,
}

impl Mode {
    /// Whether patches are computed at all
    pub fn patches(self) -> bool {
        !matches!(self, Self::Check)
    }

    /// Whether patched files are written
    pub fn writes(self) -> bool {
        matches!(self, Self::Fix)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Fix => write!(f, "fix"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}

/// A target file patched (or, in dry-run, patchable) by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub file: String,
    /// The file did not exist before
    pub created: bool,
    /// Unified diff from the old to the new text
    pub diff: String,
    pub stats: DiffStats,
}

/// Outcome of one run
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub mode: Mode,
    pub violations: Vec<Violation>,
    pub changes: Vec<FileChange>,
    /// Resolution failed; no file was checked
    pub aborted: bool,
}

impl Report {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Violations still standing after the run
    pub fn unfixed(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.fixed)
    }

    pub fn fixed_count(&self) -> usize {
        self.violations.iter().filter(|v| v.fixed).count()
    }

    /// Nothing left to do
    pub fn is_clean(&self) -> bool {
        !self.aborted && self.unfixed().next().is_none()
    }

    /// Violations with the given code
    pub fn with_code(&self, code: ViolationCode) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flags() {
        assert!(!Mode::Check.patches());
        assert!(Mode::DryRun.patches() && !Mode::DryRun.writes());
        assert!(Mode::Fix.writes());
    }

    #[test]
    fn test_clean_ignores_fixed() {
        let mut report = Report::new(Mode::Fix);
        report.violations.push(
            Violation::new("a.toml", ViolationCode::MissingValues, "Missing values").with_fixed(true),
        );
        assert!(report.is_clean());
        assert_eq!(report.fixed_count(), 1);

        report
            .violations
            .push(Violation::new("b.toml", ViolationCode::TargetParse, "Cannot parse"));
        assert!(!report.is_clean());
        assert_eq!(report.with_code(ViolationCode::TargetParse).count(), 1);
    }

    #[test]
    fn test_aborted_is_never_clean() {
        let report = Report {
            aborted: true,
            ..Report::new(Mode::Check)
        };
        assert!(!report.is_clean());
    }
}
