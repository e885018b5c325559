//! Engine implementation
//!
//! The engine resolves the style, then for every file the merged style
//! describes: loads the target, compares it against the expectation and
//! reports (check), patches in memory (dry-run) or patches and writes (fix).

use serde_json::Value;
use stylist_content::{Change, ChangeKind, CompareOptions, Comparison, DiffStats, Document, Format, unified_diff};
use stylist_fs::{NormalizedPath, io};

use super::report::{FileChange, Mode, Report};
use crate::Result;
use crate::config::Context;
use crate::style::{ResolvedStyle, StyleResolver};
use crate::violation::{Violation, ViolationCode};

/// Codes a comparison can produce, in reporting order
const CHANGE_CODES: [ViolationCode; 4] = [
    ViolationCode::MissingValues,
    ViolationCode::DifferentValues,
    ViolationCode::RecordsUpdate,
    ViolationCode::CommaMembers,
];

/// Checks and fixes the files of one project.
pub struct Engine<'a> {
    context: &'a Context,
}

impl<'a> Engine<'a> {
    pub fn new(context: &'a Context) -> Self {
        Self { context }
    }

    /// Resolve the project's style
    pub fn resolve(&self) -> ResolvedStyle {
        StyleResolver::new(self.context).resolve()
    }

    /// Resolve the style and enforce it
    pub fn run(&self, mode: Mode) -> Result<Report> {
        let style = self.resolve();
        self.run_with(&style, mode)
    }

    /// Enforce an already resolved style.
    ///
    /// Only I/O failures while writing a fixed file are errors; every other
    /// problem becomes a violation and the run moves on to the next file.
    pub fn run_with(&self, style: &ResolvedStyle, mode: Mode) -> Result<Report> {
        let mut report = Report::new(mode);
        report.violations.extend(style.violations.iter().cloned());

        if style.aborted {
            report.aborted = true;
            return Ok(report);
        }

        if self.context.materialize() {
            if let Err(e) = style.materialize(self.context.cache_dir()) {
                tracing::warn!(error = %e, "Could not materialize merged style");
            }
        }

        for (file, expectation) in &style.files {
            self.enforce_file(file, expectation, &style.options_for(file), &mut report)?;
        }
        self.check_presence(style, &mut report);

        tracing::info!(
            %mode,
            violations = report.violations.len(),
            fixed = report.fixed_count(),
            "Run finished"
        );
        Ok(report)
    }

    fn enforce_file(
        &self,
        file: &str,
        expectation: &Value,
        options: &CompareOptions,
        report: &mut Report,
    ) -> Result<()> {
        let Some(format) = Format::from_file_name(file) else {
            return Ok(());
        };
        let Some(path) = self.target_path(file, report) else {
            return Ok(());
        };

        if !path.is_file() {
            return self.create_file(file, &path, expectation, format, report);
        }

        let source = match io::read_text(&path) {
            Ok(source) => source,
            Err(e) => {
                report.violations.push(Violation::new(
                    file,
                    ViolationCode::TargetParse,
                    format!("Cannot read file: {e}"),
                ));
                return Ok(());
            }
        };

        let mut document = match Document::parse_as(&source, format) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(file, error = %e, "Target file does not parse, not fixing it");
                report.violations.push(Violation::new(
                    file,
                    ViolationCode::TargetParse,
                    format!("Cannot parse as {format}: {e}"),
                ));
                return Ok(());
            }
        };

        let comparison = document.compare(file, expectation, options);
        if comparison.is_empty() {
            tracing::debug!(file, "File matches the style");
            return Ok(());
        }

        let first = report.violations.len();
        report.violations.extend(describe(file, &document, &comparison));

        if !report.mode.patches() {
            return Ok(());
        }

        if let Err(e) = document.apply(&comparison.patch_delta()) {
            tracing::warn!(file, error = %e, "Could not patch file");
            return Ok(());
        }
        if !document.is_modified() {
            return Ok(());
        }

        report.changes.push(FileChange {
            file: file.to_string(),
            created: false,
            diff: document.diff(file),
            stats: document.diff_stats(),
        });

        if report.mode.writes() {
            io::write_text(&path, document.source())?;
            tracing::info!(%path, "Fixed file");
            for violation in &mut report.violations[first..] {
                violation.fixed = true;
            }
        }
        Ok(())
    }

    fn create_file(
        &self,
        file: &str,
        path: &NormalizedPath,
        expectation: &Value,
        format: Format,
        report: &mut Report,
    ) -> Result<()> {
        let document = match Document::from_value(expectation, format) {
            Ok(document) => document,
            Err(e) => {
                report.violations.push(Violation::new(
                    file,
                    ViolationCode::InvalidStyle,
                    format!("Cannot render expected content as {format}: {e}"),
                ));
                return Ok(());
            }
        };
        let content = document.source();

        let mut violation = Violation::new(file, ViolationCode::FileCreated, "File should be created from the style")
            .with_suggestion(content);

        if report.mode.patches() {
            report.changes.push(FileChange {
                file: file.to_string(),
                created: true,
                diff: unified_diff("", content, file),
                stats: DiffStats::compute("", content),
            });
        }
        if report.mode.writes() {
            io::write_text(path, content)?;
            tracing::info!(%path, "Created file");
            violation = violation.with_fixed(true);
        }

        report.violations.push(violation);
        Ok(())
    }

    /// The project path for `file`, or an invalid-style violation when the
    /// name points outside the project root.
    fn target_path(&self, file: &str, report: &mut Report) -> Option<NormalizedPath> {
        let path = self.context.root().join_within(file);
        if path.is_none() {
            tracing::warn!(file, "Ignoring file outside the project root");
            report.violations.push(Violation::new(
                file,
                ViolationCode::InvalidStyle,
                "File name must stay inside the project root",
            ));
        }
        path
    }

    fn check_presence(&self, style: &ResolvedStyle, report: &mut Report) {
        for (file, reason) in &style.settings.files.present {
            // Described files were already created or reported above
            if style.files.contains_key(file) {
                continue;
            }
            let Some(path) = self.target_path(file, report) else {
                continue;
            };
            if path.exists() {
                continue;
            }
            report.violations.push(Violation::new(
                file.as_str(),
                ViolationCode::FileShouldExist,
                with_reason("File should exist", reason),
            ));
        }

        for (file, reason) in &style.settings.files.absent {
            let Some(path) = self.target_path(file, report) else {
                continue;
            };
            if path.exists() {
                report.violations.push(Violation::new(
                    file.as_str(),
                    ViolationCode::FileShouldNotExist,
                    with_reason("File should not exist", reason),
                ));
            }
        }
    }
}

/// One violation per kind of change, each suggesting the content to add in
/// the target's own format.
fn describe(file: &str, document: &Document, comparison: &Comparison) -> Vec<Violation> {
    CHANGE_CODES
        .iter()
        .filter_map(|&code| {
            let changes: Vec<&Change> = comparison
                .changes
                .iter()
                .filter(|change| code_of(&change.kind) == code)
                .collect();
            if changes.is_empty() {
                return None;
            }

            let details: Vec<String> = changes.iter().map(|change| detail(change)).collect();
            let message = format!("{}: {}", label(code), details.join(", "));
            let subtree = comparison.subtree(|kind| code_of(kind) == code);

            let violation = Violation::new(file, code, message);
            Some(match document.render(&subtree) {
                Ok(suggestion) => violation.with_suggestion(suggestion),
                Err(_) => violation,
            })
        })
        .collect()
}

fn code_of(kind: &ChangeKind) -> ViolationCode {
    match kind {
        ChangeKind::Missing => ViolationCode::MissingValues,
        ChangeKind::Different { .. } | ChangeKind::Appended { .. } => ViolationCode::DifferentValues,
        ChangeKind::Records { .. } => ViolationCode::RecordsUpdate,
        ChangeKind::CommaMembers { .. } => ViolationCode::CommaMembers,
    }
}

fn label(code: ViolationCode) -> &'static str {
    match code {
        ViolationCode::MissingValues => "Missing values",
        ViolationCode::DifferentValues => "Different values",
        ViolationCode::RecordsUpdate => "Records to add or update",
        _ => "Missing members",
    }
}

fn detail(change: &Change) -> String {
    match &change.kind {
        ChangeKind::Records { added, updated } => {
            format!("{} ({} new, {} updated)", change.path, added.len(), updated.len())
        }
        ChangeKind::CommaMembers { added } => format!("{} (add {})", change.path, added.join(",")),
        ChangeKind::Appended { added } => format!("{} ({} to append)", change.path, added.len()),
        _ => change.path.to_string(),
    }
}

fn with_reason(message: &str, reason: &str) -> String {
    if reason.trim().is_empty() {
        message.to_string()
    } else {
        format!("{message}: {reason}")
    }
}
