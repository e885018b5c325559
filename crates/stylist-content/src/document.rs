//! Unified Document type

use serde_json::Value;

use crate::compare::{CompareOptions, Comparator, Comparison};
use crate::diff::{DiffStats, unified_diff};
use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};
use crate::handlers::adapter;

/// A target file's text together with its parsed value tree.
///
/// Patches go through the format adapter, so the text keeps whatever the
/// delta did not touch.
pub struct Document {
    /// Source as first parsed (for is_modified and diffs)
    original_source: String,
    /// Current source after any applied deltas
    source: String,
    value: Value,
    adapter: &'static dyn FormatAdapter,
}

impl Document {
    /// Parse with an explicit format
    pub fn parse_as(source: &str, format: Format) -> Result<Self> {
        let adapter = adapter(format);
        let value = adapter.load(source)?;

        Ok(Self {
            original_source: source.to_string(),
            source: source.to_string(),
            value,
            adapter,
        })
    }

    /// Parse a target file, choosing the format from its name
    pub fn parse_file(file_name: &str, source: &str) -> Result<Self> {
        let format = Format::from_file_name(file_name)
            .ok_or_else(|| Error::UnsupportedFormat(file_name.to_string()))?;
        Self::parse_as(source, format)
    }

    /// Build a new document from a value tree
    pub fn from_value(tree: &Value, format: Format) -> Result<Self> {
        let mut doc = Self::parse_as("", format)?;
        doc.source = doc.adapter.serialize(tree)?;
        doc.value = doc.adapter.load(&doc.source)?;
        Ok(doc)
    }

    pub fn format(&self) -> Format {
        self.adapter.format()
    }

    pub fn adapter(&self) -> &'static dyn FormatAdapter {
        self.adapter
    }

    /// Current source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current parsed value tree
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Compare a desired tree against this document.
    ///
    /// `options` are layered over the adapter's defaults for `file_name`.
    pub fn compare(&self, file_name: &str, desired: &Value, options: &CompareOptions) -> Comparison {
        let mut effective = self.adapter.default_options(file_name, desired);
        effective.extend(options);
        Comparator::new(&effective)
            .with_normalizer(self.adapter.normalizer())
            .compare(desired, &self.value)
    }

    /// Apply a delta through the adapter's patch routine
    pub fn apply(&mut self, delta: &Value) -> Result<()> {
        let source = self.adapter.patch(&self.source, delta)?;
        self.value = self.adapter.load(&source)?;
        self.source = source;
        Ok(())
    }

    /// Render a delta in this document's format, for suggestions
    pub fn render(&self, tree: &Value) -> Result<String> {
        self.adapter.serialize(tree)
    }

    /// Check if the source differs from what was parsed
    pub fn is_modified(&self) -> bool {
        self.source != self.original_source
    }

    /// Unified diff of all applied deltas
    pub fn diff(&self, label: &str) -> String {
        unified_diff(&self.original_source, &self.source, label)
    }

    pub fn diff_stats(&self) -> DiffStats {
        DiffStats::compute(&self.original_source, &self.source)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("format", &self.format())
            .field("modified", &self.is_modified())
            .finish()
    }
}
