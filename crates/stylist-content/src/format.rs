//! Format detection and the adapter trait

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compare::{CompareOptions, Normalizer, normalize_scalar};
use crate::error::Result;

/// Supported target-file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Toml,
    Json,
    Yaml,
    Ini,
    Text,
}

/// Section-based files known by name rather than extension.
const INI_FILE_NAMES: &[&str] = &[".editorconfig", ".flake8", ".pylintrc", ".coveragerc", "pylintrc"];

/// Line-oriented files known by name rather than extension.
const TEXT_FILE_NAMES: &[&str] = &[".gitignore", ".dockerignore", ".npmignore", "CODEOWNERS"];

impl Format {
    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "ini" | "cfg" => Some(Self::Ini),
            "txt" | "in" => Some(Self::Text),
            _ => None,
        }
    }

    /// Detect format from a target file name, which may include directories.
    ///
    /// Well-known dotfiles are matched by name first; otherwise the text after
    /// the last dot decides. A leading dot alone is not an extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

        if INI_FILE_NAMES.contains(&base) {
            return Some(Self::Ini);
        }
        if TEXT_FILE_NAMES.contains(&base) {
            return Some(Self::Text);
        }

        let (stem, ext) = base.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(ext)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Ini => "INI",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-format load/serialize/patch behavior.
///
/// `patch` works on the live text rather than on a plain value tree, so
/// whatever the delta does not mention keeps its formatting, comments and
/// ordering where the format allows it.
pub trait FormatAdapter: Send + Sync {
    /// Format identifier
    fn format(&self) -> Format;

    /// Parse source text into a value tree
    fn load(&self, source: &str) -> Result<Value>;

    /// Render a value tree as a fresh document
    fn serialize(&self, tree: &Value) -> Result<String>;

    /// Apply `delta` onto `source`, returning the new text
    fn patch(&self, source: &str, delta: &Value) -> Result<String>;

    /// Shape problems in a style's expectation for a file of this format
    fn validate(&self, expectation: &Value) -> Vec<String> {
        if expectation.is_object() {
            Vec::new()
        } else {
            vec![format!("{} file expectation must be a table", self.format())]
        }
    }

    /// Scalar normalization used by the comparator
    fn normalizer(&self) -> Normalizer {
        normalize_scalar
    }

    /// Comparison options this format applies to `file_name` by default,
    /// given the style's expectation for it
    fn default_options(&self, _file_name: &str, _expectation: &Value) -> CompareOptions {
        CompareOptions::default()
    }
}
