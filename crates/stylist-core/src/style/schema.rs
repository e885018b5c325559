//! Shape checks for style documents
//!
//! A style's top-level keys are either the reserved [`SECTION`] or target
//! file names. The reserved section is deserialized into typed structs;
//! file keys are checked by whichever format adapter claims the name.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use stylist_content::{CompareOptions, Format, adapter};
use stylist_fs::NormalizedPath;

use crate::violation::{Violation, ViolationCode};

/// Top-level key configuring stylist itself
pub const SECTION: &str = "stylist";

/// A string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// The reserved `[stylist]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylistSection {
    /// Oldest stylist release able to apply the style
    pub minimum_version: Option<String>,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub files: FilesSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesSection {
    /// Further styles to resolve after this one
    #[serde(default)]
    pub include: OneOrMany,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesSection {
    /// File name -> reason it must exist
    #[serde(default)]
    pub present: BTreeMap<String, String>,
    /// File name -> reason it must not exist
    #[serde(default)]
    pub absent: BTreeMap<String, String>,
    /// Per-file comparison options
    #[serde(flatten)]
    pub options: BTreeMap<String, FileOptions>,
}

/// Comparison settings for one target file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOptions {
    /// Dotted keys holding comma-joined sets
    #[serde(default)]
    pub comma_separated_values: Vec<String>,
    /// Sequence path -> record-relative unique key
    #[serde(default)]
    pub unique_keys: BTreeMap<String, String>,
}

impl FileOptions {
    pub fn compare_options(&self) -> CompareOptions {
        let mut options = CompareOptions::new();
        for key in &self.comma_separated_values {
            options = options.with_comma_separated(key);
        }
        for (sequence, key) in &self.unique_keys {
            options = options.with_unique_key(sequence, key);
        }
        options
    }
}

impl StylistSection {
    /// Deserialize the reserved section, with the error text on failure.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        serde_json::from_value(value.clone()).map_err(|e| e.to_string())
    }
}

/// Validate one style document, returning what is wrong with it.
///
/// `source` names the style in the returned violations.
pub fn validate(source: &str, tree: &Value) -> Vec<Violation> {
    match tree.as_object() {
        Some(map) => map
            .iter()
            .flat_map(|(key, value)| validate_entry(source, key, value))
            .collect(),
        None => vec![Violation::new(
            source,
            ViolationCode::InvalidStyle,
            "Style document must be a table",
        )],
    }
}

/// Validate one top-level entry of a style document.
pub fn validate_entry(source: &str, key: &str, value: &Value) -> Vec<Violation> {
    if key == SECTION {
        let message = match StylistSection::from_value(value) {
            Err(message) => Some(format!("Invalid [{SECTION}] section: {message}")),
            Ok(_) => check_minimum_version(value),
        };
        return message
            .map(|message| Violation::new(source, ViolationCode::InvalidStyle, message))
            .into_iter()
            .collect();
    }

    let Some(format) = Format::from_file_name(key) else {
        return vec![Violation::new(
            source,
            ViolationCode::UnknownFile,
            format!("No handler for file \"{key}\""),
        )];
    };

    if NormalizedPath::new(key).escapes() {
        return vec![Violation::new(
            source,
            ViolationCode::InvalidStyle,
            format!("\"{key}\": file name must stay inside the project root"),
        )];
    }

    if !value.is_object() {
        return vec![Violation::new(
            source,
            ViolationCode::InvalidStyle,
            format!("\"{key}\": expected a table of {format} content"),
        )];
    }

    adapter(format)
        .validate(value)
        .into_iter()
        .map(|problem| {
            Violation::new(
                source,
                ViolationCode::InvalidStyle,
                format!("\"{key}\": {problem}"),
            )
        })
        .collect()
}

fn check_minimum_version(section: &Value) -> Option<String> {
    let raw = section.get("minimum_version")?.as_str()?;
    semver::Version::parse(raw)
        .err()
        .map(|e| format!("Invalid minimum_version '{raw}': {e}"))
}
