//! INI adapter with a line-preserving document model
//!
//! Every physical line is kept verbatim unless a patch rewrites that exact
//! entry, so comments, blank lines and separator spacing survive. Keys
//! before the first section header form the top section and load as
//! root-level scalars. Indented lines following an entry continue its
//! value, joined with `\n`.

use serde_json::{Map, Value};

use crate::compare::{CompareOptions, Normalizer, normalize_scalar};
use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};
use crate::path::KeyPath;
use crate::value::{empty_map, is_scalar, scalar_text};

const NEW_SEPARATOR: &str = " = ";
const DEFAULT_INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Blank(String),
    Comment(String),
    Section {
        raw: String,
        name: String,
    },
    Entry {
        raw: Vec<String>,
        key: String,
        separator: String,
        value: String,
    },
}

impl Line {
    fn raw(&self) -> Vec<&str> {
        match self {
            Line::Blank(text) | Line::Comment(text) => vec![text.as_str()],
            Line::Section { raw, .. } => vec![raw.as_str()],
            Line::Entry { raw, .. } => raw.iter().map(String::as_str).collect(),
        }
    }

    fn entry(key: &str, separator: &str, value: &str, indent: &str) -> Self {
        let mut parts = value.split('\n');
        let first = parts.next().unwrap_or_default();
        let head = if first.is_empty() {
            format!("{key}{}", separator.trim_end())
        } else {
            format!("{key}{separator}{first}")
        };
        let mut raw = vec![head];
        raw.extend(parts.map(|part| format!("{indent}{part}")));

        Line::Entry {
            raw,
            key: key.to_string(),
            separator: separator.to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_entry(text: &str) -> Option<Line> {
    let position = text.find(['=', ':'])?;
    let (head, tail) = text.split_at(position);
    let key = head.trim();
    if key.is_empty() {
        return None;
    }

    let after = &tail[1..];
    let separator_start = head.trim_end().len();
    let separator_end = position + 1 + (after.len() - after.trim_start().len());

    Some(Line::Entry {
        raw: vec![text.to_string()],
        key: key.to_string(),
        separator: text[separator_start..separator_end].to_string(),
        value: after.trim().to_string(),
    })
}

fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

/// A parsed INI file that renders back byte-for-byte until edited.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    lines: Vec<Line>,
    trailing_newline: bool,
}

impl IniDocument {
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines: Vec<Line> = Vec::new();

        for (index, text) in source.lines().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                lines.push(Line::Blank(text.to_string()));
                continue;
            }
            if trimmed.starts_with(['#', ';']) {
                lines.push(Line::Comment(text.to_string()));
                continue;
            }
            if text.starts_with([' ', '\t']) {
                if let Some(Line::Entry { raw, value, .. }) = lines.last_mut() {
                    raw.push(text.to_string());
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }
            if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                lines.push(Line::Section {
                    raw: text.to_string(),
                    name: inner.trim().to_string(),
                });
                continue;
            }

            let entry = parse_entry(text).ok_or_else(|| {
                Error::parse(
                    "INI",
                    format!("line {}: expected a section header or 'key = value'", index + 1),
                )
            })?;
            lines.push(entry);
        }

        Ok(Self {
            lines,
            trailing_newline: source.is_empty() || source.ends_with('\n'),
        })
    }

    /// Top-section keys as root scalars, sections as maps of strings.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        let mut section: Option<&str> = None;

        for line in &self.lines {
            match line {
                Line::Section { name, .. } => {
                    section = Some(name.as_str());
                    let slot = root.entry(name.clone()).or_insert_with(empty_map);
                    if !slot.is_object() {
                        *slot = empty_map();
                    }
                }
                Line::Entry { key, value, .. } => {
                    let text = Value::String(value.clone());
                    match section {
                        None => {
                            root.insert(key.clone(), text);
                        }
                        Some(name) => {
                            if let Some(Value::Object(map)) = root.get_mut(name) {
                                map.insert(key.clone(), text);
                            }
                        }
                    }
                }
                Line::Blank(_) | Line::Comment(_) => {}
            }
        }

        Value::Object(root)
    }

    /// Set `key` in `section` (`None` for the top section).
    ///
    /// An existing entry is rewritten in place keeping its separator and
    /// continuation indent. A new entry goes after the last entry of its
    /// section; a missing section is appended at the end.
    pub fn set(&mut self, section: Option<&str>, key: &str, value: &str) {
        if let Some(index) = self.find_entry(section, key) {
            if let Line::Entry {
                raw,
                separator,
                value: current,
                ..
            } = &self.lines[index]
            {
                if current == value {
                    return;
                }
                let indent = raw
                    .get(1)
                    .map(|line| leading_whitespace(line))
                    .unwrap_or(DEFAULT_INDENT)
                    .to_string();
                let separator = separator.clone();
                self.lines[index] = Line::entry(key, &separator, value, &indent);
            }
            return;
        }

        let line = Line::entry(key, NEW_SEPARATOR, value, DEFAULT_INDENT);
        match (self.insertion_point(section), section) {
            (Some(index), _) => {
                let before_header = matches!(self.lines.get(index), Some(Line::Section { .. }));
                self.lines.insert(index, line);
                if section.is_none() && before_header {
                    self.lines.insert(index + 1, Line::Blank(String::new()));
                }
            }
            (None, Some(name)) => {
                self.push_section(name);
                self.lines.push(line);
            }
            (None, None) => self.lines.push(line),
        }
    }

    /// Append an empty `[name]` section unless one exists.
    pub fn ensure_section(&mut self, name: &str) {
        let exists = self
            .lines
            .iter()
            .any(|line| matches!(line, Line::Section { name: n, .. } if n == name));
        if !exists {
            self.push_section(name);
        }
    }

    pub fn render(&self) -> String {
        let mut text = self
            .lines
            .iter()
            .flat_map(|line| line.raw())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline && !text.is_empty() {
            text.push('\n');
        }
        text
    }

    fn push_section(&mut self, name: &str) {
        if self
            .lines
            .last()
            .is_some_and(|line| !matches!(line, Line::Blank(_)))
        {
            self.lines.push(Line::Blank(String::new()));
        }
        self.lines.push(Line::Section {
            raw: format!("[{name}]"),
            name: name.to_string(),
        });
    }

    /// The section each line belongs to; a header belongs to itself.
    fn owners(&self) -> Vec<Option<&str>> {
        let mut current = None;
        self.lines
            .iter()
            .map(|line| {
                if let Line::Section { name, .. } = line {
                    current = Some(name.as_str());
                }
                current
            })
            .collect()
    }

    fn find_entry(&self, section: Option<&str>, key: &str) -> Option<usize> {
        let owners = self.owners();
        self.lines
            .iter()
            .enumerate()
            .rev()
            .find(|(index, line)| {
                owners[*index] == section && matches!(line, Line::Entry { key: k, .. } if k == key)
            })
            .map(|(index, _)| index)
    }

    fn insertion_point(&self, section: Option<&str>) -> Option<usize> {
        let owners = self.owners();
        let mut found = None;
        for (index, line) in self.lines.iter().enumerate() {
            if owners[index] == section && matches!(line, Line::Entry { .. } | Line::Section { .. }) {
                found = Some(index + 1);
            }
        }

        match (found, section) {
            (Some(index), _) => Some(index),
            (None, None) => Some(
                self.lines
                    .iter()
                    .position(|line| matches!(line, Line::Section { .. }))
                    .unwrap_or(self.lines.len()),
            ),
            (None, Some(_)) => None,
        }
    }
}

/// Adapter for INI-style files (`setup.cfg`, `tox.ini`, `.editorconfig`)
#[derive(Debug, Default)]
pub struct IniAdapter;

impl IniAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FormatAdapter for IniAdapter {
    fn format(&self) -> Format {
        Format::Ini
    }

    fn load(&self, source: &str) -> Result<Value> {
        Ok(IniDocument::parse(source)?.to_value())
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        self.patch("", tree)
    }

    fn patch(&self, source: &str, delta: &Value) -> Result<String> {
        let Value::Object(map) = delta else {
            return Err(Error::NotAMap {
                path: String::new(),
            });
        };

        let mut doc = IniDocument::parse(source)?;
        for (key, want) in map {
            match want {
                Value::Object(entries) => {
                    if entries.is_empty() {
                        doc.ensure_section(key);
                    }
                    for (name, value) in entries {
                        doc.set(Some(key), name, &ini_text(value)?);
                    }
                }
                other => doc.set(None, key, &ini_text(other)?),
            }
        }
        Ok(doc.render())
    }

    fn validate(&self, expectation: &Value) -> Vec<String> {
        let Value::Object(map) = expectation else {
            return vec!["INI file expectation must be a table".to_string()];
        };

        let mut problems = Vec::new();
        for (key, value) in map {
            match value {
                Value::Object(entries) => {
                    for (name, entry) in entries {
                        if !is_flat(entry) {
                            let path = KeyPath::new([key.as_str(), name.as_str()]);
                            problems.push(format!(
                                "'{path}' must be a scalar or a list of scalars"
                            ));
                        }
                    }
                }
                other if !is_flat(other) => {
                    problems.push(format!("'{key}' must be a scalar or a list of scalars"));
                }
                _ => {}
            }
        }
        problems
    }

    fn normalizer(&self) -> Normalizer {
        normalize_ini
    }

    /// A list given for an INI key can only mean a comma-joined set.
    fn default_options(&self, _file_name: &str, expectation: &Value) -> CompareOptions {
        let mut options = CompareOptions::default();
        let Value::Object(map) = expectation else {
            return options;
        };
        for (key, value) in map {
            match value {
                Value::Array(_) => {
                    options.comma_separated.insert(KeyPath::new([key.as_str()]));
                }
                Value::Object(entries) => {
                    for (name, entry) in entries {
                        if entry.is_array() {
                            options
                                .comma_separated
                                .insert(KeyPath::new([key.as_str(), name.as_str()]));
                        }
                    }
                }
                _ => {}
            }
        }
        options
    }
}

fn is_flat(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(is_scalar),
        other => is_scalar(other),
    }
}

fn ini_text(value: &Value) -> Result<String> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(",")),
        Value::Object(_) => Err(Error::serialize("INI", "nested tables are not supported")),
        other => Ok(scalar_text(other).unwrap_or_default()),
    }
}

/// Booleans, numbers and boolean-like strings compare lower-cased.
fn normalize_ini(value: &Value) -> Value {
    match normalize_scalar(value) {
        Value::String(text)
            if matches!(
                text.to_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "on" | "off"
            ) =>
        {
            Value::String(text.to_lowercase())
        }
        other => other,
    }
}
