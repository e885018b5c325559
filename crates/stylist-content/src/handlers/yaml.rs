//! YAML adapter with a line-preserving patcher
//!
//! `serde_yaml` does the parsing. Patches are applied to the block-style
//! source line by line: scalars are rewritten in place (keeping quoting and
//! trailing comments), new keys and sequence items are inserted at the
//! indentation of their siblings, and untouched lines are kept verbatim.
//! Flow collections, block scalars and anchors are re-rendered as a whole
//! entry when they change. A patch that the line model cannot express
//! falls back to re-serializing the full document.

use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;

use crate::compare::CompareOptions;
use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};
use crate::value::{is_scalar, patch_value};

const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

/// A mapping key located in the source.
#[derive(Debug)]
struct Entry {
    key: String,
    line: usize,
    col: usize,
    colon: usize,
}

#[derive(Clone, Copy)]
enum Slot<'a> {
    Entry(&'a str),
    Item,
}

/// A YAML source split into lines, patched without disturbing the lines a
/// delta does not reach.
#[derive(Debug, Clone, Default)]
pub struct YamlDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl YamlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            trailing_newline: source.is_empty() || source.ends_with('\n'),
        }
    }

    /// Apply `delta` and render, or `None` when the layout is out of reach
    /// of the line model.
    pub fn patch(&self, delta: &Value) -> Option<String> {
        let root = self
            .lines
            .iter()
            .position(|line| is_content(line) && !is_marker(line));

        let lines = match root {
            Some(first) => {
                let end = self.content_end(first, self.lines.len());
                let col = indent_of(&self.lines[first]);
                let mut out = self.lines[..first].to_vec();
                out.extend(self.patch_block(first, col, end, delta)?);
                out.extend_from_slice(&self.lines[end..]);
                out
            }
            None => {
                let mut out = self.lines.clone();
                out.extend(render_lines(delta, "", 0)?);
                out
            }
        };

        let mut text = lines.join("\n");
        if self.trailing_newline && !text.is_empty() {
            text.push('\n');
        }
        Some(text)
    }

    fn patch_block(
        &self,
        start: usize,
        col: usize,
        end: usize,
        want: &Value,
    ) -> Option<Vec<String>> {
        let text = &self.lines[start][col..];
        match want {
            Value::Array(items) if is_dash(text) => self.patch_sequence(start, col, end, items),
            Value::Object(map) if !is_dash(text) && split_key(text).is_some() => {
                self.patch_mapping(start, col, end, map)
            }
            _ => None,
        }
    }

    fn patch_mapping(
        &self,
        start: usize,
        col: usize,
        end: usize,
        want: &Map<String, Value>,
    ) -> Option<Vec<String>> {
        let entries = self.entries(start, col, end)?;
        let pad = " ".repeat(col);
        let mut out = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let entry_end = entries.get(index + 1).map_or(end, |next| next.line);
            let content_end = self.content_end(entry.line, entry_end);
            match want.get(&entry.key) {
                Some(value) => out.extend(self.patch_entry(entry, content_end, value)?),
                None => out.extend_from_slice(&self.lines[entry.line..content_end]),
            }

            if index + 1 == entries.len() {
                for (key, value) in want {
                    if !entries.iter().any(|e| &e.key == key) {
                        out.extend(render_lines(&single(key, value), &pad, col)?);
                    }
                }
            }
            out.extend_from_slice(&self.lines[content_end..entry_end]);
        }
        Some(out)
    }

    fn patch_sequence(
        &self,
        start: usize,
        col: usize,
        end: usize,
        want: &[Value],
    ) -> Option<Vec<String>> {
        let items = self.items(start, col, end)?;
        let pad = " ".repeat(col);
        let mut out = Vec::new();

        for (index, &line) in items.iter().enumerate() {
            let item_end = items.get(index + 1).copied().unwrap_or(end);
            let content_end = self.content_end(line, item_end);
            match want.get(index) {
                Some(value) => out.extend(self.patch_item(line, col, content_end, value)?),
                None => out.extend_from_slice(&self.lines[line..content_end]),
            }

            if index + 1 == items.len() {
                for value in want.iter().skip(items.len()) {
                    out.extend(render_lines(&Value::Array(vec![value.clone()]), &pad, col)?);
                }
            }
            out.extend_from_slice(&self.lines[content_end..item_end]);
        }
        Some(out)
    }

    fn patch_entry(&self, entry: &Entry, end: usize, want: &Value) -> Option<Vec<String>> {
        let line = &self.lines[entry.line];
        let (start, stop) = value_bounds(line, entry.colon + 1);

        if start == stop {
            if let Some(block) = self.patch_child(entry.line, end, want) {
                return Some(block);
            }
        } else if let Some(text) = replace_scalar(line, start, stop, want) {
            let mut out = vec![text];
            out.extend_from_slice(&self.lines[entry.line + 1..end]);
            return Some(out);
        }
        self.rewrite(entry.line, entry.col, end, want, Slot::Entry(&entry.key))
    }

    fn patch_item(
        &self,
        line_index: usize,
        col: usize,
        end: usize,
        want: &Value,
    ) -> Option<Vec<String>> {
        let line = &self.lines[line_index];
        let (start, stop) = value_bounds(line, col + 1);
        let inline = &line[start..stop];

        if inline.is_empty() {
            if let Some(block) = self.patch_child(line_index, end, want) {
                return Some(block);
            }
        } else if is_dash(inline) || split_key(inline).is_some() {
            if let Some(block) = self.patch_block(line_index, start, end, want) {
                return Some(block);
            }
        } else if let Some(text) = replace_scalar(line, start, stop, want) {
            let mut out = vec![text];
            out.extend_from_slice(&self.lines[line_index + 1..end]);
            return Some(out);
        }
        self.rewrite(line_index, col, end, want, Slot::Item)
    }

    /// Patch the block nested under a `key:` or bare `-` line.
    fn patch_child(&self, owner: usize, end: usize, want: &Value) -> Option<Vec<String>> {
        let child = (owner + 1..end).find(|&index| is_content(&self.lines[index]))?;
        let block = self.patch_block(child, indent_of(&self.lines[child]), end, want)?;
        let mut out = self.lines[owner..child].to_vec();
        out.extend(block);
        Some(out)
    }

    /// Re-render one entry or item from its merged value.
    fn rewrite(
        &self,
        first: usize,
        col: usize,
        end: usize,
        want: &Value,
        slot: Slot<'_>,
    ) -> Option<Vec<String>> {
        let mut snippet = format!("{}{}", " ".repeat(col), &self.lines[first][col..]);
        for line in &self.lines[first + 1..end] {
            snippet.push('\n');
            snippet.push_str(line);
        }
        let parsed = yaml_to_json(&serde_yaml::from_str(&snippet).ok()?);

        let current = match slot {
            Slot::Entry(key) => parsed.get(key)?.clone(),
            Slot::Item => parsed.as_array()?.first()?.clone(),
        };
        let mut merged = current.clone();
        patch_value(&mut merged, want);
        if merged == current {
            return Some(self.lines[first..end].to_vec());
        }

        let wrapped = match slot {
            Slot::Entry(key) => single(key, &merged),
            Slot::Item => Value::Array(vec![merged]),
        };
        render_lines(&wrapped, &self.lines[first][..col], col)
    }

    fn entries(&self, start: usize, col: usize, end: usize) -> Option<Vec<Entry>> {
        let mut entries: Vec<Entry> = Vec::new();
        for index in start..end {
            let line = &self.lines[index];
            let at = if index == start {
                col
            } else {
                if !is_content(line) {
                    continue;
                }
                let indent = indent_of(line);
                if indent < col {
                    return None;
                }
                if indent > col || is_dash(&line[indent..]) {
                    continue;
                }
                indent
            };
            let (key, colon) = split_key(&line[at..])?;
            entries.push(Entry {
                key,
                line: index,
                col: at,
                colon: at + colon,
            });
        }
        (!entries.is_empty()).then_some(entries)
    }

    fn items(&self, start: usize, col: usize, end: usize) -> Option<Vec<usize>> {
        let mut items = Vec::new();
        for index in start..end {
            let line = &self.lines[index];
            if index != start {
                if !is_content(line) {
                    continue;
                }
                let indent = indent_of(line);
                if indent < col {
                    return None;
                }
                if indent > col {
                    continue;
                }
            }
            if !is_dash(&line[col..]) {
                return None;
            }
            items.push(index);
        }
        (!items.is_empty()).then_some(items)
    }

    /// One past the last non-blank, non-comment line in `from..end`.
    fn content_end(&self, from: usize, end: usize) -> usize {
        (from..end)
            .rev()
            .find(|&index| is_content(&self.lines[index]))
            .map_or(from, |index| index + 1)
    }
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

fn is_marker(line: &str) -> bool {
    line.starts_with("---") || line.starts_with('%')
}

fn is_dash(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Byte range of the value text starting at `from`, without surrounding
/// whitespace or a trailing comment.
fn value_bounds(line: &str, from: usize) -> (usize, usize) {
    let bytes = line.as_bytes();
    let mut start = from.min(bytes.len());
    while start < bytes.len() && matches!(bytes[start], b' ' | b'\t') {
        start += 1;
    }

    let mut end = bytes.len();
    let mut quote = None;
    let mut index = start;
    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(q) if byte == q => {
                if q == b'\'' && bytes.get(index + 1) == Some(&b'\'') {
                    index += 1;
                } else {
                    quote = None;
                }
            }
            Some(b'"') if byte == b'\\' => index += 1,
            Some(_) => {}
            None if index == start && matches!(byte, b'"' | b'\'') => quote = Some(byte),
            None if byte == b'#'
                && (index == start || matches!(bytes[index - 1], b' ' | b'\t')) =>
            {
                end = index;
                break;
            }
            None => {}
        }
        index += 1;
    }

    while end > start && matches!(bytes[end - 1], b' ' | b'\t') {
        end -= 1;
    }
    (start, end)
}

/// Split `key: ...` into the decoded key and the byte offset of its colon.
fn split_key(text: &str) -> Option<(String, usize)> {
    let text = &text[..value_bounds(text, 0).1];
    if text.starts_with(['-', '[', '{', '&', '*', '!', '|', '>', '?', '%', '@', '`']) {
        return None;
    }

    let colon = if text.starts_with(['"', '\'']) {
        let quote = &text[..1];
        let close = text[1..].find(quote)? + 1;
        text[close + 1..].starts_with(':').then_some(close + 1)?
    } else {
        text.find(": ")
            .or_else(|| text.strip_suffix(':').map(str::len))?
    };
    let after = &text[colon + 1..];
    if !(after.is_empty() || after.starts_with([' ', '\t'])) {
        return None;
    }

    let raw = text[..colon].trim_end();
    let key = if raw.starts_with(['"', '\'']) {
        serde_yaml::from_str::<String>(raw).ok()?
    } else {
        raw.to_string()
    };
    Some((key, colon))
}

/// Rewrite an inline scalar in place, keeping its quoting style.
fn replace_scalar(line: &str, start: usize, stop: usize, want: &Value) -> Option<String> {
    let inline = &line[start..stop];
    if !is_scalar(want) || inline.starts_with(['[', '{', '&', '*', '!', '|', '>']) {
        return None;
    }

    let current = yaml_to_json(&serde_yaml::from_str(inline).ok()?);
    if current == *want {
        return Some(line.to_string());
    }

    let text = match want {
        Value::String(s) if inline.starts_with('\'') => format!("'{}'", s.replace('\'', "''")),
        Value::String(s) if inline.starts_with('"') => serde_json::to_string(s).ok()?,
        Value::String(s) if plain_is_exact(s) => s.clone(),
        other => serde_yaml::to_string(other).ok()?.trim_end().to_string(),
    };
    if text.contains('\n') {
        return None;
    }
    Some(format!("{}{}{}", &line[..start], text, &line[stop..]))
}

/// Whether `text` written unquoted reads back as the same string.
fn plain_is_exact(text: &str) -> bool {
    !text.contains('\n')
        && !text.contains(": ")
        && !text.contains(" #")
        && text.trim() == text
        && serde_yaml::from_str::<YamlValue>(text).ok() == Some(YamlValue::String(text.to_string()))
}

fn single(key: &str, value: &Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value.clone());
    Value::Object(map)
}

/// Render `value` as block YAML: the first line after `first_prefix`, the
/// rest indented by `col`.
fn render_lines(value: &Value, first_prefix: &str, col: usize) -> Option<Vec<String>> {
    let text = serde_yaml::to_string(value).ok()?;
    let pad = " ".repeat(col);
    Some(
        text.lines()
            .enumerate()
            .map(|(index, line)| match index {
                0 => format!("{first_prefix}{line}"),
                _ if line.is_empty() => String::new(),
                _ => format!("{pad}{line}"),
            })
            .collect(),
    )
}

/// Adapter for YAML files
#[derive(Debug, Default)]
pub struct YamlAdapter;

impl YamlAdapter {
    pub fn new() -> Self {
        Self
    }

    fn parse(source: &str) -> Result<YamlValue> {
        serde_yaml::from_str(source).map_err(|e| Error::parse("YAML", e.to_string()))
    }
}

impl FormatAdapter for YamlAdapter {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn load(&self, source: &str) -> Result<Value> {
        match yaml_to_json(&Self::parse(source)?) {
            Value::Null => Ok(Value::Object(Map::new())),
            value => Ok(value),
        }
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        Ok(serde_yaml::to_string(tree)?)
    }

    fn patch(&self, source: &str, delta: &Value) -> Result<String> {
        let mut live = Self::parse(source)?;
        patch_yaml(&mut live, delta)?;
        let expected = yaml_to_json(&live);

        if let Some(text) = YamlDocument::parse(source).patch(delta) {
            match Self::parse(&text) {
                Ok(reparsed) if yaml_to_json(&reparsed) == expected => return Ok(text),
                _ => tracing::debug!("Line-level YAML patch diverged; re-serializing document"),
            }
        }
        Ok(serde_yaml::to_string(&live)?)
    }

    fn default_options(&self, file_name: &str, _expectation: &Value) -> CompareOptions {
        if file_name.rsplit('/').next() == Some(PRE_COMMIT_CONFIG) {
            CompareOptions::new()
                .with_unique_key("repos", "repo")
                .with_unique_key("repos.hooks", "id")
        } else {
            CompareOptions::default()
        }
    }
}

fn yaml_to_json(value: &YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => Value::Array(items.iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                let key = match key {
                    YamlValue::String(s) => s.clone(),
                    YamlValue::Bool(b) => b.to_string(),
                    YamlValue::Number(n) => n.to_string(),
                    _ => continue,
                };
                out.insert(key, yaml_to_json(item));
            }
            Value::Object(out)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn patch_yaml(live: &mut YamlValue, delta: &Value) -> Result<()> {
    match (live, delta) {
        (YamlValue::Mapping(map), Value::Object(delta_map)) => {
            for (key, want) in delta_map {
                match map.get_mut(key.as_str()) {
                    Some(existing) => patch_yaml(existing, want)?,
                    None => {
                        map.insert(YamlValue::String(key.clone()), serde_yaml::to_value(want)?);
                    }
                }
            }
        }
        (YamlValue::Sequence(items), Value::Array(wants)) => {
            for (index, want) in wants.iter().enumerate() {
                match items.get_mut(index) {
                    Some(existing) => patch_yaml(existing, want)?,
                    None => items.push(serde_yaml::to_value(want)?),
                }
            }
        }
        (live, want) => {
            let replacement = serde_yaml::to_value(want)?;
            if *live != replacement {
                *live = replacement;
            }
        }
    }
    Ok(())
}
