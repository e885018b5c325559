//! Line-oriented text adapter
//!
//! A text file is modelled as `{contains = [{line = "..."}, ...]}`. Styles
//! can only require lines to be present; patching appends the missing ones
//! and leaves every existing line where it is.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::compare::CompareOptions;
use crate::error::{Error, Result};
use crate::format::{Format, FormatAdapter};
use crate::value::collect_at;

const CONTAINS: &str = "contains";
const LINE: &str = "line";

/// Adapter for plain text files (`requirements.txt`, `.gitignore`)
#[derive(Debug, Default)]
pub struct TextAdapter;

impl TextAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn wanted_lines(tree: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_at(tree, &[CONTAINS.to_string(), LINE.to_string()], &mut found);
    found
        .into_iter()
        .filter_map(Value::as_str)
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Lines are stored trimmed and blank lines are dropped on load, so a wanted
/// line that differs from its trimmed form could never be satisfied.
fn line_problem(line: &str) -> Option<&'static str> {
    if line.trim().is_empty() {
        Some("must not be blank")
    } else if line.contains(['\n', '\r']) {
        Some("must be a single line")
    } else if line.trim_end() != line {
        Some("must not end with whitespace")
    } else {
        None
    }
}

impl FormatAdapter for TextAdapter {
    fn format(&self) -> Format {
        Format::Text
    }

    fn load(&self, source: &str) -> Result<Value> {
        let lines: Vec<Value> = source
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(|line| json!({ LINE: line }))
            .collect();
        let mut tree = Map::new();
        tree.insert(CONTAINS.to_string(), Value::Array(lines));
        Ok(Value::Object(tree))
    }

    fn serialize(&self, tree: &Value) -> Result<String> {
        let mut text = wanted_lines(tree).join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        Ok(text)
    }

    fn patch(&self, source: &str, delta: &Value) -> Result<String> {
        if !delta.is_object() {
            return Err(Error::NotAMap {
                path: String::new(),
            });
        }

        let mut present: HashSet<String> = source
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect();

        let mut text = source.to_string();
        for line in wanted_lines(delta) {
            if present.contains(&line) {
                continue;
            }
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&line);
            text.push('\n');
            present.insert(line);
        }
        Ok(text)
    }

    fn validate(&self, expectation: &Value) -> Vec<String> {
        let Value::Object(map) = expectation else {
            return vec!["text file expectation must be a table".to_string()];
        };

        let mut problems = Vec::new();
        for (key, value) in map {
            if key != CONTAINS {
                problems.push(format!("unknown key '{key}', only '{CONTAINS}' is allowed"));
                continue;
            }
            let Value::Array(items) = value else {
                problems.push(format!("'{CONTAINS}' must be a list"));
                continue;
            };
            for (index, item) in items.iter().enumerate() {
                let valid = item
                    .as_object()
                    .is_some_and(|record| record.len() == 1 && record.get(LINE).is_some_and(Value::is_string));
                if !valid {
                    problems.push(format!(
                        "'{CONTAINS}' item {index} must be a table with a single '{LINE}' string"
                    ));
                    continue;
                }
                if let Some(line) = item.get(LINE).and_then(Value::as_str) {
                    if let Some(problem) = line_problem(line) {
                        problems.push(format!("'{CONTAINS}' item {index} {problem}"));
                    }
                }
            }
        }
        problems
    }

    fn default_options(&self, _file_name: &str, _expectation: &Value) -> CompareOptions {
        CompareOptions::new().with_unique_key(CONTAINS, LINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Comparator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_skips_blank_lines() {
        let tree = TextAdapter.load("black\n\nflake8  \n").unwrap();
        assert_eq!(tree, json!({"contains": [{"line": "black"}, {"line": "flake8"}]}));
    }

    #[test]
    fn test_patch_appends_missing_lines_only() {
        let delta = json!({"contains": [{"line": "flake8"}, {"line": "mypy"}]});
        let patched = TextAdapter.patch("black\nflake8", &delta).unwrap();
        assert_eq!(patched, "black\nflake8\nmypy\n");
    }

    #[test]
    fn test_compare_reports_missing_line_as_record() {
        let actual = TextAdapter.load("black\n").unwrap();
        let desired = json!({"contains": [{"line": "black"}, {"line": "isort"}]});
        let options = TextAdapter.default_options("requirements.txt", &desired);
        let result = Comparator::new(&options).compare(&desired, &actual);
        assert_eq!(result.missing, json!({"contains": [{"line": "isort"}]}));
    }

    #[test]
    fn test_validate_shape() {
        assert!(TextAdapter.validate(&json!({"contains": [{"line": "x"}]})).is_empty());
        assert_eq!(TextAdapter.validate(&json!({"contains": [{"text": "x"}]})).len(), 1);
        assert_eq!(TextAdapter.validate(&json!({"other": 1})).len(), 1);
    }

    #[test]
    fn test_validate_rejects_lines_that_cannot_match() {
        let problems = TextAdapter.validate(&json!({"contains": [
            {"line": "*.pyc "},
            {"line": "  "},
            {"line": "a\nb"},
            {"line": "  .venv"}
        ]}));
        assert_eq!(
            problems,
            vec![
                "'contains' item 0 must not end with whitespace",
                "'contains' item 1 must not be blank",
                "'contains' item 2 must be a single line",
            ]
        );
    }

    #[test]
    fn test_patch_is_idempotent_for_padded_lines() {
        let delta = json!({"contains": [{"line": "*.pyc "}]});
        let once = TextAdapter.patch("", &delta).unwrap();
        assert_eq!(once, "*.pyc\n");

        let desired = json!({"contains": [{"line": "*.pyc"}]});
        let options = TextAdapter.default_options(".gitignore", &desired);
        let actual = TextAdapter.load(&once).unwrap();
        assert!(Comparator::new(&options).compare(&desired, &actual).is_empty());
        assert_eq!(TextAdapter.patch(&once, &delta).unwrap(), once);
    }
}
