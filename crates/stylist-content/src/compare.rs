//! Desired-vs-actual comparison
//!
//! The comparator is additive: it reports what the desired tree asks for
//! and the actual tree lacks, never what the actual tree has on top.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::blend::flatten;
use crate::path::KeyPath;
use crate::reconcile::reconcile;
use crate::value::{empty_map, insert_at, is_empty_map, is_scalar, lookup, merge_into, scalar_text};

/// Maps a scalar to the form used for equality checks.
pub type Normalizer = fn(&Value) -> Value;

/// Booleans and numbers compare as their lower-cased string form, so a
/// native `true` equals the string `"true"` and `1` equals `"1"`.
pub fn normalize_scalar(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string().to_lowercase()),
        other => other.clone(),
    }
}

/// Per-file comparison settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Keys whose string values are comma-joined sets
    pub comma_separated: BTreeSet<KeyPath>,
    /// Sequence path -> record-relative path of the field identifying a record
    pub unique_keys: BTreeMap<KeyPath, KeyPath>,
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comma_separated(mut self, dotted: &str) -> Self {
        self.comma_separated.insert(KeyPath::parse(dotted));
        self
    }

    pub fn with_unique_key(mut self, sequence: &str, key: &str) -> Self {
        self.unique_keys
            .insert(KeyPath::parse(sequence), KeyPath::parse(key));
        self
    }

    /// Layer `other` on top; its unique keys win on conflict.
    pub fn extend(&mut self, other: &CompareOptions) {
        self.comma_separated
            .extend(other.comma_separated.iter().cloned());
        for (sequence, key) in &other.unique_keys {
            self.unique_keys.insert(sequence.clone(), key.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.comma_separated.is_empty() && self.unique_keys.is_empty()
    }
}

/// What happened at one path.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// The key is absent
    Missing,
    /// A value is present but differs
    Different { actual: Value },
    /// Elements absent from a plain sequence
    Appended { added: Vec<Value> },
    /// Members absent from a comma-joined set
    CommaMembers { added: Vec<String> },
    /// A record sequence reconciled by unique key
    Records { added: Vec<Value>, updated: Vec<usize> },
}

/// One reported difference. `value` is what the path should hold after
/// fixing.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: KeyPath,
    pub kind: ChangeKind,
    pub value: Value,
}

/// The delta between desired and actual state for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Keys desired but absent
    pub missing: Value,
    /// Keys present with a different value
    pub diff: Value,
    /// Whole sequences rewritten by unique-key reconciliation
    pub replace: Value,
    /// Flat list of the individual changes, in desired order
    pub changes: Vec<Change>,
}

impl Default for Comparison {
    fn default() -> Self {
        Self {
            missing: empty_map(),
            diff: empty_map(),
            replace: empty_map(),
            changes: Vec::new(),
        }
    }
}

impl Comparison {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The single delta to hand to a format adapter: missing and diff
    /// combined, with replaced sequences taking precedence.
    pub fn patch_delta(&self) -> Value {
        let mut delta = self.missing.clone();
        merge_into(&mut delta, &self.diff);
        merge_into(&mut delta, &self.replace);
        delta
    }

    /// A tree of the changes matching `filter`.
    pub fn subtree(&self, filter: impl Fn(&ChangeKind) -> bool) -> Value {
        let mut tree = empty_map();
        for change in self.changes.iter().filter(|c| filter(&c.kind)) {
            insert_at(&mut tree, &change.path, change.value.clone());
        }
        tree
    }

    fn record(&mut self, path: KeyPath, kind: ChangeKind, value: Value) {
        match &kind {
            ChangeKind::Missing => insert_at(&mut self.missing, &path, value.clone()),
            ChangeKind::Records { added, .. } => {
                if !added.is_empty() {
                    insert_at(&mut self.missing, &path, Value::Array(added.clone()));
                }
                insert_at(&mut self.replace, &path, value.clone());
            }
            _ => insert_at(&mut self.diff, &path, value.clone()),
        }
        self.changes.push(Change { path, kind, value });
    }
}

/// Computes [`Comparison`]s under one set of options.
pub struct Comparator<'a> {
    options: &'a CompareOptions,
    normalize: Normalizer,
}

impl<'a> Comparator<'a> {
    pub fn new(options: &'a CompareOptions) -> Self {
        Self {
            options,
            normalize: normalize_scalar,
        }
    }

    /// Use a format-specific scalar normalization.
    pub fn with_normalizer(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn options(&self) -> &CompareOptions {
        self.options
    }

    /// Compare every leaf of `desired` against `actual`.
    pub fn compare(&self, desired: &Value, actual: &Value) -> Comparison {
        let mut result = Comparison::default();

        for (path, want) in flatten(desired) {
            if path.is_empty() {
                continue;
            }
            match lookup(actual, &path) {
                None => result.record(path, ChangeKind::Missing, want),
                Some(have) => self.compare_leaf(path, &want, have, &mut result),
            }
        }

        result
    }

    fn compare_leaf(&self, path: KeyPath, want: &Value, have: &Value, result: &mut Comparison) {
        if is_empty_map(want) && have.is_object() {
            return;
        }

        if self.options.comma_separated.contains(&path) {
            if let Some((merged, added)) = self.comma_merge(have, want) {
                result.record(path, ChangeKind::CommaMembers { added }, Value::String(merged));
            }
            return;
        }

        match (want, have) {
            (Value::Array(want_items), Value::Array(have_items)) => {
                match self.options.unique_keys.get(&path) {
                    Some(key) => {
                        let outcome = reconcile(self, &path, key, want_items, have_items);
                        if !outcome.is_unchanged() {
                            let kind = ChangeKind::Records {
                                added: outcome.added,
                                updated: outcome.updated,
                            };
                            result.record(path, kind, Value::Array(outcome.result));
                        }
                    }
                    None => {
                        let added = self.missing_elements(want_items, have_items);
                        if !added.is_empty() {
                            let mut merged = have_items.clone();
                            merged.extend(added.iter().cloned());
                            result.record(path, ChangeKind::Appended { added }, Value::Array(merged));
                        }
                    }
                }
            }
            _ if self.equivalent(want, have) => {}
            _ => result.record(
                path,
                ChangeKind::Different {
                    actual: have.clone(),
                },
                want.clone(),
            ),
        }
    }

    /// Structural equality under the scalar normalization.
    pub fn equivalent(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Array(xs), Value::Array(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.equivalent(x, y))
            }
            (Value::Object(xs), Value::Object(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, x)| ys.get(k).is_some_and(|y| self.equivalent(x, y)))
            }
            (x, y) if is_scalar(x) && is_scalar(y) => (self.normalize)(x) == (self.normalize)(y),
            _ => false,
        }
    }

    /// Whether `have` already holds everything `want` asks for.
    pub fn contains(&self, have: &Value, want: &Value) -> bool {
        match (have, want) {
            (Value::Object(h), Value::Object(w)) => w
                .iter()
                .all(|(k, wv)| h.get(k).is_some_and(|hv| self.contains(hv, wv))),
            (Value::Array(h), Value::Array(w)) => w
                .iter()
                .all(|wv| h.iter().any(|hv| self.contains(hv, wv))),
            (h, w) if is_scalar(h) && is_scalar(w) => (self.normalize)(h) == (self.normalize)(w),
            _ => false,
        }
    }

    /// Desired elements no actual element contains, without repeats.
    pub fn missing_elements(&self, want: &[Value], have: &[Value]) -> Vec<Value> {
        let mut added: Vec<Value> = Vec::new();
        for item in want {
            let present = have.iter().any(|h| self.contains(h, item))
                || added.iter().any(|a| self.contains(a, item));
            if !present {
                added.push(item.clone());
            }
        }
        added
    }

    /// Merge `want` into `have` without removing anything `have` holds.
    ///
    /// `path` addresses `have` (sequence indices are not part of paths), so
    /// nested unique keys and comma-separated keys keep applying.
    pub fn merge_additive(&self, have: &Value, want: &Value, path: &KeyPath) -> Value {
        match (have, want) {
            (Value::Object(h), Value::Object(w)) => {
                let mut out = h.clone();
                for (key, wv) in w {
                    let merged = match h.get(key) {
                        Some(hv) => self.merge_additive(hv, wv, &path.child(key.clone())),
                        None => wv.clone(),
                    };
                    out.insert(key.clone(), merged);
                }
                Value::Object(out)
            }
            (Value::Array(h), Value::Array(w)) => match self.options.unique_keys.get(path) {
                Some(key) => Value::Array(reconcile(self, path, key, w, h).result),
                None => {
                    let mut out = h.clone();
                    out.extend(self.missing_elements(w, h));
                    Value::Array(out)
                }
            },
            _ if self.options.comma_separated.contains(path) => self
                .comma_merge(have, want)
                .map(|(merged, _)| Value::String(merged))
                .unwrap_or_else(|| have.clone()),
            _ if self.equivalent(have, want) => have.clone(),
            _ => want.clone(),
        }
    }

    /// Text form of the record fields at `key`, used to match records.
    pub fn key_values(&self, record: &Value, key: &KeyPath) -> Vec<String> {
        let mut found = Vec::new();
        crate::value::collect_at(record, key.segments(), &mut found);
        found
            .into_iter()
            .filter(|v| is_scalar(v))
            .filter_map(|v| scalar_text(&(self.normalize)(v)))
            .collect()
    }

    /// Set-difference of comma-joined members. Returns the rewritten value
    /// and the appended members, or `None` when nothing is missing.
    fn comma_merge(&self, have: &Value, want: &Value) -> Option<(String, Vec<String>)> {
        let have_text = match have {
            Value::Array(items) => items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(","),
            other => scalar_text(other).unwrap_or_default(),
        };
        let have_members = split_members(&have_text);

        let want_members: Vec<String> = match want {
            Value::Array(items) => items
                .iter()
                .filter_map(scalar_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            other => split_members(&scalar_text(other).unwrap_or_default()),
        };

        let mut added: Vec<String> = Vec::new();
        for member in want_members {
            if !have_members.contains(&member) && !added.contains(&member) {
                added.push(member);
            }
        }
        if added.is_empty() {
            return None;
        }

        let separator = if have_text.contains(", ") { ", " } else { "," };
        let base = have_text.trim_end().trim_end_matches(',');
        let merged = if base.trim().is_empty() {
            added.join(separator)
        } else {
            format!("{base}{separator}{}", added.join(separator))
        };
        Some((merged, added))
    }
}

fn split_members(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compare(desired: &Value, actual: &Value, options: &CompareOptions) -> Comparison {
        Comparator::new(options).compare(desired, actual)
    }

    #[test]
    fn test_simple_missing_value() {
        let result = compare(&json!({"a": {"b": 1}}), &json!({}), &CompareOptions::new());
        assert_eq!(result.missing, json!({"a": {"b": 1}}));
        assert_eq!(result.diff, json!({}));
        assert_eq!(result.replace, json!({}));
    }

    #[test]
    fn test_type_coerced_equality() {
        let result = compare(&json!({"x": true}), &json!({"x": "true"}), &CompareOptions::new());
        assert!(result.is_empty());
        let result = compare(&json!({"n": 120}), &json!({"n": "120"}), &CompareOptions::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_different_scalar() {
        let result = compare(
            &json!({"tool": {"black": {"line-length": 120}}}),
            &json!({"tool": {"black": {"line-length": 88, "target": "py38"}}}),
            &CompareOptions::new(),
        );
        assert_eq!(result.diff, json!({"tool": {"black": {"line-length": 120}}}));
        assert_eq!(result.missing, json!({}));
        assert!(matches!(
            &result.changes[0].kind,
            ChangeKind::Different { actual } if actual == &json!(88)
        ));
    }

    #[test]
    fn test_actual_only_keys_ignored() {
        let result = compare(&json!({"a": 1}), &json!({"a": 1, "b": 2}), &CompareOptions::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_plain_sequence_is_additions_only() {
        let result = compare(
            &json!({"list": ["b", "d"]}),
            &json!({"list": ["a", "b", "c"]}),
            &CompareOptions::new(),
        );
        assert_eq!(result.diff, json!({"list": ["a", "b", "c", "d"]}));

        let satisfied = compare(
            &json!({"list": ["b"]}),
            &json!({"list": ["a", "b", "c"]}),
            &CompareOptions::new(),
        );
        assert!(satisfied.is_empty());
    }

    #[test]
    fn test_comma_set_reconciliation() {
        let options = CompareOptions::new().with_comma_separated("flake8.ignore");
        let result = compare(
            &json!({"flake8": {"ignore": ["ham", "salt"]}}),
            &json!({"flake8": {"ignore": "spam,eggs,cheese"}}),
            &options,
        );
        assert_eq!(
            result.diff,
            json!({"flake8": {"ignore": "spam,eggs,cheese,ham,salt"}})
        );
        assert!(matches!(
            &result.changes[0].kind,
            ChangeKind::CommaMembers { added } if added == &vec!["ham".to_string(), "salt".to_string()]
        ));
    }

    #[test]
    fn test_comma_set_keeps_spacing_style() {
        let options = CompareOptions::new().with_comma_separated("s.k");
        let result = compare(
            &json!({"s": {"k": "b, c"}}),
            &json!({"s": {"k": "a, b"}}),
            &options,
        );
        assert_eq!(result.diff, json!({"s": {"k": "a, b, c"}}));
    }

    #[test]
    fn test_unique_key_updates_matched_record() {
        let options = CompareOptions::new().with_unique_key("hooks", "id");
        let result = compare(
            &json!({"hooks": [{"id": "black", "rev": "2"}]}),
            &json!({"hooks": [{"id": "flake8", "rev": "9"}, {"id": "black", "rev": "1"}]}),
            &options,
        );
        assert_eq!(result.missing, json!({}));
        assert_eq!(
            result.replace,
            json!({"hooks": [{"id": "flake8", "rev": "9"}, {"id": "black", "rev": "2"}]})
        );
    }

    #[test]
    fn test_patch_delta_prefers_replace() {
        let options = CompareOptions::new().with_unique_key("hooks", "id");
        let result = compare(
            &json!({"top": 1, "hooks": [{"id": "new"}]}),
            &json!({"hooks": [{"id": "old"}]}),
            &options,
        );
        assert_eq!(result.missing, json!({"top": 1, "hooks": [{"id": "new"}]}));
        assert_eq!(
            result.patch_delta(),
            json!({"top": 1, "hooks": [{"id": "old"}, {"id": "new"}]})
        );
    }

    #[test]
    fn test_empty_desired_table_is_satisfied_by_table() {
        let result = compare(&json!({"a": {}}), &json!({"a": {"x": 1}}), &CompareOptions::new());
        assert!(result.is_empty());
        let result = compare(&json!({"a": {}}), &json!({}), &CompareOptions::new());
        assert_eq!(result.missing, json!({"a": {}}));
    }

    #[test]
    fn test_subtree_filters_by_kind() {
        let result = compare(
            &json!({"a": 1, "b": 2}),
            &json!({"b": 3}),
            &CompareOptions::new(),
        );
        let different = result.subtree(|k| matches!(k, ChangeKind::Different { .. }));
        assert_eq!(different, json!({"b": 2}));
    }
}
