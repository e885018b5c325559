//! Flatten/merge primitive for value tree maps
//!
//! [`flatten`] turns nested maps into `KeyPath -> leaf` pairs, where a leaf
//! is a scalar, a sequence or an empty map. [`DictBlender`] accumulates
//! several trees in that flat form: scalars overwrite, sequences extend, and
//! [`DictBlender::mix`] rebuilds the nested result.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::path::KeyPath;
use crate::value::{empty_map, is_empty_map};

/// Flat view of a tree, in first-seen order.
pub type FlatTree = IndexMap<KeyPath, Value>;

/// Flatten nested maps into leaf paths.
///
/// A non-map root becomes a single entry under the root path.
pub fn flatten(tree: &Value) -> FlatTree {
    let mut out = FlatTree::new();
    flatten_into(KeyPath::root(), tree, &mut out);
    out
}

fn flatten_into(prefix: KeyPath, value: &Value, out: &mut FlatTree) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(prefix.child(key.clone()), child, out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}

/// Rebuild nested maps from flat entries.
///
/// Fails when one path is used both as a leaf and as a parent.
pub fn unflatten(flat: &FlatTree) -> Result<Value> {
    let mut root = Map::new();

    for (path, value) in flat {
        let Some((last, parents)) = path.segments().split_last() else {
            if flat.len() == 1 {
                return Ok(value.clone());
            }
            return Err(Error::StructuralConflict {
                path: path.to_string(),
            });
        };

        let mut node = &mut root;
        for (depth, key) in parents.iter().enumerate() {
            let child = node.entry(key.clone()).or_insert_with(empty_map);
            node = match child {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::StructuralConflict {
                        path: KeyPath::new(parents[..=depth].iter().cloned()).to_string(),
                    });
                }
            };
        }

        let is_parent = matches!(node.get(last), Some(Value::Object(existing)) if !existing.is_empty());
        if !is_parent {
            node.insert(last.clone(), value.clone());
        } else if !is_empty_map(value) {
            return Err(Error::StructuralConflict {
                path: path.to_string(),
            });
        }
    }

    Ok(Value::Object(root))
}

/// Accumulates value tree maps into one merged tree.
///
/// ```
/// use serde_json::json;
/// use stylist_content::DictBlender;
///
/// let mut blender = DictBlender::new();
/// blender.add(&json!({"hooks": ["a"], "line-length": 80})).unwrap();
/// blender.add(&json!({"hooks": ["b"], "line-length": 120})).unwrap();
/// assert_eq!(blender.mix(), json!({"hooks": ["a", "b"], "line-length": 120}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DictBlender {
    flat: FlatTree,
}

impl DictBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Merge a map into the accumulated state.
    ///
    /// The call is all-or-nothing: every path is checked for a leaf/parent
    /// conflict before anything is stored.
    pub fn add(&mut self, tree: &Value) -> Result<()> {
        if !tree.is_object() {
            return Err(Error::NotAMap {
                path: KeyPath::root().to_string(),
            });
        }

        let incoming = flatten(tree);
        for (path, value) in &incoming {
            self.check_conflict(path, value)?;
        }

        for (path, value) in incoming {
            for ancestor in path.ancestors() {
                if self.flat.get(&ancestor).is_some_and(is_empty_map) {
                    self.flat.shift_remove(&ancestor);
                }
            }

            if is_empty_map(&value) && self.has_descendants(&path) {
                continue;
            }

            let extends = matches!(
                (self.flat.get(&path), &value),
                (Some(Value::Array(_)), Value::Array(_))
            );
            if !extends {
                self.flat.insert(path, value);
            } else if let (Some(Value::Array(existing)), Value::Array(extra)) =
                (self.flat.get_mut(&path), value)
            {
                existing.extend(extra);
            }
        }

        Ok(())
    }

    /// The merged nested tree.
    pub fn mix(&self) -> Value {
        // add() never admits conflicting paths
        unflatten(&self.flat).unwrap_or_else(|_| empty_map())
    }

    /// The flat entries accumulated so far.
    pub fn entries(&self) -> &FlatTree {
        &self.flat
    }

    fn check_conflict(&self, path: &KeyPath, value: &Value) -> Result<()> {
        for ancestor in path.ancestors() {
            if let Some(existing) = self.flat.get(&ancestor) {
                if !is_empty_map(existing) {
                    return Err(Error::StructuralConflict {
                        path: ancestor.to_string(),
                    });
                }
            }
        }

        if !is_empty_map(value) && self.has_descendants(path) {
            return Err(Error::StructuralConflict {
                path: path.to_string(),
            });
        }

        Ok(())
    }

    fn has_descendants(&self, path: &KeyPath) -> bool {
        self.flat
            .keys()
            .any(|key| key.len() > path.len() && key.starts_with(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let flat = flatten(&json!({"a": {"b": 1, "c": [1, 2]}, "d": {}}));
        let keys: Vec<_> = flat.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a.b", "a.c", "d"]);
        assert_eq!(flat[&KeyPath::parse("d")], json!({}));
    }

    #[test]
    fn test_flatten_keeps_dotted_keys_whole() {
        let flat = flatten(&json!({"setup.cfg": {"flake8": {"max-line-length": 120}}}));
        let (path, _) = flat.first().unwrap();
        assert_eq!(path.segments(), &["setup.cfg", "flake8", "max-line-length"]);
    }

    #[test]
    fn test_scalar_overwrites() {
        let mut blender = DictBlender::new();
        blender.add(&json!({"a": {"b": 1}})).unwrap();
        blender.add(&json!({"a": {"b": 2, "c": 3}})).unwrap();
        assert_eq!(blender.mix(), json!({"a": {"b": 2, "c": 3}}));
    }

    #[test]
    fn test_sequences_extend() {
        let mut blender = DictBlender::new();
        blender.add(&json!({"repos": [{"repo": "a"}]})).unwrap();
        blender.add(&json!({"repos": [{"repo": "b"}]})).unwrap();
        assert_eq!(
            blender.mix(),
            json!({"repos": [{"repo": "a"}, {"repo": "b"}]})
        );
    }

    #[test]
    fn test_descending_through_scalar_conflicts() {
        let mut blender = DictBlender::new();
        blender.add(&json!({"a": 1})).unwrap();
        let err = blender.add(&json!({"a": {"b": 2}})).unwrap_err();
        assert!(matches!(err, Error::StructuralConflict { path } if path == "a"));
        // The failed call left nothing behind
        assert_eq!(blender.mix(), json!({"a": 1}));
    }

    #[test]
    fn test_scalar_over_table_conflicts() {
        let mut blender = DictBlender::new();
        blender.add(&json!({"a": {"b": 2}})).unwrap();
        assert!(blender.add(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_empty_map_refined_by_children() {
        let mut blender = DictBlender::new();
        blender.add(&json!({"a": {}})).unwrap();
        blender.add(&json!({"a": {"b": 1}})).unwrap();
        blender.add(&json!({"a": {}})).unwrap();
        assert_eq!(blender.mix(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_unflatten_reports_conflict() {
        let mut flat = FlatTree::new();
        flat.insert(KeyPath::parse("a"), json!(1));
        flat.insert(KeyPath::parse("a.b"), json!(2));
        assert!(unflatten(&flat).is_err());
    }
}
