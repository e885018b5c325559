//! Unique-key reconciliation of record sequences
//!
//! Records are matched by the value of a configured key field instead of
//! by position. Unmatched desired records are appended; matched ones are
//! merged additively in place. Records only the actual sequence holds are
//! never removed or reordered.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::compare::Comparator;
use crate::path::KeyPath;

/// Outcome of reconciling one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Records appended because no actual record matched them
    pub added: Vec<Value>,
    /// Positions of actual records updated in place
    pub updated: Vec<usize>,
    /// The full resulting sequence
    pub result: Vec<Value>,
}

impl Reconciliation {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Reconcile `desired` records into `actual` using the field at `key`.
///
/// A record whose key field holds a sequence is indexed under every value
/// it contains. A desired record is merged into each actual record sharing
/// one of its key values, and appended only when none does.
pub fn reconcile(
    comparator: &Comparator<'_>,
    sequence_path: &KeyPath,
    key: &KeyPath,
    desired: &[Value],
    actual: &[Value],
) -> Reconciliation {
    let mut index: HashMap<String, usize> = HashMap::new();
    for (position, record) in actual.iter().enumerate() {
        for value in comparator.key_values(record, key) {
            index.entry(value).or_insert(position);
        }
    }

    if index.is_empty() {
        let added = comparator.missing_elements(desired, actual);
        let mut result = actual.to_vec();
        result.extend(added.iter().cloned());
        return Reconciliation {
            added,
            updated: Vec::new(),
            result,
        };
    }

    let mut result = actual.to_vec();
    let mut updated = BTreeSet::new();

    for record in desired {
        let values = comparator.key_values(record, key);
        let positions: BTreeSet<usize> = values
            .iter()
            .filter_map(|v| index.get(v).copied())
            .collect();

        if positions.is_empty() {
            if values.is_empty() && result.iter().any(|r| comparator.contains(r, record)) {
                continue;
            }
            let position = result.len();
            for value in values {
                index.insert(value, position);
            }
            result.push(record.clone());
            continue;
        }

        for position in positions {
            let merged = comparator.merge_additive(&result[position], record, sequence_path);
            if merged != result[position] {
                tracing::trace!(path = %sequence_path, position, "Record updated in place");
                result[position] = merged;
                if position < actual.len() {
                    updated.insert(position);
                }
            }
        }
    }

    Reconciliation {
        added: result[actual.len()..].to_vec(),
        updated: updated.into_iter().collect(),
        result,
    }
}
